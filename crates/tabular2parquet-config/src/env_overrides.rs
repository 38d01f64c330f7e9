use crate::{FsConfig, RuntimeConfig, S3Config, StorageBackend};
use anyhow::{anyhow, Context, Result};
use tabular2parquet_core::{CompressionCodec, OnUnparseableDate};

pub const ENV_PREFIX: &str = "TABULAR2PARQUET_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides without mutating the process environment.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the TABULAR2PARQUET_ prefix.
    /// Used for externally-owned variables (DATE_COLUMN_NAME, AWS_REGION, ...)
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Output dataset
    if let Some(bucket) = get_env_string(env, "OUTPUT_BUCKET")? {
        config.output.bucket = bucket;
    }
    if let Some(prefix) = get_env_string(env, "OUTPUT_PREFIX")? {
        config.output.prefix = if prefix.is_empty() { None } else { Some(prefix) };
    }
    if let Some(codec) = get_env_string(env, "COMPRESSION")? {
        config.output.compression = codec
            .parse::<CompressionCodec>()
            .context("Invalid TABULAR2PARQUET_COMPRESSION value")?;
    }

    // Path convention
    if let Some(anchor) = get_env_string(env, "ANCHOR")? {
        config.convention.anchor = if anchor.is_empty() { None } else { Some(anchor) };
    }
    if let Some(position) = get_env_usize(env, "ANCHOR_POSITION")? {
        config.convention.anchor_position = position;
    }
    if let Some(min) = get_env_usize(env, "MIN_SEGMENTS")? {
        config.convention.min_segments = min;
    }

    // Date detection / partitioning
    // Support both TABULAR2PARQUET_DATE_COLUMN (canonical) and the bare
    // DATE_COLUMN_NAME used by existing deployments
    if let Some(column) = get_env_string(env, "DATE_COLUMN")? {
        config.partitioning.date_column = if column.is_empty() { None } else { Some(column) };
    } else if let Some(column) = get_raw_env_string(env, "DATE_COLUMN_NAME")? {
        config.partitioning.date_column = if column.is_empty() { None } else { Some(column) };
    }
    if let Some(keywords) = get_env_string(env, "KEYWORDS")? {
        config.partitioning.keywords = keywords
            .split(',')
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
    }
    if let Some(fraction) = get_env_f64(env, "MIN_PARSE_FRACTION")? {
        config.partitioning.min_parse_fraction = fraction;
    }
    if let Some(rows) = get_env_usize(env, "SAMPLE_ROWS")? {
        config.partitioning.sample_rows = rows;
    }
    if let Some(policy) = get_env_string(env, "ON_UNPARSEABLE_DATE")? {
        config.partitioning.on_unparseable_date = policy
            .parse::<OnUnparseableDate>()
            .context("Invalid TABULAR2PARQUET_ON_UNPARSEABLE_DATE value")?;
    }

    // Storage backend
    if let Some(backend) = get_env_string(env, "STORAGE_BACKEND")? {
        config.storage.backend = backend
            .parse::<StorageBackend>()
            .context("Invalid TABULAR2PARQUET_STORAGE_BACKEND value")?;
    }
    if let Some(region) = get_env_string(env, "S3_REGION")? {
        ensure_s3(config).region = region;
    } else if let Some(region) = get_raw_env_string(env, "AWS_REGION")? {
        if config.storage.backend == StorageBackend::S3 {
            ensure_s3(config).region = region;
        }
    }
    if let Some(endpoint) = get_env_string(env, "S3_ENDPOINT")? {
        ensure_s3(config).endpoint = Some(endpoint);
    } else if let Some(endpoint) = get_raw_env_string(env, "AWS_ENDPOINT_URL")? {
        if config.storage.backend == StorageBackend::S3 {
            ensure_s3(config).endpoint = Some(endpoint);
        }
    }
    if let Some(root) = get_env_string(env, "STORAGE_PATH")? {
        config.storage.fs = Some(FsConfig { root });
    }

    // Catalog
    if let Some(endpoint) = get_env_string(env, "CATALOG_ENDPOINT")? {
        config.catalog.endpoint = endpoint;
    }
    if let Some(token) = get_env_string(env, "CATALOG_TOKEN")? {
        config.catalog.token = if token.is_empty() { None } else { Some(token) };
    }

    // Limits
    if let Some(bytes) = get_env_u64(env, "LARGE_INPUT_WARN_BYTES")? {
        config.limits.large_input_warn_bytes = bytes;
    }

    Ok(())
}

fn ensure_s3(config: &mut RuntimeConfig) -> &mut S3Config {
    config.storage.s3.get_or_insert_with(|| S3Config {
        region: String::new(),
        endpoint: None,
    })
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get(key))
}

fn get_raw_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get_raw(key))
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    env.get(key)
        .map(|v| {
            v.parse::<usize>()
                .map_err(|_| anyhow!("{}{} must be an integer, got '{}'", ENV_PREFIX, key, v))
        })
        .transpose()
}

fn get_env_u64<E: EnvSource>(env: &E, key: &str) -> Result<Option<u64>> {
    env.get(key)
        .map(|v| {
            v.parse::<u64>()
                .map_err(|_| anyhow!("{}{} must be an integer, got '{}'", ENV_PREFIX, key, v))
        })
        .transpose()
}

fn get_env_f64<E: EnvSource>(env: &E, key: &str) -> Result<Option<f64>> {
    env.get(key)
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| anyhow!("{}{} must be a number, got '{}'", ENV_PREFIX, key, v))
        })
        .transpose()
}
