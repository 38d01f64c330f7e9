// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::{RuntimeConfig, StorageBackend};
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    if config.output.bucket.is_empty() {
        bail!("output.bucket is required");
    }

    if let Some(anchor) = &config.convention.anchor {
        if anchor.is_empty() {
            bail!("convention.anchor must not be an empty string");
        }
    }
    // namespace and table are taken from the third- and second-from-last
    // segments, so anything shorter cannot be addressed
    if config.convention.min_segments < 3 {
        bail!("convention.min_segments must be at least 3");
    }

    if config.partitioning.keywords.is_empty() && config.partitioning.date_column.is_none() {
        bail!("partitioning.keywords must not be empty without an explicit date_column");
    }
    let fraction = config.partitioning.min_parse_fraction;
    if !(fraction > 0.0 && fraction <= 1.0) {
        bail!(
            "partitioning.min_parse_fraction must be in (0, 1], got {}",
            fraction
        );
    }
    if config.partitioning.sample_rows == 0 {
        bail!("partitioning.sample_rows must be greater than 0");
    }

    match config.storage.backend {
        StorageBackend::S3 => {
            let s3 = config
                .storage
                .s3
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("s3 storage backend requires 's3' configuration"))?;
            if s3.region.is_empty() {
                bail!("storage.s3.region is required for the S3 backend");
            }
        }
        StorageBackend::Fs => {
            let fs = config
                .storage
                .fs
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("fs storage backend requires 'fs' configuration"))?;
            if fs.root.is_empty() {
                bail!("storage.fs.root must not be empty");
            }
        }
        StorageBackend::Memory => {}
    }

    if config.catalog.endpoint.is_empty() {
        bail!("catalog.endpoint is required");
    }

    if config.limits.large_input_warn_bytes == 0 {
        warn!("limits.large_input_warn_bytes is 0; every input will log a size warning");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::S3Config;

    fn valid_config() -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.output.bucket = "clean-zone".to_string();
        config.storage.s3 = Some(S3Config {
            region: "us-east-1".to_string(),
            endpoint: None,
        });
        config.catalog.endpoint = "http://catalog.internal/api".to_string();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_output_bucket_rejected() {
        let mut config = valid_config();
        config.output.bucket = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_s3_region_rejected() {
        let mut config = valid_config();
        config.storage.s3 = Some(S3Config {
            region: String::new(),
            endpoint: None,
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_fraction_out_of_range_rejected() {
        let mut config = valid_config();
        config.partitioning.min_parse_fraction = 1.5;
        assert!(validate_config(&config).is_err());

        config.partitioning.min_parse_fraction = 0.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_catalog_endpoint_rejected() {
        let mut config = valid_config();
        config.catalog.endpoint = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_min_segments_floor() {
        let mut config = valid_config();
        config.convention.min_segments = 2;
        assert!(validate_config(&config).is_err());
    }
}
