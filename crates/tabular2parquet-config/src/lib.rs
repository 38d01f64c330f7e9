// tabular2parquet-config - Unified configuration for both functions
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from TABULAR2PARQUET_CONFIG env var
// 3. Config file contents from TABULAR2PARQUET_CONFIG_CONTENT env var
// 4. Default config file locations (./config.toml, ./.tabular2parquet.toml)
// 5. Struct defaults (lowest priority)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tabular2parquet_core::dates::{default_keywords, DateDetection};
use tabular2parquet_core::key::{PathAnchor, PathConvention};
use tabular2parquet_core::{CompressionCodec, OnUnparseableDate};

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};

/// Main runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub convention: ConventionConfig,

    #[serde(default)]
    pub partitioning: PartitioningConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub catalog: CatalogSettings,

    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Destination dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Bucket receiving converted/partitioned datasets
    pub bucket: String,

    /// Optional key prefix inside the output bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(default)]
    pub compression: CompressionCodec,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            prefix: None,
            compression: CompressionCodec::Snappy,
        }
    }
}

/// Landing-key path convention
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConventionConfig {
    /// Literal segment that must appear at `anchor_position`, when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,

    #[serde(default = "default_anchor_position")]
    pub anchor_position: usize,

    #[serde(default = "default_min_segments")]
    pub min_segments: usize,
}

fn default_anchor_position() -> usize {
    1
}

fn default_min_segments() -> usize {
    3
}

impl Default for ConventionConfig {
    fn default() -> Self {
        Self {
            anchor: None,
            anchor_position: default_anchor_position(),
            min_segments: default_min_segments(),
        }
    }
}

impl ConventionConfig {
    pub fn to_convention(&self) -> PathConvention {
        PathConvention {
            anchor: self.anchor.as_ref().map(|literal| PathAnchor {
                position: self.anchor_position,
                literal: literal.clone(),
            }),
            min_segments: self.min_segments,
        }
    }
}

/// Date detection and partitioning behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitioningConfig {
    /// Explicit date column; bypasses the heuristics when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_column: Option<String>,

    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    #[serde(default = "default_min_parse_fraction")]
    pub min_parse_fraction: f64,

    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,

    #[serde(default)]
    pub on_unparseable_date: OnUnparseableDate,
}

fn default_min_parse_fraction() -> f64 {
    0.9
}

fn default_sample_rows() -> usize {
    100
}

impl Default for PartitioningConfig {
    fn default() -> Self {
        Self {
            date_column: None,
            keywords: default_keywords(),
            min_parse_fraction: default_min_parse_fraction(),
            sample_rows: default_sample_rows(),
            on_unparseable_date: OnUnparseableDate::default(),
        }
    }
}

impl PartitioningConfig {
    pub fn to_detection(&self) -> DateDetection {
        DateDetection {
            override_column: self.date_column.clone(),
            keywords: self.keywords.clone(),
            min_parse_fraction: self.min_parse_fraction,
            sample_rows: self.sample_rows,
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    S3,
    Fs,
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Fs => write!(f, "fs"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "s3" | "aws" => Ok(StorageBackend::S3),
            "fs" | "filesystem" => Ok(StorageBackend::Fs),
            "memory" => Ok(StorageBackend::Memory),
            _ => anyhow::bail!("Unsupported storage backend: {}. Supported: s3, fs, memory", s),
        }
    }
}

/// S3 access settings; bucket names come from events and `output.bucket`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsConfig {
    pub root: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            root: "./data".to_string(),
        }
    }
}

/// Metadata catalog access
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Base URL of the catalog REST API
    #[serde(default)]
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Operational guardrails
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Log a warning when the source object exceeds this many bytes
    #[serde(default = "default_large_input_warn_bytes")]
    pub large_input_warn_bytes: u64,
}

fn default_large_input_warn_bytes() -> u64 {
    100 * 1024 * 1024
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            large_input_warn_bytes: default_large_input_warn_bytes(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}
