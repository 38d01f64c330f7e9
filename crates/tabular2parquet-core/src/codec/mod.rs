// Tabular codecs: CSV in, Parquet in/out
//
// Pure byte-level conversions around Arrow RecordBatches. Storage backends
// stream these buffers; nothing here touches the network or filesystem.

mod csv;
mod parquet;

pub use csv::read_csv;
pub use parquet::{read_parquet, write_parquet, write_parquet_into, writer_properties};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from decoding or encoding tabular buffers
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unreadable {format} input: {reason}")]
    UnreadableFormat { format: &'static str, reason: String },

    #[error("failed to encode parquet output: {reason}")]
    Encode { reason: String },
}

/// Input file format, derived from the object key extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

impl TableFormat {
    /// Infer the format from an object key's extension
    pub fn from_key(key: &str) -> Option<Self> {
        let lowered = key.to_lowercase();
        if lowered.ends_with(".csv") {
            Some(Self::Csv)
        } else if lowered.ends_with(".parquet") {
            Some(Self::Parquet)
        } else {
            None
        }
    }
}

impl std::fmt::Display for TableFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableFormat::Csv => write!(f, "csv"),
            TableFormat::Parquet => write!(f, "parquet"),
        }
    }
}

/// Compression codec applied to Parquet output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    #[default]
    Snappy,
    Zstd,
    Uncompressed,
}

impl std::fmt::Display for CompressionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionCodec::Snappy => write!(f, "snappy"),
            CompressionCodec::Zstd => write!(f, "zstd"),
            CompressionCodec::Uncompressed => write!(f, "uncompressed"),
        }
    }
}

impl std::str::FromStr for CompressionCodec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "snappy" => Ok(CompressionCodec::Snappy),
            "zstd" => Ok(CompressionCodec::Zstd),
            "uncompressed" | "none" => Ok(CompressionCodec::Uncompressed),
            _ => anyhow::bail!(
                "Unsupported compression codec: {}. Supported: snappy, zstd, uncompressed",
                s
            ),
        }
    }
}
