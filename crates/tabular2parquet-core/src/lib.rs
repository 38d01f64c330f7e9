// tabular2parquet-core - Platform-agnostic core logic
//
// This crate contains the PURE processing logic for turning tabular files
// landing in object storage into partition-ready Parquet data. No I/O,
// no async, no runtime dependencies: bytes and RecordBatches in, bytes and
// RecordBatches out.
//
// The two pieces that are not library glue live here:
// - key: positional extraction of (namespace, table) from an object key
// - dates: heuristic selection and normalization of a date column, plus
//   year/month/day partition-key derivation (partition module)

pub mod codec;
pub mod dates;
pub mod key;
pub mod partition;

// Re-export commonly used types
pub use codec::{CodecError, CompressionCodec, TableFormat};
pub use dates::{DateColumnPick, DateDetection, DateError};
pub use key::{KeyError, PathAnchor, PathConvention, TableAddress};
pub use partition::{OnUnparseableDate, PartitionValues};
