//! Unified error taxonomy for the pipelines
//!
//! Every variant is fatal: the invocation aborts, nothing is retried here,
//! and partially-created catalog state (a namespace without tables) is left
//! in place for the next successful run to fill in.

use tabular2parquet_catalog::CatalogError;
use tabular2parquet_core::dates::DateError;
use tabular2parquet_core::key::KeyError;
use tabular2parquet_core::partition::PartitionError;
use tabular2parquet_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Key violates the path convention; nothing was loaded or written
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Date detection or normalization failed
    #[error(transparent)]
    Date(#[from] DateError),

    /// Partition-key derivation failed
    #[error(transparent)]
    Partition(#[from] PartitionError),

    /// Source load or destination write failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Catalog dependency failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
