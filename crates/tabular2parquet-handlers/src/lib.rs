//! Transform-and-write orchestration
//!
//! Two pipelines share one context: `convert` turns a landed CSV into an
//! unpartitioned Parquet dataset, `partition` re-lays a landed Parquet file
//! out by date. Both derive the destination from the object key, keep the
//! catalog in sync, and leave all I/O to the injected capability traits so
//! tests can run them against in-memory fakes.

pub mod convert;
pub mod error;
pub mod partition;

pub use error::PipelineError;

use serde::Serialize;
use std::sync::Arc;
use tabular2parquet_catalog::CatalogClient;
use tabular2parquet_config::RuntimeConfig;
use tabular2parquet_core::dates::DateDetection;
use tabular2parquet_core::key::{parse_object_key, PathConvention, TableAddress};
use tabular2parquet_core::{CompressionCodec, OnUnparseableDate, TableFormat};
use tabular2parquet_storage::{Location, TableStore};

/// Immutable settings injected into the orchestrator at construction
#[derive(Debug, Clone)]
pub struct TransformSettings {
    pub convention: PathConvention,
    pub detection: DateDetection,
    pub on_unparseable_date: OnUnparseableDate,
    pub output_bucket: String,
    pub output_prefix: Option<String>,
    pub compression: CompressionCodec,
    pub large_input_warn_bytes: u64,
}

impl TransformSettings {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            convention: config.convention.to_convention(),
            detection: config.partitioning.to_detection(),
            on_unparseable_date: config.partitioning.on_unparseable_date,
            output_bucket: config.output.bucket.clone(),
            output_prefix: config.output.prefix.clone(),
            compression: config.output.compression,
            large_input_warn_bytes: config.limits.large_input_warn_bytes,
        }
    }

    /// Key prefix of the destination dataset inside the output bucket
    pub fn dataset_prefix(&self, address: &TableAddress) -> String {
        match &self.output_prefix {
            Some(prefix) => format!(
                "{}/{}",
                prefix.trim_end_matches('/'),
                address.dataset_path()
            ),
            None => address.dataset_path(),
        }
    }

    /// Bucket-qualified dataset location recorded in the catalog
    pub fn dataset_location(&self, address: &TableAddress) -> String {
        format!("{}/{}", self.output_bucket, self.dataset_prefix(address))
    }
}

/// Result payload returned to the triggering platform
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub namespace: String,
    pub table: String,
    pub rows_processed: usize,
    pub files_written: Vec<String>,
    pub output_location: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_column: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_method: Option<&'static str>,
}

/// Shared state for both pipelines
pub struct TransformContext {
    store: Arc<dyn TableStore>,
    catalog: Arc<dyn CatalogClient>,
    settings: TransformSettings,
}

impl TransformContext {
    pub fn new(
        store: Arc<dyn TableStore>,
        catalog: Arc<dyn CatalogClient>,
        settings: TransformSettings,
    ) -> Self {
        Self {
            store,
            catalog,
            settings,
        }
    }

    pub fn settings(&self) -> &TransformSettings {
        &self.settings
    }

    pub(crate) fn store(&self) -> &dyn TableStore {
        self.store.as_ref()
    }

    pub(crate) fn catalog(&self) -> &dyn CatalogClient {
        self.catalog.as_ref()
    }

    /// Step 1 of both pipelines: derive the destination from the key.
    /// Aborts before any I/O when the key violates the convention.
    pub(crate) fn resolve_address(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<TableAddress, PipelineError> {
        let address = parse_object_key(key, &self.settings.convention)?;
        tracing::info!(
            bucket = %bucket,
            key = %key,
            namespace = %address.namespace,
            table = %address.table,
            "resolved landing object"
        );
        Ok(address)
    }

    /// Step 2: size probe plus load
    pub(crate) async fn load_source(
        &self,
        location: &Location,
        format: TableFormat,
    ) -> Result<arrow::array::RecordBatch, PipelineError> {
        if let Some(size) = self.store.stat_size(location).await? {
            if size > self.settings.large_input_warn_bytes {
                tracing::warn!(
                    location = %location,
                    size_mb = size as f64 / 1024.0 / 1024.0,
                    "large source object, processing may take longer"
                );
            } else {
                tracing::debug!(location = %location, bytes = size, "source object size");
            }
        }

        let batch = self.store.load_table(location, format).await?;
        tracing::info!(
            location = %location,
            rows = batch.num_rows(),
            columns = batch.num_columns(),
            "source table loaded"
        );
        Ok(batch)
    }
}
