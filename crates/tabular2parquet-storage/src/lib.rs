//! Object storage access for the transform functions
//!
//! A thin `TableStore` capability trait over OpenDAL so the orchestrators can
//! be tested against in-memory buckets. Buckets are mapped to per-bucket
//! operators: S3 talks to the real bucket, Fs nests buckets under a root
//! directory, and Memory keeps one shared map per store instance.

use arrow::array::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use opendal::Operator;
use std::collections::HashMap;
use std::sync::Mutex;
use tabular2parquet_config::{StorageBackend, StorageConfig};
use tabular2parquet_core::codec::{
    read_csv, read_parquet, write_parquet, CodecError, CompressionCodec, TableFormat,
};
use tabular2parquet_core::partition::PartitionValues;
use thiserror::Error;

/// Name of the single data file written into each dataset or partition
/// directory. Deterministic so rewrites land on the same object.
const PART_FILE: &str = "part-00000.parquet";

/// One object in one bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub bucket: String,
    pub key: String,
}

impl Location {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Errors from table storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {location}")]
    NotFound { location: String },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("storage backend error at '{location}': {source}")]
    Backend {
        location: String,
        #[source]
        source: opendal::Error,
    },

    #[error("failed to initialize storage backend: {reason}")]
    Init { reason: String },
}

/// Storage capability surface used by the orchestrators
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Object size in bytes, or None when the object does not exist
    async fn stat_size(&self, location: &Location) -> Result<Option<u64>, StorageError>;

    /// Load one tabular object into a RecordBatch
    async fn load_table(
        &self,
        location: &Location,
        format: TableFormat,
    ) -> Result<RecordBatch, StorageError>;

    /// Overwrite a dataset directory with one unpartitioned Parquet file;
    /// returns the keys written
    async fn write_table(
        &self,
        bucket: &str,
        dataset_prefix: &str,
        batch: &RecordBatch,
        compression: CompressionCodec,
    ) -> Result<Vec<String>, StorageError>;

    /// Overwrite each partition directory with one Parquet file
    /// (last-write-wins per partition); returns the keys written
    async fn write_partitioned(
        &self,
        bucket: &str,
        dataset_prefix: &str,
        partitions: &[(PartitionValues, RecordBatch)],
        compression: CompressionCodec,
    ) -> Result<Vec<String>, StorageError>;
}

enum Backend {
    S3 {
        region: String,
        endpoint: Option<String>,
    },
    Fs {
        root: String,
    },
    #[cfg(feature = "memory")]
    Memory,
}

/// OpenDAL-backed `TableStore`
pub struct OpenDalStore {
    backend: Backend,
    operators: Mutex<HashMap<String, Operator>>,
}

impl OpenDalStore {
    pub fn new_s3(region: &str, endpoint: Option<&str>) -> Self {
        Self {
            backend: Backend::S3 {
                region: region.to_string(),
                endpoint: endpoint.map(|e| e.to_string()),
            },
            operators: Mutex::new(HashMap::new()),
        }
    }

    pub fn new_fs(root: &str) -> Self {
        Self {
            backend: Backend::Fs {
                root: root.to_string(),
            },
            operators: Mutex::new(HashMap::new()),
        }
    }

    #[cfg(feature = "memory")]
    pub fn new_memory() -> Self {
        Self {
            backend: Backend::Memory,
            operators: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        match config.backend {
            StorageBackend::S3 => {
                let s3 = config.s3.as_ref().ok_or_else(|| StorageError::Init {
                    reason: "s3 config required for S3 backend".to_string(),
                })?;
                Ok(Self::new_s3(&s3.region, s3.endpoint.as_deref()))
            }
            StorageBackend::Fs => {
                let fs = config.fs.as_ref().ok_or_else(|| StorageError::Init {
                    reason: "fs config required for filesystem backend".to_string(),
                })?;
                Ok(Self::new_fs(&fs.root))
            }
            #[cfg(feature = "memory")]
            StorageBackend::Memory => Ok(Self::new_memory()),
            #[cfg(not(feature = "memory"))]
            StorageBackend::Memory => Err(StorageError::Init {
                reason: "memory backend requires the 'memory' feature".to_string(),
            }),
        }
    }

    /// Operator for one bucket, built lazily and cached
    pub fn operator(&self, bucket: &str) -> Result<Operator, StorageError> {
        let mut operators = self.operators.lock().expect("operator cache poisoned");
        if let Some(operator) = operators.get(bucket) {
            return Ok(operator.clone());
        }

        let operator = match &self.backend {
            Backend::S3 { region, endpoint } => {
                // Credentials come from the execution role / environment
                let mut builder = opendal::services::S3::default()
                    .bucket(bucket)
                    .region(region);
                if let Some(endpoint) = endpoint {
                    builder = builder.endpoint(endpoint);
                }
                Operator::new(builder)
                    .map_err(|e| StorageError::Init {
                        reason: format!("failed to create S3 operator: {}", e),
                    })?
                    .finish()
            }
            Backend::Fs { root } => {
                let builder =
                    opendal::services::Fs::default().root(&format!("{}/{}", root, bucket));
                Operator::new(builder)
                    .map_err(|e| StorageError::Init {
                        reason: format!("failed to create filesystem operator: {}", e),
                    })?
                    .finish()
            }
            #[cfg(feature = "memory")]
            Backend::Memory => Operator::new(opendal::services::Memory::default())
                .map_err(|e| StorageError::Init {
                    reason: format!("failed to create memory operator: {}", e),
                })?
                .finish(),
        };

        operators.insert(bucket.to_string(), operator.clone());
        Ok(operator)
    }

    /// Raw object read, mostly for tests and verification
    pub async fn read_object(&self, location: &Location) -> Result<Vec<u8>, StorageError> {
        let operator = self.operator(&location.bucket)?;
        let buffer = operator
            .read(&location.key)
            .await
            .map_err(|e| backend_error(location.to_string(), e))?;
        Ok(buffer.to_vec())
    }

    /// Raw object write, mostly for tests seeding landing buckets
    pub async fn write_object(
        &self,
        location: &Location,
        data: Vec<u8>,
    ) -> Result<(), StorageError> {
        let operator = self.operator(&location.bucket)?;
        operator
            .write(&location.key, data)
            .await
            .map_err(|e| backend_error(location.to_string(), e))?;
        Ok(())
    }

    /// Recursively list keys under a prefix
    pub async fn list_keys(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<String>, StorageError> {
        let operator = self.operator(bucket)?;
        let entries = operator
            .list_with(prefix)
            .recursive(true)
            .await
            .map_err(|e| backend_error(format!("{}/{}", bucket, prefix), e))?;
        Ok(entries
            .into_iter()
            .filter(|entry| !entry.path().ends_with('/'))
            .map(|entry| entry.path().to_string())
            .collect())
    }

    async fn overwrite_directory(
        &self,
        bucket: &str,
        directory: &str,
        batch: &RecordBatch,
        compression: CompressionCodec,
    ) -> Result<String, StorageError> {
        let operator = self.operator(bucket)?;
        let directory = format!("{}/", directory.trim_end_matches('/'));

        // First write into a fresh prefix has nothing to clear
        if let Err(e) = operator.remove_all(&directory).await {
            if e.kind() != opendal::ErrorKind::NotFound {
                return Err(backend_error(format!("{}/{}", bucket, directory), e));
            }
        }

        let key = format!("{}{}", directory, PART_FILE);
        let bytes = write_parquet(batch, compression)?;
        operator
            .write(&key, bytes)
            .await
            .map_err(|e| backend_error(format!("{}/{}", bucket, key), e))?;
        Ok(key)
    }
}

fn backend_error(location: String, source: opendal::Error) -> StorageError {
    if source.kind() == opendal::ErrorKind::NotFound {
        StorageError::NotFound { location }
    } else {
        StorageError::Backend { location, source }
    }
}

#[async_trait]
impl TableStore for OpenDalStore {
    async fn stat_size(&self, location: &Location) -> Result<Option<u64>, StorageError> {
        let operator = self.operator(&location.bucket)?;
        match operator.stat(&location.key).await {
            Ok(metadata) => Ok(Some(metadata.content_length())),
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(backend_error(location.to_string(), e)),
        }
    }

    async fn load_table(
        &self,
        location: &Location,
        format: TableFormat,
    ) -> Result<RecordBatch, StorageError> {
        let bytes = self.read_object(location).await?;
        tracing::debug!(
            location = %location,
            format = %format,
            bytes = bytes.len(),
            "loaded source object"
        );
        let batch = match format {
            TableFormat::Csv => read_csv(&bytes)?,
            TableFormat::Parquet => read_parquet(Bytes::from(bytes))?,
        };
        Ok(batch)
    }

    async fn write_table(
        &self,
        bucket: &str,
        dataset_prefix: &str,
        batch: &RecordBatch,
        compression: CompressionCodec,
    ) -> Result<Vec<String>, StorageError> {
        let key = self
            .overwrite_directory(bucket, dataset_prefix, batch, compression)
            .await?;
        tracing::info!(bucket = %bucket, key = %key, rows = batch.num_rows(), "wrote dataset");
        Ok(vec![key])
    }

    async fn write_partitioned(
        &self,
        bucket: &str,
        dataset_prefix: &str,
        partitions: &[(PartitionValues, RecordBatch)],
        compression: CompressionCodec,
    ) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::with_capacity(partitions.len());
        for (values, batch) in partitions {
            let directory = format!("{}/{}", dataset_prefix, values.path_segment());
            let key = self
                .overwrite_directory(bucket, &directory, batch, compression)
                .await?;
            tracing::info!(
                bucket = %bucket,
                key = %key,
                rows = batch.num_rows(),
                "wrote partition"
            );
            keys.push(key);
        }
        Ok(keys)
    }
}
