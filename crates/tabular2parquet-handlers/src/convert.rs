//! CSV-to-Parquet conversion pipeline
//!
//! Sequencing: parse key, load CSV, ensure namespace, write unpartitioned
//! Parquet (overwrite), register the table. Namespace creation always
//! precedes the data write and registration always follows it, so the
//! catalog never points at data that does not exist yet.

use crate::{PipelineError, PipelineReport, TransformContext};
use tabular2parquet_catalog::{ensure_namespace, TableRegistration};
use tabular2parquet_core::TableFormat;
use tabular2parquet_storage::Location;

impl TransformContext {
    pub async fn convert(&self, bucket: &str, key: &str) -> Result<PipelineReport, PipelineError> {
        let address = self.resolve_address(bucket, key)?;

        let source = Location::new(bucket, key);
        let batch = self.load_source(&source, TableFormat::Csv).await?;

        ensure_namespace(self.catalog(), &address.namespace).await?;

        let prefix = self.settings().dataset_prefix(&address);
        let files_written = self
            .store()
            .write_table(
                &self.settings().output_bucket,
                &prefix,
                &batch,
                self.settings().compression,
            )
            .await?;

        let registration = TableRegistration::from_schema(
            &address.namespace,
            &address.table,
            &self.settings().dataset_location(&address),
            &batch.schema(),
            &[],
        );
        self.catalog().register_table(&registration).await?;

        Ok(PipelineReport {
            namespace: address.namespace,
            table: address.table,
            rows_processed: batch.num_rows(),
            files_written,
            output_location: registration.location,
            date_column: None,
            detection_method: None,
        })
    }
}
