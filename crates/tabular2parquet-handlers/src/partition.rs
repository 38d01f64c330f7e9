//! Date-partitioning pipeline
//!
//! Sequencing: parse key, load Parquet, detect the date column, derive
//! year/month/day partition keys, ensure namespace, write each partition
//! (overwrite, last-write-wins per partition), register the table with its
//! partition scheme. Detection failure aborts the run; there is no fallback
//! to an unpartitioned write.

use crate::{PipelineError, PipelineReport, TransformContext};
use tabular2parquet_catalog::{ensure_namespace, TableRegistration};
use tabular2parquet_core::dates::{detect_date_column, normalize_to_dates};
use tabular2parquet_core::partition::{
    derive_partition_keys, split_by_partition, DAY_COLUMN, MONTH_COLUMN, YEAR_COLUMN,
};
use tabular2parquet_core::TableFormat;
use tabular2parquet_storage::Location;

impl TransformContext {
    pub async fn partition(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<PipelineReport, PipelineError> {
        let address = self.resolve_address(bucket, key)?;

        let source = Location::new(bucket, key);
        let batch = self.load_source(&source, TableFormat::Parquet).await?;

        let pick = detect_date_column(&batch, &self.settings().detection)?;
        tracing::info!(
            column = %pick.column(),
            method = %pick.method(),
            "date column selected"
        );

        let dates = normalize_to_dates(&batch, pick.column())?;
        let keyed = derive_partition_keys(
            &batch,
            &dates,
            pick.column(),
            self.settings().on_unparseable_date,
        )?;
        let partitions = split_by_partition(&keyed)?;
        tracing::info!(
            rows = keyed.num_rows(),
            partitions = partitions.len(),
            "partition keys derived"
        );

        ensure_namespace(self.catalog(), &address.namespace).await?;

        let prefix = self.settings().dataset_prefix(&address);
        let files_written = self
            .store()
            .write_partitioned(
                &self.settings().output_bucket,
                &prefix,
                &partitions,
                self.settings().compression,
            )
            .await?;

        let registration = TableRegistration::from_schema(
            &address.namespace,
            &address.table,
            &self.settings().dataset_location(&address),
            &keyed.schema(),
            &[YEAR_COLUMN, MONTH_COLUMN, DAY_COLUMN],
        );
        self.catalog().register_table(&registration).await?;

        Ok(PipelineReport {
            namespace: address.namespace,
            table: address.table,
            rows_processed: keyed.num_rows(),
            files_written,
            output_location: registration.location,
            date_column: Some(pick.column().to_string()),
            detection_method: Some(pick.method()),
        })
    }
}
