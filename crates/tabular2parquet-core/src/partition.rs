// Partition-key derivation and Hive-style partition splitting
//
// Expands a normalized Date32 column into year/month/day Int32 columns and
// splits the batch into one sub-batch per distinct partition value, in
// first-seen row order. Partition path segments are unpadded
// (`year=2024/month=3/day=7`), matching the catalog-facing layout.

use crate::dates::DateError;
use arrow::array::{Array, ArrayRef, BooleanArray, Date32Array, Int32Array, RecordBatch};
use arrow::compute::{filter, filter_record_batch};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::temporal_conversions::date32_to_datetime;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub const YEAR_COLUMN: &str = "year";
pub const MONTH_COLUMN: &str = "month";
pub const DAY_COLUMN: &str = "day";

/// Policy for rows whose date value failed normalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnUnparseableDate {
    /// Drop the offending rows and continue
    #[default]
    Drop,
    /// Fail the whole operation
    Fail,
}

impl std::str::FromStr for OnUnparseableDate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "fail" => Ok(Self::Fail),
            _ => anyhow::bail!(
                "Unsupported unparseable-date policy: {}. Supported: drop, fail",
                s
            ),
        }
    }
}

/// One distinct (year, month, day) triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionValues {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl PartitionValues {
    /// Hive-style path fragment, values unpadded
    pub fn path_segment(&self) -> String {
        format!("year={}/month={}/day={}", self.year, self.month, self.day)
    }
}

#[derive(Debug, Error)]
pub enum PartitionError {
    #[error(transparent)]
    Date(#[from] DateError),

    #[error(transparent)]
    Arrow(#[from] ArrowError),
}

/// Append year/month/day partition columns derived from `dates`
///
/// `dates` must be the normalized date column for `batch`, row-aligned.
/// Rows with a null date are handled per `policy` before derivation, so the
/// returned batch has all three partition attributes populated on every row.
pub fn derive_partition_keys(
    batch: &RecordBatch,
    dates: &Date32Array,
    column: &str,
    policy: OnUnparseableDate,
) -> Result<RecordBatch, PartitionError> {
    let mut batch = batch.clone();
    let mut dates = dates.clone();

    let unparseable = dates.null_count();
    if unparseable > 0 {
        match policy {
            OnUnparseableDate::Fail => {
                return Err(DateError::UnparseableDates {
                    column: column.to_string(),
                    unparseable,
                    total: batch.num_rows(),
                }
                .into());
            }
            OnUnparseableDate::Drop => {
                tracing::warn!(
                    column = %column,
                    dropped = unparseable,
                    total = batch.num_rows(),
                    "dropping rows without a parseable date"
                );
                let mask: BooleanArray =
                    (0..dates.len()).map(|i| Some(dates.is_valid(i))).collect();
                batch = filter_record_batch(&batch, &mask)?;
                dates = filter(&dates, &mask)?
                    .as_any()
                    .downcast_ref::<Date32Array>()
                    .expect("filtering Date32 yields Date32Array")
                    .clone();
            }
        }
    }

    let mut years = Vec::with_capacity(dates.len());
    let mut months = Vec::with_capacity(dates.len());
    let mut days = Vec::with_capacity(dates.len());
    for i in 0..dates.len() {
        let date = date32_to_datetime(dates.value(i))
            .ok_or_else(|| {
                ArrowError::ComputeError(format!("date32 value {} out of range", dates.value(i)))
            })?
            .date();
        years.push(date.year());
        months.push(date.month() as i32);
        days.push(date.day() as i32);
    }

    let mut fields: Vec<Field> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    fields.push(Field::new(YEAR_COLUMN, DataType::Int32, false));
    fields.push(Field::new(MONTH_COLUMN, DataType::Int32, false));
    fields.push(Field::new(DAY_COLUMN, DataType::Int32, false));

    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    columns.push(Arc::new(Int32Array::from(years)));
    columns.push(Arc::new(Int32Array::from(months)));
    columns.push(Arc::new(Int32Array::from(days)));

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Split a partition-keyed batch into one sub-batch per distinct
/// (year, month, day), preserving first-seen order
pub fn split_by_partition(
    batch: &RecordBatch,
) -> Result<Vec<(PartitionValues, RecordBatch)>, PartitionError> {
    let years = partition_column(batch, YEAR_COLUMN)?;
    let months = partition_column(batch, MONTH_COLUMN)?;
    let days = partition_column(batch, DAY_COLUMN)?;

    let mut order: Vec<PartitionValues> = Vec::new();
    let mut groups: HashMap<PartitionValues, Vec<usize>> = HashMap::new();
    for row in 0..batch.num_rows() {
        let values = PartitionValues {
            year: years.value(row),
            month: months.value(row) as u32,
            day: days.value(row) as u32,
        };
        groups
            .entry(values)
            .or_insert_with(|| {
                order.push(values);
                Vec::new()
            })
            .push(row);
    }

    let mut partitions = Vec::with_capacity(order.len());
    for values in order {
        let rows = &groups[&values];
        let mut mask = vec![false; batch.num_rows()];
        for &row in rows {
            mask[row] = true;
        }
        let mask: BooleanArray = mask.into_iter().map(Some).collect();
        partitions.push((values, filter_record_batch(batch, &mask)?));
    }

    Ok(partitions)
}

fn partition_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a Int32Array, PartitionError> {
    let idx = batch.schema().index_of(name)?;
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<Int32Array>()
        .ok_or_else(|| {
            ArrowError::SchemaError(format!("partition column '{}' is not Int32", name)).into()
        })
}
