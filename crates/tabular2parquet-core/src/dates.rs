// Date-column detection and normalization
//
// Selection order, first match wins:
// 1. Explicit override from configuration
// 2. Keyword match on column names (verified against a value sample)
// 3. Content fallback: first column whose sampled values parse as dates
//
// Detection returns a tagged pick so callers and tests can assert the reason,
// not just the chosen column.

use arrow::array::{Array, Date32Array, LargeStringArray, RecordBatch, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Days from 0001-01-01 (CE) to the Unix epoch
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Keyword substrings denoting temporal semantics in column names
pub fn default_keywords() -> Vec<String> {
    [
        "date",
        "time",
        "timestamp",
        "created_at",
        "updated_at",
        "transaction_date",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Tuning knobs for the date-column heuristics
#[derive(Debug, Clone)]
pub struct DateDetection {
    /// Explicit column override; bypasses all heuristics when set
    pub override_column: Option<String>,
    /// Case-insensitive substrings matched against column names
    pub keywords: Vec<String>,
    /// Minimum fraction of sampled non-null values that must parse as dates
    pub min_parse_fraction: f64,
    /// Number of leading rows sampled when testing a column
    pub sample_rows: usize,
}

impl Default for DateDetection {
    fn default() -> Self {
        Self {
            override_column: None,
            keywords: default_keywords(),
            min_parse_fraction: 0.9,
            sample_rows: 100,
        }
    }
}

/// How a date column was selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateColumnPick {
    /// Named explicitly by configuration
    Explicit(String),
    /// Column name matched a temporal keyword
    NameMatch(String),
    /// Column values parsed as dates
    ContentMatch(String),
}

impl DateColumnPick {
    pub fn column(&self) -> &str {
        match self {
            Self::Explicit(c) | Self::NameMatch(c) | Self::ContentMatch(c) => c,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Self::Explicit(_) => "explicit",
            Self::NameMatch(_) => "keyword_match",
            Self::ContentMatch(_) => "content_match",
        }
    }
}

/// Errors from date detection and normalization
#[derive(Debug, Error)]
pub enum DateError {
    #[error("date column '{0}' not found in input table")]
    ColumnNotFound(String),

    #[error("no date column detected; set the date column override")]
    NoDateColumnFound,

    #[error("column '{column}': {unparseable} of {total} rows have no parseable date")]
    UnparseableDates {
        column: String,
        unparseable: usize,
        total: usize,
    },

    #[error("column '{column}' has type {data_type} which cannot hold dates")]
    UnsupportedType { column: String, data_type: String },
}

/// Select at most one column as the partitioning date source
pub fn detect_date_column(
    batch: &RecordBatch,
    options: &DateDetection,
) -> Result<DateColumnPick, DateError> {
    let schema = batch.schema();

    if let Some(name) = &options.override_column {
        if schema.column_with_name(name).is_none() {
            return Err(DateError::ColumnNotFound(name.clone()));
        }
        return Ok(DateColumnPick::Explicit(name.clone()));
    }

    // Keyword pass: collect matches in column order, verify against a sample
    let mut name_candidates = Vec::new();
    for (idx, field) in schema.fields().iter().enumerate() {
        let lowered = field.name().to_lowercase();
        if options
            .keywords
            .iter()
            .any(|k| lowered.contains(&k.to_lowercase()))
            && column_is_dateish(batch, idx, options)
        {
            name_candidates.push(field.name().to_string());
        }
    }
    if let Some(first) = name_candidates.first() {
        if name_candidates.len() > 1 {
            tracing::warn!(
                candidates = ?name_candidates,
                selected = %first,
                "multiple date column candidates detected, using the first"
            );
        }
        return Ok(DateColumnPick::NameMatch(first.clone()));
    }

    // Content fallback: first column whose sampled values parse as dates
    for (idx, field) in schema.fields().iter().enumerate() {
        if column_is_dateish(batch, idx, options) {
            return Ok(DateColumnPick::ContentMatch(field.name().to_string()));
        }
    }

    Err(DateError::NoDateColumnFound)
}

/// Does a sample of this column parse as dates?
///
/// Temporal types qualify trivially. String columns qualify when the parsed
/// fraction of sampled non-null values reaches `min_parse_fraction`; a column
/// whose sample is entirely null never qualifies.
fn column_is_dateish(batch: &RecordBatch, idx: usize, options: &DateDetection) -> bool {
    let column = batch.column(idx);
    match column.data_type() {
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => true,
        DataType::Utf8 => {
            let array = column.as_any().downcast_ref::<StringArray>();
            array.is_some_and(|a| sample_parses(a.iter(), options))
        }
        DataType::LargeUtf8 => {
            let array = column.as_any().downcast_ref::<LargeStringArray>();
            array.is_some_and(|a| sample_parses(a.iter(), options))
        }
        _ => false,
    }
}

fn sample_parses<'a>(
    values: impl Iterator<Item = Option<&'a str>>,
    options: &DateDetection,
) -> bool {
    let mut non_null = 0usize;
    let mut parsed = 0usize;
    for value in values.take(options.sample_rows) {
        if let Some(raw) = value {
            non_null += 1;
            if parse_date_value(raw).is_some() {
                parsed += 1;
            }
        }
    }
    if non_null == 0 {
        return false;
    }
    parsed as f64 / non_null as f64 >= options.min_parse_fraction
}

/// Parse a single value as a calendar date
///
/// Strict ISO 8601 (`%Y-%m-%d`) first, then a fixed list of inferred formats.
pub fn parse_date_value(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }

    const DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    None
}

pub(crate) fn days_since_epoch(date: NaiveDate) -> i32 {
    use chrono::Datelike;
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

/// Convert the selected column into a canonical `Date32` array
///
/// Values that fail every format become nulls; the caller applies the
/// configured unparseable-date policy afterwards.
pub fn normalize_to_dates(batch: &RecordBatch, column: &str) -> Result<Date32Array, DateError> {
    let schema = batch.schema();
    let (idx, field) = schema
        .column_with_name(column)
        .ok_or_else(|| DateError::ColumnNotFound(column.to_string()))?;
    let source = batch.column(idx);

    match field.data_type() {
        DataType::Date32 => {
            let array = source
                .as_any()
                .downcast_ref::<Date32Array>()
                .expect("Date32 column downcasts to Date32Array");
            Ok(array.clone())
        }
        DataType::Date64 | DataType::Timestamp(_, _) => {
            let converted =
                cast(source, &DataType::Date32).map_err(|_| DateError::UnsupportedType {
                    column: column.to_string(),
                    data_type: field.data_type().to_string(),
                })?;
            Ok(converted
                .as_any()
                .downcast_ref::<Date32Array>()
                .expect("cast to Date32 yields Date32Array")
                .clone())
        }
        DataType::Utf8 => {
            let array = source
                .as_any()
                .downcast_ref::<StringArray>()
                .expect("Utf8 column downcasts to StringArray");
            Ok(parse_string_dates(array.iter()))
        }
        DataType::LargeUtf8 => {
            let array = source
                .as_any()
                .downcast_ref::<LargeStringArray>()
                .expect("LargeUtf8 column downcasts to LargeStringArray");
            Ok(parse_string_dates(array.iter()))
        }
        other => Err(DateError::UnsupportedType {
            column: column.to_string(),
            data_type: other.to_string(),
        }),
    }
}

fn parse_string_dates<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Date32Array {
    values
        .map(|value| {
            value
                .and_then(parse_date_value)
                .map(days_since_epoch)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, TimestampSecondArray};
    use arrow::datatypes::{Field, Schema, TimeUnit};
    use std::sync::Arc;

    fn batch_of(columns: Vec<(&str, Arc<dyn Array>)>) -> RecordBatch {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
            .collect();
        let arrays = columns.into_iter().map(|(_, array)| array).collect();
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
    }

    fn iso_dates() -> Arc<dyn Array> {
        Arc::new(StringArray::from(vec![
            "2024-03-07",
            "2024-03-07",
            "2024-03-08",
        ]))
    }

    #[test]
    fn test_explicit_override_bypasses_heuristics() {
        let batch = batch_of(vec![
            ("transaction_date", iso_dates()),
            ("shipped", iso_dates()),
        ]);
        let options = DateDetection {
            override_column: Some("shipped".to_string()),
            ..Default::default()
        };
        let pick = detect_date_column(&batch, &options).unwrap();
        assert_eq!(pick, DateColumnPick::Explicit("shipped".to_string()));
        assert_eq!(pick.method(), "explicit");
    }

    #[test]
    fn test_explicit_override_missing_column() {
        let batch = batch_of(vec![("transaction_date", iso_dates())]);
        let options = DateDetection {
            override_column: Some("order_date".to_string()),
            ..Default::default()
        };
        let err = detect_date_column(&batch, &options).unwrap_err();
        assert!(matches!(err, DateError::ColumnNotFound(c) if c == "order_date"));
    }

    #[test]
    fn test_name_match_beats_content() {
        // `id` is numeric and never considered; `transaction_date` wins by name
        let id: Arc<dyn Array> = Arc::new(Int64Array::from(vec![20240307, 20240308, 20240309]));
        let batch = batch_of(vec![("id", id), ("transaction_date", iso_dates())]);
        let pick = detect_date_column(&batch, &DateDetection::default()).unwrap();
        assert_eq!(pick, DateColumnPick::NameMatch("transaction_date".to_string()));
    }

    #[test]
    fn test_name_match_requires_parseable_sample() {
        // `date_region` matches by name but its values never parse, so the
        // next keyword candidate wins
        let bogus: Arc<dyn Array> =
            Arc::new(StringArray::from(vec!["north", "south", "east"]));
        let batch = batch_of(vec![("date_region", bogus), ("updated_at", iso_dates())]);
        let pick = detect_date_column(&batch, &DateDetection::default()).unwrap();
        assert_eq!(pick, DateColumnPick::NameMatch("updated_at".to_string()));
    }

    #[test]
    fn test_content_fallback_selects_first_parseable() {
        let labels: Arc<dyn Array> = Arc::new(StringArray::from(vec!["a", "b", "c"]));
        let batch = batch_of(vec![("label", labels), ("col2", iso_dates())]);
        let pick = detect_date_column(&batch, &DateDetection::default()).unwrap();
        assert_eq!(pick, DateColumnPick::ContentMatch("col2".to_string()));
    }

    #[test]
    fn test_content_fallback_respects_min_fraction() {
        let half: Arc<dyn Array> = Arc::new(StringArray::from(vec![
            "2024-03-07",
            "not a date",
            "2024-03-08",
            "also not",
        ]));
        let batch = batch_of(vec![("col", half)]);
        let strict = DateDetection {
            min_parse_fraction: 0.9,
            ..Default::default()
        };
        assert!(matches!(
            detect_date_column(&batch, &strict),
            Err(DateError::NoDateColumnFound)
        ));

        let lenient = DateDetection {
            min_parse_fraction: 0.5,
            ..Default::default()
        };
        assert!(detect_date_column(&batch, &lenient).is_ok());
    }

    #[test]
    fn test_no_candidates_fails() {
        let labels: Arc<dyn Array> = Arc::new(StringArray::from(vec!["a", "b"]));
        let ids: Arc<dyn Array> = Arc::new(Int64Array::from(vec![1, 2]));
        let batch = batch_of(vec![("label", labels), ("id", ids)]);
        assert!(matches!(
            detect_date_column(&batch, &DateDetection::default()),
            Err(DateError::NoDateColumnFound)
        ));
    }

    #[test]
    fn test_all_null_column_never_qualifies() {
        let nulls: Arc<dyn Array> =
            Arc::new(StringArray::from(vec![None::<&str>, None, None]));
        let batch = batch_of(vec![("updated_at", nulls)]);
        assert!(matches!(
            detect_date_column(&batch, &DateDetection::default()),
            Err(DateError::NoDateColumnFound)
        ));
    }

    #[test]
    fn test_parse_date_value_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(parse_date_value("2024-03-07"), Some(expected));
        assert_eq!(parse_date_value("2024-03-07T10:15:30Z"), Some(expected));
        assert_eq!(parse_date_value("2024-03-07 10:15:30"), Some(expected));
        assert_eq!(parse_date_value("2024/03/07"), Some(expected));
        assert_eq!(parse_date_value("03/07/2024"), Some(expected));
        assert_eq!(parse_date_value("20240307"), Some(expected));
        assert_eq!(parse_date_value(" 2024-03-07 "), Some(expected));
        assert_eq!(parse_date_value("not a date"), None);
        assert_eq!(parse_date_value(""), None);
    }

    #[test]
    fn test_normalize_string_column_with_unparseable_rows() {
        let values: Arc<dyn Array> = Arc::new(StringArray::from(vec![
            Some("2024-03-07"),
            Some("garbage"),
            None,
        ]));
        let batch = batch_of(vec![("order_date", values)]);
        let dates = normalize_to_dates(&batch, "order_date").unwrap();
        assert!(dates.is_valid(0));
        assert!(dates.is_null(1));
        assert!(dates.is_null(2));
        assert_eq!(
            dates.value(0),
            days_since_epoch(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap())
        );
    }

    #[test]
    fn test_normalize_timestamp_column() {
        // 2024-03-07 00:10:00 UTC
        let ts: Arc<dyn Array> = Arc::new(TimestampSecondArray::from(vec![1_709_770_200]));
        let field = Field::new(
            "event_time",
            DataType::Timestamp(TimeUnit::Second, None),
            true,
        );
        let batch =
            RecordBatch::try_new(Arc::new(Schema::new(vec![field])), vec![ts]).unwrap();
        let dates = normalize_to_dates(&batch, "event_time").unwrap();
        assert_eq!(
            dates.value(0),
            days_since_epoch(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap())
        );
    }

    #[test]
    fn test_normalize_unsupported_type() {
        let ids: Arc<dyn Array> = Arc::new(Int64Array::from(vec![1, 2]));
        let batch = batch_of(vec![("id", ids)]);
        assert!(matches!(
            normalize_to_dates(&batch, "id"),
            Err(DateError::UnsupportedType { .. })
        ));
    }
}
