// CSV decoding with schema inference
//
// Landing files carry a header row; column types are inferred from the data
// the same way the CSV reader would type them for a query engine.

use super::CodecError;
use arrow::array::RecordBatch;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use std::io::Cursor;
use std::sync::Arc;

fn unreadable(reason: impl std::fmt::Display) -> CodecError {
    CodecError::UnreadableFormat {
        format: "csv",
        reason: reason.to_string(),
    }
}

/// Decode a CSV buffer (header row required) into a single RecordBatch
pub fn read_csv(bytes: &[u8]) -> Result<RecordBatch, CodecError> {
    let format = Format::default().with_header(true);
    let (schema, _) = format
        .infer_schema(Cursor::new(bytes), None)
        .map_err(unreadable)?;
    let schema = Arc::new(schema);

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .build(Cursor::new(bytes))
        .map_err(unreadable)?;

    let batches: Vec<RecordBatch> = reader
        .collect::<Result<_, _>>()
        .map_err(unreadable)?;

    if batches.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    arrow::compute::concat_batches(&schema, &batches).map_err(unreadable)
}
