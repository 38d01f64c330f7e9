// S3 event extraction
//
// S3 delivers object keys URL-encoded (spaces become `+`, everything else
// percent-escaped). Keys must be decoded before the path convention sees
// them. Records missing a bucket or key are skipped with a warning rather
// than failing the whole event.

use anyhow::{Context, Result};
use aws_lambda_events::event::s3::S3Event;

/// One upload to process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    pub bucket: String,
    pub key: String,
}

/// Decode a URL-encoded S3 object key
pub fn decode_object_key(raw: &str) -> Result<String> {
    let plus_decoded = raw.replace('+', " ");
    let decoded = urlencoding::decode(&plus_decoded)
        .with_context(|| format!("object key is not valid UTF-8 after decoding: {}", raw))?;
    Ok(decoded.into_owned())
}

/// Extract bucket/key pairs from an S3 event, keys decoded
pub fn object_records(event: &S3Event) -> Result<Vec<ObjectRecord>> {
    let mut records = Vec::with_capacity(event.records.len());
    for record in &event.records {
        let (Some(bucket), Some(key)) = (&record.s3.bucket.name, &record.s3.object.key) else {
            tracing::warn!(
                event_name = ?record.event_name,
                "skipping S3 record without bucket or key"
            );
            continue;
        };
        records.push(ObjectRecord {
            bucket: bucket.clone(),
            key: decode_object_key(key)?,
        });
    }
    Ok(records)
}
