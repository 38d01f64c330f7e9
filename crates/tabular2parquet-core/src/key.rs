// Object-key parsing for landing-zone uploads
//
// Keys follow a fixed positional convention: the namespace (database) is the
// third-from-last segment and the table is the second-from-last, e.g.
// `landing/non-partitioned-folder/salesdb/orders/file.parquet`. An optional
// anchor segment pins a known folder name to a fixed position so unrelated
// uploads are rejected early.

use thiserror::Error;

/// Namespace/table pair derived from an object key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableAddress {
    /// Database or schema name
    pub namespace: String,
    /// Table name (any `.parquet` suffix stripped)
    pub table: String,
}

impl TableAddress {
    /// Dataset-relative path (`namespace/table`)
    pub fn dataset_path(&self) -> String {
        format!("{}/{}", self.namespace, self.table)
    }
}

/// A literal segment that must appear at a fixed position in the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAnchor {
    pub position: usize,
    pub literal: String,
}

/// Positional path convention for landing keys
///
/// This is configuration, not runtime input: the orchestrator builds one from
/// its settings and reuses it for every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConvention {
    /// Optional anchor segment that must match exactly
    pub anchor: Option<PathAnchor>,
    /// Minimum number of path segments required
    pub min_segments: usize,
}

impl Default for PathConvention {
    fn default() -> Self {
        // <namespace>/<table>/<filename> is the shortest acceptable key
        Self {
            anchor: None,
            min_segments: 3,
        }
    }
}

/// Errors from object-key parsing
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("malformed object key '{key}': {reason}")]
    MalformedKey { key: String, reason: String },
}

impl KeyError {
    fn malformed(key: &str, reason: impl Into<String>) -> Self {
        Self::MalformedKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Extract `(namespace, table)` from an object key
///
/// The key must already be URL-decoded. Fails with `MalformedKey` when the
/// segment count is insufficient, the anchor does not match, or either
/// extracted segment is empty. No side effects; callers abort before any I/O
/// on failure.
pub fn parse_object_key(key: &str, convention: &PathConvention) -> Result<TableAddress, KeyError> {
    let segments: Vec<&str> = key.split('/').collect();

    if let Some(anchor) = &convention.anchor {
        match segments.get(anchor.position) {
            Some(segment) if *segment == anchor.literal => {}
            Some(segment) => {
                return Err(KeyError::malformed(
                    key,
                    format!(
                        "expected anchor '{}' at segment {}, found '{}'",
                        anchor.literal, anchor.position, segment
                    ),
                ));
            }
            None => {
                return Err(KeyError::malformed(
                    key,
                    format!(
                        "expected anchor '{}' at segment {}, key has {} segments",
                        anchor.literal,
                        anchor.position,
                        segments.len()
                    ),
                ));
            }
        }
    }

    if segments.len() < convention.min_segments {
        return Err(KeyError::malformed(
            key,
            format!(
                "expected at least {} segments, got {}",
                convention.min_segments,
                segments.len()
            ),
        ));
    }

    let namespace = segments[segments.len() - 3];
    let table = segments[segments.len() - 2];
    let table = table.strip_suffix(".parquet").unwrap_or(table);

    if namespace.is_empty() {
        return Err(KeyError::malformed(key, "namespace segment is empty"));
    }
    if table.is_empty() {
        return Err(KeyError::malformed(key, "table segment is empty"));
    }

    Ok(TableAddress {
        namespace: namespace.to_string(),
        table: table.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchored() -> PathConvention {
        PathConvention {
            anchor: Some(PathAnchor {
                position: 1,
                literal: "non-partitioned-folder".to_string(),
            }),
            min_segments: 3,
        }
    }

    #[test]
    fn test_parse_well_formed_key() {
        let address = parse_object_key(
            "landing/non-partitioned-folder/salesdb/orders/file.parquet",
            &anchored(),
        )
        .unwrap();
        assert_eq!(address.namespace, "salesdb");
        assert_eq!(address.table, "orders");
        assert_eq!(address.dataset_path(), "salesdb/orders");
    }

    #[test]
    fn test_parse_without_anchor() {
        let address =
            parse_object_key("landing/salesdb/orders/file.csv", &PathConvention::default())
                .unwrap();
        assert_eq!(address.namespace, "salesdb");
        assert_eq!(address.table, "orders");
    }

    #[test]
    fn test_table_parquet_suffix_stripped() {
        let address =
            parse_object_key("zone/salesdb/orders.parquet/part-0", &PathConvention::default())
                .unwrap();
        assert_eq!(address.table, "orders");
    }

    #[test]
    fn test_too_few_segments() {
        let err = parse_object_key("orders/file.csv", &PathConvention::default()).unwrap_err();
        assert!(matches!(err, KeyError::MalformedKey { .. }));
        assert!(err.to_string().contains("at least 3 segments"));
    }

    #[test]
    fn test_anchor_mismatch() {
        let err = parse_object_key(
            "landing/partitioned-folder/salesdb/orders/file.parquet",
            &anchored(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected anchor"));
    }

    #[test]
    fn test_anchor_beyond_key_length() {
        let err = parse_object_key("landing", &anchored()).unwrap_err();
        assert!(matches!(err, KeyError::MalformedKey { .. }));
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let err =
            parse_object_key("zone//orders/file.csv", &PathConvention::default()).unwrap_err();
        assert!(err.to_string().contains("namespace segment is empty"));
    }
}
