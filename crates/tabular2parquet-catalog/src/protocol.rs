//! Catalog REST API wire types

use crate::{ColumnDef, TableRegistration};
use serde::{Deserialize, Serialize};

/// Request to create a namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNamespaceRequest {
    pub namespace: String,
}

/// Request to register or refresh a table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterTableRequest {
    pub name: String,
    pub location: String,
    pub columns: Vec<ColumnDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partition_keys: Vec<String>,
    pub format: String,
}

impl From<&TableRegistration> for RegisterTableRequest {
    fn from(registration: &TableRegistration) -> Self {
        Self {
            name: registration.table.clone(),
            location: registration.location.clone(),
            columns: registration.columns.clone(),
            partition_keys: registration.partition_keys.clone(),
            format: "parquet".to_string(),
        }
    }
}

/// Error response from the catalog REST API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,

    /// Error type/code
    #[serde(rename = "type")]
    pub error_type: String,

    /// HTTP status code
    pub code: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_table_serialization() {
        let request = RegisterTableRequest {
            name: "orders".to_string(),
            location: "clean-zone/salesdb/orders".to_string(),
            columns: vec![ColumnDef {
                name: "order_id".to_string(),
                data_type: "bigint".to_string(),
            }],
            partition_keys: vec!["year".to_string(), "month".to_string(), "day".to_string()],
            format: "parquet".to_string(),
        };

        let json = serde_json::to_string(&request).unwrap();
        let deserialized: RegisterTableRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, deserialized);
    }

    #[test]
    fn test_empty_partition_keys_omitted() {
        let request = RegisterTableRequest {
            name: "orders".to_string(),
            location: "clean-zone/salesdb/orders".to_string(),
            columns: vec![],
            partition_keys: vec![],
            format: "parquet".to_string(),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("partition_keys"));
    }

    #[test]
    fn test_error_response_deserialization() {
        let json = r#"{"message":"namespace missing","type":"NoSuchNamespace","code":404}"#;
        let error: ErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(error.code, 404);
        assert_eq!(error.error_type, "NoSuchNamespace");
    }
}
