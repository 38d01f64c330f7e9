//! Metadata catalog client
//!
//! The transform functions only ensure that a namespace exists and that the
//! table entry reflects the schema and partition scheme of the data just
//! written; the catalog owns everything else about those entities. Both
//! operations must be safe to race across concurrent invocations, so
//! "already exists" responses are treated as success.

pub mod http;
pub mod memory;
pub mod protocol;
pub mod rest;

pub use http::{HttpClient, HttpResponse, ReqwestHttpClient};
pub use memory::MemoryCatalog;
pub use rest::RestCatalog;

use arrow::datatypes::{DataType, Schema};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from catalog operations
///
/// Every variant is fatal for the current invocation; retries belong to the
/// triggering platform.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("catalog rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// One column in a catalog table entry
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
}

/// Everything needed to register or refresh a table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRegistration {
    pub namespace: String,
    pub table: String,
    /// Dataset root the entry points at (e.g. `clean-zone/salesdb/orders`)
    pub location: String,
    pub columns: Vec<ColumnDef>,
    /// Column names the dataset is physically partitioned by, in order
    pub partition_keys: Vec<String>,
}

impl TableRegistration {
    /// Build a registration from an Arrow schema
    pub fn from_schema(
        namespace: &str,
        table: &str,
        location: &str,
        schema: &Schema,
        partition_keys: &[&str],
    ) -> Self {
        let columns = schema
            .fields()
            .iter()
            .map(|field| ColumnDef {
                name: field.name().to_string(),
                data_type: catalog_type(field.data_type()).to_string(),
            })
            .collect();
        Self {
            namespace: namespace.to_string(),
            table: table.to_string(),
            location: location.to_string(),
            columns,
            partition_keys: partition_keys.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Map an Arrow type to the catalog's SQL-ish type name
fn catalog_type(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Boolean => "boolean",
        DataType::Int8 | DataType::Int16 | DataType::Int32 => "int",
        DataType::Int64 => "bigint",
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 => "int",
        DataType::UInt64 => "bigint",
        DataType::Float16 | DataType::Float32 => "float",
        DataType::Float64 => "double",
        DataType::Date32 | DataType::Date64 => "date",
        DataType::Timestamp(_, _) => "timestamp",
        DataType::Utf8 | DataType::LargeUtf8 => "string",
        DataType::Binary | DataType::LargeBinary => "binary",
        DataType::Decimal128(_, _) | DataType::Decimal256(_, _) => "decimal",
        _ => "string",
    }
}

/// Catalog capability surface used by the orchestrators
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, CatalogError>;

    /// Create a namespace. Implementations must treat "already exists" as
    /// success so concurrent invocations can race the call safely.
    async fn create_namespace(&self, namespace: &str) -> Result<(), CatalogError>;

    /// Register a table or refresh its schema/partition scheme (upsert).
    async fn register_table(&self, registration: &TableRegistration) -> Result<(), CatalogError>;
}

/// Create the namespace when it does not exist yet
pub async fn ensure_namespace(
    catalog: &dyn CatalogClient,
    namespace: &str,
) -> Result<(), CatalogError> {
    if catalog.namespace_exists(namespace).await? {
        tracing::debug!(namespace = %namespace, "namespace already exists");
        return Ok(());
    }
    tracing::info!(namespace = %namespace, "creating catalog namespace");
    catalog.create_namespace(namespace).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::Field;

    #[test]
    fn test_registration_from_schema() {
        let schema = Schema::new(vec![
            Field::new("order_id", DataType::Int64, false),
            Field::new("customer", DataType::Utf8, true),
            Field::new("order_date", DataType::Date32, true),
            Field::new("year", DataType::Int32, false),
        ]);
        let registration = TableRegistration::from_schema(
            "salesdb",
            "orders",
            "clean-zone/salesdb/orders",
            &schema,
            &["year"],
        );

        assert_eq!(registration.columns.len(), 4);
        assert_eq!(registration.columns[0].data_type, "bigint");
        assert_eq!(registration.columns[1].data_type, "string");
        assert_eq!(registration.columns[2].data_type, "date");
        assert_eq!(registration.columns[3].data_type, "int");
        assert_eq!(registration.partition_keys, vec!["year"]);
    }
}
