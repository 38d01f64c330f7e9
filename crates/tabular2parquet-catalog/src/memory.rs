//! In-memory catalog fake for unit and pipeline tests
//!
//! Records a journal of operations so tests can assert call ordering
//! (namespace creation before registration) as well as final state.

use crate::{CatalogClient, CatalogError, TableRegistration};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

#[derive(Default)]
struct MemoryState {
    namespaces: BTreeSet<String>,
    tables: BTreeMap<String, TableRegistration>,
    journal: Vec<String>,
}

#[derive(Default)]
pub struct MemoryCatalog {
    state: Mutex<MemoryState>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .namespaces
            .iter()
            .cloned()
            .collect()
    }

    pub fn table(&self, namespace: &str, table: &str) -> Option<TableRegistration> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(&format!("{}/{}", namespace, table))
            .cloned()
    }

    /// Operation log in call order, e.g. `create_namespace:salesdb`
    pub fn journal(&self) -> Vec<String> {
        self.state.lock().unwrap().journal.clone()
    }
}

#[async_trait]
impl CatalogClient for MemoryCatalog {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, CatalogError> {
        let mut state = self.state.lock().unwrap();
        state.journal.push(format!("namespace_exists:{}", namespace));
        Ok(state.namespaces.contains(namespace))
    }

    async fn create_namespace(&self, namespace: &str) -> Result<(), CatalogError> {
        let mut state = self.state.lock().unwrap();
        state.journal.push(format!("create_namespace:{}", namespace));
        state.namespaces.insert(namespace.to_string());
        Ok(())
    }

    async fn register_table(&self, registration: &TableRegistration) -> Result<(), CatalogError> {
        let mut state = self.state.lock().unwrap();
        state.journal.push(format!(
            "register_table:{}/{}",
            registration.namespace, registration.table
        ));
        state.tables.insert(
            format!("{}/{}", registration.namespace, registration.table),
            registration.clone(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensure_namespace;

    #[tokio::test]
    async fn test_ensure_namespace_creates_once() {
        let catalog = MemoryCatalog::new();
        ensure_namespace(&catalog, "salesdb").await.unwrap();
        ensure_namespace(&catalog, "salesdb").await.unwrap();

        assert_eq!(catalog.namespaces(), vec!["salesdb"]);
        assert_eq!(
            catalog.journal(),
            vec![
                "namespace_exists:salesdb",
                "create_namespace:salesdb",
                "namespace_exists:salesdb",
            ]
        );
    }

    #[tokio::test]
    async fn test_register_table_upserts() {
        let catalog = MemoryCatalog::new();
        let mut registration = TableRegistration {
            namespace: "salesdb".to_string(),
            table: "orders".to_string(),
            location: "clean-zone/salesdb/orders".to_string(),
            columns: vec![],
            partition_keys: vec![],
        };
        catalog.register_table(&registration).await.unwrap();
        registration.partition_keys = vec!["year".to_string()];
        catalog.register_table(&registration).await.unwrap();

        let stored = catalog.table("salesdb", "orders").unwrap();
        assert_eq!(stored.partition_keys, vec!["year"]);
    }
}
