//! REST catalog client
//!
//! Minimal client for the catalog management API. Generic over `HttpClient`
//! so platforms and tests can supply their own transport.

use crate::http::{HttpClient, HttpResponse};
use crate::protocol::{CreateNamespaceRequest, ErrorResponse, RegisterTableRequest};
use crate::{CatalogClient, CatalogError, TableRegistration};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

pub struct RestCatalog<T: HttpClient> {
    http: T,
    /// Base URL of the catalog REST API (no trailing slash)
    base_url: String,
    /// Optional bearer token
    token: Option<String>,
}

impl<T: HttpClient> RestCatalog<T> {
    pub fn new(http: T, base_url: String, token: Option<String>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            token,
        }
    }

    fn headers(&self, with_body: bool) -> Vec<(String, String)> {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if with_body {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = &self.token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
        headers
    }

    fn unavailable(err: anyhow::Error) -> CatalogError {
        CatalogError::Unavailable {
            reason: err.to_string(),
        }
    }

    fn rejected(response: &HttpResponse) -> CatalogError {
        // Prefer the structured error body when the catalog sends one
        if let Ok(error) = response.json::<ErrorResponse>() {
            return CatalogError::Rejected {
                status: response.status,
                message: format!("{}: {}", error.error_type, error.message),
            };
        }
        let body = response
            .body_string()
            .unwrap_or_else(|_| "<binary>".to_string());
        CatalogError::Rejected {
            status: response.status,
            message: body,
        }
    }
}

#[async_trait]
impl<T: HttpClient> CatalogClient for RestCatalog<T> {
    #[instrument(skip(self))]
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, CatalogError> {
        let url = format!("{}/v1/namespaces/{}", self.base_url, namespace);
        let response = self
            .http
            .get(&url, self.headers(false))
            .await
            .map_err(Self::unavailable)?;

        if response.is_success() {
            return Ok(true);
        }
        if response.status == 404 {
            return Ok(false);
        }
        Err(Self::rejected(&response))
    }

    #[instrument(skip(self))]
    async fn create_namespace(&self, namespace: &str) -> Result<(), CatalogError> {
        let url = format!("{}/v1/namespaces", self.base_url);
        let request = CreateNamespaceRequest {
            namespace: namespace.to_string(),
        };
        let body = serde_json::to_vec(&request).map_err(|e| CatalogError::Unavailable {
            reason: format!("failed to serialize create-namespace request: {}", e),
        })?;

        let response = self
            .http
            .post(&url, self.headers(true), body)
            .await
            .map_err(Self::unavailable)?;

        // 409: another invocation created it first; that is success here
        if response.is_success() || response.status == 409 {
            debug!(namespace = %namespace, status = response.status, "namespace ensured");
            return Ok(());
        }
        Err(Self::rejected(&response))
    }

    #[instrument(skip(self, registration), fields(namespace = %registration.namespace, table = %registration.table))]
    async fn register_table(&self, registration: &TableRegistration) -> Result<(), CatalogError> {
        let url = format!(
            "{}/v1/namespaces/{}/tables/{}",
            self.base_url, registration.namespace, registration.table
        );
        let request = RegisterTableRequest::from(registration);
        let body = serde_json::to_vec(&request).map_err(|e| CatalogError::Unavailable {
            reason: format!("failed to serialize register-table request: {}", e),
        })?;

        let response = self
            .http
            .post(&url, self.headers(true), body)
            .await
            .map_err(Self::unavailable)?;

        if !response.is_success() {
            return Err(Self::rejected(&response));
        }

        info!(
            namespace = %registration.namespace,
            table = %registration.table,
            columns = registration.columns.len(),
            partition_keys = ?registration.partition_keys,
            "table registered in catalog"
        );
        Ok(())
    }
}
