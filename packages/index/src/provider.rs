//! `OpenSearch` provider implementation.
//!
//! Talks to the backend with the `opensearch` crate. The three requests it
//! issues (`PUT /<index>`, `PUT /<index>/_mapping`, and
//! `PUT /<index>/_doc/<id>`) are shared by Elasticsearch and `OpenSearch`.

use std::time::Duration;

use async_trait::async_trait;
use opensearch::http::response::Response;
use opensearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use opensearch::indices::{IndicesCreateParts, IndicesPutMappingParts};
use opensearch::params::Refresh;
use opensearch::{IndexParts, OpenSearch};
use serde_json::Value;
use url::Url;

use crate::{IndexError, IndexProvider, RefreshPolicy};

/// Endpoint used when the operator does not supply one.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:9200";

/// Index name used when the operator does not supply one.
pub const DEFAULT_INDEX: &str = "pleb-app";

/// [`IndexProvider`] backed by a single Elasticsearch/`OpenSearch` node.
pub struct OpenSearchProvider {
    client: OpenSearch,
    index: String,
}

impl OpenSearchProvider {
    /// Creates a provider for `index` on the node at `endpoint`. Every
    /// request gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Connection`] if the HTTP transport cannot be
    /// built.
    pub fn new(endpoint: &Url, index: &str, timeout: Duration) -> Result<Self, IndexError> {
        let conn_pool = SingleNodeConnectionPool::new(endpoint.clone());
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .timeout(timeout)
            .build()
            .map_err(|e| IndexError::Connection(e.to_string()))?;

        log::debug!("Created index provider for {index} at {endpoint}");

        Ok(Self {
            client: OpenSearch::new(transport),
            index: index.to_owned(),
        })
    }

    /// Parses `endpoint` and creates a provider for it.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidEndpoint`] if `endpoint` is not a URL,
    /// or [`IndexError::Connection`] if the transport cannot be built.
    pub fn from_endpoint(endpoint: &str, index: &str, timeout: Duration) -> Result<Self, IndexError> {
        Self::new(&Url::parse(endpoint)?, index, timeout)
    }

    async fn check(&self, operation: &'static str, response: Response) -> Result<(), IndexError> {
        let status = response.status_code();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        log::debug!("{operation} on {} failed with {status}: {body}", self.index);
        Err(IndexError::Rejected {
            operation,
            index: self.index.clone(),
            status: status.as_u16(),
            body,
        })
    }
}

impl From<RefreshPolicy> for Refresh {
    fn from(policy: RefreshPolicy) -> Self {
        match policy {
            RefreshPolicy::Immediate => Self::True,
            RefreshPolicy::WaitFor => Self::WaitFor,
            RefreshPolicy::Deferred => Self::False,
        }
    }
}

#[async_trait]
impl IndexProvider for OpenSearchProvider {
    fn index_name(&self) -> &str {
        &self.index
    }

    async fn create_index(&self) -> Result<(), IndexError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index))
            .send()
            .await?;
        self.check("create index", response).await
    }

    async fn put_mapping(&self, mapping: &Value) -> Result<(), IndexError> {
        let response = self
            .client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[self.index.as_str()]))
            .body(mapping)
            .send()
            .await?;
        self.check("put mapping", response).await
    }

    async fn upsert_document(
        &self,
        id: &str,
        document: &Value,
        refresh: RefreshPolicy,
    ) -> Result<(), IndexError> {
        let response = self
            .client
            .index(IndexParts::IndexId(&self.index, id))
            .refresh(refresh.into())
            .body(document)
            .send()
            .await?;
        self.check("index document", response).await
    }
}
