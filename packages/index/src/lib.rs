#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Search index backend access.
//!
//! [`IndexProvider`] abstracts the three operations the ingester needs from
//! the backend: create the index, put a mapping, and upsert a document.
//! [`provider::OpenSearchProvider`] implements it over the
//! Elasticsearch/OpenSearch REST protocol; tests substitute an in-memory
//! provider.

pub mod bootstrap;
pub mod mapping;
pub mod provider;

use async_trait::async_trait;
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};

pub use bootstrap::{BootstrapReport, bootstrap_index};
pub use provider::OpenSearchProvider;

/// Errors from search index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The endpoint URL could not be parsed.
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// The HTTP transport could not be built.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The request never got a response (connection refused, timeout).
    #[error("Index request failed: {0}")]
    Transport(#[from] opensearch::Error),

    /// The backend answered with a non-success status.
    #[error("{operation} on index {index:?} rejected with status {status}: {body}")]
    Rejected {
        /// Operation that was attempted (e.g., `"create index"`).
        operation: &'static str,
        /// Target index name.
        index: String,
        /// HTTP status code.
        status: u16,
        /// Response body returned by the backend.
        body: String,
    },

    /// A document could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// When an indexed document becomes visible to searches.
///
/// Parses from and displays as `immediate`, `wait-for`, or `deferred`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum RefreshPolicy {
    /// Refresh the affected shards immediately.
    Immediate,
    /// Wait for the next scheduled refresh before responding.
    WaitFor,
    /// Leave visibility to the backend's refresh interval.
    Deferred,
}

/// Abstracts the search index backend.
///
/// Every operation targets the single index the provider was built for.
#[async_trait]
pub trait IndexProvider: Send + Sync {
    /// Returns the name of the target index.
    fn index_name(&self) -> &str;

    /// Creates the index with backend default settings.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if the request fails or the backend rejects
    /// it (for instance because the index already exists).
    async fn create_index(&self) -> Result<(), IndexError>;

    /// Applies a field mapping to the index.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if the request fails or the backend rejects
    /// the mapping.
    async fn put_mapping(&self, mapping: &Value) -> Result<(), IndexError>;

    /// Creates or replaces the document stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if the request fails or the backend rejects
    /// the document.
    async fn upsert_document(
        &self,
        id: &str,
        document: &Value,
        refresh: RefreshPolicy,
    ) -> Result<(), IndexError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_policy_parses_kebab_case_names() {
        assert_eq!("immediate".parse::<RefreshPolicy>(), Ok(RefreshPolicy::Immediate));
        assert_eq!("wait-for".parse::<RefreshPolicy>(), Ok(RefreshPolicy::WaitFor));
        assert_eq!("deferred".parse::<RefreshPolicy>(), Ok(RefreshPolicy::Deferred));
        assert!("true".parse::<RefreshPolicy>().is_err());
        assert_eq!(RefreshPolicy::WaitFor.to_string(), "wait-for");
        assert_eq!(RefreshPolicy::Deferred.as_ref(), "deferred");
    }
}
