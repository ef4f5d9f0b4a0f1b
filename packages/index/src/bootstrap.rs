//! One-time index bootstrap.
//!
//! Creates the incident index and types its `spot` field as a `geo_point`.
//! Failures are reported, never raised: re-running the bootstrap against an
//! existing index is expected to fail the create step, and the mapping step
//! is still attempted.

use std::fmt;

use blotter_source_models::SPOT_FIELD;

use crate::mapping::geo_point_mapping;
use crate::{IndexError, IndexProvider};

/// Outcome of each bootstrap step.
///
/// Displays as one line per step, suitable for printing to the operator.
#[derive(Debug)]
pub struct BootstrapReport {
    /// Name of the bootstrapped index.
    pub index: String,
    /// Result of creating the index.
    pub create: Result<(), IndexError>,
    /// Result of applying the `geo_point` mapping.
    pub mapping: Result<(), IndexError>,
}

impl BootstrapReport {
    /// Whether both steps succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.create.is_ok() && self.mapping.is_ok()
    }
}

impl fmt::Display for BootstrapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = &self.index;
        match &self.create {
            Ok(()) => writeln!(f, "create index {index}: ok")?,
            Err(e) => writeln!(f, "create index {index}: failed: {e}")?,
        }
        match &self.mapping {
            Ok(()) => write!(f, "map {index}.{SPOT_FIELD} as geo_point: ok"),
            Err(e) => write!(f, "map {index}.{SPOT_FIELD} as geo_point: failed: {e}"),
        }
    }
}

/// Creates the index and applies the `spot` geo-point mapping, logging the
/// outcome of each step.
pub async fn bootstrap_index(provider: &dyn IndexProvider) -> BootstrapReport {
    let index = provider.index_name();

    log::info!("Creating index {index}...");
    let create = provider.create_index().await;
    match &create {
        Ok(()) => log::info!("Created index {index}"),
        Err(e) => log::error!("Failed to create index {index}: {e}"),
    }

    log::info!("Mapping {index}.{SPOT_FIELD} as geo_point...");
    let mapping = provider.put_mapping(&geo_point_mapping(SPOT_FIELD)).await;
    match &mapping {
        Ok(()) => log::info!("Applied geo_point mapping to {index}.{SPOT_FIELD}"),
        Err(e) => log::error!("Failed to apply geo_point mapping to {index}: {e}"),
    }

    BootstrapReport {
        index: index.to_owned(),
        create,
        mapping,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::RefreshPolicy;

    #[derive(Default)]
    struct FakeProvider {
        index_exists: bool,
        calls: Mutex<Vec<String>>,
        mappings: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl IndexProvider for FakeProvider {
        fn index_name(&self) -> &str {
            "pleb-app"
        }

        async fn create_index(&self) -> Result<(), IndexError> {
            self.calls.lock().unwrap().push("create".to_owned());
            if self.index_exists {
                return Err(IndexError::Rejected {
                    operation: "create index",
                    index: "pleb-app".to_owned(),
                    status: 400,
                    body: "resource_already_exists_exception".to_owned(),
                });
            }
            Ok(())
        }

        async fn put_mapping(&self, mapping: &Value) -> Result<(), IndexError> {
            self.calls.lock().unwrap().push("mapping".to_owned());
            self.mappings.lock().unwrap().push(mapping.clone());
            Ok(())
        }

        async fn upsert_document(
            &self,
            _id: &str,
            _document: &Value,
            _refresh: RefreshPolicy,
        ) -> Result<(), IndexError> {
            unreachable!("bootstrap never writes documents")
        }
    }

    #[tokio::test]
    async fn creates_index_then_maps_spot() {
        let provider = FakeProvider::default();

        let report = bootstrap_index(&provider).await;

        assert!(report.is_success());
        assert_eq!(*provider.calls.lock().unwrap(), ["create", "mapping"]);
        assert_eq!(
            provider.mappings.lock().unwrap()[0],
            json!({ "properties": { "spot": { "type": "geo_point" } } })
        );
    }

    #[tokio::test]
    async fn create_failure_is_reported_and_mapping_still_runs() {
        let provider = FakeProvider {
            index_exists: true,
            ..FakeProvider::default()
        };

        let report = bootstrap_index(&provider).await;

        assert!(!report.is_success());
        assert!(matches!(
            report.create,
            Err(IndexError::Rejected { status: 400, .. })
        ));
        assert!(report.mapping.is_ok());
        assert_eq!(*provider.calls.lock().unwrap(), ["create", "mapping"]);
    }

    #[tokio::test]
    async fn report_renders_one_line_per_step() {
        let report = bootstrap_index(&FakeProvider::default()).await;
        assert_eq!(
            report.to_string(),
            "create index pleb-app: ok\nmap pleb-app.spot as geo_point: ok"
        );

        let report = bootstrap_index(&FakeProvider {
            index_exists: true,
            ..FakeProvider::default()
        })
        .await;
        let rendered = report.to_string();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("create index pleb-app: failed: "));
        assert!(lines[0].contains("resource_already_exists_exception"));
        assert_eq!(lines[1], "map pleb-app.spot as geo_point: ok");
    }
}
