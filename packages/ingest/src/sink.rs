//! Output stage for normalized incidents.
//!
//! A run picks one [`IncidentSink`] at startup: [`IndexSink`] upserts into
//! the search index, [`StdoutSink`] prints for inspection.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use blotter_index::{IndexError, IndexProvider, RefreshPolicy};
use blotter_source_models::NormalizedIncident;
use serde::Serialize as _;
use serde_json::ser::PrettyFormatter;

use crate::config::SinkKind;

/// Errors that can occur while sinking a single incident.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The index backend rejected the write or could not be reached.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The incident could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The output stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persists or displays one normalized incident at a time.
#[async_trait]
pub trait IncidentSink: Send + Sync {
    /// Which kind of output this sink writes to.
    fn kind(&self) -> SinkKind;

    /// Writes a single incident.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the incident cannot be written.
    async fn write(&self, incident: &NormalizedIncident) -> Result<(), SinkError>;
}

/// Upserts incidents into the search index, keyed by incident id.
pub struct IndexSink {
    provider: Box<dyn IndexProvider>,
    refresh: RefreshPolicy,
}

impl IndexSink {
    /// Creates a sink writing through `provider`, applying `refresh` to
    /// every write.
    #[must_use]
    pub fn new(provider: Box<dyn IndexProvider>, refresh: RefreshPolicy) -> Self {
        Self { provider, refresh }
    }
}

#[async_trait]
impl IncidentSink for IndexSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Index
    }

    async fn write(&self, incident: &NormalizedIncident) -> Result<(), SinkError> {
        let document = incident.to_document()?;
        self.provider
            .upsert_document(&incident.id, &document, self.refresh)
            .await?;
        log::debug!(
            "Indexed incident {} into {}",
            incident.id,
            self.provider.index_name()
        );
        Ok(())
    }
}

/// Prints incidents as 4-space-indented JSON, one document per record.
pub struct StdoutSink<W> {
    out: Mutex<W>,
}

impl StdoutSink<std::io::Stdout> {
    /// Creates a sink printing to the process's standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> StdoutSink<W> {
    /// Creates a sink printing to `out`.
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Consumes the sink, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<W: Write + Send> IncidentSink for StdoutSink<W> {
    fn kind(&self) -> SinkKind {
        SinkKind::Stdout
    }

    async fn write(&self, incident: &NormalizedIncident) -> Result<(), SinkError> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        {
            let mut serializer = serde_json::Serializer::with_formatter(
                &mut *out,
                PrettyFormatter::with_indent(b"    "),
            );
            incident.serialize(&mut serializer)?;
        }
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use blotter_source::normalize::normalize;
    use blotter_source_models::RawIncident;
    use serde_json::{Value, json};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Upsert {
        index: String,
        id: String,
        document: Value,
        refresh: RefreshPolicy,
    }

    #[derive(Default)]
    struct RecordingProvider {
        writes: Arc<Mutex<Vec<Upsert>>>,
        reject: bool,
    }

    #[async_trait]
    impl IndexProvider for RecordingProvider {
        fn index_name(&self) -> &str {
            "pleb-app"
        }

        async fn create_index(&self) -> Result<(), IndexError> {
            Ok(())
        }

        async fn put_mapping(&self, _mapping: &Value) -> Result<(), IndexError> {
            Ok(())
        }

        async fn upsert_document(
            &self,
            id: &str,
            document: &Value,
            refresh: RefreshPolicy,
        ) -> Result<(), IndexError> {
            if self.reject {
                return Err(IndexError::Rejected {
                    operation: "index document",
                    index: "pleb-app".to_owned(),
                    status: 400,
                    body: "mapper_parsing_exception".to_owned(),
                });
            }
            self.writes.lock().unwrap().push(Upsert {
                index: self.index_name().to_owned(),
                id: id.to_owned(),
                document: document.clone(),
                refresh,
            });
            Ok(())
        }
    }

    fn incident() -> NormalizedIncident {
        normalize(
            RawIncident::try_from(json!({
                "objectID": "abc123",
                "title": "Vehicle break-in",
                "created_at": 1_700_000_000_000_i64,
                "updated_at": 1_700_000_005_000_i64,
                "_geoloc": { "lat": [37.77], "lng": [-122.41] }
            }))
            .unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn index_sink_upserts_by_id_with_refresh() {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let sink = IndexSink::new(
            Box::new(RecordingProvider {
                writes: Arc::clone(&writes),
                reject: false,
            }),
            RefreshPolicy::Immediate,
        );

        sink.write(&incident()).await.unwrap();

        let writes = writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].index, "pleb-app");
        assert_eq!(writes[0].id, "abc123");
        assert_eq!(writes[0].refresh, RefreshPolicy::Immediate);
        assert_eq!(writes[0].document["spot"], "POINT (-122.41 37.77)");
        assert_eq!(writes[0].document["createdAt"], "2023-11-14T22:13:20Z");
        assert_eq!(writes[0].document["title"], "Vehicle break-in");
    }

    #[tokio::test]
    async fn index_sink_surfaces_backend_rejection() {
        let sink = IndexSink::new(
            Box::new(RecordingProvider {
                reject: true,
                ..RecordingProvider::default()
            }),
            RefreshPolicy::Immediate,
        );

        let err = sink.write(&incident()).await.unwrap_err();
        assert!(matches!(
            err,
            SinkError::Index(IndexError::Rejected { status: 400, .. })
        ));
        assert_eq!(sink.kind(), SinkKind::Index);
    }

    #[tokio::test]
    async fn index_sink_applies_configured_refresh() {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let sink = IndexSink::new(
            Box::new(RecordingProvider {
                writes: Arc::clone(&writes),
                reject: false,
            }),
            RefreshPolicy::WaitFor,
        );

        sink.write(&incident()).await.unwrap();

        assert_eq!(writes.lock().unwrap()[0].refresh, RefreshPolicy::WaitFor);
    }

    #[tokio::test]
    async fn stdout_sink_prints_indented_json() {
        let sink = StdoutSink::new(Vec::new());

        sink.write(&incident()).await.unwrap();
        sink.write(&incident()).await.unwrap();
        assert_eq!(sink.kind(), SinkKind::Stdout);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.starts_with("{\n    \""));
        assert!(output.contains("\n    \"spot\": \"POINT (-122.41 37.77)\""));

        let documents: Vec<Value> = serde_json::Deserializer::from_str(&output)
            .into_iter::<Value>()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0]["objectID"], "abc123");
        assert_eq!(documents[0]["updatedAt"], "2023-11-14T22:13:25Z");
    }

    #[tokio::test]
    async fn stdout_sink_reports_write_failures() {
        struct Broken;

        impl std::io::Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let sink = StdoutSink::new(Broken);
        let err = sink.write(&incident()).await.unwrap_err();
        assert!(matches!(err, SinkError::Serialize(_) | SinkError::Io(_)));
    }
}
