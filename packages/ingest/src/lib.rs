#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Library for ingesting incident feed records for a metro region into a
//! search index.
//!
//! A run is either a one-time index bootstrap or a single sync cycle: fetch
//! one bounded batch from the feed, normalize each record, and hand it to
//! the configured [`sink::IncidentSink`].

pub mod cli;
pub mod config;
pub mod sink;

use std::time::Instant;

use blotter_index::{IndexError, OpenSearchProvider, bootstrap_index};
use blotter_source::feed::FeedClient;
use blotter_source::normalize::normalize;
use blotter_source::region::RegionQuery;
use blotter_source::{FeedError, NormalizeError, RegionError};
use blotter_source_models::RawIncident;

use crate::config::{IngestConfig, Mode, SinkKind};
use crate::sink::{IncidentSink, IndexSink, SinkError, StdoutSink};

/// Fatal errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// A command-line value is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The region code is unknown or its definition is invalid.
    #[error(transparent)]
    Region(#[from] RegionError),

    /// The feed could not be fetched or parsed.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// The index backend client could not be built.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Why a single record was skipped.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The record could not be normalized.
    #[error("normalization failed: {0}")]
    Normalize(#[from] NormalizeError),

    /// The sink failed to write the normalized record.
    #[error("write failed: {0}")]
    Sink(#[from] SinkError),
}

/// A record that was fetched but not written.
#[derive(Debug)]
pub struct RecordFailure {
    /// The record's `objectID`, if it had one.
    pub id: Option<String>,
    /// What went wrong.
    pub error: RecordError,
}

/// Outcome of one sync cycle.
#[derive(Debug, Default)]
pub struct IngestSummary {
    /// Records returned by the feed.
    pub fetched: usize,
    /// Records written to the sink.
    pub written: usize,
    /// Records skipped, in feed order.
    pub failures: Vec<RecordFailure>,
}

impl IngestSummary {
    /// Number of records skipped.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Logs the cycle totals.
    pub fn log(&self, label: &str) {
        if self.failures.is_empty() {
            log::info!(
                "[{label}] Wrote {}/{} incidents",
                self.written,
                self.fetched
            );
        } else {
            log::warn!(
                "[{label}] Wrote {}/{} incidents, {} skipped",
                self.written,
                self.fetched,
                self.failed()
            );
        }
    }
}

/// Executes one run as configured.
///
/// In bootstrap mode the index is created and mapped, and the outcome of
/// each step is printed to stdout; failures there do not fail the run.
/// Otherwise a single sync cycle is run for the configured region.
/// Per-record failures are logged and counted but do not fail the run
/// either.
///
/// # Errors
///
/// Returns [`IngestError`] if a client cannot be built or the feed cannot
/// be fetched or parsed.
pub async fn run(config: &IngestConfig) -> Result<IngestSummary, IngestError> {
    log::info!("Starting {} run against index {}", config.mode, config.index);

    if config.mode == Mode::Bootstrap {
        let provider = OpenSearchProvider::new(&config.endpoint, &config.index, config.timeout)?;
        let report = bootstrap_index(&provider).await;
        println!("{report}");
        if !report.is_success() {
            log::warn!("Index {} bootstrap finished with errors", config.index);
        }
        return Ok(IngestSummary::default());
    }

    let sink: Box<dyn IncidentSink> = match config.sink {
        SinkKind::Index => Box::new(IndexSink::new(
            Box::new(OpenSearchProvider::new(
                &config.endpoint,
                &config.index,
                config.timeout,
            )?),
            config.refresh,
        )),
        SinkKind::Stdout => Box::new(StdoutSink::stdout()),
    };
    let feed = FeedClient::new(config.feed_url.as_str(), config.timeout)?;

    log::info!(
        "Syncing region {} (limit {}) to {}",
        config.region.region,
        config.region.limit,
        sink.kind()
    );
    sync_region(&feed, &config.region, sink.as_ref()).await
}

/// Fetches one batch for `query` and sinks every record.
///
/// # Errors
///
/// Returns [`IngestError::Feed`] if the feed cannot be fetched or parsed;
/// nothing is written in that case.
pub async fn sync_region(
    feed: &FeedClient,
    query: &RegionQuery,
    sink: &dyn IncidentSink,
) -> Result<IngestSummary, IngestError> {
    let start = Instant::now();
    let incidents = feed.fetch(query).await?;
    let summary = process_incidents(incidents, sink).await;

    summary.log(&query.region);
    log::info!(
        "[{}] Sync complete in {:.1}s",
        query.region,
        start.elapsed().as_secs_f64()
    );
    Ok(summary)
}

/// Normalizes and sinks each record in feed order.
///
/// A record that fails to normalize or write is logged with its
/// identifier and skipped.
pub async fn process_incidents(
    incidents: Vec<RawIncident>,
    sink: &dyn IncidentSink,
) -> IngestSummary {
    let mut summary = IngestSummary {
        fetched: incidents.len(),
        ..IngestSummary::default()
    };

    for raw in incidents {
        let id = raw.id();
        let result = match normalize(raw) {
            Ok(incident) => sink.write(&incident).await.map_err(RecordError::from),
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => summary.written += 1,
            Err(error) => {
                log::warn!(
                    "Skipping incident {}: {error}",
                    id.as_deref().unwrap_or("<no objectID>")
                );
                summary.failures.push(RecordFailure { id, error });
            }
        }
    }

    summary
}
