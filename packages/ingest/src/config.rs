//! Run configuration, built once from parsed arguments and passed
//! explicitly to every component.

use std::time::Duration;

use blotter_index::RefreshPolicy;
use blotter_source::region::RegionQuery;
use blotter_source::registry::resolve_region;
use strum_macros::Display;
use url::Url;

use crate::IngestError;
use crate::cli::Cli;

/// What a run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    /// Create the index and its mapping, then stop.
    Bootstrap,
    /// Fetch, normalize, and sink one batch of incidents.
    Sync,
}

/// Where normalized incidents go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SinkKind {
    /// Upsert into the search index.
    Index,
    /// Print as indented JSON.
    Stdout,
}

/// Everything a run needs, validated up front.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Search index URL.
    pub endpoint: Url,
    /// Search index name.
    pub index: String,
    /// Bootstrap or sync.
    pub mode: Mode,
    /// Output for normalized incidents.
    pub sink: SinkKind,
    /// Visibility of each indexed incident.
    pub refresh: RefreshPolicy,
    /// Bounded feed query for the selected region.
    pub region: RegionQuery,
    /// Incident feed search endpoint.
    pub feed_url: Url,
    /// Timeout for the feed request and each index request.
    pub timeout: Duration,
}

impl IngestConfig {
    /// Validates parsed arguments and resolves the region.
    ///
    /// The region is resolved in every mode so that a typo fails before
    /// any network request is made.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Region`] for an unknown region code and
    /// [`IngestError::Config`] for an unparseable URL, an empty index name,
    /// or a zero limit or timeout.
    pub fn from_cli(cli: &Cli) -> Result<Self, IngestError> {
        let endpoint = parse_url("--endpoint", &cli.endpoint)?;
        let feed_url = parse_url("--feed-url", &cli.feed_url)?;

        let index = cli.index.trim();
        if index.is_empty() {
            return Err(IngestError::Config("--index must not be empty".to_owned()));
        }

        if cli.timeout_secs == 0 {
            return Err(IngestError::Config(
                "--timeout-secs must be greater than zero".to_owned(),
            ));
        }

        let mut region = resolve_region(&cli.region)?;
        match cli.limit {
            Some(0) => {
                return Err(IngestError::Config(
                    "--limit must be greater than zero".to_owned(),
                ));
            }
            Some(limit) => region = region.with_limit(limit),
            None => {}
        }

        Ok(Self {
            endpoint,
            index: index.to_owned(),
            mode: if cli.first_run {
                Mode::Bootstrap
            } else {
                Mode::Sync
            },
            sink: if cli.stdio {
                SinkKind::Stdout
            } else {
                SinkKind::Index
            },
            refresh: cli.refresh,
            region,
            feed_url,
            timeout: Duration::from_secs(cli.timeout_secs),
        })
    }
}

fn parse_url(flag: &str, value: &str) -> Result<Url, IngestError> {
    Url::parse(value).map_err(|e| IngestError::Config(format!("{flag} {value:?}: {e}")))
}
