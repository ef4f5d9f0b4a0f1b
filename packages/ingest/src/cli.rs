//! Command-line arguments for the `blotter_ingest` binary.

use blotter_index::RefreshPolicy;
use blotter_index::provider::{DEFAULT_ENDPOINT, DEFAULT_INDEX};
use blotter_source::feed::DEFAULT_FEED_URL;
use blotter_source::registry::DEFAULT_REGION;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "blotter_ingest",
    about = "Ingests incident feed records for a metro region into a search index"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Search index (Elasticsearch/OpenSearch) URL
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Print normalized incidents to stdout instead of indexing them
    #[arg(long)]
    pub stdio: bool,

    /// Search index name
    #[arg(long, default_value = DEFAULT_INDEX)]
    pub index: String,

    /// When indexed incidents become searchable (immediate, wait-for, deferred)
    #[arg(long, default_value = "immediate", value_parser = parse_refresh)]
    pub refresh: RefreshPolicy,

    /// Create the index with a geo-point mapping for `spot`, then exit
    #[arg(long)]
    pub first_run: bool,

    /// Region code (bayarea|sf, dc, la, nyc|ny, atl)
    #[arg(long, default_value = DEFAULT_REGION)]
    pub region: String,

    /// Incident feed search endpoint
    #[arg(long, default_value = DEFAULT_FEED_URL)]
    pub feed_url: String,

    /// Maximum number of incidents to fetch (overrides the region's limit)
    #[arg(long)]
    pub limit: Option<u32>,

    /// Timeout in seconds for the feed request and each index request
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// List the configured regions and exit
    #[arg(long)]
    pub list_regions: bool,
}

fn parse_refresh(value: &str) -> Result<RefreshPolicy, String> {
    value
        .parse()
        .map_err(|_| format!("expected immediate, wait-for, or deferred, got {value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_documented_defaults() {
        let cli = Cli::try_parse_from(["blotter_ingest"]).unwrap();
        assert_eq!(cli.endpoint, "http://localhost:9200");
        assert_eq!(cli.index, "pleb-app");
        assert_eq!(cli.region, "bayarea");
        assert!(!cli.stdio);
        assert!(!cli.first_run);
        assert!(cli.limit.is_none());
        assert_eq!(cli.timeout_secs, 30);
        assert_eq!(cli.refresh, RefreshPolicy::Immediate);
    }

    #[test]
    fn parses_kebab_case_flags() {
        let cli = Cli::try_parse_from([
            "blotter_ingest",
            "--first-run",
            "--stdio",
            "--region",
            "dc",
            "--limit",
            "50",
            "--feed-url",
            "http://127.0.0.1:8080/search",
        ])
        .unwrap();
        assert!(cli.first_run);
        assert!(cli.stdio);
        assert_eq!(cli.region, "dc");
        assert_eq!(cli.limit, Some(50));
        assert_eq!(cli.feed_url, "http://127.0.0.1:8080/search");
    }

    #[test]
    fn parses_refresh_policy() {
        let cli = Cli::try_parse_from(["blotter_ingest", "--refresh", "wait-for"]).unwrap();
        assert_eq!(cli.refresh, RefreshPolicy::WaitFor);

        assert!(Cli::try_parse_from(["blotter_ingest", "--refresh", "sometimes"]).is_err());
    }
}
