//! Config-driven region definitions.
//!
//! A [`RegionDefinition`] names a metro area, the codes an operator may use
//! to select it, and the bounding box the feed is asked about. The
//! definition resolves to an immutable [`RegionQuery`], which renders the
//! feed's query string.

use blotter_source_models::BoundingBox;
use serde::Deserialize;

use crate::RegionError;

/// Rows requested from the feed when a definition does not set `limit`.
pub const DEFAULT_LIMIT: u32 = 1000;

/// A metro area the feed can be queried for.
///
/// Loaded from TOML files embedded at compile time.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionDefinition {
    /// Canonical region code (e.g., `"bayarea"`).
    pub id: String,
    /// Human-readable name (e.g., `"San Francisco Bay Area"`).
    pub name: String,
    /// Additional codes that select this region (e.g., `"sf"`).
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Maximum number of incidents requested per run.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Area searched by the feed.
    pub bounding_box: BoundingBox,
}

const fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl RegionDefinition {
    /// Whether `code` is this region's id or one of its aliases.
    #[must_use]
    pub fn matches(&self, code: &str) -> bool {
        self.id == code || self.aliases.iter().any(|a| a == code)
    }

    /// Returns every code that selects this region, id first.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Builds the feed query for this region.
    #[must_use]
    pub fn query(&self) -> RegionQuery {
        RegionQuery {
            region: self.id.clone(),
            bounding_box: self.bounding_box,
            limit: self.limit,
        }
    }
}

/// Parses and validates a region definition from TOML.
///
/// # Errors
///
/// Returns [`RegionError::Definition`] if the TOML is malformed and
/// [`RegionError::InvalidArea`] if the bounding box is degenerate or the
/// limit is zero.
pub fn parse_region_toml(toml_str: &str) -> Result<RegionDefinition, RegionError> {
    let definition: RegionDefinition = toml::from_str(toml_str)?;

    if !definition.bounding_box.is_valid() || definition.limit == 0 {
        return Err(RegionError::InvalidArea { id: definition.id });
    }

    Ok(definition)
}

/// The bounded search the feed is asked to run.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionQuery {
    /// Canonical code of the region this query came from.
    pub region: String,
    /// Area searched.
    pub bounding_box: BoundingBox,
    /// Maximum number of incidents returned.
    pub limit: u32,
}

impl RegionQuery {
    /// Returns a copy that asks for at most `limit` incidents.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Renders the feed query string:
    /// `insideBoundingBox[0]=..&insideBoundingBox[3]=..&limit=N`.
    #[must_use]
    pub fn query_string(&self) -> String {
        let corners = self
            .bounding_box
            .corners()
            .iter()
            .enumerate()
            .map(|(i, corner)| format!("insideBoundingBox[{i}]={corner}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{corners}&limit={}", self.limit)
    }
}
