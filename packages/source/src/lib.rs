#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident feed access: which area to ask for, how to ask, and how to
//! turn the answer into index-ready records.
//!
//! - [`registry`] resolves a region code to a [`region::RegionQuery`].
//! - [`feed`] issues the single bounded search request.
//! - [`normalize`] converts each [`RawIncident`] into a
//!   [`blotter_source_models::NormalizedIncident`].

pub mod feed;
pub mod normalize;
pub mod parsing;
pub mod region;
pub mod registry;

use blotter_source_models::RawIncident;

/// Errors that can occur while querying the incident feed.
///
/// [`Self::Request`] and [`Self::Status`] mean the feed could not be
/// reached; the remaining variants mean it answered with something other
/// than a search result.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The feed answered with a non-success status.
    #[error("Feed returned HTTP {status} for {url}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
        /// Leading part of the response body.
        body: String,
    },

    /// The response body is not valid JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response has no top-level `hits` array.
    #[error("Feed response has no `hits` array")]
    MissingHits,

    /// An element of `hits` is not a JSON object.
    #[error("Feed hit {index} is not a JSON object")]
    MalformedHit {
        /// Position of the offending element.
        index: usize,
    },
}

impl FeedError {
    /// Whether the feed was reached but its answer could not be parsed.
    #[must_use]
    pub const fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::Parse(_) | Self::MissingHits | Self::MalformedHit { .. }
        )
    }
}

/// Errors that can occur while normalizing a single [`RawIncident`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    /// The record carries no usable `objectID`.
    #[error("record has no `objectID` identifier")]
    MissingIdentifier,

    /// A timestamp field is absent, not numeric, or out of range.
    #[error("timestamp field `{field}` is missing or not an epoch-millisecond number")]
    MalformedTimestamp {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A geolocation array is absent, empty, or not numeric.
    #[error("geolocation field `{field}` is missing or empty")]
    MissingGeoData {
        /// Path of the offending field.
        field: &'static str,
    },

    /// The coordinates lie outside the WGS84 range.
    #[error("coordinates out of range: lat={latitude}, lng={longitude}")]
    CoordinateOutOfRange {
        /// First latitude value.
        latitude: f64,
        /// First longitude value.
        longitude: f64,
    },
}

/// Errors that can occur while resolving a region code.
#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    /// The code matches no region id or alias.
    #[error("Unknown region {code:?}. Available: {available}")]
    Unknown {
        /// The code that was asked for.
        code: String,
        /// Comma-separated list of accepted codes.
        available: String,
    },

    /// A region definition could not be parsed.
    #[error("Invalid region definition: {0}")]
    Definition(#[from] toml::de::Error),

    /// A region definition parsed but describes an unusable area.
    #[error("Region {id:?} has an invalid bounding box or limit")]
    InvalidArea {
        /// Region id.
        id: String,
    },
}

/// A fetched batch of incidents, in feed order.
pub type IncidentBatch = Vec<RawIncident>;
