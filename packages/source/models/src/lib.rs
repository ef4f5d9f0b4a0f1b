#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident feed record types and the normalized index document format.
//!
//! The feed delivers loosely-structured JSON objects ([`RawIncident`]).
//! Normalization keeps every provider field and superimposes the derived
//! `createdAt`, `updatedAt`, and `spot` fields, producing a
//! [`NormalizedIncident`] that serializes straight into an index document.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Feed field holding the provider's incident identifier.
pub const ID_FIELD: &str = "objectID";

/// Feed field holding the creation time in epoch milliseconds.
pub const CREATED_AT_FIELD: &str = "created_at";

/// Feed field holding the last-update time in epoch milliseconds.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Feed field holding the nested `lat`/`lng` arrays.
pub const GEOLOC_FIELD: &str = "_geoloc";

/// Derived field holding the creation instant.
pub const CREATED_AT_KEY: &str = "createdAt";

/// Derived field holding the last-update instant.
pub const UPDATED_AT_KEY: &str = "updatedAt";

/// Derived field holding the WKT point. The index mapping types this
/// field as `geo_point`.
pub const SPOT_FIELD: &str = "spot";

/// A single incident exactly as delivered by the feed.
///
/// Only a handful of fields are interpreted; everything else the provider
/// sends is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawIncident(Map<String, Value>);

impl RawIncident {
    /// Wraps an already-parsed JSON object.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Returns the value of a top-level field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns all provider fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the record, returning its provider fields.
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Returns the incident identifier.
    ///
    /// String identifiers are returned as-is; numeric identifiers are
    /// rendered in their JSON form. Empty strings count as missing.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        match self.0.get(ID_FIELD)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl TryFrom<Value> for RawIncident {
    /// The original value, when it is not a JSON object.
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(other),
        }
    }
}

/// Errors produced when parsing a WKT point string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeoPointParseError {
    /// The string is not wrapped in `POINT (` ... `)`.
    #[error("expected `POINT (<lon> <lat>)`, got {0:?}")]
    Syntax(String),

    /// A coordinate component is not a finite number.
    #[error("invalid coordinate component {0:?}")]
    Component(String),
}

/// A WGS84 coordinate pair rendered as a WKT point.
///
/// Serializes as the string `"POINT (<lon> <lat>)"`, the form the index
/// backend accepts for `geo_point` fields. Components render in shortest
/// round-trip decimal form, so parsing the string yields the original
/// values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
}

impl GeoPoint {
    /// Creates a point from a longitude/latitude pair.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Whether both components are finite and inside the WGS84 range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "POINT ({} {})", self.longitude, self.latitude)
    }
}

impl FromStr for GeoPoint {
    type Err = GeoPointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix("POINT")
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix('('))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| GeoPointParseError::Syntax(s.to_owned()))?;

        let mut parts = inner.split_whitespace();
        let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(GeoPointParseError::Syntax(s.to_owned()));
        };

        let component = |part: &str| {
            part.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| GeoPointParseError::Component(part.to_owned()))
        };

        Ok(Self::new(component(lon)?, component(lat)?))
    }
}

impl Serialize for GeoPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A feed incident with its timestamps and location normalized for the
/// search index.
///
/// Serializes as the provider's original fields plus `createdAt`,
/// `updatedAt` (RFC 3339, whole seconds), and `spot` (WKT point).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedIncident {
    /// Provider identifier, used as the index document id.
    #[serde(skip)]
    pub id: String,
    /// Creation instant, truncated to whole seconds.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Last-update instant, truncated to whole seconds.
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    /// Location of the incident.
    pub spot: GeoPoint,
    /// Every other field the provider sent.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl NormalizedIncident {
    /// Renders the incident as the JSON document stored in the index.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if serialization fails.
    pub fn to_document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// A rectangular search area in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum latitude.
    pub south: f64,
    /// Minimum longitude.
    pub west: f64,
    /// Maximum latitude.
    pub north: f64,
    /// Maximum longitude.
    pub east: f64,
}

impl BoundingBox {
    /// Returns the corners in the order the feed expects:
    /// `[south, west, north, east]`.
    #[must_use]
    pub const fn corners(&self) -> [f64; 4] {
        [self.south, self.west, self.north, self.east]
    }

    /// Whether the box is non-degenerate and inside the WGS84 range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        GeoPoint::new(self.west, self.south).is_valid()
            && GeoPoint::new(self.east, self.north).is_valid()
            && self.south < self.north
            && self.west < self.east
    }
}
