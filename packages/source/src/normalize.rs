//! Converts feed records into index documents.
//!
//! Normalization is pure: the output depends only on the input record.

use blotter_source_models::{
    CREATED_AT_FIELD, CREATED_AT_KEY, GEOLOC_FIELD, GeoPoint, NormalizedIncident, RawIncident,
    SPOT_FIELD, UPDATED_AT_FIELD, UPDATED_AT_KEY,
};
use chrono::{DateTime, Utc};

use crate::NormalizeError;
use crate::parsing::{epoch_millis_to_instant, first_coordinate};

/// Normalizes a single feed record.
///
/// Converts `created_at`/`updated_at` from epoch milliseconds to whole-second
/// instants and builds the `spot` point from the first `_geoloc.lng` and
/// `_geoloc.lat` values. Every other provider field is kept. Provider keys
/// that collide with the derived `createdAt`, `updatedAt`, or `spot` fields
/// are replaced.
///
/// # Errors
///
/// Returns [`NormalizeError`] if the identifier, either timestamp, or the
/// geolocation is missing or malformed.
pub fn normalize(raw: RawIncident) -> Result<NormalizedIncident, NormalizeError> {
    let id = raw.id().ok_or(NormalizeError::MissingIdentifier)?;
    let created_at = timestamp(&raw, CREATED_AT_FIELD)?;
    let updated_at = timestamp(&raw, UPDATED_AT_FIELD)?;
    let spot = spot(&raw)?;

    let mut fields = raw.into_fields();
    for key in [CREATED_AT_KEY, UPDATED_AT_KEY, SPOT_FIELD] {
        fields.remove(key);
    }

    Ok(NormalizedIncident {
        id,
        created_at,
        updated_at,
        spot,
        fields,
    })
}

fn timestamp(raw: &RawIncident, field: &'static str) -> Result<DateTime<Utc>, NormalizeError> {
    raw.get(field)
        .and_then(epoch_millis_to_instant)
        .ok_or(NormalizeError::MalformedTimestamp { field })
}

fn spot(raw: &RawIncident) -> Result<GeoPoint, NormalizeError> {
    let geoloc = raw.get(GEOLOC_FIELD);

    let latitude = first_coordinate(geoloc.and_then(|g| g.get("lat"))).ok_or(
        NormalizeError::MissingGeoData {
            field: "_geoloc.lat",
        },
    )?;
    let longitude = first_coordinate(geoloc.and_then(|g| g.get("lng"))).ok_or(
        NormalizeError::MissingGeoData {
            field: "_geoloc.lng",
        },
    )?;

    let point = GeoPoint::new(longitude, latitude);
    if !point.is_valid() {
        return Err(NormalizeError::CoordinateOutOfRange {
            latitude,
            longitude,
        });
    }

    Ok(point)
}
