//! Shared parsing utilities for feed records.
//!
//! Epoch-millisecond and coordinate parsing used by [`crate::normalize`].

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Converts epoch milliseconds to an instant, dropping the sub-second part.
///
/// The division truncates toward zero, so `1_700_000_000_999` and
/// `1_700_000_000_000` both map to epoch second `1_700_000_000`. Returns
/// `None` when the result is outside chrono's representable range.
#[must_use]
pub fn millis_to_instant(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(millis / 1000, 0)
}

/// Parses a JSON epoch-millisecond value (integer or float) into an
/// instant. Strings, booleans, and other non-numeric values yield `None`.
#[must_use]
pub fn epoch_millis_to_instant(value: &Value) -> Option<DateTime<Utc>> {
    if let Some(millis) = value.as_i64() {
        return millis_to_instant(millis);
    }
    if let Some(millis) = value.as_u64() {
        return millis_to_instant(i64::try_from(millis).ok()?);
    }

    let millis = value.as_f64()?;
    #[allow(clippy::cast_possible_truncation)]
    let seconds = (millis / 1000.0).trunc() as i64;
    DateTime::from_timestamp(seconds, 0)
}

/// Extracts the first coordinate from a geolocation component.
///
/// The feed sends each component as an array; the first element is used.
/// A bare scalar is accepted as a single-element array. Elements may be
/// numbers or numeric strings. Returns `None` if the array is empty or
/// the value is not a finite number.
#[must_use]
pub fn first_coordinate(value: Option<&Value>) -> Option<f64> {
    let first = match value? {
        Value::Array(items) => items.first()?,
        scalar => scalar,
    };

    let coordinate = match first {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    coordinate.is_finite().then_some(coordinate)
}
