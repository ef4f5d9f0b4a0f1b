//! Field mappings applied to the incident index.

use serde_json::{Map, Value, json};

/// Builds a mapping body that types `field` as a `geo_point`.
///
/// The backend accepts WKT strings such as `"POINT (-122.41 37.77)"` for
/// `geo_point` fields, which is the form normalized incidents carry.
#[must_use]
pub fn geo_point_mapping(field: &str) -> Value {
    let mut properties = Map::new();
    properties.insert(field.to_owned(), json!({ "type": "geo_point" }));
    json!({ "properties": properties })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_spot_as_geo_point() {
        assert_eq!(
            geo_point_mapping("spot"),
            json!({ "properties": { "spot": { "type": "geo_point" } } })
        );
    }
}
