//! Region registry: loads all region definitions from embedded TOML configs.
//!
//! Each `.toml` file in `packages/source/regions/` is baked into the binary
//! at compile time via [`include_str!`]. Adding a region is as simple as
//! creating a new TOML file and adding it to the list below.

use crate::RegionError;
use crate::region::{RegionDefinition, RegionQuery, parse_region_toml};

/// TOML configs embedded at compile time.
const REGION_TOMLS: &[(&str, &str)] = &[
    ("bayarea", include_str!("../regions/bayarea.toml")),
    ("dc", include_str!("../regions/dc.toml")),
    ("la", include_str!("../regions/la.toml")),
    ("nyc", include_str!("../regions/nyc.toml")),
    ("atl", include_str!("../regions/atl.toml")),
];

/// Region selected when the operator does not pick one.
pub const DEFAULT_REGION: &str = "bayarea";

/// Returns all configured region definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_regions() -> Vec<RegionDefinition> {
    REGION_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_region_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns every accepted region code (ids and aliases), comma-separated.
#[must_use]
pub fn available_codes() -> String {
    all_regions()
        .iter()
        .flat_map(|r| r.codes().map(str::to_owned))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolves a region code (case-sensitive id or alias) to its feed query.
///
/// # Errors
///
/// Returns [`RegionError::Unknown`] if no region matches. An unknown code
/// never falls back to an unbounded query.
pub fn resolve_region(code: &str) -> Result<RegionQuery, RegionError> {
    all_regions()
        .iter()
        .find(|r| r.matches(code))
        .map(RegionDefinition::query)
        .ok_or_else(|| RegionError::Unknown {
            code: code.to_owned(),
            available: available_codes(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: [&str; 5] = ["bayarea", "dc", "la", "nyc", "atl"];

    #[test]
    fn loads_all_regions() {
        let regions = all_regions();
        assert_eq!(regions.len(), CANONICAL.len());
        for id in CANONICAL {
            assert!(regions.iter().any(|r| r.id == id), "missing region {id}");
        }
    }

    #[test]
    fn region_codes_are_unique() {
        let regions = all_regions();
        let mut codes: Vec<&str> = regions.iter().flat_map(|r| r.codes()).collect();
        let total = codes.len();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), total);
    }

    #[test]
    fn canonical_regions_render_four_corners_and_a_limit() {
        for code in CANONICAL {
            let query = resolve_region(code).unwrap();
            let qs = query.query_string();
            let pairs: Vec<(&str, &str)> = qs
                .split('&')
                .map(|pair| pair.split_once('=').unwrap())
                .collect();

            assert_eq!(pairs.len(), 5, "{code}: {qs}");
            for (i, (key, value)) in pairs[..4].iter().enumerate() {
                assert_eq!(*key, format!("insideBoundingBox[{i}]"), "{code}");
                let corner: f64 = value.parse().unwrap();
                assert!(
                    (corner - query.bounding_box.corners()[i]).abs() < f64::EPSILON,
                    "{code}: corner {i}"
                );
            }
            assert_eq!(pairs[4].0, "limit");
            assert_eq!(pairs[4].1.parse::<u32>().unwrap(), 1000);
        }
    }

    #[test]
    fn aliases_select_the_same_query() {
        assert_eq!(resolve_region("sf").unwrap(), resolve_region("bayarea").unwrap());
        assert_eq!(resolve_region("ny").unwrap(), resolve_region("nyc").unwrap());
    }

    #[test]
    fn unknown_region_fails_instead_of_querying_everything() {
        let err = resolve_region("boston").unwrap_err();
        match err {
            RegionError::Unknown { code, available } => {
                assert_eq!(code, "boston");
                assert!(available.contains("bayarea"));
                assert!(available.contains("sf"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn region_codes_are_case_sensitive() {
        assert!(resolve_region("DC").is_err());
        assert!(resolve_region("").is_err());
    }
}
