//! Exact-level and level-set queries against a catalog.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::catalog::FieldCatalog;
use crate::error::{FieldError, Result};
use crate::record::{FieldRecord, LevelType};

/// Which record wins when a bucket holds duplicates of one
/// `(variable, level type, level)` triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The first-ingested record is authoritative.
    #[default]
    FirstWins,
    /// A later duplicate supersedes earlier ones, e.g. a corrected message
    /// appended to the same source.
    LastWins,
}

/// Resolves level queries with a fixed duplicate-precedence policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelResolver {
    policy: DuplicatePolicy,
}

impl LevelResolver {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// The authoritative record at an exact level.
    ///
    /// Exact numeric match with no tolerance; `None` is a reported,
    /// warning-class condition, never an error.
    pub fn resolve_exact<'a>(
        &self,
        catalog: &'a FieldCatalog,
        variable: &str,
        level_type: LevelType,
        level: u32,
    ) -> Option<&'a FieldRecord> {
        let bucket = catalog.bucket(variable, level_type);
        match self.policy {
            DuplicatePolicy::FirstWins => bucket.iter().find(|r| r.level() == level),
            DuplicatePolicy::LastWins => bucket.iter().rev().find(|r| r.level() == level),
        }
    }

    /// Like [`resolve_exact`](Self::resolve_exact), but an absent level is
    /// a `LevelNotFound` error carrying the levels that are present, for
    /// callers that treat the miss as more than a skip.
    pub fn resolve_required<'a>(
        &self,
        catalog: &'a FieldCatalog,
        variable: &str,
        level_type: LevelType,
        level: u32,
    ) -> Result<&'a FieldRecord> {
        self.resolve_exact(catalog, variable, level_type, level)
            .ok_or_else(|| FieldError::LevelNotFound {
                variable: variable.to_string(),
                level_type,
                levels: self
                    .available_levels(catalog, variable, level_type)
                    .into_iter()
                    .collect(),
            })
    }

    /// The first-ingested record in a bucket, for level types with no
    /// natural level selection (surface fields).
    pub fn resolve_first<'a>(
        &self,
        catalog: &'a FieldCatalog,
        variable: &str,
        level_type: LevelType,
    ) -> Option<&'a FieldRecord> {
        catalog.bucket(variable, level_type).first()
    }

    /// All distinct levels present in a bucket, ascending.
    pub fn available_levels(
        &self,
        catalog: &FieldCatalog,
        variable: &str,
        level_type: LevelType,
    ) -> BTreeSet<u32> {
        catalog
            .bucket(variable, level_type)
            .iter()
            .map(|r| r.level())
            .collect()
    }

    /// Split a requested level list into `(available, missing)`, preserving
    /// request order, so callers can report every unavailable level in one
    /// batch instead of one at a time.
    pub fn validate_levels(
        &self,
        catalog: &FieldCatalog,
        variable: &str,
        level_type: LevelType,
        requested: &[u32],
    ) -> (Vec<u32>, Vec<u32>) {
        let available = self.available_levels(catalog, variable, level_type);
        requested
            .iter()
            .copied()
            .partition(|level| available.contains(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Coordinates, FieldGrid};
    use chrono::{TimeZone, Utc};

    fn record(key: &str, level_type: LevelType, level: u32, fill: f32) -> FieldRecord {
        let grid = FieldGrid::new(1, 2, vec![fill, fill]).unwrap();
        let coords = Coordinates::new(vec![0.0], vec![0.0, 1.0]);
        let valid = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        FieldRecord::new(key, level_type, level, valid, grid, coords)
    }

    fn isobaric_catalog(levels: &[(u32, f32)]) -> FieldCatalog {
        let mut catalog = FieldCatalog::new();
        catalog.ingest(
            levels
                .iter()
                .map(|&(level, fill)| record("Temperature", LevelType::IsobaricInhPa, level, fill))
                .collect::<Vec<_>>(),
        );
        catalog
    }

    #[test]
    fn test_resolve_exact_present_and_missing() {
        // Scenario: isobaric temperature at levels {500, 850}.
        let catalog = isobaric_catalog(&[(500, 1.0), (850, 2.0)]);
        let resolver = LevelResolver::default();

        let found = resolver
            .resolve_exact(&catalog, "Temperature", LevelType::IsobaricInhPa, 500)
            .unwrap();
        assert_eq!(found.level(), 500);

        assert!(resolver
            .resolve_exact(&catalog, "Temperature", LevelType::IsobaricInhPa, 700)
            .is_none());
    }

    #[test]
    fn test_resolve_exact_first_wins_on_duplicates() {
        let catalog = isobaric_catalog(&[(500, 1.0), (500, 2.0)]);
        let resolver = LevelResolver::new(DuplicatePolicy::FirstWins);
        let found = resolver
            .resolve_exact(&catalog, "Temperature", LevelType::IsobaricInhPa, 500)
            .unwrap();
        assert_eq!(found.values().values()[0], 1.0);
    }

    #[test]
    fn test_resolve_exact_last_wins_on_duplicates() {
        let catalog = isobaric_catalog(&[(500, 1.0), (500, 2.0)]);
        let resolver = LevelResolver::new(DuplicatePolicy::LastWins);
        let found = resolver
            .resolve_exact(&catalog, "Temperature", LevelType::IsobaricInhPa, 500)
            .unwrap();
        assert_eq!(found.values().values()[0], 2.0);
    }

    #[test]
    fn test_resolve_required_reports_available_levels() {
        let catalog = isobaric_catalog(&[(500, 1.0), (850, 2.0)]);
        let resolver = LevelResolver::default();

        assert!(resolver
            .resolve_required(&catalog, "Temperature", LevelType::IsobaricInhPa, 500)
            .is_ok());

        let err = resolver
            .resolve_required(&catalog, "Temperature", LevelType::IsobaricInhPa, 700)
            .unwrap_err();
        match err {
            FieldError::LevelNotFound {
                variable, levels, ..
            } => {
                assert_eq!(variable, "Temperature");
                assert_eq!(levels, vec![500, 850]);
            }
            other => panic!("expected LevelNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_first_returns_first_ingested() {
        let mut catalog = FieldCatalog::new();
        catalog.ingest(vec![
            record("Precipitation rate", LevelType::Surface, 0, 1.0),
            record("Precipitation rate", LevelType::Surface, 0, 2.0),
        ]);
        let resolver = LevelResolver::default();
        let found = resolver
            .resolve_first(&catalog, "Precipitation rate", LevelType::Surface)
            .unwrap();
        assert_eq!(found.values().values()[0], 1.0);
    }

    #[test]
    fn test_resolve_first_empty_bucket() {
        let catalog = FieldCatalog::new();
        let resolver = LevelResolver::default();
        assert!(resolver
            .resolve_first(&catalog, "Precipitation rate", LevelType::Surface)
            .is_none());
    }

    #[test]
    fn test_available_levels_sorted_unique() {
        let catalog = isobaric_catalog(&[(850, 1.0), (500, 2.0), (850, 3.0), (250, 4.0)]);
        let resolver = LevelResolver::default();
        let levels: Vec<u32> = resolver
            .available_levels(&catalog, "Temperature", LevelType::IsobaricInhPa)
            .into_iter()
            .collect();
        assert_eq!(levels, vec![250, 500, 850]);
    }

    #[test]
    fn test_validate_levels_batches_missing() {
        // Scenario: requested [500, 700, 850] against available [500, 850].
        let catalog = isobaric_catalog(&[(500, 1.0), (850, 2.0)]);
        let resolver = LevelResolver::default();
        let (available, missing) = resolver.validate_levels(
            &catalog,
            "Temperature",
            LevelType::IsobaricInhPa,
            &[500, 700, 850],
        );
        assert_eq!(available, vec![500, 850]);
        assert_eq!(missing, vec![700]);
    }

    #[test]
    fn test_validate_levels_empty_bucket_reports_all_missing() {
        let catalog = FieldCatalog::new();
        let resolver = LevelResolver::default();
        let (available, missing) = resolver.validate_levels(
            &catalog,
            "Temperature",
            LevelType::IsobaricInhPa,
            &[500, 700],
        );
        assert!(available.is_empty());
        assert_eq!(missing, vec![500, 700]);
    }
}
