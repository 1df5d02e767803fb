//! Level-ordered zonal-mean series.

use tracing::warn;

use crate::catalog::FieldCatalog;
use crate::record::LevelType;

/// Latitude–level cross-section of longitude-averaged values.
///
/// Entries are strictly ascending by level regardless of the order the
/// underlying records were ingested. Built once per variable per pass and
/// immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZonalMeanSeries {
    /// Shared latitude axis, taken from the first usable record.
    pub lats: Vec<f64>,
    /// `(level, zonal mean)` pairs, ascending by level.
    pub entries: Vec<(u32, Vec<f32>)>,
}

impl ZonalMeanSeries {
    /// Callers must check this before rendering; an empty series is a
    /// reported, non-fatal condition.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn levels(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|(level, _)| *level)
    }
}

/// Build the zonal-mean series for one variable.
///
/// Each record contributes the mean of its values along the longitude
/// axis, one value per latitude. Records whose latitude axis disagrees
/// with the grid shape, or with the axis the series was started on, are
/// skipped; duplicates of a level keep the first-ingested record. An
/// empty bucket yields an empty series.
pub fn build(catalog: &FieldCatalog, variable: &str, level_type: LevelType) -> ZonalMeanSeries {
    let mut lats: Vec<f64> = Vec::new();
    let mut entries: Vec<(u32, Vec<f32>)> = Vec::new();

    for record in catalog.bucket(variable, level_type) {
        let grid = record.values();
        let coords = record.coordinates();
        if coords.lats.len() != grid.ny() {
            warn!(
                variable = %variable,
                level = record.level(),
                axis_len = coords.lats.len(),
                rows = grid.ny(),
                "latitude axis does not match grid shape, skipping record"
            );
            continue;
        }
        if lats.is_empty() {
            lats = coords.lats.clone();
        } else if coords.lats != lats {
            warn!(
                variable = %variable,
                level = record.level(),
                "latitude axis differs from the series axis, skipping record"
            );
            continue;
        }
        entries.push((record.level(), grid.row_means()));
    }

    // Bucket order is ingestion order; the series contract is ascending
    // levels with first-ingested precedence for duplicates.
    entries.sort_by_key(|(level, _)| *level);
    entries.dedup_by_key(|(level, _)| *level);

    ZonalMeanSeries { lats, entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Coordinates, FieldGrid, FieldRecord};
    use chrono::{TimeZone, Utc};

    fn record(level: u32, row0: [f32; 2], row1: [f32; 2]) -> FieldRecord {
        let grid = FieldGrid::new(2, 2, vec![row0[0], row0[1], row1[0], row1[1]]).unwrap();
        let coords = Coordinates::new(vec![45.0, -45.0], vec![0.0, 180.0]);
        let valid = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        FieldRecord::new(
            "U component of wind",
            LevelType::IsobaricInhPa,
            level,
            valid,
            grid,
            coords,
        )
    }

    #[test]
    fn test_levels_ascending_regardless_of_ingestion_order() {
        let mut catalog = FieldCatalog::new();
        catalog.ingest(vec![
            record(850, [1.0, 3.0], [5.0, 7.0]),
            record(250, [2.0, 4.0], [6.0, 8.0]),
            record(500, [0.0, 0.0], [0.0, 0.0]),
        ]);

        let series = build(&catalog, "U component of wind", LevelType::IsobaricInhPa);
        let levels: Vec<u32> = series.levels().collect();
        assert_eq!(levels, vec![250, 500, 850]);
    }

    #[test]
    fn test_means_are_longitude_averages() {
        let mut catalog = FieldCatalog::new();
        catalog.ingest(vec![record(500, [1.0, 3.0], [5.0, 7.0])]);

        let series = build(&catalog, "U component of wind", LevelType::IsobaricInhPa);
        assert_eq!(series.entries.len(), 1);
        assert_eq!(series.entries[0].1, vec![2.0, 6.0]);
        assert_eq!(series.lats, vec![45.0, -45.0]);
    }

    #[test]
    fn test_empty_bucket_yields_empty_series() {
        let catalog = FieldCatalog::new();
        let series = build(&catalog, "U component of wind", LevelType::IsobaricInhPa);
        assert!(series.is_empty());
        assert!(series.lats.is_empty());
    }

    #[test]
    fn test_duplicate_levels_keep_first_ingested() {
        let mut catalog = FieldCatalog::new();
        catalog.ingest(vec![
            record(500, [1.0, 1.0], [1.0, 1.0]),
            record(500, [9.0, 9.0], [9.0, 9.0]),
        ]);

        let series = build(&catalog, "U component of wind", LevelType::IsobaricInhPa);
        assert_eq!(series.entries.len(), 1);
        assert_eq!(series.entries[0].1, vec![1.0, 1.0]);
    }

    #[test]
    fn test_record_on_different_latitude_axis_is_skipped() {
        // Self-consistent grid, but on another latitude axis than the one
        // the series started with; its row count happens to match too.
        let grid = FieldGrid::new(2, 2, vec![9.0, 9.0, 9.0, 9.0]).unwrap();
        let coords = Coordinates::new(vec![30.0, -30.0], vec![0.0, 180.0]);
        let valid = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        let other_axis = FieldRecord::new(
            "U component of wind",
            LevelType::IsobaricInhPa,
            700,
            valid,
            grid,
            coords,
        );

        let mut catalog = FieldCatalog::new();
        catalog.ingest(vec![record(500, [1.0, 3.0], [5.0, 7.0]), other_axis]);

        let series = build(&catalog, "U component of wind", LevelType::IsobaricInhPa);
        let levels: Vec<u32> = series.levels().collect();
        assert_eq!(levels, vec![500]);
        assert_eq!(series.lats, vec![45.0, -45.0]);
    }

    #[test]
    fn test_mismatched_axis_record_is_skipped() {
        let grid = FieldGrid::new(1, 2, vec![1.0, 2.0]).unwrap();
        let coords = Coordinates::new(vec![45.0, -45.0], vec![0.0, 180.0]);
        let valid = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        let bad = FieldRecord::new(
            "U component of wind",
            LevelType::IsobaricInhPa,
            700,
            valid,
            grid,
            coords,
        );

        let mut catalog = FieldCatalog::new();
        catalog.ingest(vec![bad, record(500, [1.0, 3.0], [5.0, 7.0])]);

        let series = build(&catalog, "U component of wind", LevelType::IsobaricInhPa);
        let levels: Vec<u32> = series.levels().collect();
        assert_eq!(levels, vec![500]);
    }
}
