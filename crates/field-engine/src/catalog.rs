//! Per-pass index of field records by variable and level type.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::record::{FieldRecord, LevelType};

/// Indexes an unordered stream of records under `(variable key, level type)`.
///
/// Buckets preserve ingestion order and are never deduplicated here;
/// duplicate precedence is the resolver's concern. A catalog is scoped to
/// one forecast hour's processing and must not be reused across hours.
#[derive(Debug, Default)]
pub struct FieldCatalog {
    buckets: HashMap<String, HashMap<LevelType, Vec<FieldRecord>>>,
    record_count: usize,
    first_valid_time: Option<DateTime<Utc>>,
}

impl FieldCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index each record under its variable key and level type, appending
    /// to the ordered-insertion bucket. Absent variables are not an error;
    /// they simply yield empty buckets later.
    pub fn ingest(&mut self, records: impl IntoIterator<Item = FieldRecord>) {
        for record in records {
            if self.first_valid_time.is_none() {
                self.first_valid_time = Some(record.valid_time());
            }
            self.buckets
                .entry(record.variable_key().to_string())
                .or_default()
                .entry(record.level_type())
                .or_default()
                .push(record);
            self.record_count += 1;
        }
    }

    /// Records for one variable and level type, in ingestion order.
    pub fn bucket(&self, variable: &str, level_type: LevelType) -> &[FieldRecord] {
        self.buckets
            .get(variable)
            .and_then(|by_level| by_level.get(&level_type))
            .map(|records| records.as_slice())
            .unwrap_or(&[])
    }

    /// Valid time of the first ingested record, used for the batch date tag.
    pub fn first_valid_time(&self) -> Option<DateTime<Utc>> {
        self.first_valid_time
    }

    /// Total number of ingested records.
    pub fn len(&self) -> usize {
        self.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Coordinates, FieldGrid};
    use chrono::TimeZone;

    fn record(key: &str, level_type: LevelType, level: u32, fill: f32) -> FieldRecord {
        let grid = FieldGrid::new(1, 2, vec![fill, fill]).unwrap();
        let coords = Coordinates::new(vec![0.0], vec![0.0, 1.0]);
        let valid = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        FieldRecord::new(key, level_type, level, valid, grid, coords)
    }

    #[test]
    fn test_ingest_and_bucket() {
        let mut catalog = FieldCatalog::new();
        catalog.ingest(vec![
            record("Temperature", LevelType::IsobaricInhPa, 500, 1.0),
            record("Temperature", LevelType::IsobaricInhPa, 850, 2.0),
            record("Precipitation rate", LevelType::Surface, 0, 3.0),
        ]);

        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.bucket("Temperature", LevelType::IsobaricInhPa).len(),
            2
        );
        assert_eq!(catalog.bucket("Precipitation rate", LevelType::Surface).len(), 1);
    }

    #[test]
    fn test_absent_variable_yields_empty_bucket() {
        let catalog = FieldCatalog::new();
        assert!(catalog.bucket("Temperature", LevelType::Surface).is_empty());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_bucket_separates_level_types() {
        let mut catalog = FieldCatalog::new();
        catalog.ingest(vec![
            record("Temperature", LevelType::IsobaricInhPa, 500, 1.0),
            record("Temperature", LevelType::HeightAboveGround, 2, 2.0),
        ]);
        assert_eq!(
            catalog.bucket("Temperature", LevelType::IsobaricInhPa).len(),
            1
        );
        assert_eq!(
            catalog
                .bucket("Temperature", LevelType::HeightAboveGround)
                .len(),
            1
        );
        assert!(catalog.bucket("Temperature", LevelType::Surface).is_empty());
    }

    #[test]
    fn test_bucket_preserves_ingestion_order_with_duplicates() {
        let mut catalog = FieldCatalog::new();
        catalog.ingest(vec![
            record("Temperature", LevelType::IsobaricInhPa, 500, 1.0),
            record("Temperature", LevelType::IsobaricInhPa, 500, 2.0),
        ]);
        let bucket = catalog.bucket("Temperature", LevelType::IsobaricInhPa);
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket[0].values().values()[0], 1.0);
        assert_eq!(bucket[1].values().values()[0], 2.0);
    }

    #[test]
    fn test_first_valid_time_tracks_first_record() {
        let mut catalog = FieldCatalog::new();
        assert!(catalog.first_valid_time().is_none());
        catalog.ingest(vec![record("Temperature", LevelType::IsobaricInhPa, 500, 1.0)]);
        assert!(catalog.first_valid_time().is_some());
    }
}
