//! Field records and grid containers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FieldError, Result};

/// Classification of the vertical coordinate a field is defined on.
///
/// The meaning of a record's `level` value depends on this class: 0 for a
/// true surface, meters for height above ground, hectopascals for a
/// constant-pressure surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LevelType {
    Surface,
    HeightAboveGround,
    IsobaricInhPa,
}

impl fmt::Display for LevelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LevelType::Surface => "surface",
            LevelType::HeightAboveGround => "heightAboveGround",
            LevelType::IsobaricInhPa => "isobaricInhPa",
        };
        write!(f, "{}", s)
    }
}

/// Row-major 2-D grid of field values.
///
/// Rows follow latitude, columns longitude, matching the data order of
/// regular lat/lon model output.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGrid {
    nx: usize,
    ny: usize,
    data: Vec<f32>,
}

impl FieldGrid {
    /// Create a grid, validating that the data length matches the shape.
    pub fn new(ny: usize, nx: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != nx * ny {
            return Err(FieldError::MalformedGrid(format!(
                "expected {}x{} = {} values, got {}",
                ny,
                nx,
                nx * ny,
                data.len()
            )));
        }
        Ok(Self { nx, ny, data })
    }

    /// Number of columns (longitude points).
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Number of rows (latitude points).
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// All values in row-major order.
    pub fn values(&self) -> &[f32] {
        &self.data
    }

    /// One latitude row.
    pub fn row(&self, j: usize) -> &[f32] {
        &self.data[j * self.nx..(j + 1) * self.nx]
    }

    /// Mean along the longitude axis, one value per latitude row.
    pub fn row_means(&self) -> Vec<f32> {
        (0..self.ny)
            .map(|j| {
                let row = self.row(j);
                row.iter().sum::<f32>() / row.len() as f32
            })
            .collect()
    }

    /// Apply `f` to every value, producing a new grid.
    pub fn map<F>(&self, f: F) -> FieldGrid
    where
        F: Fn(f32) -> f32,
    {
        FieldGrid {
            nx: self.nx,
            ny: self.ny,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Copy of this grid with the first column appended as a wrap-around
    /// duplicate. Callers must ensure `nx > 0`.
    pub(crate) fn with_cyclic_column(&self) -> FieldGrid {
        let mut data = Vec::with_capacity((self.nx + 1) * self.ny);
        for j in 0..self.ny {
            let row = self.row(j);
            data.extend_from_slice(row);
            data.push(row[0]);
        }
        FieldGrid {
            nx: self.nx + 1,
            ny: self.ny,
            data,
        }
    }
}

/// Latitude/longitude axes of a regular grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
}

impl Coordinates {
    pub fn new(lats: Vec<f64>, lons: Vec<f64>) -> Self {
        Self { lats, lons }
    }

    /// Whether the axes match a grid's shape.
    pub fn matches(&self, grid: &FieldGrid) -> bool {
        self.lats.len() == grid.ny() && self.lons.len() == grid.nx()
    }
}

/// One gridded field at one vertical level and one valid time.
///
/// Immutable once created; owned by the catalog that ingested it and
/// discarded when the processing pass ends.
#[derive(Debug, Clone)]
pub struct FieldRecord {
    variable_key: String,
    level_type: LevelType,
    level: u32,
    valid_time: DateTime<Utc>,
    values: FieldGrid,
    coords: Coordinates,
}

impl FieldRecord {
    pub fn new(
        variable_key: impl Into<String>,
        level_type: LevelType,
        level: u32,
        valid_time: DateTime<Utc>,
        values: FieldGrid,
        coords: Coordinates,
    ) -> Self {
        Self {
            variable_key: variable_key.into(),
            level_type,
            level,
            valid_time,
            values,
            coords,
        }
    }

    pub fn variable_key(&self) -> &str {
        &self.variable_key
    }

    pub fn level_type(&self) -> LevelType {
        self.level_type
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn valid_time(&self) -> DateTime<Utc> {
        self.valid_time
    }

    pub fn values(&self) -> &FieldGrid {
        &self.values
    }

    /// Coordinate axes of the record's grid.
    ///
    /// Records sharing a variable key are assumed to share an identical
    /// grid within one pass; [`crate::coords::CoordinateCache`] relies on
    /// that without verifying it.
    pub fn coordinates(&self) -> &Coordinates {
        &self.coords
    }
}
