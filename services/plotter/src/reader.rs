//! GRIB2-backed field reader.
//!
//! Maps GRIB2 submessages onto [`FieldRecord`]s: parameter codes are
//! translated to canonical variable keys through a small built-in table,
//! fixed-surface codes to level-type classes, and the packed data is
//! decoded into a row-major grid with 1-D lat/lon axes.

use chrono::{DateTime, Duration, Utc};
use grib::codetables::{CodeTable4_2, Lookup};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::{debug, warn};

use field_engine::{
    Coordinates, FieldError, FieldGrid, FieldReader, FieldRecord, Inventory, InventoryEntry,
    LevelType, Result,
};

// GRIB2 fixed-surface codes understood by this reader (Code Table 4.5).
const SURFACE: u8 = 1;
const HEIGHT_ABOVE_GROUND: u8 = 103;
const ISOBARIC: u8 = 100;

// Height of the conventional near-surface level, in meters.
const NEAR_SURFACE_HEIGHT_M: u32 = 2;

/// Maps GRIB2 (discipline, category, number, level code) onto canonical
/// variable names and short identifiers.
///
/// The level code participates in the key because near-surface products
/// carry distinct names: (0,0,0) at 2 m above ground is "2 metre
/// temperature" while the same parameter code on a pressure surface is
/// plain "Temperature".
#[derive(Debug, Clone)]
pub struct ParameterTable {
    params: HashMap<(u8, u8, u8, u8), (&'static str, &'static str)>,
}

impl ParameterTable {
    /// Parameters produced by the GFS products this tool plots.
    pub fn builtin_gfs() -> Self {
        let entries: [((u8, u8, u8, u8), (&'static str, &'static str)); 10] = [
            (
                (0, 7, 6, SURFACE),
                ("Convective available potential energy", "cape"),
            ),
            ((0, 1, 7, SURFACE), ("Precipitation rate", "prate")),
            ((0, 0, 0, HEIGHT_ABOVE_GROUND), ("2 metre temperature", "2t")),
            (
                (0, 1, 1, HEIGHT_ABOVE_GROUND),
                ("2 metre relative humidity", "2r"),
            ),
            ((0, 0, 0, ISOBARIC), ("Temperature", "t")),
            ((0, 1, 1, ISOBARIC), ("Relative humidity", "r")),
            ((0, 3, 5, ISOBARIC), ("Geopotential height", "gh")),
            ((0, 2, 2, ISOBARIC), ("U component of wind", "u")),
            ((0, 2, 3, ISOBARIC), ("V component of wind", "v")),
            ((0, 2, 8, ISOBARIC), ("Vertical velocity", "w")),
        ];
        Self {
            params: entries.into_iter().collect(),
        }
    }

    /// `(name, short name)` for a parameter at a given level.
    ///
    /// The height-above-ground names are specific to the conventional 2 m
    /// level; the same parameter at another height (e.g. 80 m relative
    /// humidity) is not one of these products.
    pub fn lookup(
        &self,
        discipline: u8,
        category: u8,
        number: u8,
        level_code: u8,
        level: u32,
    ) -> Option<(&'static str, &'static str)> {
        if level_code == HEIGHT_ABOVE_GROUND && level != NEAR_SURFACE_HEIGHT_M {
            return None;
        }
        self.params
            .get(&(discipline, category, number, level_code))
            .copied()
    }
}

/// Where and when to read from.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Directory containing the GRIB2 source files.
    pub input_dir: PathBuf,
    /// File name template; `{fh}` is replaced by the zero-padded hour.
    pub file_template: String,
    /// Model cycle time; valid time = cycle + forecast hour.
    pub cycle: DateTime<Utc>,
}

/// Reads one forecast hour's GRIB2 file into field records.
pub struct GribFieldReader {
    config: ReaderConfig,
    table: ParameterTable,
}

impl GribFieldReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self {
            config,
            table: ParameterTable::builtin_gfs(),
        }
    }

    pub(crate) fn source_path(&self, forecast_hour: u32) -> PathBuf {
        let name = self
            .config
            .file_template
            .replace("{fh}", &format!("{:03}", forecast_hour));
        self.config.input_dir.join(name)
    }

    /// Scan one forecast hour's file and list every distinct
    /// (variable, level) combination it contains, in comparator order.
    ///
    /// Unlike [`FieldReader::read`], this covers messages outside the
    /// built-in parameter table: names for those come from the GRIB2 code
    /// tables, with a placeholder short identifier.
    pub fn inventory(&self, forecast_hour: u32) -> Result<Inventory> {
        let path = self.source_path(forecast_hour);
        let file = File::open(&path).map_err(|e| FieldError::SourceUnavailable {
            forecast_hour,
            reason: format!("{}: {}", path.display(), e),
        })?;
        let grib2 =
            grib::from_reader(BufReader::new(file)).map_err(|e| FieldError::SourceUnavailable {
                forecast_hour,
                reason: format!("{}: {:?}", path.display(), e),
            })?;

        let mut inventory = Inventory::new();
        for (_index, submessage) in grib2.iter() {
            let discipline = submessage.indicator().discipline;
            let prod_def = submessage.prod_def();
            let (Some(category), Some(number)) =
                (prod_def.parameter_category(), prod_def.parameter_number())
            else {
                continue;
            };
            let Some((first_surface, _)) = prod_def.fixed_surfaces() else {
                continue;
            };

            let level_code = first_surface.surface_type;
            let (level_type, level) = match level_code {
                SURFACE => (LevelType::Surface.to_string(), 0),
                HEIGHT_ABOVE_GROUND => (
                    LevelType::HeightAboveGround.to_string(),
                    first_surface.value() as u32,
                ),
                ISOBARIC => (
                    LevelType::IsobaricInhPa.to_string(),
                    (first_surface.value() / 100.0).round() as u32,
                ),
                code => (format!("surfaceType{}", code), first_surface.value() as u32),
            };

            let (name, short_name) =
                match self.table.lookup(discipline, category, number, level_code, level) {
                    Some((name, short)) => (name.to_string(), short.to_string()),
                    None => (
                        CodeTable4_2::new(discipline, category)
                            .lookup(usize::from(number))
                            .to_string(),
                        "-".to_string(),
                    ),
                };

            inventory.insert(InventoryEntry {
                name,
                short_name,
                level_type,
                level,
            });
        }
        Ok(inventory)
    }
}

impl FieldReader for GribFieldReader {
    fn read(&self, forecast_hour: u32) -> Result<Vec<FieldRecord>> {
        let path = self.source_path(forecast_hour);
        let file = File::open(&path).map_err(|e| FieldError::SourceUnavailable {
            forecast_hour,
            reason: format!("{}: {}", path.display(), e),
        })?;
        let grib2 =
            grib::from_reader(BufReader::new(file)).map_err(|e| FieldError::SourceUnavailable {
                forecast_hour,
                reason: format!("{}: {:?}", path.display(), e),
            })?;

        let valid_time = self.config.cycle + Duration::hours(i64::from(forecast_hour));
        let mut records = Vec::new();

        for (_index, submessage) in grib2.iter() {
            let discipline = submessage.indicator().discipline;
            let prod_def = submessage.prod_def();
            let (Some(category), Some(number)) =
                (prod_def.parameter_category(), prod_def.parameter_number())
            else {
                continue;
            };
            let Some((first_surface, _)) = prod_def.fixed_surfaces() else {
                continue;
            };

            let level_code = first_surface.surface_type;
            let (level_type, level) = match level_code {
                SURFACE => (LevelType::Surface, 0),
                HEIGHT_ABOVE_GROUND => {
                    (LevelType::HeightAboveGround, first_surface.value() as u32)
                }
                // Pressure surfaces are coded in Pa; levels are hPa.
                ISOBARIC => (
                    LevelType::IsobaricInhPa,
                    (first_surface.value() / 100.0).round() as u32,
                ),
                _ => continue,
            };

            let Some((key, _)) =
                self.table.lookup(discipline, category, number, level_code, level)
            else {
                continue;
            };

            let latlons: Vec<(f32, f32)> = match submessage.latlons() {
                Ok(points) => points.collect(),
                Err(e) => {
                    warn!(
                        variable = %key,
                        level = level,
                        error = ?e,
                        "could not compute grid coordinates, skipping message"
                    );
                    continue;
                }
            };

            let decoder = match grib::Grib2SubmessageDecoder::from(submessage) {
                Ok(decoder) => decoder,
                Err(e) => {
                    warn!(variable = %key, level = level, error = ?e, "could not create decoder, skipping message");
                    continue;
                }
            };
            let values: Vec<f32> = match decoder.dispatch() {
                Ok(values) => values.collect(),
                Err(e) => {
                    warn!(variable = %key, level = level, error = ?e, "could not decode values, skipping message");
                    continue;
                }
            };

            let Some((coords, ny, nx)) = axes_from_latlons(&latlons) else {
                warn!(
                    variable = %key,
                    level = level,
                    points = latlons.len(),
                    "grid points do not form a regular lat/lon grid, skipping message"
                );
                continue;
            };
            if values.len() != nx * ny {
                warn!(
                    variable = %key,
                    level = level,
                    expected = nx * ny,
                    actual = values.len(),
                    "data size does not match grid shape, skipping message"
                );
                continue;
            }

            match FieldGrid::new(ny, nx, values) {
                Ok(grid) => records.push(FieldRecord::new(
                    key, level_type, level, valid_time, grid, coords,
                )),
                Err(e) => {
                    warn!(variable = %key, level = level, error = %e, "skipping message");
                }
            }
        }

        debug!(
            forecast_hour = forecast_hour,
            path = %path.display(),
            records = records.len(),
            "read GRIB2 source"
        );
        Ok(records)
    }
}

/// Recover 1-D axes from a row-major lat/lon point sequence of a regular
/// grid. Returns the axes together with the (ny, nx) shape, or `None` if
/// the points do not factor into rows of constant latitude.
fn axes_from_latlons(latlons: &[(f32, f32)]) -> Option<(Coordinates, usize, usize)> {
    if latlons.is_empty() {
        return None;
    }
    let first_lat = latlons[0].0;
    let nx = latlons
        .iter()
        .take_while(|(lat, _)| *lat == first_lat)
        .count();
    if nx == 0 || latlons.len() % nx != 0 {
        return None;
    }
    let ny = latlons.len() / nx;
    let lons: Vec<f64> = latlons[..nx].iter().map(|&(_, lon)| f64::from(lon)).collect();
    let lats: Vec<f64> = latlons
        .iter()
        .step_by(nx)
        .map(|&(lat, _)| f64::from(lat))
        .collect();
    Some((Coordinates::new(lats, lons), ny, nx))
}
