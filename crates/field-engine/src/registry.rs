//! Variable metadata table and unit conversions.
//!
//! The registry is a static, data-driven table of plain structs; unit
//! conversions are looked up by name from a fixed set rather than carried
//! as per-entry closures, so the table can be loaded from configuration
//! and tested independent of any plotting code.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{FieldError, Result};
use crate::record::{FieldGrid, LevelType};

// ============================================================================
// Unit Conversions
// ============================================================================

/// Named unit conversion applied to raw field values before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitConversion {
    /// Kelvin to Celsius: `x - 273.15`.
    KelvinToCelsius,
}

impl UnitConversion {
    /// Look up a conversion by its configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "kelvin_to_celsius" => Some(UnitConversion::KelvinToCelsius),
            _ => None,
        }
    }

    #[inline]
    pub fn apply(&self, value: f32) -> f32 {
        match self {
            UnitConversion::KelvinToCelsius => value - 273.15,
        }
    }
}

/// Apply a variable's registered conversion to a grid of raw values.
///
/// Pure function of its inputs: the raw grid is never mutated, and a spec
/// without a conversion yields an unchanged copy.
pub fn convert_units(spec: &VariableSpec, raw: &FieldGrid) -> FieldGrid {
    match spec.conversion {
        Some(conversion) => raw.map(|v| conversion.apply(v)),
        None => raw.clone(),
    }
}

// ============================================================================
// Variable Registry
// ============================================================================

/// Display and conversion metadata for one variable.
///
/// Configuration, not behavior; read-only after construction.
#[derive(Debug, Clone)]
pub struct VariableSpec {
    /// Canonical variable name, e.g. "2 metre temperature".
    pub key: String,
    /// Units after conversion, for colorbar labels.
    pub units: String,
    /// Colormap name handed to the renderer.
    pub colormap: String,
    /// Level-type class this variable is plotted on.
    pub level_type: LevelType,
    /// Optional conversion applied to raw values.
    pub conversion: Option<UnitConversion>,
}

/// Read-only table of variable specs, shared by reference across a
/// processing pass.
///
/// Iteration order is insertion order; when the same key is inserted
/// twice, `lookup` returns the first entry.
#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    specs: Vec<VariableSpec>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, spec: VariableSpec) {
        self.specs.push(spec);
    }

    /// Pure read; `None` means "skip this variable", never a fatal error.
    pub fn lookup(&self, key: &str) -> Option<&VariableSpec> {
        self.specs.iter().find(|s| s.key == key)
    }

    /// Like [`lookup`](Self::lookup), but an unknown key is a
    /// `VariableNotFound` error, for callers that were explicitly asked
    /// for the variable.
    pub fn require(&self, key: &str) -> Result<&VariableSpec> {
        self.lookup(key)
            .ok_or_else(|| FieldError::VariableNotFound(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableSpec> {
        self.specs.iter()
    }

    /// Specs plotted on the given level-type class, in insertion order.
    pub fn for_level_type(&self, level_type: LevelType) -> impl Iterator<Item = &VariableSpec> {
        self.specs.iter().filter(move |s| s.level_type == level_type)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Built-in table for the GFS surface, near-surface, and isobaric
    /// products this tool plots.
    pub fn builtin_gfs() -> Self {
        let mut registry = Self::new();
        let entries: [(&str, &str, &str, LevelType, Option<UnitConversion>); 10] = [
            (
                "Convective available potential energy",
                "J/kg",
                "YlGnBu",
                LevelType::Surface,
                None,
            ),
            (
                "2 metre temperature",
                "°C",
                "coolwarm",
                LevelType::HeightAboveGround,
                Some(UnitConversion::KelvinToCelsius),
            ),
            (
                "2 metre relative humidity",
                "%",
                "BrBG",
                LevelType::HeightAboveGround,
                None,
            ),
            (
                "Precipitation rate",
                "kg/m^2/s",
                "Blues",
                LevelType::Surface,
                None,
            ),
            (
                "Temperature",
                "°C",
                "coolwarm",
                LevelType::IsobaricInhPa,
                Some(UnitConversion::KelvinToCelsius),
            ),
            (
                "Relative humidity",
                "%",
                "BrBG",
                LevelType::IsobaricInhPa,
                None,
            ),
            (
                "Geopotential height",
                "m",
                "viridis",
                LevelType::IsobaricInhPa,
                None,
            ),
            (
                "U component of wind",
                "m/s",
                "RdBu_r",
                LevelType::IsobaricInhPa,
                None,
            ),
            (
                "V component of wind",
                "m/s",
                "RdBu_r",
                LevelType::IsobaricInhPa,
                None,
            ),
            (
                "Vertical velocity",
                "Pa/s",
                "bwr",
                LevelType::IsobaricInhPa,
                None,
            ),
        ];
        for (key, units, colormap, level_type, conversion) in entries {
            registry.insert(VariableSpec {
                key: key.to_string(),
                units: units.to_string(),
                colormap: colormap.to_string(),
                level_type,
                conversion,
            });
        }
        registry
    }

    /// Load a variable table from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read, the YAML is
    /// malformed, a conversion name is unknown, or no variables are
    /// defined. Callers should treat these as fatal startup errors.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            FieldError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;

        let file: VariableFile = serde_yaml::from_str(&contents).map_err(|e| {
            FieldError::InvalidConfig(format!("invalid YAML in {}: {}", path.display(), e))
        })?;

        if file.variables.is_empty() {
            return Err(FieldError::InvalidConfig(format!(
                "no variables defined in {}",
                path.display()
            )));
        }

        let mut registry = Self::new();
        for entry in file.variables {
            let conversion = match entry.conversion.as_deref() {
                Some(name) => Some(UnitConversion::from_name(name).ok_or_else(|| {
                    FieldError::InvalidConfig(format!(
                        "unknown conversion '{}' for variable '{}'",
                        name, entry.name
                    ))
                })?),
                None => None,
            };
            registry.insert(VariableSpec {
                key: entry.name,
                units: entry.units,
                colormap: entry.colormap,
                level_type: entry.level_type,
                conversion,
            });
        }

        debug!(
            path = %path.display(),
            variables = registry.len(),
            "Loaded variable registry"
        );
        Ok(registry)
    }
}

/// On-disk shape of a variable table.
#[derive(Debug, Deserialize)]
struct VariableFile {
    #[serde(default)]
    variables: Vec<VariableEntry>,
}

#[derive(Debug, Deserialize)]
struct VariableEntry {
    name: String,
    units: String,
    colormap: String,
    level_type: LevelType,
    #[serde(default)]
    conversion: Option<String>,
}
