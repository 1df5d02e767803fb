//! Output file and directory naming conventions.
//!
//! These formats are reproduced exactly for compatibility with existing
//! downstream tooling; do not change them without coordinating.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::record::LevelType;

/// Fallback date tag when no record resolved for the batch.
pub const UNKNOWN_DATE_TAG: &str = "unknown";

/// Lowercased, underscore-separated form of a variable name.
pub fn variable_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Level portion of an output file name: `surface`, `{level}m`, or
/// `{level}hPa` depending on the level-type class.
pub fn level_label(level_type: LevelType, level: u32) -> String {
    match level_type {
        LevelType::Surface => "surface".to_string(),
        LevelType::HeightAboveGround => format!("{}m", level),
        LevelType::IsobaricInhPa => format!("{}hPa", level),
    }
}

/// Human-readable level phrase for product titles.
pub fn level_title(level_type: LevelType, level: u32) -> String {
    match level_type {
        LevelType::Surface => "surface".to_string(),
        LevelType::HeightAboveGround => format!("{}m", level),
        LevelType::IsobaricInhPa => format!("{} hPa", level),
    }
}

/// Map product file name: `{variable_slug}_{level_label}_f{hour:03}.png`.
pub fn product_file_name(
    variable: &str,
    level_type: LevelType,
    level: u32,
    forecast_hour: u32,
) -> String {
    format!(
        "{}_{}_f{:03}.png",
        variable_slug(variable),
        level_label(level_type, level),
        forecast_hour
    )
}

/// Zonal-mean product file name, keyed by the variable's first word.
pub fn zonal_file_name(variable: &str, forecast_hour: u32) -> String {
    let first_word = variable.split_whitespace().next().unwrap_or(variable);
    format!(
        "zonal_mean_{}_f{:03}.png",
        first_word.to_lowercase(),
        forecast_hour
    )
}

/// Date tag for a batch, from the first resolved record's valid date.
pub fn date_tag(valid_time: Option<DateTime<Utc>>) -> String {
    match valid_time {
        Some(t) => t.format("%Y%m%d").to_string(),
        None => UNKNOWN_DATE_TAG.to_string(),
    }
}

/// Per-batch output directory: `{date_tag}_{suffix}` under `root`.
pub fn output_directory(root: &Path, date_tag: &str, suffix: &str) -> PathBuf {
    root.join(format!("{}_{}", date_tag, suffix))
}
