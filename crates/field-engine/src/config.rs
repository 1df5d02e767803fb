//! Scheduler configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{FieldError, Result};
use crate::resolver::DuplicatePolicy;

/// One batch of work for the scheduler.
///
/// Constructed once by the caller and passed by reference; there is no
/// process-wide mutable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Forecast hours to process, in order.
    pub forecast_hours: Vec<u32>,
    /// Requested isobaric levels, in hPa.
    pub pressure_levels: Vec<u32>,
    /// Append a wrap-around longitude column before rendering map
    /// products. Only correct for global grids; keep off for regional
    /// ones.
    pub cyclic: bool,
    /// Variables aggregated into zonal-mean cross-sections.
    pub zonal_variables: Vec<String>,
    /// Duplicate precedence for level resolution.
    pub duplicate_policy: DuplicatePolicy,
    /// Root under which the per-batch output directory is created.
    pub output_root: PathBuf,
    /// Fixed suffix combined with the batch date tag.
    pub output_suffix: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            forecast_hours: vec![0],
            pressure_levels: vec![500],
            cyclic: false,
            zonal_variables: vec![
                "U component of wind".to_string(),
                "V component of wind".to_string(),
            ],
            duplicate_policy: DuplicatePolicy::default(),
            output_root: PathBuf::from("."),
            output_suffix: "level_plots".to_string(),
        }
    }
}

impl ScheduleConfig {
    /// Reject configurations that cannot produce any work.
    ///
    /// Configuration errors are fatal and must abort before any
    /// processing begins.
    pub fn validate(&self) -> Result<()> {
        if self.forecast_hours.is_empty() {
            return Err(FieldError::InvalidConfig(
                "no forecast hours requested".to_string(),
            ));
        }
        if self.output_suffix.is_empty() {
            return Err(FieldError::InvalidConfig(
                "output directory suffix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a comma-separated list of non-negative integers, e.g. `"500,700,850"`.
///
/// Any non-numeric entry is `InvalidConfig`; callers treat this as fatal.
pub fn parse_u32_list(input: &str, what: &str) -> Result<Vec<u32>> {
    input
        .split(',')
        .map(|token| {
            let token = token.trim();
            token.parse::<u32>().map_err(|_| {
                FieldError::InvalidConfig(format!("invalid {} '{}'", what, token))
            })
        })
        .collect()
}
