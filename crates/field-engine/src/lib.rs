//! Field resolution and aggregation for gridded forecast products.
//!
//! Indexes an unordered stream of field records by variable identity and
//! level classification, resolves exact-level queries with a defined
//! tie-break and missing-data policy, memoizes coordinate grids, applies
//! variable-specific unit conversions, extends global grids with a
//! wrap-around column, and computes level-ordered zonal means.
//!
//! # Architecture
//!
//! - [`registry`]: static variable table with named unit conversions
//! - [`catalog`]: per-hour index of records by variable and level type
//! - [`resolver`]: exact-level and level-set queries with duplicate policy
//! - [`coords`]: per-pass coordinate grid memoization
//! - [`cyclic`]: wrap-around longitude column for global grids
//! - [`inventory`]: ordered-unique listing of a source's variables
//! - [`zonal`]: level-ordered zonal-mean cross-sections
//! - [`scheduler`]: forecast-hour orchestration over the reader/renderer
//!   seams, with skip-and-continue failure policy
//!
//! Reading source files and rendering images are external collaborators
//! behind the [`scheduler::FieldReader`] and [`scheduler::ProductRenderer`]
//! traits; this crate never inspects file formats or image bytes.

pub mod catalog;
pub mod config;
pub mod coords;
pub mod cyclic;
pub mod error;
pub mod inventory;
pub mod naming;
pub mod record;
pub mod registry;
pub mod resolver;
pub mod scheduler;
pub mod zonal;

// Re-exports
pub use catalog::FieldCatalog;
pub use config::ScheduleConfig;
pub use coords::CoordinateCache;
pub use error::{FieldError, Result};
pub use inventory::{Inventory, InventoryEntry};
pub use record::{Coordinates, FieldGrid, FieldRecord, LevelType};
pub use registry::{convert_units, UnitConversion, VariableRegistry, VariableSpec};
pub use resolver::{DuplicatePolicy, LevelResolver};
pub use scheduler::{
    CrossSectionProduct, FieldReader, ForecastScheduler, MapProduct, ProductRenderer, RunSummary,
};
pub use zonal::ZonalMeanSeries;
