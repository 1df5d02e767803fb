//! Forecast-hour orchestration over the reader and renderer seams.
//!
//! The scheduler walks two nested loops, forecast hours on the outside and
//! requested levels on the inside, resolving each (variable, level)
//! product through the catalog and handing finished products to the
//! renderer. Every per-variable and per-level failure is recovered locally
//! with skip-and-continue semantics; a single missing hour never aborts
//! the batch.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::catalog::FieldCatalog;
use crate::config::ScheduleConfig;
use crate::coords::CoordinateCache;
use crate::cyclic;
use crate::error::Result;
use crate::naming;
use crate::record::{FieldGrid, FieldRecord, LevelType};
use crate::registry::{self, VariableRegistry, VariableSpec};
use crate::resolver::LevelResolver;
use crate::zonal::{self, ZonalMeanSeries};

/// Produces the field records for one forecast hour.
///
/// One-shot and re-invocable per hour; the engine never inspects the
/// underlying file format.
pub trait FieldReader {
    fn read(&self, forecast_hour: u32) -> Result<Vec<FieldRecord>>;
}

/// Consumes finished products and persists them as images.
///
/// The engine does not inspect results beyond success/failure logging.
pub trait ProductRenderer {
    fn render_map(&self, product: &MapProduct<'_>) -> Result<()>;
    fn render_cross_section(&self, product: &CrossSectionProduct<'_>) -> Result<()>;
}

/// A resolved, converted lat/lon field ready for rendering.
#[derive(Debug)]
pub struct MapProduct<'a> {
    pub values: FieldGrid,
    pub lats: &'a [f64],
    /// Owned because it may carry the appended cyclic column.
    pub lons: Vec<f64>,
    pub title: String,
    pub colormap: &'a str,
    pub colorbar_label: String,
    pub output_path: PathBuf,
}

/// A latitude–level cross-section of zonal means.
#[derive(Debug)]
pub struct CrossSectionProduct<'a> {
    pub series: &'a ZonalMeanSeries,
    pub title: String,
    pub colormap: &'a str,
    pub colorbar_label: String,
    pub output_path: PathBuf,
}

/// Outcome of one scheduler run.
///
/// Partial success is not an error for the batch as a whole; callers
/// inspect the counters to decide what to report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub products_rendered: usize,
    pub products_skipped: usize,
    /// Forecast hours whose source could not be read.
    pub source_failures: Vec<u32>,
}

/// Iterates forecast hours × levels, resolving and aggregating fields and
/// delegating finished products to the renderer.
pub struct ForecastScheduler<'a, R, P> {
    registry: &'a VariableRegistry,
    config: &'a ScheduleConfig,
    reader: &'a R,
    renderer: &'a P,
    resolver: LevelResolver,
}

impl<'a, R, P> ForecastScheduler<'a, R, P>
where
    R: FieldReader,
    P: ProductRenderer,
{
    pub fn new(
        registry: &'a VariableRegistry,
        config: &'a ScheduleConfig,
        reader: &'a R,
        renderer: &'a P,
    ) -> Self {
        Self {
            registry,
            config,
            reader,
            renderer,
            resolver: LevelResolver::new(config.duplicate_policy),
        }
    }

    /// Process every configured forecast hour.
    ///
    /// Only configuration errors are returned; a failed hour is recorded
    /// in the summary and the batch continues.
    pub fn run(&self) -> Result<RunSummary> {
        self.config.validate()?;

        let mut summary = RunSummary::default();
        for &hour in &self.config.forecast_hours {
            match self.reader.read(hour) {
                Ok(records) => self.process_hour(hour, records, &mut summary),
                Err(e) => {
                    warn!(
                        forecast_hour = hour,
                        error = %e,
                        "source unavailable, skipping hour"
                    );
                    summary.source_failures.push(hour);
                }
            }
        }

        info!(
            rendered = summary.products_rendered,
            skipped = summary.products_skipped,
            failed_hours = ?summary.source_failures,
            "batch complete"
        );
        Ok(summary)
    }

    fn process_hour(&self, hour: u32, records: Vec<FieldRecord>, summary: &mut RunSummary) {
        info!(forecast_hour = hour, records = records.len(), "processing forecast hour");

        // Catalog and coordinate cache are scoped to this hour and never
        // reused across hours.
        let mut catalog = FieldCatalog::new();
        catalog.ingest(records);
        let mut coord_cache = CoordinateCache::new();

        let date_tag = naming::date_tag(catalog.first_valid_time());
        let out_dir =
            naming::output_directory(&self.config.output_root, &date_tag, &self.config.output_suffix);
        if let Err(e) = fs::create_dir_all(&out_dir) {
            error!(
                forecast_hour = hour,
                dir = %out_dir.display(),
                error = %e,
                "cannot create output directory, skipping hour"
            );
            return;
        }

        // Surface and near-surface fields resolve once, with no level
        // iteration.
        for spec in self.registry.iter().filter(|s| {
            matches!(
                s.level_type,
                LevelType::Surface | LevelType::HeightAboveGround
            )
        }) {
            match self
                .resolver
                .resolve_first(&catalog, &spec.key, spec.level_type)
            {
                Some(record) => {
                    self.render_field(spec, record, hour, &out_dir, &mut coord_cache, summary)
                }
                None => {
                    warn!(
                        variable = %spec.key,
                        level_type = %spec.level_type,
                        forecast_hour = hour,
                        "variable not available at expected level, skipping"
                    );
                    summary.products_skipped += 1;
                }
            }
        }

        // Isobaric fields iterate the requested levels, pre-validated per
        // variable so every unavailable level is reported in one batch.
        for spec in self.registry.for_level_type(LevelType::IsobaricInhPa) {
            if catalog
                .bucket(&spec.key, LevelType::IsobaricInhPa)
                .is_empty()
            {
                warn!(
                    variable = %spec.key,
                    forecast_hour = hour,
                    "no records on isobaric levels, skipping variable"
                );
                summary.products_skipped += 1;
                continue;
            }

            let (available, missing) = self.resolver.validate_levels(
                &catalog,
                &spec.key,
                LevelType::IsobaricInhPa,
                &self.config.pressure_levels,
            );
            if !missing.is_empty() {
                warn!(
                    variable = %spec.key,
                    level_type = %LevelType::IsobaricInhPa,
                    levels = ?missing,
                    forecast_hour = hour,
                    "requested levels not available"
                );
                summary.products_skipped += missing.len();
            }

            for level in available {
                match self.resolver.resolve_required(
                    &catalog,
                    &spec.key,
                    LevelType::IsobaricInhPa,
                    level,
                ) {
                    Ok(record) => {
                        self.render_field(spec, record, hour, &out_dir, &mut coord_cache, summary)
                    }
                    Err(e) => {
                        // Pre-validated above; only reachable if the
                        // catalog changed underneath us.
                        warn!(forecast_hour = hour, error = %e, "skipping level");
                        summary.products_skipped += 1;
                    }
                }
            }
        }

        // Zonal-mean cross-sections.
        for key in &self.config.zonal_variables {
            let spec = match self.registry.require(key) {
                Ok(spec) => spec,
                Err(e) => {
                    warn!(error = %e, "zonal variable not in registry, skipping");
                    summary.products_skipped += 1;
                    continue;
                }
            };
            let series = zonal::build(&catalog, key, LevelType::IsobaricInhPa);
            if series.is_empty() {
                warn!(
                    variable = %key,
                    forecast_hour = hour,
                    "no zonal means available, skipping"
                );
                summary.products_skipped += 1;
                continue;
            }

            let product = CrossSectionProduct {
                series: &series,
                title: format!("Zonal Mean {}", key),
                colormap: &spec.colormap,
                colorbar_label: format!("{} ({})", key, spec.units),
                output_path: out_dir.join(naming::zonal_file_name(key, hour)),
            };
            match self.renderer.render_cross_section(&product) {
                Ok(()) => {
                    info!(path = %product.output_path.display(), "saved cross-section product");
                    summary.products_rendered += 1;
                }
                Err(e) => {
                    warn!(
                        variable = %key,
                        forecast_hour = hour,
                        error = %e,
                        "failed to render cross-section, skipping"
                    );
                    summary.products_skipped += 1;
                }
            }
        }
    }

    /// Convert, optionally extend, and render one resolved record.
    fn render_field(
        &self,
        spec: &VariableSpec,
        record: &FieldRecord,
        hour: u32,
        out_dir: &Path,
        coord_cache: &mut CoordinateCache,
        summary: &mut RunSummary,
    ) {
        let converted = registry::convert_units(spec, record.values());

        let coords = match coord_cache.get(&spec.key, || Ok(record.coordinates().clone())) {
            Ok(coords) => coords.clone(),
            Err(e) => {
                warn!(
                    variable = %spec.key,
                    level = record.level(),
                    forecast_hour = hour,
                    error = %e,
                    "could not obtain coordinates, skipping"
                );
                summary.products_skipped += 1;
                return;
            }
        };

        if !coords.matches(&converted) {
            warn!(
                variable = %spec.key,
                level_type = %record.level_type(),
                level = record.level(),
                forecast_hour = hour,
                "coordinate axes do not match grid shape, skipping"
            );
            summary.products_skipped += 1;
            return;
        }

        let (values, lons) = if self.config.cyclic {
            match cyclic::add_cyclic_point(&converted, &coords.lons) {
                Ok(extended) => extended,
                Err(e) => {
                    warn!(
                        variable = %spec.key,
                        level = record.level(),
                        forecast_hour = hour,
                        error = %e,
                        "cyclic extension failed, skipping"
                    );
                    summary.products_skipped += 1;
                    return;
                }
            }
        } else {
            (converted, coords.lons.clone())
        };

        let product = MapProduct {
            values,
            lats: &coords.lats,
            lons,
            title: format!(
                "{} at {}\nValid: {}",
                spec.key,
                naming::level_title(record.level_type(), record.level()),
                record.valid_time().format("%Y-%m-%d %H:%M UTC")
            ),
            colormap: &spec.colormap,
            colorbar_label: format!("{} ({})", spec.key, spec.units),
            output_path: out_dir.join(naming::product_file_name(
                &spec.key,
                record.level_type(),
                record.level(),
                hour,
            )),
        };

        match self.renderer.render_map(&product) {
            Ok(()) => {
                info!(path = %product.output_path.display(), "saved map product");
                summary.products_rendered += 1;
            }
            Err(e) => {
                warn!(
                    variable = %spec.key,
                    level = record.level(),
                    forecast_hour = hour,
                    error = %e,
                    "failed to render product, skipping"
                );
                summary.products_skipped += 1;
            }
        }
    }
}
