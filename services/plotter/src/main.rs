//! Forecast field plotting service.
//!
//! Resolves (variable, level) products from GRIB2 forecast files and
//! renders PNG heatmaps plus zonal-mean cross-sections.

mod reader;
mod render;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use field_engine::config::parse_u32_list;
use field_engine::{
    DuplicatePolicy, ForecastScheduler, Inventory, ScheduleConfig, VariableRegistry,
};
use reader::{GribFieldReader, ReaderConfig};
use render::PngRenderer;

#[derive(Parser, Debug)]
#[command(name = "plotter")]
#[command(about = "Renders gridded forecast fields to PNG products")]
struct Args {
    /// Forecast hours to process, comma separated (e.g. "0,6,12")
    #[arg(short = 'f', long, default_value = "0")]
    forecast_hours: String,

    /// Isobaric levels in hPa, comma separated
    #[arg(short = 'l', long, default_value = "500")]
    pressure_levels: String,

    /// Directory containing the GRIB2 source files
    #[arg(short, long, default_value = ".")]
    input_dir: PathBuf,

    /// Root directory for rendered products
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Source file name template; `{fh}` is replaced by the zero-padded
    /// forecast hour
    #[arg(long, default_value = "gfs.t00z.pgrb2.0p25.f{fh}")]
    file_template: String,

    /// Fixed suffix combined with the batch date tag for the output
    /// directory
    #[arg(long, default_value = "level_plots")]
    output_suffix: String,

    /// Model cycle time used to derive valid times (RFC 3339)
    #[arg(long, default_value = "2025-04-01T00:00:00Z")]
    cycle: DateTime<Utc>,

    /// List the variables present in each source file instead of rendering
    #[arg(long)]
    inspect: bool,

    /// Append a wrap-around longitude column (global grids only)
    #[arg(long)]
    cyclic: bool,

    /// Skip zonal-mean cross-section products
    #[arg(long)]
    no_zonal: bool,

    /// Resolve duplicate records with last-wins precedence
    #[arg(long)]
    prefer_latest: bool,

    /// Optional YAML variable table overriding the built-in GFS set
    #[arg(long)]
    variables: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting forecast field plotter");

    // Configuration errors are fatal before any processing begins.
    let forecast_hours = parse_u32_list(&args.forecast_hours, "forecast hour")?;
    let pressure_levels = parse_u32_list(&args.pressure_levels, "pressure level")?;

    let reader = GribFieldReader::new(ReaderConfig {
        input_dir: args.input_dir,
        file_template: args.file_template,
        cycle: args.cycle,
    });

    if args.inspect {
        for &hour in &forecast_hours {
            let inventory = reader.inventory(hour)?;
            println!("\nVariables in {}:\n", reader.source_path(hour).display());
            print!("{}", inventory_table(&inventory));
        }
        return Ok(());
    }

    let registry = match &args.variables {
        Some(path) => VariableRegistry::from_yaml_file(path)?,
        None => VariableRegistry::builtin_gfs(),
    };
    info!(variables = registry.len(), "Loaded variable registry");

    let zonal_variables = if args.no_zonal {
        vec![]
    } else {
        ScheduleConfig::default().zonal_variables
    };

    let config = ScheduleConfig {
        forecast_hours,
        pressure_levels,
        cyclic: args.cyclic,
        zonal_variables,
        duplicate_policy: if args.prefer_latest {
            DuplicatePolicy::LastWins
        } else {
            DuplicatePolicy::FirstWins
        },
        output_root: args.output_dir,
        output_suffix: args.output_suffix,
    };

    let renderer = PngRenderer::new();

    let scheduler = ForecastScheduler::new(&registry, &config, &reader, &renderer);
    let summary = scheduler.run()?;

    info!(
        rendered = summary.products_rendered,
        skipped = summary.products_skipped,
        failed_hours = ?summary.source_failures,
        "Plotter finished"
    );

    Ok(())
}

/// Fixed-width listing of an inventory, one row per distinct entry.
fn inventory_table(inventory: &Inventory) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<40} {:<12} {:<20} {}\n",
        "Name", "Short Name", "Level Type", "Level"
    ));
    out.push_str(&format!("{}\n", "=".repeat(80)));
    for entry in inventory.iter() {
        out.push_str(&format!(
            "{:<40} {:<12} {:<20} {}\n",
            entry.name, entry.short_name, entry.level_type, entry.level
        ));
    }
    out
}
