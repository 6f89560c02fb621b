//! viewshed-points - per-observer cumulative viewshed analysis
//!
//! For every point of the input layer: compute its viewshed from the
//! elevation surface, measure the visible area, count the other observer
//! points inside the viewshed, find the distance to the nearest one, and
//! commit one row into the output point layer.
//!
//! Runs inside a GRASS session; the toolbox modules must be on PATH.

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use viewshed_tools::adapters::grass::GrassToolbox;
use viewshed_tools::core::{accumulate, Job, ViewshedParams};
use viewshed_tools::ports::{MapKind, RasterOps, VectorOps};

/// Compute and analyze viewsheds
#[derive(Parser)]
#[command(name = "viewshed-points")]
#[command(version)]
#[command(about = "Per-observer viewshed area, visible-neighbor count and nearest distance")]
struct Cli {
    /// Name of input elevation raster map
    #[arg(long)]
    elevation: String,

    /// Name of input observer points vector map
    #[arg(long)]
    points: String,

    /// Name for the output points vector map
    #[arg(long)]
    output_points: String,

    /// Basename for the retained per-observer viewshed rasters
    #[arg(long)]
    viewshed_basename: String,

    /// Viewing elevation above the ground
    #[arg(long, default_value_t = 1.75)]
    observer_elevation: f64,

    /// Maximum visibility radius; -1 for infinity
    #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
    max_distance: f64,

    /// Consider the curvature of the earth (current ellipsoid)
    #[arg(short = 'c', long)]
    curvature: bool,

    /// Keep the temporary maps instead of removing them on exit
    #[arg(short = 'k', long)]
    keep: bool,

    /// Allow replacing an existing output map
    #[arg(long)]
    overwrite: bool,

    /// Verbose output (logs every toolbox invocation)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to initialize logging")?;

    let toolbox = GrassToolbox::new();

    if toolbox
        .layer_exists(&cli.output_points)
        .context("checking for an existing output layer")?
    {
        if !cli.overwrite {
            bail!(
                "output layer '{}' already exists (use --overwrite to replace it)",
                cli.output_points
            );
        }
        toolbox
            .remove(MapKind::Vector, &[cli.output_points.clone()])
            .context("removing the existing output layer")?;
    }

    let params = ViewshedParams::default()
        .with_observer_elevation(cli.observer_elevation)
        .with_max_distance(cli.max_distance)
        .with_curvature(cli.curvature);
    let job = Job::new(
        &cli.elevation,
        &cli.points,
        &cli.output_points,
        &cli.viewshed_basename,
    )
    .with_params(params)
    .keep_temporaries(cli.keep);

    let records = accumulate(&toolbox, &job)
        .with_context(|| format!("viewshed accumulation over '{}' failed", cli.points))?;

    println!(
        "{} observer points written to '{}'",
        records.len(),
        cli.output_points
    );
    Ok(())
}
