//! viewshed-sum - cumulative viewshed raster (stub)
//!
//! Placeholder for the cumulative-viewshed-sum tool: it declares the full
//! option schema and echoes what was parsed, but performs no computation.
//! Useful for documenting and testing the option surface.

use clap::Parser;

/// Performs a "cumulative viewshed analysis" using a vector points map as
/// input viewing locations
#[derive(Parser)]
#[command(name = "viewshed-sum")]
#[command(version)]
#[command(about = "Cumulative viewshed raster over a set of viewing locations (stub)")]
struct Cli {
    /// Name of input elevation raster map
    #[arg(long)]
    input: String,

    /// Name of input vector points map containing the set of viewpoints
    #[arg(long)]
    vector: String,

    /// Output cumulative viewshed raster map
    #[arg(long)]
    output: String,

    /// Viewing elevation above the ground
    #[arg(long, default_value_t = 1.75)]
    observer_elevation: f64,

    /// Offset for target elevation above the ground
    #[arg(long, default_value_t = 0.0)]
    target_elevation: f64,

    /// Keep all interim viewshed maps
    #[arg(short = 'k', long)]
    keep: bool,
}

fn main() {
    let cli = Cli::parse();

    println!("Options:");
    println!("  input: {}", cli.input);
    println!("  vector: {}", cli.vector);
    println!("  output: {}", cli.output);
    println!("  observer_elevation: {}", cli.observer_elevation);
    println!("  target_elevation: {}", cli.target_elevation);
    println!("Flags:");
    println!("  keep: {}", cli.keep);
}
