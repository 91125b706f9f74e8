//! crowdtrack CLI - obfuscate a single track
//!
//! Usage:
//!   crowdtrack-cli crowd <track.csv> --landuse <landuse.json> [--output <dir>]
//!   crowdtrack-cli params <track.csv> [--k <n>]
//!
//! Tracks are CSV files with projected `X` and `Y` columns. Land use is a
//! JSON array of `{ "class", "exterior", "interiors" }` polygon records in
//! the same coordinate system.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use crowdtrack::{crowd, CrowdConfig, CrowdOutput, CrowdParameters, ExtensionStep, LandUseLayer, Point};

#[derive(Parser)]
#[command(name = "crowdtrack-cli")]
#[command(about = "Obfuscate a track by rasterization, mimicry and template masking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full crowding pipeline on a track
    Crowd {
        /// CSV file with X and Y columns
        track: PathBuf,

        /// JSON file with land-use polygons
        #[arg(short, long)]
        landuse: PathBuf,

        /// Target decoy count per point
        #[arg(short, long, default_value = "10")]
        k: u32,

        /// Similarity acceptance threshold
        #[arg(short, long, default_value = "0.02")]
        p: f64,

        /// Land-use buffer radius
        #[arg(long, default_value = "50")]
        lag: f64,

        /// Lattice step for buffer areas (default: lag / 8)
        #[arg(long)]
        spacing: Option<f64>,

        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Output directory for results
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Print the parameters derived from a track
    Params {
        /// CSV file with X and Y columns
        track: PathBuf,

        /// Target decoy count per point
        #[arg(short, long, default_value = "10")]
        k: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let result = match cli.command {
        Commands::Crowd {
            track,
            landuse,
            k,
            p,
            lag,
            spacing,
            seed,
            output,
        } => {
            let config = CrowdConfig {
                k,
                p,
                lag,
                sample_spacing: spacing,
                seed,
            };
            run_crowd(&track, &landuse, &config, &output)
        }
        Commands::Params { track, k } => run_params(&track, k),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// One row of the input CSV.
#[derive(Deserialize)]
struct TrackRow {
    #[serde(rename = "X", alias = "x")]
    x: f64,
    #[serde(rename = "Y", alias = "y")]
    y: f64,
}

/// Read a track from a CSV file with X/Y columns
fn load_track(path: &Path) -> Result<Vec<Point>, String> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    let points = reader
        .deserialize::<TrackRow>()
        .map(|row| row.map(|r| Point::new(r.x, r.y)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("cannot parse {}: {}", path.display(), e))?;

    if points.is_empty() {
        return Err(format!("no track points found in {}", path.display()));
    }
    Ok(points)
}

fn load_landuse(path: &Path) -> Result<LandUseLayer, String> {
    LandUseLayer::from_json_file(path).map_err(|e| format!("{}: {}", path.display(), e))
}

fn run_params(track_path: &Path, k: u32) -> Result<(), String> {
    let track = load_track(track_path)?;
    let params = CrowdParameters::derive(&track, k).map_err(|e| e.to_string())?;

    println!("Track: {} points", track.len());
    println!("  distance parameter d: {:.3}", params.d);
    println!("  grid size m:          {}", params.m);
    println!("  template radius r:    {}", params.r);
    Ok(())
}

fn run_crowd(
    track_path: &Path,
    landuse_path: &Path,
    config: &CrowdConfig,
    output_dir: &Path,
) -> Result<(), String> {
    let track = load_track(track_path)?;
    let land = load_landuse(landuse_path)?;
    println!(
        "Loaded {} track points and {} land-use polygons",
        track.len(),
        land.len()
    );

    let output = crowd(&track, &land, config).map_err(|e| e.to_string())?;

    println!("\n{}", "-".repeat(60));
    println!("RESULTS");
    println!("{}", "-".repeat(60));
    println!(
        "  d={:.3} m={} r={}",
        output.parameters.d, output.parameters.m, output.parameters.r
    );
    println!(
        "  Rasterized: {} points, {} distinct cells",
        output.rasterized.len(),
        output.rasterized.cells().len()
    );
    for (class, prob) in output.table.iter() {
        println!("    {:<20} {:.4}", class.as_str(), prob);
    }
    let appended = output.steps.iter().filter(|s| s.is_appended()).count();
    println!(
        "  Extended: {} points ({} of {} requested appended)",
        output.extended.len(),
        appended,
        output.requested
    );
    for (i, step) in output.steps.iter().enumerate() {
        if let ExtensionStep::NoCandidateFound = step {
            println!("    step {}: no sufficiently similar candidate", i);
        }
    }
    println!(
        "  Masked: {} points in {} runs",
        output.masked.point_count(),
        output.masked.len()
    );

    write_outputs(&output, output_dir)
}

fn write_outputs(output: &CrowdOutput, output_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(output_dir)
        .map_err(|e| format!("cannot create {}: {}", output_dir.display(), e))?;

    write_points_csv(&output_dir.join("rastertrack.csv"), output.rasterized.points())?;
    write_points_csv(&output_dir.join("faketrack.csv"), &output.extended)?;
    write_points_csv(&output_dir.join("maskedtrack.csv"), &output.masked.points())?;
    write_geojson(&output_dir.join("crowd.geojson"), output)?;

    println!("\n[Export] Written to: {}", output_dir.display());
    println!("  rastertrack.csv, faketrack.csv, maskedtrack.csv, crowd.geojson");
    Ok(())
}

/// Write points as an X,Y CSV
fn write_points_csv(path: &Path, points: &[Point]) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
    writer.write_record(["X", "Y"]).map_err(|e| e.to_string())?;
    for p in points {
        writer
            .write_record([p.x.to_string(), p.y.to_string()])
            .map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())
}

/// Write the three outputs as one GeoJSON FeatureCollection
fn write_geojson(path: &Path, output: &CrowdOutput) -> Result<(), String> {
    let coords = |points: &[Point]| -> Vec<[f64; 2]> { points.iter().map(|p| [p.x, p.y]).collect() };

    let collection = json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "layer": "rastertrack" },
                "geometry": { "type": "LineString", "coordinates": coords(output.rasterized.points()) }
            },
            {
                "type": "Feature",
                "properties": { "layer": "faketrack" },
                "geometry": { "type": "LineString", "coordinates": coords(&output.extended) }
            },
            {
                "type": "Feature",
                "properties": { "layer": "maskedtrack" },
                "geometry": { "type": "MultiPoint", "coordinates": coords(&output.masked.points()) }
            }
        ]
    });

    let file = File::create(path).map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &collection).map_err(|e| e.to_string())
}
