//! Route Comparison CLI
//!
//! Generates a constellation, trains the Q-learning router between two
//! satellites on a background worker, floods the same pair and reports both.
//!
//! Usage:
//!   route-compare --satellites 100 --start 0 --end 87 \
//!                 --episodes 3000 --output data/route_comparison.json

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use constellation_routing::compare::ComparisonReport;
use constellation_routing::flood::route_from_edges;
use constellation_routing::node::{advance_all, generate};
use constellation_routing::{worker, RoutingConfig, RoutingEngine};
use orbital_mechanics::walker::{Distribution, DEFAULT_SPEED_DEG};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Layout {
    Uniform,
    Equatorial,
    Polar,
    Walker,
}

#[derive(Parser, Debug)]
#[command(
    name = "route-compare",
    about = "Compare learned satellite routing against a flood baseline"
)]
struct Args {
    /// Number of satellites to generate
    #[arg(short = 'n', long, default_value_t = 100)]
    satellites: usize,

    /// Constellation layout preset
    #[arg(short, long, value_enum, default_value_t = Layout::Uniform)]
    distribution: Layout,

    /// Orbital planes for the walker layout
    #[arg(long, default_value_t = 10)]
    planes: u32,

    /// Start satellite index
    #[arg(short, long, default_value_t = 0)]
    start: usize,

    /// Destination satellite index
    #[arg(short, long, default_value_t = 87)]
    end: usize,

    /// Training episodes (defaults to the config value)
    #[arg(long)]
    episodes: Option<usize>,

    /// Ticks to advance the constellation before routing
    #[arg(long, default_value_t = 0)]
    ticks: u32,

    /// Seed for layout generation and exploration
    #[arg(long)]
    seed: Option<u64>,

    /// JSON routing config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the comparison report as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "constellation_routing=debug,route_compare=debug"
    } else {
        "constellation_routing=info,route_compare=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => RoutingConfig::from_json_file(path)?,
        None => RoutingConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(episodes) = args.episodes {
        config = config.with_episodes(episodes);
    }
    let episodes = config.episodes;

    if args.start >= args.satellites || args.end >= args.satellites {
        bail!(
            "start {} and end {} must both be below the satellite count {}",
            args.start,
            args.end,
            args.satellites
        );
    }

    let distribution = match args.distribution {
        Layout::Uniform => Distribution::Uniform,
        Layout::Equatorial => Distribution::Equatorial,
        Layout::Polar => Distribution::Polar,
        Layout::Walker => Distribution::Walker {
            planes: args.planes,
            phasing: 1,
            inclination_deg: 53.0,
        },
    };

    let mut layout_rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let mut satellites = generate(&distribution, args.satellites, 0.0, DEFAULT_SPEED_DEG, &mut layout_rng)?;

    for _ in 0..args.ticks {
        advance_all(&mut satellites);
    }

    info!("{}", "=".repeat(60));
    info!("Constellation Route Comparison");
    info!("{}", "=".repeat(60));
    info!(
        "{} satellites ({:?}), routing {} -> {} over {} episodes",
        satellites.len(),
        args.distribution,
        args.start,
        args.end,
        episodes
    );

    let handle = worker::spawn_training(satellites, args.start, args.end, episodes, config.clone())?;
    let trained = handle.wait()?;
    let mut satellites = trained.satellites;
    let learned_path = trained.report.path;

    let mut engine = RoutingEngine::new(config)?;
    let flood_edges = engine.flood(&mut satellites, args.start, args.end)?;
    let comparison = engine.compare(&learned_path, &flood_edges)?;

    info!("\n{}", "=".repeat(60));
    info!("RESULTS");
    info!("{}", "=".repeat(60));
    info!(
        " -> Flood baseline ({:3} satellites): {:.0} km",
        comparison.baseline.hop_count, comparison.baseline.distance_km
    );
    info!(
        " ->  Learned route ({:3} satellites): {:.0} km",
        comparison.learned.hop_count, comparison.learned.distance_km
    );
    info!(
        "Learned route {:?} ({} of {} episodes reached the destination)",
        learned_path, trained.report.successful_episodes, trained.report.episodes
    );
    let flood_route = route_from_edges(&flood_edges, args.end);
    if flood_route.is_empty() && args.start != args.end {
        info!("Flood did not reach the destination");
    } else {
        info!("Flood route {:?}", flood_route);
    }

    if let Some(output) = &args.output {
        info!("Writing report to {:?}", output);
        let report = ComparisonReport::new(learned_path, flood_edges, comparison);
        let writer = BufWriter::new(File::create(output)?);
        serde_json::to_writer_pretty(writer, &report)?;
    }

    Ok(())
}
