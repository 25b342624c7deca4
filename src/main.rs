mod config;
mod headless;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Stream procedurally generated voxel terrain around a walking player", long_about = None)]
struct Args {
    /// Generation config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// World seed (random when unset)
    #[arg(long)]
    seed: Option<u64>,
    /// Chunk edge length in blocks
    #[arg(long)]
    chunk_size: Option<u32>,
    /// Chunk radius kept loaded around the player
    #[arg(long)]
    render_distance: Option<u32>,
    /// Background generation threads (0 generates inline)
    #[arg(long)]
    workers: Option<usize>,
    /// Number of update ticks to run
    #[arg(long, default_value_t = 200)]
    ticks: u64,
    /// Blocks walked along +x per tick
    #[arg(long, default_value_t = 0.5)]
    walk_speed: f64,
    /// Chunk radius generated synchronously before the first tick
    #[arg(long, default_value_t = 1)]
    spawn_radius: u32,
    /// Write a JSON run summary here
    #[arg(long)]
    stats_out: Option<PathBuf>,
    /// Save the effective generation config to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize tracing with INFO level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("Starting voxelgen v{}", env!("CARGO_PKG_VERSION"));

    let mut generation = match &args.config {
        Some(path) => config::load_from_path(path),
        None => config::load(),
    };
    if let Some(seed) = args.seed {
        generation.seed = Some(seed);
    }
    if let Some(chunk_size) = args.chunk_size {
        generation.chunk_size = chunk_size;
    }
    if let Some(render_distance) = args.render_distance {
        generation.render_distance = render_distance;
    }
    if let Some(workers) = args.workers {
        generation.worker_count = workers;
    }

    if let Some(path) = &args.write_config {
        config::save_to_path(&generation, path)?;
        info!("Wrote generation config to {}", path.display());
        return Ok(());
    }

    headless::run(headless::HeadlessConfig {
        generation,
        ticks: args.ticks,
        walk_speed: args.walk_speed,
        spawn_radius: args.spawn_radius,
        stats_out: args.stats_out,
    })?;

    Ok(())
}
