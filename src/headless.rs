//! Headless world driver: an in-memory host with a player walking east.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use voxelgen_core::{BlockHandle, BlockPos};
use voxelgen_world::{BlockHost, GenerationConfig, NameRegistry, WorldGenerator, WorldStats};

pub struct HeadlessConfig {
    pub generation: GenerationConfig,
    pub ticks: u64,
    /// Blocks walked along +x per tick.
    pub walk_speed: f64,
    pub spawn_radius: u32,
    pub stats_out: Option<PathBuf>,
}

/// Totals of one headless run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub chunks_requested: usize,
    pub chunks_released: usize,
    pub peak_loaded_chunks: usize,
    pub player_position: (f64, f64),
    pub stats: WorldStats,
}

/// Host that keeps blocks in a map and moves its player on demand.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    next_handle: u64,
    blocks: HashMap<BlockHandle, (String, BlockPos)>,
    player: (f64, f64),
}

impl HeadlessHost {
    pub fn walk(&mut self, dx: f64, dz: f64) {
        self.player.0 += dx;
        self.player.1 += dz;
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl BlockHost for HeadlessHost {
    fn create_block(&mut self, block: &str, pos: BlockPos) -> Option<BlockHandle> {
        self.next_handle += 1;
        let handle = BlockHandle(self.next_handle);
        self.blocks.insert(handle, (block.to_string(), pos));
        Some(handle)
    }

    fn destroy_block(&mut self, handle: BlockHandle) {
        self.blocks.remove(&handle);
    }

    fn player_position(&self) -> Option<(f64, f64)> {
        Some(self.player)
    }
}

pub fn run(cfg: HeadlessConfig) -> Result<RunSummary> {
    let mut host = HeadlessHost::default();
    let mut world = WorldGenerator::new(cfg.generation, Arc::new(NameRegistry::with_defaults()));

    world.generate_spawn_area(0.0, 0.0, cfg.spawn_radius, &mut host);

    let mut requested = 0;
    let mut released = 0;
    let mut peak_loaded = 0;
    let log_every = (cfg.ticks / 10).max(1);

    for tick in 1..=cfg.ticks {
        host.walk(cfg.walk_speed, 0.0);
        let summary = world.update(&mut host);
        requested += summary.requested;
        released += summary.released;

        let stats = world.stats();
        peak_loaded = peak_loaded.max(stats.loaded_chunks);
        if tick % log_every == 0 {
            info!(
                tick,
                x = host.player.0,
                loaded = stats.loaded_chunks,
                pending = stats.pending_chunks,
                blocks = stats.total_blocks,
                "Headless progress"
            );
        }
    }

    let summary = RunSummary {
        ticks: cfg.ticks,
        chunks_requested: requested,
        chunks_released: released,
        peak_loaded_chunks: peak_loaded,
        player_position: host.player,
        stats: world.stats(),
    };
    info!(
        requested,
        released,
        loaded = summary.stats.loaded_chunks,
        blocks = summary.stats.total_blocks,
        seed = summary.stats.seed,
        "Headless run complete"
    );

    if let Some(path) = &cfg.stats_out {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote stats to {}", path.display());
    }

    world.shutdown(&mut host);
    if host.block_count() > 0 {
        warn!(
            remaining = host.block_count(),
            "Blocks left behind after shutdown"
        );
    }

    Ok(summary)
}
