//! World facade: seed, generator and chunk store around one player.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use voxelgen_core::ChunkKey;

use crate::biome::BiomeId;
use crate::config::GenerationConfig;
use crate::generator::ChunkGenerator;
use crate::host::{BlockHost, BlockRegistry};
use crate::storage::{ChunkStore, FaultCounters, UpdateSummary};

/// Snapshot of the world's streaming state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorldStats {
    pub seed: u64,
    pub chunk_size: i32,
    pub render_distance: i32,
    pub worker_count: usize,
    pub loaded_chunks: usize,
    pub pending_chunks: usize,
    pub cached_chunks: usize,
    pub total_blocks: usize,
    pub dispatched: u64,
    pub faults: FaultCounters,
}

/// Deterministic world around a moving player.
///
/// Handles realized through a host are only destroyed by [`update`],
/// [`regenerate`] or [`shutdown`]; dropping the world without calling
/// `shutdown` leaves the host's blocks in place.
///
/// [`update`]: WorldGenerator::update
/// [`regenerate`]: WorldGenerator::regenerate
/// [`shutdown`]: WorldGenerator::shutdown
pub struct WorldGenerator {
    config: GenerationConfig,
    seed: u64,
    registry: Arc<dyn BlockRegistry>,
    generator: Arc<ChunkGenerator>,
    store: ChunkStore,
}

impl std::fmt::Debug for WorldGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldGenerator")
            .field("seed", &self.seed)
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl WorldGenerator {
    /// Build a world from settings; an unset seed is drawn at random.
    pub fn new(config: GenerationConfig, registry: Arc<dyn BlockRegistry>) -> Self {
        let config = config.validated();
        let seed = config.resolve_seed();
        let (generator, store) = Self::build(&config, seed, &registry);

        info!(
            seed,
            chunk_size = config.chunk_size,
            render_distance = config.render_distance,
            workers = store.worker_count(),
            "World generator initialized"
        );

        Self {
            config,
            seed,
            registry,
            generator,
            store,
        }
    }

    fn build(
        config: &GenerationConfig,
        seed: u64,
        registry: &Arc<dyn BlockRegistry>,
    ) -> (Arc<ChunkGenerator>, ChunkStore) {
        let generator = Arc::new(ChunkGenerator::new(
            seed,
            config.chunk_span(),
            Arc::clone(registry),
        ));
        let store = ChunkStore::new(generator.clone(), config);
        (generator, store)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Settings after validation.
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn generator(&self) -> &ChunkGenerator {
        &self.generator
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Surface height of a world column.
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        self.generator.height_at(x, z)
    }

    /// Biome of a world column.
    pub fn biome_at(&self, x: i32, z: i32) -> BiomeId {
        self.generator.biome_at(x, z)
    }

    /// Chunk containing a world position.
    pub fn chunk_coords(&self, world_x: f64, world_z: f64) -> ChunkKey {
        ChunkKey::from_world(world_x, world_z, self.store.chunk_size())
    }

    /// Synchronously load the `(2r+1)^2` chunks around the spawn chunk.
    ///
    /// Returns the number of chunks loaded by this call.
    pub fn generate_spawn_area(
        &mut self,
        spawn_x: f64,
        spawn_z: f64,
        radius: u32,
        host: &mut dyn BlockHost,
    ) -> usize {
        let center = self.chunk_coords(spawn_x, spawn_z);
        let radius = radius.min(i32::MAX as u32) as i32;
        let total = (2 * radius as usize + 1).pow(2);
        info!(%center, radius, total, "Generating spawn area");

        let mut loaded = 0;
        for (index, key) in center.square_around(radius).enumerate() {
            if self.store.load_now(key, host) {
                loaded += 1;
            }
            debug!(chunk = %key, progress = index + 1, total, "Spawn chunk ready");
        }

        info!(
            loaded,
            blocks = self.store.total_blocks(),
            "Spawn area generated"
        );
        loaded
    }

    /// Stream chunks around the host's player; a no-op without a player.
    pub fn update(&mut self, host: &mut dyn BlockHost) -> UpdateSummary {
        match host.player_position() {
            Some((x, z)) => self.update_around(x, z, host),
            None => UpdateSummary::default(),
        }
    }

    /// Stream chunks around an explicit position.
    pub fn update_around(
        &mut self,
        player_x: f64,
        player_z: f64,
        host: &mut dyn BlockHost,
    ) -> UpdateSummary {
        self.store.update(player_x, player_z, host)
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            seed: self.seed,
            chunk_size: self.store.chunk_size(),
            render_distance: self.store.render_distance(),
            worker_count: self.store.worker_count(),
            loaded_chunks: self.store.loaded_count(),
            pending_chunks: self.store.pending_count(),
            cached_chunks: self.store.cached_count(),
            total_blocks: self.store.total_blocks(),
            dispatched: self.store.dispatched(),
            faults: self.store.faults(),
        }
    }

    /// Tear the world down and rebuild it from `new_seed`.
    pub fn regenerate(&mut self, new_seed: u64, host: &mut dyn BlockHost) {
        info!(old_seed = self.seed, new_seed, "Regenerating world");
        self.store.shutdown(host);
        self.seed = new_seed;
        self.config.seed = Some(new_seed);
        let (generator, store) = Self::build(&self.config, new_seed, &self.registry);
        self.generator = generator;
        self.store = store;
    }

    /// Join generation workers and destroy every realized block.
    pub fn shutdown(&mut self, host: &mut dyn BlockHost) {
        let stats = self.stats();
        self.store.shutdown(host);
        info!(
            seed = self.seed,
            dispatched = stats.dispatched,
            worker_faults = stats.faults.worker_faults,
            "World shut down"
        );
    }
}
