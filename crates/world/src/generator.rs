//! Chunk generation: biome, terrain and decoration over one chunk footprint.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::biome::{BiomeClassifier, BiomeId, BiomeTable};
use crate::column::{CaveParams, ColumnSynthesizer};
use crate::error::GenerationError;
use crate::heightmap::Heightmap;
use crate::host::BlockRegistry;
use crate::scheduler::PlacementSource;
use crate::trees::FeaturePlacer;
use tracing::{debug, instrument, warn};
use voxelgen_core::{BlockPlacement, BlockPos, ChunkKey};

/// Columns around the footprint that decoration may read or touch: trees
/// rooted one column out and their leaves one column further.
const FEATURE_MARGIN: i32 = 2;

/// Placements of one chunk plus what was lost on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkOutput {
    /// Registered placements, terrain first, then features.
    pub placements: Vec<BlockPlacement>,
    /// Placements dropped because their block type is unknown to the registry.
    pub unregistered: usize,
    /// Columns skipped after a synthesis failure.
    pub failed_columns: usize,
}

/// Deterministic generator of chunk placements.
///
/// Output is a pure function of the seed, the chunk size, the biome table and
/// the chunk key. Every field is read-only after construction, so one
/// generator is shared by all workers behind an `Arc`.
pub struct ChunkGenerator {
    seed: u64,
    chunk_size: i32,
    classifier: BiomeClassifier,
    table: BiomeTable,
    columns: ColumnSynthesizer,
    features: FeaturePlacer,
    registry: Arc<dyn BlockRegistry>,
}

impl fmt::Debug for ChunkGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkGenerator")
            .field("seed", &self.seed)
            .field("chunk_size", &self.chunk_size)
            .field("caves", self.columns.caves())
            .finish_non_exhaustive()
    }
}

impl ChunkGenerator {
    /// Generator with the built-in biome table and cave parameters.
    pub fn new(seed: u64, chunk_size: i32, registry: Arc<dyn BlockRegistry>) -> Self {
        Self::with_parts(
            seed,
            chunk_size,
            BiomeTable::default(),
            CaveParams::default(),
            registry,
        )
    }

    /// Generator with a custom biome table and cave tuning.
    pub fn with_parts(
        seed: u64,
        chunk_size: i32,
        table: BiomeTable,
        caves: CaveParams,
        registry: Arc<dyn BlockRegistry>,
    ) -> Self {
        Self {
            seed,
            chunk_size: chunk_size.max(1),
            classifier: BiomeClassifier::new(seed),
            table,
            columns: ColumnSynthesizer::with_caves(seed, caves),
            features: FeaturePlacer::new(seed),
            registry,
        }
    }

    /// World seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Edge length of a chunk footprint.
    pub fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    /// Biome parameters in use.
    pub fn table(&self) -> &BiomeTable {
        &self.table
    }

    /// Biome of a world column.
    pub fn biome_at(&self, x: i32, z: i32) -> BiomeId {
        self.classifier.classify(x, z)
    }

    /// Surface height of a world column.
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        let biome = self.biome_at(x, z);
        self.columns.surface_height(x, z, self.table.get(biome))
    }

    /// Heights and biomes of every column in `key`.
    pub fn heightmap(&self, key: ChunkKey) -> Heightmap {
        Heightmap::generate(
            &self.classifier,
            &self.columns,
            &self.table,
            key,
            self.chunk_size,
        )
    }

    /// Reject placements whose block type the registry does not know.
    pub fn check_registered(&self, placement: &BlockPlacement) -> Result<(), GenerationError> {
        if self.registry.is_registered(placement.block) {
            Ok(())
        } else {
            Err(GenerationError::UnregisteredBlockType {
                block: placement.block.to_string(),
                pos: placement.pos,
            })
        }
    }

    /// Placements of `key`, dropping what the registry does not know.
    pub fn generate(&self, key: ChunkKey) -> Vec<BlockPlacement> {
        self.generate_chunk(key).placements
    }

    /// Generate `key` and report what was dropped.
    ///
    /// Terrain for every column is emitted first. Trees rooted within one
    /// column of the footprint are then added, clipped to the footprint and
    /// never replacing a position that is already taken.
    ///
    /// A chunk whose footprint cannot be addressed with i32 coordinates
    /// yields no placements and counts every column as failed.
    #[instrument(skip(self), fields(chunk = %key, seed = self.seed))]
    pub fn generate_chunk(&self, key: ChunkKey) -> ChunkOutput {
        let start = Instant::now();
        let size = self.chunk_size;
        let mut output = ChunkOutput::default();

        let Some((origin_x, origin_z)) = key.checked_origin(size, FEATURE_MARGIN) else {
            warn!("Chunk lies outside addressable world space");
            output.failed_columns = size as usize * size as usize;
            return output;
        };
        let inside = |pos: BlockPos| {
            (origin_x..origin_x + size).contains(&pos.x)
                && (origin_z..origin_z + size).contains(&pos.z)
        };

        let mut placements = Vec::new();
        let mut occupied: HashSet<BlockPos> = HashSet::new();

        // Pass 1: terrain
        for world_z in origin_z..origin_z + size {
            for world_x in origin_x..origin_x + size {
                let params = self.table.get(self.biome_at(world_x, world_z));
                match self.columns.synthesize(world_x, world_z, params) {
                    Ok(column) => {
                        for placement in column.placements {
                            occupied.insert(placement.pos);
                            placements.push(placement);
                        }
                    }
                    Err(err) => {
                        warn!(%err, "Skipping column");
                        output.failed_columns += 1;
                    }
                }
            }
        }

        // Pass 2: trees, including those rooted just outside the footprint
        for world_z in origin_z - 1..origin_z + size + 1 {
            for world_x in origin_x - 1..origin_x + size + 1 {
                let params = self.table.get(self.biome_at(world_x, world_z));
                let Ok(surface) = self.columns.checked_surface_top(world_x, world_z, params)
                else {
                    continue;
                };
                for placement in self
                    .features
                    .maybe_place_tree(world_x, surface, world_z, params)
                {
                    if inside(placement.pos) && occupied.insert(placement.pos) {
                        placements.push(placement);
                    }
                }
            }
        }

        let before = placements.len();
        placements.retain(|p| match self.check_registered(p) {
            Ok(()) => true,
            Err(err) => {
                debug!(%err, "Dropping placement");
                false
            }
        });
        output.unregistered = before - placements.len();
        output.placements = placements;

        debug!(
            blocks = output.placements.len(),
            unregistered = output.unregistered,
            failed_columns = output.failed_columns,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Chunk generation complete"
        );
        output
    }
}

impl PlacementSource for ChunkGenerator {
    fn generate(&self, key: ChunkKey) -> ChunkOutput {
        self.generate_chunk(key)
    }
}
