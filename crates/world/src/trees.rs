//! Tree generation for biome decoration.
//!
//! Each column rolls its own RNG stream from the world seed and column
//! coordinates, so the same column grows the same tree no matter which chunk
//! or thread generates it.

use crate::biome::BiomeParameters;
use rand::Rng;
use voxelgen_core::block::names;
use voxelgen_core::{column_hash, scoped_rng, BlockPlacement};

/// Shortest trunk, in blocks.
pub const MIN_TRUNK_HEIGHT: i32 = 3;
/// Tallest trunk, in blocks.
pub const MAX_TRUNK_HEIGHT: i32 = 6;
/// Probability that a crown candidate becomes a leaf block.
pub const LEAF_DENSITY: f64 = 0.6;

/// Places decoration features on top of finished columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeaturePlacer {
    seed: u64,
}

impl FeaturePlacer {
    /// Create a placer for the given world seed.
    pub fn new(world_seed: u64) -> Self {
        Self { seed: world_seed }
    }

    /// Roll for a tree rooted at `(x, surface_height, z)`.
    ///
    /// The trunk starts at `surface_height` and rises 3 to 6 blocks. The
    /// crown covers the Chebyshev radius-1 ring of the top trunk layer and
    /// the layer above it, skipping the trunk column. Flooded columns never
    /// grow trees.
    pub fn maybe_place_tree(
        &self,
        x: i32,
        surface_height: i32,
        z: i32,
        params: &BiomeParameters,
    ) -> Vec<BlockPlacement> {
        if surface_height < params.water_level {
            return Vec::new();
        }

        let mut rng = scoped_rng(self.seed, column_hash(x, z));
        if rng.gen::<f64>() >= params.tree_chance {
            return Vec::new();
        }

        let trunk_height = rng.gen_range(MIN_TRUNK_HEIGHT..=MAX_TRUNK_HEIGHT);
        let mut placements = Vec::with_capacity(trunk_height as usize + 16);

        for y in surface_height..surface_height + trunk_height {
            placements.push(BlockPlacement::new(names::WOOD, x, y, z));
        }

        let trunk_top = surface_height + trunk_height - 1;
        for y in trunk_top..=trunk_top + 1 {
            for dx in -1..=1 {
                for dz in -1..=1 {
                    if dx == 0 && dz == 0 {
                        continue;
                    }
                    // Roll every candidate so the stream does not depend on filtering.
                    if rng.gen_bool(LEAF_DENSITY) {
                        placements.push(BlockPlacement::new(names::LEAVES, x + dx, y, z + dz));
                    }
                }
            }
        }

        placements
    }
}
