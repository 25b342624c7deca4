//! Property-based tests for chunk seam continuity
//!
//! Validates that chunk boundaries are always continuous regardless of:
//! - World seed
//! - Chunk coordinates
//! - Adjacent chunk positions
//!
//! Critical invariants:
//! - Height difference at seams stays within the biome table's bound
//! - Biome banding is exact
//! - No two placements share a position, within or across chunks

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use voxelgen_core::ChunkKey;
use voxelgen_world::{
    check_seam_continuity, max_seam_diff, BiomeId, ChunkGenerator, NameRegistry,
};

const CHUNK_SIZE: i32 = 16;

fn generator(seed: u64) -> ChunkGenerator {
    ChunkGenerator::new(seed, CHUNK_SIZE, Arc::new(NameRegistry::with_defaults()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: Adjacent chunks always have continuous heightmaps at X-axis seams
    #[test]
    fn heightmap_x_seam_continuity(
        world_seed in any::<u64>(),
        chunk_x in -100i32..100i32,
        chunk_z in -100i32..100i32,
    ) {
        let gen = generator(world_seed);
        let hm1 = gen.heightmap(ChunkKey::new(chunk_x, chunk_z));
        let hm2 = gen.heightmap(ChunkKey::new(chunk_x + 1, chunk_z));
        let last = CHUNK_SIZE as usize - 1;
        let tolerance = max_seam_diff(gen.table());

        for z in 0..CHUNK_SIZE as usize {
            let diff = (hm1.get(last, z) - hm2.get(0, z)).abs();
            prop_assert!(
                diff <= tolerance,
                "X-seam discontinuity at chunk ({}, {}) z={}: height diff = {}",
                chunk_x, chunk_z, z, diff
            );
        }
    }

    /// Property: Adjacent chunks always have continuous heightmaps at Z-axis seams
    #[test]
    fn heightmap_z_seam_continuity(
        world_seed in any::<u64>(),
        chunk_x in -100i32..100i32,
        chunk_z in -100i32..100i32,
    ) {
        let gen = generator(world_seed);
        prop_assert!(check_seam_continuity(
            &gen,
            ChunkKey::new(chunk_x, chunk_z),
            ChunkKey::new(chunk_x, chunk_z + 1),
        ));
    }

    /// Property: Heightmap generation is deterministic
    #[test]
    fn heightmap_determinism(
        world_seed in any::<u64>(),
        chunk_x in -100i32..100i32,
        chunk_z in -100i32..100i32,
    ) {
        let key = ChunkKey::new(chunk_x, chunk_z);
        prop_assert_eq!(generator(world_seed).heightmap(key), generator(world_seed).heightmap(key));
    }

    /// Property: Biome banding is a pure threshold function of the noise value
    #[test]
    fn biome_banding_is_exact(v in -1.0f64..=1.0f64) {
        let expected = if v < -0.3 {
            BiomeId::Desert
        } else if v < 0.1 {
            BiomeId::Plains
        } else if v < 0.4 {
            BiomeId::Hills
        } else {
            BiomeId::Mountains
        };
        prop_assert_eq!(BiomeId::from_noise(v), expected);
    }

    /// Property: Neighboring chunks never emit the same position twice
    #[test]
    fn placements_never_overlap(
        world_seed in any::<u64>(),
        chunk_x in -50i32..50i32,
        chunk_z in -50i32..50i32,
    ) {
        let gen = generator(world_seed);
        let mut seen = HashSet::new();
        for dx in 0..2 {
            for dz in 0..2 {
                for placement in gen.generate(ChunkKey::new(chunk_x + dx, chunk_z + dz)) {
                    prop_assert!(seen.insert(placement.pos), "duplicate {}", placement);
                }
            }
        }
    }
}
