//! Heightmap generation for terrain.
//!
//! Resolves biome and surface height for every column of a chunk footprint.
//! Chunk generation reads the same values, so a heightmap always agrees with
//! the placements generated for its chunk.

use crate::biome::{BiomeClassifier, BiomeId, BiomeTable};
use crate::column::ColumnSynthesizer;
use crate::generator::ChunkGenerator;
use voxelgen_core::ChunkKey;

/// Upper bound on how far a normalized noise channel moves between
/// neighboring columns at terrain scale.
pub const MAX_NOISE_STEP: f64 = 0.25;

/// Largest height jump expected between neighboring columns under `table`.
///
/// Biome noise moves too slowly to skip a band, so neighbors share a biome
/// or sit in consecutive bands. The bound is the widest base and variation
/// change between consecutive bands, plus the largest variation times
/// [`MAX_NOISE_STEP`], plus one for flooring.
pub fn max_seam_diff(table: &BiomeTable) -> i32 {
    let bands = BiomeId::all();
    let max_variation = bands
        .iter()
        .map(|&id| table.get(id).height_variation)
        .fold(0.0, f64::max);
    let max_transition = bands
        .windows(2)
        .map(|pair| {
            let (a, b) = (table.get(pair[0]), table.get(pair[1]));
            (a.base_height - b.base_height).abs() + (a.height_variation - b.height_variation).abs()
        })
        .fold(0.0, f64::max);
    (max_transition + max_variation * MAX_NOISE_STEP).ceil() as i32 + 1
}

/// Per-column surface heights and biomes of one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Heightmap {
    key: ChunkKey,
    size: usize,
    /// Indexed as `[z * size + x]` for row-major iteration.
    heights: Vec<i32>,
    biomes: Vec<BiomeId>,
}

impl Heightmap {
    /// Generate the heightmap of `key` for footprints of `chunk_size` blocks.
    pub fn generate(
        classifier: &BiomeClassifier,
        columns: &ColumnSynthesizer,
        table: &BiomeTable,
        key: ChunkKey,
        chunk_size: i32,
    ) -> Self {
        let size = chunk_size.max(1) as usize;
        let (origin_x, origin_z) = key.origin(chunk_size.max(1));
        let mut heights = Vec::with_capacity(size * size);
        let mut biomes = Vec::with_capacity(size * size);

        for local_z in 0..size as i32 {
            for local_x in 0..size as i32 {
                let world_x = origin_x.saturating_add(local_x);
                let world_z = origin_z.saturating_add(local_z);
                let biome = classifier.classify(world_x, world_z);
                heights.push(columns.surface_height(world_x, world_z, table.get(biome)));
                biomes.push(biome);
            }
        }

        Self {
            key,
            size,
            heights,
            biomes,
        }
    }

    /// Chunk this heightmap belongs to.
    pub fn key(&self) -> ChunkKey {
        self.key
    }

    /// Edge length in columns.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Surface height at a local column.
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds.
    pub fn get(&self, local_x: usize, local_z: usize) -> i32 {
        assert!(local_x < self.size, "local_x out of bounds");
        assert!(local_z < self.size, "local_z out of bounds");
        self.heights[local_z * self.size + local_x]
    }

    /// Biome at a local column.
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds.
    pub fn biome(&self, local_x: usize, local_z: usize) -> BiomeId {
        assert!(local_x < self.size, "local_x out of bounds");
        assert!(local_z < self.size, "local_z out of bounds");
        self.biomes[local_z * self.size + local_x]
    }

    /// Get the minimum height in this heightmap.
    pub fn min_height(&self) -> i32 {
        self.heights.iter().copied().min().unwrap_or_default()
    }

    /// Get the maximum height in this heightmap.
    pub fn max_height(&self) -> i32 {
        self.heights.iter().copied().max().unwrap_or_default()
    }

    /// Get the average height in this heightmap.
    pub fn avg_height(&self) -> f32 {
        let sum: i64 = self.heights.iter().map(|&h| h as i64).sum();
        sum as f32 / self.heights.len() as f32
    }
}

/// Check that two edge-adjacent chunks have no height jump above
/// [`max_seam_diff`] of the generator's table along their shared boundary.
///
/// Returns false for chunks that are not edge-adjacent.
pub fn check_seam_continuity(generator: &ChunkGenerator, a: ChunkKey, b: ChunkKey) -> bool {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let hm1 = generator.heightmap(first);
    let hm2 = generator.heightmap(second);
    let last = hm1.size() - 1;
    let tolerance = max_seam_diff(generator.table());

    if first.x.checked_add(1) == Some(second.x) && second.z == first.z {
        // Compare first's +X edge with second's -X edge
        (0..hm1.size()).all(|z| (hm1.get(last, z) - hm2.get(0, z)).abs() <= tolerance)
    } else if second.x == first.x && first.z.checked_add(1) == Some(second.z) {
        (0..hm1.size()).all(|x| (hm1.get(x, last) - hm2.get(x, 0)).abs() <= tolerance)
    } else {
        false
    }
}
