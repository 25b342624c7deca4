//! Vertical column synthesis: bedrock, carved underground, surface and water.

use crate::biome::BiomeParameters;
use crate::error::GenerationError;
use crate::noise::{NoiseConfig, NoiseField};
use voxelgen_core::block::names;
use voxelgen_core::{BlockPlacement, BlockType};

/// Lowest bedrock layer.
pub const BEDROCK_MIN_Y: i32 = -5;
/// First layer above the bedrock band.
pub const BEDROCK_TOP: i32 = -3;
/// Material of the bedrock band.
pub const BEDROCK_BLOCK: BlockType = names::STONE;
/// Highest y a surface or water column may reach.
pub const MAX_WORLD_Y: i32 = 255;

/// Cave generation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CaveParams {
    /// World-to-lattice scale of the cave channel
    pub scale: f64,
    /// Noise above this value carves air
    pub threshold: f64,
    /// Minimum Y level for caves (inclusive)
    pub min_y: i32,
    /// Maximum Y level for caves (exclusive)
    pub max_y: i32,
    /// Y is multiplied by this before sampling (flattens caves horizontally when < 1)
    pub vertical_compression: f64,
}

impl Default for CaveParams {
    fn default() -> Self {
        Self {
            scale: 0.05,
            threshold: 0.3,
            min_y: BEDROCK_TOP,
            max_y: 0,
            vertical_compression: 2.0,
        }
    }
}

/// Output of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedColumn {
    /// First y above the column's surface block.
    pub surface_height: i32,
    /// Placements in emission order.
    pub placements: Vec<BlockPlacement>,
}

/// Builds the terrain of single columns from the height and cave channels.
#[derive(Debug, Clone)]
pub struct ColumnSynthesizer {
    height_noise: NoiseField,
    cave_noise: NoiseField,
    caves: CaveParams,
}

impl ColumnSynthesizer {
    /// Create a synthesizer with default cave parameters.
    pub fn new(world_seed: u64) -> Self {
        Self::with_caves(world_seed, CaveParams::default())
    }

    /// Create a synthesizer with tuned cave parameters.
    pub fn with_caves(world_seed: u64, caves: CaveParams) -> Self {
        Self {
            height_noise: NoiseField::new(NoiseConfig::terrain(world_seed)),
            cave_noise: NoiseField::new(NoiseConfig::cave(world_seed, caves.scale)),
            caves,
        }
    }

    /// Cave parameters in use.
    pub fn caves(&self) -> &CaveParams {
        &self.caves
    }

    /// Raw height-channel value at a column.
    pub fn height_noise(&self, x: i32, z: i32) -> f64 {
        self.height_noise.sample(x as f64, z as f64)
    }

    /// Surface height of a column, floored toward negative infinity.
    pub fn surface_height(&self, x: i32, z: i32, params: &BiomeParameters) -> i32 {
        (params.base_height + self.height_noise(x, z) * params.height_variation).floor() as i32
    }

    /// Surface height as emitted by [`synthesize`](Self::synthesize), which
    /// never lets the surface block sink into the bedrock band.
    pub fn surface_top(&self, x: i32, z: i32, params: &BiomeParameters) -> i32 {
        self.surface_height(x, z, params).max(BEDROCK_TOP + 1)
    }

    /// Surface height of a column whose parameters are validated and whose
    /// surface lies within `BEDROCK_TOP + 1..=MAX_WORLD_Y`.
    pub fn checked_surface_top(
        &self,
        x: i32,
        z: i32,
        params: &BiomeParameters,
    ) -> Result<i32, GenerationError> {
        validate(x, z, params)?;
        let top = self.surface_top(x, z, params);
        if top > MAX_WORLD_Y {
            return Err(GenerationError::Column {
                x,
                z,
                reason: format!("surface height {top} above world limit {MAX_WORLD_Y}"),
            });
        }
        Ok(top)
    }

    /// Check if a position should be carved out
    pub fn is_cave(&self, x: i32, y: i32, z: i32) -> bool {
        if y < self.caves.min_y || y >= self.caves.max_y {
            return false;
        }
        let value = self.cave_noise.sample_3d(
            x as f64,
            y as f64 * self.caves.vertical_compression,
            z as f64,
        );
        value > self.caves.threshold
    }

    /// Synthesize the column at `(x, z)`.
    ///
    /// Emission order is bedrock, underground, surface, water; every y is
    /// decided once, so no two placements share a position.
    pub fn synthesize(
        &self,
        x: i32,
        z: i32,
        params: &BiomeParameters,
    ) -> Result<SynthesizedColumn, GenerationError> {
        let surface_y = self.checked_surface_top(x, z, params)? - 1;
        let mut placements = Vec::with_capacity((surface_y - BEDROCK_MIN_Y + 2).max(0) as usize);

        for y in BEDROCK_MIN_Y..BEDROCK_TOP {
            placements.push(BlockPlacement::new(BEDROCK_BLOCK, x, y, z));
        }

        for y in BEDROCK_TOP..surface_y {
            if self.is_cave(x, y, z) {
                continue;
            }
            placements.push(BlockPlacement::new(params.subsurface_block, x, y, z));
        }

        // Grass cannot exist underwater.
        let surface_block = if surface_y < params.water_level {
            params.subsurface_block
        } else {
            params.surface_block
        };
        placements.push(BlockPlacement::new(surface_block, x, surface_y, z));

        for y in (surface_y + 1)..params.water_level {
            placements.push(BlockPlacement::new(names::WATER, x, y, z));
        }

        Ok(SynthesizedColumn {
            surface_height: surface_y + 1,
            placements,
        })
    }
}

/// Reject parameters that cannot produce a column.
fn validate(x: i32, z: i32, params: &BiomeParameters) -> Result<(), GenerationError> {
    let fail = |reason: String| Err(GenerationError::Column { x, z, reason });

    if !params.base_height.is_finite() || params.base_height.abs() > i32::MAX as f64 / 2.0 {
        return fail(format!("base_height {} is not a usable height", params.base_height));
    }
    if !params.height_variation.is_finite() || params.height_variation < 0.0 {
        return fail(format!(
            "height_variation {} must be finite and non-negative",
            params.height_variation
        ));
    }
    if !(0.0..=1.0).contains(&params.tree_chance) {
        return fail(format!("tree_chance {} outside [0, 1]", params.tree_chance));
    }
    if !(BEDROCK_TOP..=MAX_WORLD_Y).contains(&params.water_level) {
        return fail(format!(
            "water_level {} outside {BEDROCK_TOP}..={MAX_WORLD_Y}",
            params.water_level
        ));
    }
    if params.surface_block.is_empty() || params.subsurface_block.is_empty() {
        return fail("empty block type name".to_string());
    }
    Ok(())
}
