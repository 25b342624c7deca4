//! Biome system for terrain generation.
//!
//! Assigns one of four biomes from a coarse noise channel and holds the
//! terrain parameters each biome shapes its columns with.

use crate::noise::{NoiseConfig, NoiseField};
use serde::{Deserialize, Serialize};
use voxelgen_core::block::names;
use voxelgen_core::BlockType;

/// Water level shared by every built-in biome.
pub const SEA_LEVEL: i32 = 4;

/// Biome identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiomeId {
    Desert,
    Plains,
    Hills,
    Mountains,
}

impl BiomeId {
    /// Get all biome IDs (for iteration), in band order.
    pub fn all() -> &'static [BiomeId] {
        &[
            BiomeId::Desert,
            BiomeId::Plains,
            BiomeId::Hills,
            BiomeId::Mountains,
        ]
    }

    /// Map a biome-channel noise value to its band.
    ///
    /// Cutpoints: `v < -0.3` desert, `[-0.3, 0.1)` plains, `[0.1, 0.4)` hills,
    /// `v >= 0.4` mountains.
    pub fn from_noise(v: f64) -> BiomeId {
        if v < -0.3 {
            BiomeId::Desert
        } else if v < 0.1 {
            BiomeId::Plains
        } else if v < 0.4 {
            BiomeId::Hills
        } else {
            BiomeId::Mountains
        }
    }

    /// Lowercase name used in logs and stats.
    pub fn as_str(self) -> &'static str {
        match self {
            BiomeId::Desert => "desert",
            BiomeId::Plains => "plains",
            BiomeId::Hills => "hills",
            BiomeId::Mountains => "mountains",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Terrain parameters of one biome.
#[derive(Debug, Clone, PartialEq)]
pub struct BiomeParameters {
    /// Surface height around which the column varies.
    pub base_height: f64,
    /// Multiplier applied to the height noise.
    pub height_variation: f64,
    /// Top block of each column.
    pub surface_block: BlockType,
    /// Fill between the bedrock band and the surface.
    pub subsurface_block: BlockType,
    /// Per-column probability of a tree, in [0, 1].
    pub tree_chance: f64,
    /// Columns whose surface lies below this level are flooded.
    pub water_level: i32,
}

impl BiomeParameters {
    /// Built-in parameters for a biome.
    pub fn get(id: BiomeId) -> Self {
        match id {
            BiomeId::Plains => Self {
                base_height: 5.0,
                height_variation: 2.0,
                surface_block: names::GRASS,
                subsurface_block: names::DIRT,
                tree_chance: 0.01,
                water_level: SEA_LEVEL,
            },
            BiomeId::Desert => Self {
                base_height: 4.0,
                height_variation: 1.0,
                surface_block: names::SAND,
                subsurface_block: names::SAND,
                tree_chance: 0.001,
                water_level: SEA_LEVEL,
            },
            BiomeId::Hills => Self {
                base_height: 8.0,
                height_variation: 3.0,
                surface_block: names::GRASS,
                subsurface_block: names::STONE,
                tree_chance: 0.005,
                water_level: SEA_LEVEL,
            },
            BiomeId::Mountains => Self {
                base_height: 12.0,
                height_variation: 4.0,
                surface_block: names::STONE,
                subsurface_block: names::STONE,
                tree_chance: 0.001,
                water_level: SEA_LEVEL,
            },
        }
    }
}

/// Immutable parameter table indexed by biome.
#[derive(Debug, Clone, PartialEq)]
pub struct BiomeTable {
    entries: [BiomeParameters; 4],
}

impl BiomeTable {
    /// Table with an entry overridden, for tuning and tests.
    pub fn with(mut self, id: BiomeId, params: BiomeParameters) -> Self {
        self.entries[id.index()] = params;
        self
    }

    /// Parameters of `id`.
    pub fn get(&self, id: BiomeId) -> &BiomeParameters {
        &self.entries[id.index()]
    }
}

impl Default for BiomeTable {
    fn default() -> Self {
        Self {
            entries: [
                BiomeParameters::get(BiomeId::Desert),
                BiomeParameters::get(BiomeId::Plains),
                BiomeParameters::get(BiomeId::Hills),
                BiomeParameters::get(BiomeId::Mountains),
            ],
        }
    }
}

/// Biome classifier that assigns biomes from world coordinates.
#[derive(Debug, Clone)]
pub struct BiomeClassifier {
    noise: NoiseField,
}

impl BiomeClassifier {
    /// Create a new biome classifier from world seed.
    pub fn new(world_seed: u64) -> Self {
        Self::with_config(NoiseConfig::biome(world_seed))
    }

    /// Classifier over an explicitly configured channel.
    pub fn with_config(config: NoiseConfig) -> Self {
        Self {
            noise: NoiseField::new(config),
        }
    }

    /// Raw biome-channel value at a column.
    pub fn sample(&self, world_x: i32, world_z: i32) -> f64 {
        self.noise.sample(world_x as f64, world_z as f64)
    }

    /// Get biome at world coordinates.
    pub fn classify(&self, world_x: i32, world_z: i32) -> BiomeId {
        BiomeId::from_noise(self.sample(world_x, world_z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_cutpoints_are_exact() {
        assert_eq!(BiomeId::from_noise(-0.3000001), BiomeId::Desert);
        assert_eq!(BiomeId::from_noise(-0.3), BiomeId::Plains);
        assert_eq!(BiomeId::from_noise(0.0999999), BiomeId::Plains);
        assert_eq!(BiomeId::from_noise(0.1), BiomeId::Hills);
        assert_eq!(BiomeId::from_noise(0.3999999), BiomeId::Hills);
        assert_eq!(BiomeId::from_noise(0.4), BiomeId::Mountains);
        assert_eq!(BiomeId::from_noise(-1.0), BiomeId::Desert);
        assert_eq!(BiomeId::from_noise(1.0), BiomeId::Mountains);
    }

    #[test]
    fn test_classifier_determinism() {
        let classifier1 = BiomeClassifier::new(12345);
        let classifier2 = BiomeClassifier::new(12345);

        for x in -10..10 {
            for z in -10..10 {
                let biome1 = classifier1.classify(x * 37, z * 37);
                let biome2 = classifier2.classify(x * 37, z * 37);
                assert_eq!(biome1, biome2, "Biome assignment not deterministic");
            }
        }
    }

    #[test]
    fn test_classifier_matches_banding() {
        let classifier = BiomeClassifier::new(77);
        for x in 0..50 {
            let v = classifier.sample(x * 13, -x * 7);
            assert_eq!(classifier.classify(x * 13, -x * 7), BiomeId::from_noise(v));
        }
    }

    #[test]
    fn test_biome_channel_is_decorrelated_from_terrain() {
        let seed = 31337;
        let classifier = BiomeClassifier::new(seed);
        let terrain = NoiseField::new(NoiseConfig::terrain(seed));

        let any_different = (0..40).any(|i| {
            let x = i * 11;
            (classifier.sample(x, x) - terrain.sample(x as f64, x as f64)).abs() > 1e-6
        });
        assert!(any_different);
    }

    #[test]
    fn test_parameters_are_well_formed() {
        let table = BiomeTable::default();
        for &id in BiomeId::all() {
            let params = table.get(id);
            assert!((0.0..=1.0).contains(&params.tree_chance), "{id:?}");
            assert!(params.height_variation >= 0.0);
            assert_eq!(params.water_level, SEA_LEVEL);
        }
        assert_eq!(table.get(BiomeId::Desert).surface_block, names::SAND);
        assert_eq!(table.get(BiomeId::Plains).subsurface_block, names::DIRT);
    }

    #[test]
    fn test_table_override() {
        let mut custom = BiomeParameters::get(BiomeId::Hills);
        custom.tree_chance = 1.0;
        let table = BiomeTable::default().with(BiomeId::Hills, custom.clone());
        assert_eq!(table.get(BiomeId::Hills), &custom);
        assert_eq!(
            table.get(BiomeId::Plains),
            &BiomeParameters::get(BiomeId::Plains)
        );
    }

    #[test]
    fn test_biome_names() {
        let names: Vec<_> = BiomeId::all().iter().map(|b| b.as_str()).collect();
        assert_eq!(names, ["desert", "plains", "hills", "mountains"]);
    }
}
