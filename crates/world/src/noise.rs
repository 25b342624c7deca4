//! Noise generation utilities for terrain generation.
//!
//! Provides a deterministic multi-octave value noise used by the height,
//! biome and cave channels. Each channel runs the same algorithm with its own
//! scale and seed offset.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};

/// Seed offset of the cave channel relative to the world seed.
pub const CAVE_SEED_OFFSET: u64 = 1000;
/// Seed offset of the biome channel relative to the world seed.
pub const BIOME_SEED_OFFSET: u64 = 2000;

/// Configuration for multi-octave noise generation.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseConfig {
    /// Number of octaves (layers of detail)
    pub octaves: u32,
    /// Frequency multiplier between octaves
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves (persistence)
    pub persistence: f64,
    /// World-to-lattice scale of the first octave
    pub scale: f64,
    /// Seed for deterministic generation
    pub seed: u64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            scale: 1.0,
            seed: 0,
        }
    }
}

impl NoiseConfig {
    /// Create config for the terrain height channel.
    pub fn terrain(seed: u64) -> Self {
        Self {
            scale: 0.02,
            seed,
            ..Default::default()
        }
    }

    /// Create config for biome selection (coarse, decorrelated from height).
    pub fn biome(seed: u64) -> Self {
        Self {
            scale: 0.005,
            seed: seed.wrapping_add(BIOME_SEED_OFFSET), // Offset seed
            ..Default::default()
        }
    }

    /// Create config for cave carving.
    pub fn cave(seed: u64, scale: f64) -> Self {
        Self {
            scale,
            seed: seed.wrapping_add(CAVE_SEED_OFFSET), // Offset seed
            ..Default::default()
        }
    }
}

const TABLE_SIZE: usize = 256;
const TABLE_MASK: i64 = 255;

/// Seeded value-noise field.
///
/// The permutation table is shuffled once at construction and read-only
/// afterwards, so a `NoiseField` can be shared across worker threads.
#[derive(Clone)]
pub struct NoiseField {
    /// 256 shuffled entries repeated twice so `perm[perm[i] + j]` never wraps.
    perm: Box<[u8; TABLE_SIZE * 2]>,
    config: NoiseConfig,
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NoiseField {
    /// Create a new noise field with the given configuration.
    pub fn new(config: NoiseConfig) -> Self {
        let mut table: Vec<u8> = (0..TABLE_SIZE).map(|i| i as u8).collect();
        let mut rng = StdRng::seed_from_u64(config.seed);
        table.shuffle(&mut rng);

        let mut perm = Box::new([0u8; TABLE_SIZE * 2]);
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i % TABLE_SIZE];
        }

        Self { perm, config }
    }

    /// The configuration this field was built from.
    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    #[inline]
    fn lattice(coord: f64) -> (usize, f64) {
        let floor = coord.floor();
        (((floor as i64) & TABLE_MASK) as usize, coord - floor)
    }

    #[inline]
    fn value(hash: u8) -> f64 {
        hash as f64 / 255.0 * 2.0 - 1.0
    }

    #[inline]
    fn hash2(&self, xi: usize, zi: usize) -> u8 {
        self.perm[self.perm[xi] as usize + zi]
    }

    #[inline]
    fn hash3(&self, xi: usize, yi: usize, zi: usize) -> u8 {
        self.perm[self.perm[self.perm[xi] as usize + yi] as usize + zi]
    }

    /// Single-octave value noise at lattice coordinates.
    fn lattice_2d(&self, x: f64, z: f64) -> f64 {
        let (xi, xf) = Self::lattice(x);
        let (zi, zf) = Self::lattice(z);
        let u = fade(xf);
        let v = fade(zf);

        let aa = Self::value(self.hash2(xi, zi));
        let ba = Self::value(self.hash2(xi + 1, zi));
        let ab = Self::value(self.hash2(xi, zi + 1));
        let bb = Self::value(self.hash2(xi + 1, zi + 1));

        lerp(lerp(aa, ba, u), lerp(ab, bb, u), v)
    }

    fn lattice_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xi, xf) = Self::lattice(x);
        let (yi, yf) = Self::lattice(y);
        let (zi, zf) = Self::lattice(z);
        let u = fade(xf);
        let v = fade(yf);
        let w = fade(zf);

        let corner = |dx: usize, dy: usize, dz: usize| {
            Self::value(self.hash3(xi + dx, yi + dy, zi + dz))
        };

        let x00 = lerp(corner(0, 0, 0), corner(1, 0, 0), u);
        let x10 = lerp(corner(0, 1, 0), corner(1, 1, 0), u);
        let x01 = lerp(corner(0, 0, 1), corner(1, 0, 1), u);
        let x11 = lerp(corner(0, 1, 1), corner(1, 1, 1), u);

        lerp(lerp(x00, x10, v), lerp(x01, x11, v), w)
    }

    /// Generate noise value at 2D world coordinates with multi-octave sampling.
    ///
    /// Returns value in range [-1.0, 1.0].
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.config.scale;
        let mut max_value = 0.0;

        for _ in 0..self.config.octaves {
            value += self.lattice_2d(x * frequency, z * frequency) * amplitude;
            max_value += amplitude;

            amplitude *= self.config.persistence;
            frequency *= self.config.lacunarity;
        }

        if max_value == 0.0 {
            return 0.0;
        }
        // Normalize to [-1.0, 1.0]
        value / max_value
    }

    /// Generate noise value at 3D world coordinates with multi-octave sampling.
    ///
    /// Returns value in range [-1.0, 1.0].
    pub fn sample_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.config.scale;
        let mut max_value = 0.0;

        for _ in 0..self.config.octaves {
            value += self.lattice_3d(x * frequency, y * frequency, z * frequency) * amplitude;
            max_value += amplitude;

            amplitude *= self.config.persistence;
            frequency *= self.config.lacunarity;
        }

        if max_value == 0.0 {
            return 0.0;
        }
        value / max_value
    }
}

/// Quintic fade curve `6t^5 - 15t^4 + 10t^3`.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}
