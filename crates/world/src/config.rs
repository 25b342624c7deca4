//! Generation settings shared by the world facade and the chunk store.
//!
//! Loaded from TOML by the binary; unknown keys are rejected so typos surface
//! as a warning instead of being silently ignored.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Largest render distance the store accepts, in chunks.
pub const MAX_RENDER_DISTANCE: u32 = 16;

/// World generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// World seed; a random one is drawn when unset.
    pub seed: Option<u64>,
    /// Edge length of a chunk footprint, in blocks.
    pub chunk_size: u32,
    /// Chebyshev radius of loaded chunks around the player chunk.
    pub render_distance: u32,
    /// Background generation threads; 0 generates inline on the caller.
    pub worker_count: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            chunk_size: 16,
            render_distance: 2,
            worker_count: 4,
        }
    }
}

impl GenerationConfig {
    /// Clamp out-of-range values, warning about each adjustment.
    pub fn validated(mut self) -> Self {
        if self.chunk_size == 0 {
            warn!("chunk_size 0 is invalid; using 1");
            self.chunk_size = 1;
        }
        if self.render_distance > MAX_RENDER_DISTANCE {
            warn!(
                "render_distance {} exceeds {MAX_RENDER_DISTANCE}; clamping",
                self.render_distance
            );
            self.render_distance = MAX_RENDER_DISTANCE;
        }
        self
    }

    /// The configured seed, or a freshly drawn random one.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    /// Chunk edge length as a signed coordinate span.
    pub fn chunk_span(&self) -> i32 {
        self.chunk_size.clamp(1, i32::MAX as u32) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = GenerationConfig::default();
        assert_eq!(config.seed, None);
        assert_eq!(config.chunk_size, 16);
        assert_eq!(config.render_distance, 2);
        assert_eq!(config.worker_count, 4);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: GenerationConfig = toml::from_str("seed = 12345\nworker_count = 0\n").unwrap();
        assert_eq!(config.seed, Some(12345));
        assert_eq!(config.worker_count, 0);
        assert_eq!(config.chunk_size, 16);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed = toml::from_str::<GenerationConfig>("view_distance = 4\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn validated_clamps_out_of_range_values() {
        let config = GenerationConfig {
            chunk_size: 0,
            render_distance: 100,
            ..Default::default()
        }
        .validated();
        assert_eq!(config.chunk_size, 1);
        assert_eq!(config.render_distance, MAX_RENDER_DISTANCE);
    }

    #[test]
    fn explicit_seed_is_kept() {
        let config = GenerationConfig {
            seed: Some(7),
            ..Default::default()
        };
        assert_eq!(config.resolve_seed(), 7);
    }
}
