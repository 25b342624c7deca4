//! World and chunk coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Farthest column from the origin on either horizontal axis that a
/// fractional world position resolves to.
pub const WORLD_BORDER: i32 = 30_000_000;

/// Absolute block position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    /// World X.
    pub x: i32,
    /// World Y (may be negative below the surface datum).
    pub y: i32,
    /// World Z.
    pub z: i32,
}

impl BlockPos {
    /// Construct a position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Chunk coordinate (X,Z) in chunk space.
/// Implements Ord for deterministic iteration in BTreeMap/BTreeSet (sorts by x, then z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkKey {
    /// Chunk X.
    pub x: i32,
    /// Chunk Z.
    pub z: i32,
}

impl ChunkKey {
    /// Construct a key from chunk coordinates.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the world column `(world_x, world_z)`.
    ///
    /// Uses floor division so that `-1` maps to chunk `-1`, not `0`.
    pub fn from_block(world_x: i32, world_z: i32, chunk_size: i32) -> Self {
        debug_assert!(chunk_size > 0);
        Self {
            x: world_x.div_euclid(chunk_size),
            z: world_z.div_euclid(chunk_size),
        }
    }

    /// Chunk containing a fractional world position (e.g. the player).
    ///
    /// Positions past [`WORLD_BORDER`] resolve to the border chunk.
    pub fn from_world(world_x: f64, world_z: f64, chunk_size: i32) -> Self {
        let clamp = |v: f64| v.floor().clamp(-(WORLD_BORDER as f64), WORLD_BORDER as f64) as i32;
        Self::from_block(clamp(world_x), clamp(world_z), chunk_size)
    }

    /// World-space coordinates of the chunk's minimum corner column,
    /// saturating at the i32 range.
    pub fn origin(self, chunk_size: i32) -> (i32, i32) {
        (
            self.x.saturating_mul(chunk_size),
            self.z.saturating_mul(chunk_size),
        )
    }

    /// Minimum corner column, provided the footprint grown by `margin`
    /// columns on every side, including the exclusive end of that range,
    /// fits in i32 coordinates.
    pub fn checked_origin(self, chunk_size: i32, margin: i32) -> Option<(i32, i32)> {
        let axis = |c: i32| {
            let min = i64::from(c) * i64::from(chunk_size);
            let max = min + i64::from(chunk_size) + i64::from(margin);
            i32::try_from(min - i64::from(margin)).ok()?;
            i32::try_from(max).ok()?;
            i32::try_from(min).ok()
        };
        Some((axis(self.x)?, axis(self.z)?))
    }

    /// Chebyshev distance in chunks, saturating at `i32::MAX`.
    pub fn chebyshev_distance(self, other: ChunkKey) -> i32 {
        let dx = (i64::from(self.x) - i64::from(other.x)).abs();
        let dz = (i64::from(self.z) - i64::from(other.z)).abs();
        dx.max(dz).min(i64::from(i32::MAX)) as i32
    }

    /// All keys within Chebyshev distance `radius` of `self`, in x-then-z order.
    ///
    /// Keys that would leave the i32 range are skipped.
    pub fn square_around(self, radius: i32) -> impl Iterator<Item = ChunkKey> {
        let radius = radius.max(0);
        (-radius..=radius)
            .filter_map(move |dx| self.x.checked_add(dx))
            .flat_map(move |x| {
                (-radius..=radius)
                    .filter_map(move |dz| self.z.checked_add(dz))
                    .map(move |z| ChunkKey::new(x, z))
            })
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_columns_floor_into_negative_chunks() {
        assert_eq!(ChunkKey::from_block(-1, -1, 16), ChunkKey::new(-1, -1));
        assert_eq!(ChunkKey::from_block(-16, 0, 16), ChunkKey::new(-1, 0));
        assert_eq!(ChunkKey::from_block(-17, 15, 16), ChunkKey::new(-2, 0));
        assert_eq!(ChunkKey::from_block(16, 31, 16), ChunkKey::new(1, 1));
    }

    #[test]
    fn fractional_positions_are_floored_first() {
        assert_eq!(ChunkKey::from_world(-0.25, 0.5, 16), ChunkKey::new(-1, 0));
        assert_eq!(ChunkKey::from_world(15.999, -16.0, 16), ChunkKey::new(0, -1));
        assert_eq!(ChunkKey::from_world(80.0, 0.0, 16), ChunkKey::new(5, 0));
    }

    #[test]
    fn square_around_covers_chebyshev_ball() {
        let center = ChunkKey::new(3, -2);
        let keys: Vec<_> = center.square_around(2).collect();
        assert_eq!(keys.len(), 25);
        assert!(keys.iter().all(|k| k.chebyshev_distance(center) <= 2));
        assert_eq!(center.square_around(0).count(), 1);
    }

    #[test]
    fn far_positions_clamp_to_the_border() {
        let key = ChunkKey::from_world(3.0e9, -3.0e9, 16);
        assert_eq!(key, ChunkKey::from_block(WORLD_BORDER, -WORLD_BORDER, 16));
        assert_eq!(
            ChunkKey::from_world(f64::INFINITY, 0.0, 1),
            ChunkKey::new(WORLD_BORDER, 0)
        );
        assert!(key.checked_origin(16, 2).is_some());
    }

    #[test]
    fn extreme_keys_do_not_overflow() {
        let edge = ChunkKey::new(i32::MAX, i32::MIN);
        assert_eq!(edge.square_around(1).count(), 4);
        assert_eq!(edge.chebyshev_distance(ChunkKey::new(i32::MIN, 0)), i32::MAX);
        assert_eq!(edge.origin(16), (i32::MAX, i32::MIN));

        // The exclusive end of the last chunk's range would be i32::MAX + 1.
        assert_eq!(ChunkKey::new(i32::MAX / 16, 0).checked_origin(16, 0), None);
        let near_edge = ChunkKey::new(i32::MAX / 16 - 1, 0);
        assert_eq!(near_edge.checked_origin(16, 2), Some((2_147_483_616, 0)));
        assert_eq!(near_edge.checked_origin(16, 16), None);

        let low = ChunkKey::new(i32::MIN / 16, 0);
        assert_eq!(low.checked_origin(16, 0), Some((i32::MIN, 0)));
        assert_eq!(low.checked_origin(16, 1), None);
    }

    #[test]
    fn chunk_key_display() {
        assert_eq!(ChunkKey::new(5, -3).to_string(), "(5, -3)");
    }

    #[test]
    fn chunk_key_ordering() {
        // ChunkKey implements Ord for BTreeMap determinism
        assert!(ChunkKey::new(0, 0) < ChunkKey::new(1, 0));
        assert!(ChunkKey::new(0, 0) < ChunkKey::new(0, 1));
    }

    #[test]
    fn chunk_key_serialization() {
        let key = ChunkKey::new(-5, 10);
        let serialized = serde_json::to_string(&key).unwrap();
        let deserialized: ChunkKey = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, key);
    }
}
