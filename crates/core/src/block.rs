//! Block vocabulary, placements and realized-block handles.

use serde::Serialize;
use std::fmt;

use crate::pos::BlockPos;

/// Block type identifier, keyed by name in the host's registry.
pub type BlockType = &'static str;

/// Block type names emitted by terrain generation.
#[allow(missing_docs)]
pub mod names {
    use super::BlockType;

    pub const GRASS: BlockType = "grass";
    pub const DIRT: BlockType = "dirt";
    pub const STONE: BlockType = "stone";
    pub const SAND: BlockType = "sand";
    pub const WATER: BlockType = "water";
    pub const WOOD: BlockType = "wood";
    pub const LEAVES: BlockType = "leaves";
    pub const COBBLESTONE: BlockType = "cobblestone";

    /// Every block type the default host registers.
    pub const ALL: &[BlockType] = &[GRASS, DIRT, STONE, SAND, WATER, WOOD, LEAVES, COBBLESTONE];
}

/// A block type at a world position, not yet realized by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlockPlacement {
    /// Registry name of the block.
    pub block: BlockType,
    /// Target world position.
    pub pos: BlockPos,
}

impl BlockPlacement {
    /// Describe `block` at `(x, y, z)`.
    pub const fn new(block: BlockType, x: i32, y: i32, z: i32) -> Self {
        Self {
            block,
            pos: BlockPos::new(x, y, z),
        }
    }
}

impl fmt::Display for BlockPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.block, self.pos)
    }
}

/// Opaque reference to a block realized by the host.
///
/// The chunk store owns the handle's lifetime; the host owns everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_display() {
        let p = BlockPlacement::new(names::GRASS, 1, -2, 3);
        assert_eq!(p.to_string(), "grass@(1, -2, 3)");
    }

    #[test]
    fn vocabulary_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for name in names::ALL {
            assert!(seen.insert(*name), "duplicate block name {name}");
        }
    }
}
