//! Collaborator seams to the host engine.
//!
//! The generator never touches the engine directly: it asks a
//! [`BlockRegistry`] which block types exist and realizes placements through
//! a [`BlockHost`] owned by the caller.

use std::collections::BTreeSet;
use voxelgen_core::block::names;
use voxelgen_core::{BlockHandle, BlockPos};

/// Trait for querying known block types (shared with generation workers).
pub trait BlockRegistry: Send + Sync {
    fn is_registered(&self, block: &str) -> bool;
}

/// Engine-side block lifecycle and player tracking.
///
/// Only ever called from the thread that owns the
/// [`ChunkStore`](crate::ChunkStore).
pub trait BlockHost {
    /// Realize a block; `None` when the engine declines.
    fn create_block(&mut self, block: &str, pos: BlockPos) -> Option<BlockHandle>;

    /// Destroy a realized block. Stale handles must be tolerated.
    fn destroy_block(&mut self, handle: BlockHandle);

    /// Current player position on the horizontal plane, if there is a player.
    fn player_position(&self) -> Option<(f64, f64)>;
}

/// Registry backed by a fixed set of names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameRegistry {
    names: BTreeSet<String>,
}

impl NameRegistry {
    /// Registry knowing every built-in block type.
    pub fn with_defaults() -> Self {
        names::ALL.iter().copied().collect()
    }

    /// Register an additional name.
    pub fn insert(&mut self, block: impl Into<String>) {
        self.names.insert(block.into());
    }

    /// Registry without `block`.
    pub fn without(mut self, block: &str) -> Self {
        self.names.remove(block);
        self
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for NameRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl BlockRegistry for NameRegistry {
    fn is_registered(&self, block: &str) -> bool {
        self.names.contains(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_vocabulary() {
        let registry = NameRegistry::with_defaults();
        assert_eq!(registry.len(), names::ALL.len());
        for name in names::ALL {
            assert!(registry.is_registered(name));
        }
        assert!(!registry.is_registered("lava"));
    }

    #[test]
    fn without_removes_single_name() {
        let registry = NameRegistry::with_defaults().without(names::LEAVES);
        assert!(!registry.is_registered(names::LEAVES));
        assert!(registry.is_registered(names::WOOD));
    }

    #[test]
    fn registry_is_usable_as_trait_object() {
        let registry: std::sync::Arc<dyn BlockRegistry> =
            std::sync::Arc::new(NameRegistry::from_iter(["stone"]));
        assert!(registry.is_registered("stone"));
        assert!(!registry.is_registered("dirt"));
    }
}
