#![warn(missing_docs)]
//! Deterministic testing surfaces: an in-memory block host and metrics export.

mod metrics;

use std::collections::{BTreeSet, HashMap};

use tracing::debug;
use voxelgen_core::block::names;
use voxelgen_core::{BlockHandle, BlockPos};
use voxelgen_world::{BlockHost, NameRegistry};

pub use metrics::*;

/// In-memory [`BlockHost`] that records every call.
///
/// Creation fails for unregistered types, for types marked with
/// [`fail_on`](Self::fail_on), and for every n-th call once
/// [`fail_every`](Self::fail_every) is set.
#[derive(Debug, Default)]
pub struct RecordingHost {
    registered: BTreeSet<String>,
    failing: BTreeSet<String>,
    fail_every: Option<usize>,
    next_handle: u64,
    live: HashMap<BlockHandle, (String, BlockPos)>,
    create_calls: usize,
    created: usize,
    declined: usize,
    destroyed: usize,
    stale_destroys: usize,
    player: Option<(f64, f64)>,
}

impl RecordingHost {
    /// Host knowing every built-in block type, with no player.
    pub fn new() -> Self {
        Self::with_registered(names::ALL.iter().copied())
    }

    /// Host knowing exactly `blocks`.
    pub fn with_registered<I, S>(blocks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            registered: blocks.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Forget a block type.
    pub fn unregister(&mut self, block: &str) -> &mut Self {
        self.registered.remove(block);
        self
    }

    /// Registry matching this host's known types, for sharing with workers.
    pub fn registry(&self) -> NameRegistry {
        self.registered.iter().cloned().collect()
    }

    /// Decline every creation of `block`.
    pub fn fail_on(&mut self, block: &str) -> &mut Self {
        self.failing.insert(block.to_string());
        self
    }

    /// Decline every `n`-th creation call (1-based); 0 disables.
    pub fn fail_every(&mut self, n: usize) -> &mut Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    /// Move the player; `None` removes them.
    pub fn set_player(&mut self, position: Option<(f64, f64)>) {
        self.player = position;
    }

    /// Blocks currently alive.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Successful creations so far.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Creations the host refused.
    pub fn declined(&self) -> usize {
        self.declined
    }

    /// Handles destroyed while alive.
    pub fn destroyed(&self) -> usize {
        self.destroyed
    }

    /// Destroy calls for handles that were not alive.
    pub fn stale_destroys(&self) -> usize {
        self.stale_destroys
    }

    /// Block type alive at `pos`, if exactly one is.
    pub fn block_at(&self, pos: BlockPos) -> Option<&str> {
        let mut found = self
            .live
            .values()
            .filter(|(_, p)| *p == pos)
            .map(|(block, _)| block.as_str());
        let first = found.next();
        match found.next() {
            Some(_) => None,
            None => first,
        }
    }

    /// Positions holding more than one live block.
    pub fn duplicate_positions(&self) -> Vec<BlockPos> {
        let mut counts: HashMap<BlockPos, usize> = HashMap::new();
        for (_, pos) in self.live.values() {
            *counts.entry(*pos).or_default() += 1;
        }
        let mut duplicates: Vec<_> = counts
            .into_iter()
            .filter(|&(_, n)| n > 1)
            .map(|(pos, _)| pos)
            .collect();
        duplicates.sort();
        duplicates
    }

    /// Count live blocks of one type.
    pub fn count_of(&self, block: &str) -> usize {
        self.live.values().filter(|(b, _)| b == block).count()
    }
}

impl BlockHost for RecordingHost {
    fn create_block(&mut self, block: &str, pos: BlockPos) -> Option<BlockHandle> {
        self.create_calls += 1;
        let nth_failure = self
            .fail_every
            .is_some_and(|n| self.create_calls % n == 0);
        if !self.registered.contains(block) || self.failing.contains(block) || nth_failure {
            self.declined += 1;
            return None;
        }

        self.next_handle += 1;
        let handle = BlockHandle(self.next_handle);
        self.live.insert(handle, (block.to_string(), pos));
        self.created += 1;
        Some(handle)
    }

    fn destroy_block(&mut self, handle: BlockHandle) {
        if self.live.remove(&handle).is_some() {
            self.destroyed += 1;
        } else {
            debug!(?handle, "Ignoring stale handle");
            self.stale_destroys += 1;
        }
    }

    fn player_position(&self) -> Option<(f64, f64)> {
        self.player
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxelgen_world::BlockRegistry;

    #[test]
    fn tracks_lifecycle_and_stale_handles() {
        let mut host = RecordingHost::new();
        let pos = BlockPos::new(1, 2, 3);
        let handle = host.create_block("stone", pos).unwrap();
        assert_eq!(host.block_at(pos), Some("stone"));

        host.destroy_block(handle);
        host.destroy_block(handle);
        assert_eq!(host.live_count(), 0);
        assert_eq!(host.destroyed(), 1);
        assert_eq!(host.stale_destroys(), 1);
    }

    #[test]
    fn declines_unregistered_and_injected_failures() {
        let mut host = RecordingHost::with_registered(["stone", "dirt"]);
        host.fail_on("dirt");
        assert!(host.create_block("lava", BlockPos::new(0, 0, 0)).is_none());
        assert!(host.create_block("dirt", BlockPos::new(0, 0, 0)).is_none());
        assert!(host.create_block("stone", BlockPos::new(0, 0, 0)).is_some());
        assert_eq!(host.declined(), 2);

        let registry = host.registry();
        assert!(registry.is_registered("dirt"));
        assert!(!registry.is_registered("lava"));
    }

    #[test]
    fn fail_every_nth_call() {
        let mut host = RecordingHost::new();
        host.fail_every(3);
        let results: Vec<bool> = (0..6)
            .map(|i| host.create_block("stone", BlockPos::new(i, 0, 0)).is_some())
            .collect();
        assert_eq!(results, [true, true, false, true, true, false]);
    }

    #[test]
    fn duplicate_positions_are_reported() {
        let mut host = RecordingHost::new();
        let pos = BlockPos::new(4, 4, 4);
        host.create_block("stone", pos);
        host.create_block("dirt", pos);
        assert_eq!(host.duplicate_positions(), vec![pos]);
        assert_eq!(host.block_at(pos), None);
    }
}
