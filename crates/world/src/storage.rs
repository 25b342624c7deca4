//! Chunk lifecycle around a moving player.
//!
//! [`ChunkStore`] decides which chunks are needed, dispatches generation,
//! realizes finished placements through the host and releases chunks that
//! leave render distance. Recent results are kept in an LRU cache so a quick
//! return to an area skips regeneration.

use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::Serialize;
use tracing::{debug, info, warn};
use voxelgen_core::{BlockHandle, BlockPlacement, ChunkKey};

use crate::config::GenerationConfig;
use crate::error::GenerationError;
use crate::host::BlockHost;
use crate::scheduler::{run_guarded, Completion, PlacementSource, Scheduler};

/// Generation results kept for quick reloads.
pub const DEFAULT_CACHE_CAPACITY: usize = 25;

/// Lifecycle stage of a tracked chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChunkState {
    /// Accepted, not yet handed to the scheduler.
    Requested,
    /// Handed to the scheduler; awaiting completion.
    Generating,
    /// Placements realized through the host.
    Loaded,
    /// Handles being destroyed.
    Unloading,
}

/// A tracked chunk and the handles it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    key: ChunkKey,
    state: ChunkState,
    handles: Vec<BlockHandle>,
}

impl ChunkRecord {
    fn new(key: ChunkKey) -> Self {
        Self {
            key,
            state: ChunkState::Requested,
            handles: Vec::new(),
        }
    }

    /// Chunk this record tracks.
    pub fn key(&self) -> ChunkKey {
        self.key
    }

    /// Current lifecycle stage.
    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Handles realized for this chunk.
    pub fn handles(&self) -> &[BlockHandle] {
        &self.handles
    }

    /// Requested or generating.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, ChunkState::Requested | ChunkState::Generating)
    }
}

/// What one [`ChunkStore::update`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    /// Chunks newly requested.
    pub requested: usize,
    /// Completions applied.
    pub completed: usize,
    /// Loaded chunks released.
    pub released: usize,
}

/// Recoverable faults seen since the store was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FaultCounters {
    /// Placements the host declined to create.
    pub realization_failures: usize,
    /// Placements dropped for unregistered block types.
    pub unregistered_blocks: usize,
    /// Columns skipped during generation.
    pub failed_columns: usize,
    /// Generation jobs that panicked.
    pub worker_faults: usize,
    /// Completions thrown away because the chunk was no longer needed.
    pub discarded: usize,
}

/// Owns the chunk lifecycle around a moving player.
///
/// Uses BTreeMap for deterministic iteration order. All maps are mutated only
/// by the owning thread; workers never see the store.
pub struct ChunkStore {
    chunks: BTreeMap<ChunkKey, ChunkRecord>,
    needed: BTreeSet<ChunkKey>,
    cache: Option<LruCache<ChunkKey, Vec<BlockPlacement>>>,
    scheduler: Scheduler,
    chunk_size: i32,
    render_distance: i32,
    total_blocks: usize,
    faults: FaultCounters,
}

impl std::fmt::Debug for ChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStore")
            .field("chunks", &self.chunks.len())
            .field("needed", &self.needed.len())
            .field("chunk_size", &self.chunk_size)
            .field("render_distance", &self.render_distance)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl ChunkStore {
    /// Create a store from generation settings with the default cache size.
    pub fn new(source: Arc<dyn PlacementSource>, config: &GenerationConfig) -> Self {
        let cache = NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).map(LruCache::new);
        Self {
            chunks: BTreeMap::new(),
            needed: BTreeSet::new(),
            cache,
            scheduler: Scheduler::new(source, config.worker_count),
            chunk_size: config.chunk_span(),
            render_distance: config.render_distance.min(i32::MAX as u32) as i32,
            total_blocks: 0,
            faults: FaultCounters::default(),
        }
    }

    /// Replace the result cache; 0 disables caching.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = NonZeroUsize::new(capacity).map(LruCache::new);
        self
    }

    /// Edge length of a chunk footprint, in blocks.
    pub fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    /// Chebyshev radius kept loaded around the player chunk.
    pub fn render_distance(&self) -> i32 {
        self.render_distance
    }

    /// Tracked record for `key`, if any.
    pub fn record(&self, key: ChunkKey) -> Option<&ChunkRecord> {
        self.chunks.get(&key)
    }

    /// Lifecycle state of `key`; `None` means unloaded.
    pub fn state(&self, key: ChunkKey) -> Option<ChunkState> {
        self.chunks.get(&key).map(ChunkRecord::state)
    }

    /// Keys of loaded chunks in ascending order.
    pub fn loaded_keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.chunks
            .values()
            .filter(|r| r.state == ChunkState::Loaded)
            .map(|r| r.key)
    }

    /// Number of loaded chunks.
    pub fn loaded_count(&self) -> usize {
        self.loaded_keys().count()
    }

    /// Chunks requested or generating.
    pub fn pending_count(&self) -> usize {
        self.chunks.values().filter(|r| r.is_pending()).count()
    }

    /// Generation results held in the cache.
    pub fn cached_count(&self) -> usize {
        self.cache.as_ref().map_or(0, LruCache::len)
    }

    /// Live handles across all loaded chunks.
    pub fn total_blocks(&self) -> usize {
        self.total_blocks
    }

    /// Fault counters accumulated so far.
    pub fn faults(&self) -> FaultCounters {
        self.faults
    }

    /// Generation jobs handed to the scheduler so far.
    pub fn dispatched(&self) -> u64 {
        self.scheduler.dispatched()
    }

    /// Background worker threads in use.
    pub fn worker_count(&self) -> usize {
        self.scheduler.worker_count()
    }

    /// Chunks within render distance of a player position.
    pub fn needed_around(&self, player_x: f64, player_z: f64) -> BTreeSet<ChunkKey> {
        ChunkKey::from_world(player_x, player_z, self.chunk_size)
            .square_around(self.render_distance)
            .collect()
    }

    /// Request `key`; a no-op when it is already pending or loaded.
    ///
    /// Cached chunks are realized immediately. Otherwise the key is
    /// dispatched; inline schedulers complete it before returning.
    /// Returns true when the key was newly requested.
    pub fn request(&mut self, key: ChunkKey, host: &mut dyn BlockHost) -> bool {
        if self.chunks.contains_key(&key) {
            return false;
        }
        self.needed.insert(key);

        if let Some(placements) = self.cache.as_ref().and_then(|c| c.peek(&key)).cloned() {
            debug!(chunk = %key, "Realizing chunk from cache");
            self.chunks.insert(key, ChunkRecord::new(key));
            self.realize(key, &placements, host);
            return true;
        }

        self.chunks.insert(key, ChunkRecord::new(key));
        self.scheduler.dispatch(key);
        if let Some(record) = self.chunks.get_mut(&key) {
            record.state = ChunkState::Generating;
        }

        if self.scheduler.worker_count() == 0 {
            self.poll(host);
        }
        true
    }

    /// Generate and realize `key` on the calling thread, bypassing workers.
    ///
    /// Returns true when the chunk ends up loaded by this call.
    pub fn load_now(&mut self, key: ChunkKey, host: &mut dyn BlockHost) -> bool {
        if self.chunks.contains_key(&key) {
            return false;
        }
        self.needed.insert(key);
        self.chunks.insert(key, ChunkRecord::new(key));

        if let Some(placements) = self.cache.as_ref().and_then(|c| c.peek(&key)).cloned() {
            self.realize(key, &placements, host);
        } else {
            if let Some(record) = self.chunks.get_mut(&key) {
                record.state = ChunkState::Generating;
            }
            let completion = run_guarded(self.scheduler.source().as_ref(), key);
            self.complete(completion, host);
        }
        self.state(key) == Some(ChunkState::Loaded)
    }

    /// Apply a finished job.
    ///
    /// Ignored unless `key` is pending. A fault returns the key to unloaded so
    /// a later update retries it; results for keys no longer needed are
    /// cached but not realized.
    pub fn complete(&mut self, completion: Completion, host: &mut dyn BlockHost) {
        let Completion {
            key,
            result,
            elapsed,
        } = completion;

        if !self.chunks.get(&key).is_some_and(ChunkRecord::is_pending) {
            debug!(chunk = %key, "Ignoring completion for chunk that is not pending");
            self.faults.discarded += 1;
            return;
        }

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                warn!(%err, "Chunk generation failed; will retry on next update");
                self.chunks.remove(&key);
                self.faults.worker_faults += 1;
                return;
            }
        };

        self.faults.unregistered_blocks += output.unregistered;
        self.faults.failed_columns += output.failed_columns;
        if let Some(cache) = self.cache.as_mut() {
            cache.put(key, output.placements.clone());
        }

        if !self.needed.contains(&key) {
            debug!(chunk = %key, "Discarding chunk that left render distance");
            self.chunks.remove(&key);
            self.faults.discarded += 1;
            return;
        }

        debug!(
            chunk = %key,
            blocks = output.placements.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "Chunk generated"
        );
        self.realize(key, &output.placements, host);
    }

    fn realize(&mut self, key: ChunkKey, placements: &[BlockPlacement], host: &mut dyn BlockHost) {
        let mut handles = Vec::with_capacity(placements.len());
        let mut failures = 0usize;

        for placement in placements {
            match host.create_block(placement.block, placement.pos) {
                Some(handle) => handles.push(handle),
                None => {
                    let err = GenerationError::PlacementRealization {
                        block: placement.block.to_string(),
                        pos: placement.pos,
                    };
                    debug!(%err, "Skipping placement");
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            warn!(chunk = %key, failures, "Host declined some placements");
            self.faults.realization_failures += failures;
        }

        self.total_blocks += handles.len();
        self.chunks.insert(
            key,
            ChunkRecord {
                key,
                state: ChunkState::Loaded,
                handles,
            },
        );
    }

    /// Destroy every handle of a loaded chunk and forget it.
    ///
    /// Pending chunks are left alone. Returns true when something was released.
    pub fn release(&mut self, key: ChunkKey, host: &mut dyn BlockHost) -> bool {
        let Some(record) = self.chunks.get_mut(&key) else {
            return false;
        };
        if record.state != ChunkState::Loaded {
            return false;
        }

        record.state = ChunkState::Unloading;
        let handles = std::mem::take(&mut record.handles);
        for &handle in &handles {
            host.destroy_block(handle);
        }
        self.total_blocks = self.total_blocks.saturating_sub(handles.len());
        self.chunks.remove(&key);
        self.needed.remove(&key);
        true
    }

    /// Apply every completion that is ready. Returns how many were applied.
    pub fn poll(&mut self, host: &mut dyn BlockHost) -> usize {
        let done = self.scheduler.poll();
        let count = done.len();
        for completion in done {
            self.complete(completion, host);
        }
        count
    }

    /// Keep polling until nothing is pending or `timeout` passes.
    pub fn flush(&mut self, host: &mut dyn BlockHost, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut applied = 0;
        while self.pending_count() > 0 {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let wait = (deadline - now).min(Duration::from_millis(20));
            for completion in self.scheduler.poll_wait(wait) {
                self.complete(completion, host);
                applied += 1;
            }
        }
        applied
    }

    /// Bring the loaded set in line with a player position.
    pub fn update(&mut self, player_x: f64, player_z: f64, host: &mut dyn BlockHost) -> UpdateSummary {
        self.needed = self.needed_around(player_x, player_z);
        let mut summary = UpdateSummary {
            completed: self.poll(host),
            ..Default::default()
        };

        let needed: Vec<ChunkKey> = self.needed.iter().copied().collect();
        for key in needed {
            if self.request(key, host) {
                summary.requested += 1;
            }
        }

        let stale: Vec<ChunkKey> = self
            .loaded_keys()
            .filter(|key| !self.needed.contains(key))
            .collect();
        for key in stale {
            if self.release(key, host) {
                summary.released += 1;
            }
        }

        if summary.requested > 0 || summary.released > 0 {
            debug!(
                requested = summary.requested,
                released = summary.released,
                completed = summary.completed,
                loaded = self.loaded_count(),
                pending = self.pending_count(),
                "Chunk update"
            );
        }
        summary
    }

    /// Release every loaded chunk and forget pending ones.
    ///
    /// Pending results that arrive later are discarded.
    pub fn teardown(&mut self, host: &mut dyn BlockHost) {
        let loaded: Vec<ChunkKey> = self.loaded_keys().collect();
        for key in &loaded {
            self.release(*key, host);
        }
        self.chunks.clear();
        self.needed.clear();
        info!(released = loaded.len(), "Chunk store torn down");
    }

    /// Join the workers, then tear down.
    pub fn shutdown(&mut self, host: &mut dyn BlockHost) {
        let leftover = self.scheduler.shutdown();
        self.faults.discarded += leftover.len();
        self.teardown(host);
    }
}
