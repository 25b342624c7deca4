//! Chunk generation scheduling.
//!
//! A [`Scheduler`] either generates inline on the calling thread or feeds a
//! fixed pool of named worker threads over crossbeam channels. Workers only
//! produce inert [`ChunkOutput`]s; completions are drained on the owning
//! thread by [`Scheduler::poll`], which is the only place results re-enter
//! the chunk store.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, warn};
use voxelgen_core::ChunkKey;

use crate::error::GenerationError;
use crate::generator::ChunkOutput;

/// Something that turns a chunk key into placements.
///
/// Implementations are shared with every worker thread.
pub trait PlacementSource: Send + Sync {
    fn generate(&self, key: ChunkKey) -> ChunkOutput;
}

/// Outcome of one generation job.
pub type GenerationResult = Result<ChunkOutput, GenerationError>;

/// A finished generation job.
#[derive(Debug)]
pub struct Completion {
    /// Chunk the job was dispatched for.
    pub key: ChunkKey,
    /// Placements, or the fault that ended the job.
    pub result: GenerationResult,
    /// Wall time spent generating.
    pub elapsed: Duration,
}

/// Run one job, converting a panic into [`GenerationError::WorkerFault`].
pub fn run_guarded(source: &dyn PlacementSource, key: ChunkKey) -> Completion {
    let start = Instant::now();
    let result = catch_unwind(AssertUnwindSafe(|| source.generate(key)))
        .map_err(|payload| GenerationError::from_panic(key, payload.as_ref()));
    Completion {
        key,
        result,
        elapsed: start.elapsed(),
    }
}

/// Background generation threads fed by an unbounded job channel.
struct WorkerPool {
    jobs: Option<Sender<ChunkKey>>,
    results: Receiver<Completion>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn up to `count` workers; fewer if the OS refuses threads.
    fn spawn(source: &Arc<dyn PlacementSource>, count: usize) -> Self {
        let (job_tx, job_rx) = unbounded::<ChunkKey>();
        let (result_tx, result_rx) = unbounded::<Completion>();
        let mut workers = Vec::with_capacity(count);

        for index in 0..count {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let source = Arc::clone(source);

            let spawned = std::thread::Builder::new()
                .name("chunk-gen-worker".into())
                .spawn(move || {
                    while let Ok(key) = jobs.recv() {
                        let completion = run_guarded(source.as_ref(), key);
                        if results.send(completion).is_err() {
                            break;
                        }
                    }
                    debug!(worker = index, "Chunk worker exiting");
                });

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    warn!(%err, worker = index, "Failed to spawn chunk worker");
                    break;
                }
            }
        }

        Self {
            jobs: Some(job_tx),
            results: result_rx,
            workers,
        }
    }

    /// Close the job channel and join every worker once it drains.
    fn shutdown(&mut self) -> Vec<Completion> {
        self.jobs.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("Chunk worker panicked outside a job");
            }
        }
        self.results.try_iter().collect()
    }
}

enum Mode {
    Inline(VecDeque<Completion>),
    Pool(WorkerPool),
}

/// Dispatches chunk generation inline or to a worker pool.
pub struct Scheduler {
    source: Arc<dyn PlacementSource>,
    mode: Mode,
    in_flight: usize,
    dispatched: u64,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("workers", &self.worker_count())
            .field("in_flight", &self.in_flight)
            .field("dispatched", &self.dispatched)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Create a scheduler; `worker_count == 0` generates inline.
    pub fn new(source: Arc<dyn PlacementSource>, worker_count: usize) -> Self {
        let mode = if worker_count == 0 {
            Mode::Inline(VecDeque::new())
        } else {
            let pool = WorkerPool::spawn(&source, worker_count);
            if pool.workers.is_empty() {
                warn!("No chunk workers available; generating inline");
                Mode::Inline(VecDeque::new())
            } else {
                Mode::Pool(pool)
            }
        };

        Self {
            source,
            mode,
            in_flight: 0,
            dispatched: 0,
        }
    }

    /// The shared placement source.
    pub fn source(&self) -> &Arc<dyn PlacementSource> {
        &self.source
    }

    /// Number of live worker threads (0 when inline).
    pub fn worker_count(&self) -> usize {
        match &self.mode {
            Mode::Inline(_) => 0,
            Mode::Pool(pool) => pool.workers.len(),
        }
    }

    /// Jobs dispatched and not yet returned by [`poll`](Self::poll).
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Total jobs ever dispatched.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Queue generation of `key`.
    pub fn dispatch(&mut self, key: ChunkKey) {
        self.dispatched += 1;
        self.in_flight += 1;

        match &mut self.mode {
            Mode::Inline(ready) => ready.push_back(run_guarded(self.source.as_ref(), key)),
            Mode::Pool(pool) => {
                let sent = pool
                    .jobs
                    .as_ref()
                    .map(|jobs| jobs.send(key).is_ok())
                    .unwrap_or(false);
                if !sent {
                    warn!(chunk = %key, "Worker pool unavailable; generating inline");
                    // Keep whatever the workers finished before they went away.
                    let mut ready: VecDeque<Completion> = pool.shutdown().into();
                    ready.push_back(run_guarded(self.source.as_ref(), key));
                    self.mode = Mode::Inline(ready);
                }
            }
        }
    }

    /// Drain finished jobs without blocking.
    pub fn poll(&mut self) -> Vec<Completion> {
        let done: Vec<Completion> = match &mut self.mode {
            Mode::Inline(ready) => ready.drain(..).collect(),
            Mode::Pool(pool) => pool.results.try_iter().collect(),
        };
        self.in_flight = self.in_flight.saturating_sub(done.len());
        done
    }

    /// Block up to `timeout` for at least one completion, then drain the rest.
    pub fn poll_wait(&mut self, timeout: Duration) -> Vec<Completion> {
        let first = match &mut self.mode {
            Mode::Inline(_) => None,
            Mode::Pool(pool) => match pool.results.recv_timeout(timeout) {
                Ok(completion) => Some(completion),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
            },
        };
        let mut done: Vec<Completion> = first.into_iter().collect();
        if !done.is_empty() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        done.extend(self.poll());
        done
    }

    /// Stop accepting work, let workers finish queued jobs and join them.
    ///
    /// Returns completions that were never polled. Later dispatches run inline.
    pub fn shutdown(&mut self) -> Vec<Completion> {
        let mut leftover = self.poll();
        if let Mode::Pool(pool) = &mut self.mode {
            leftover.extend(pool.shutdown());
            self.mode = Mode::Inline(VecDeque::new());
        }
        self.in_flight = 0;
        leftover
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Mode::Pool(pool) = &mut self.mode {
            pool.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use voxelgen_core::BlockPlacement;

    struct Flat;

    impl PlacementSource for Flat {
        fn generate(&self, key: ChunkKey) -> ChunkOutput {
            ChunkOutput {
                placements: vec![BlockPlacement::new("stone", key.x, 0, key.z)],
                ..Default::default()
            }
        }
    }

    /// Panics on chunks with negative x.
    struct Faulty;

    impl PlacementSource for Faulty {
        fn generate(&self, key: ChunkKey) -> ChunkOutput {
            if key.x < 0 {
                panic!("corrupt noise table");
            }
            Flat.generate(key)
        }
    }

    fn collect_all(scheduler: &mut Scheduler, expected: usize) -> Vec<Completion> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut done = Vec::new();
        while done.len() < expected && Instant::now() < deadline {
            done.extend(scheduler.poll_wait(Duration::from_millis(50)));
        }
        done
    }

    #[test]
    fn inline_completes_on_next_poll() {
        let mut scheduler = Scheduler::new(Arc::new(Flat), 0);
        assert_eq!(scheduler.worker_count(), 0);

        scheduler.dispatch(ChunkKey::new(2, 3));
        assert_eq!(scheduler.in_flight(), 1);

        let done = scheduler.poll();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].key, ChunkKey::new(2, 3));
        assert_eq!(done[0].result.as_ref().unwrap().placements.len(), 1);
        assert_eq!(scheduler.in_flight(), 0);
        assert!(scheduler.poll().is_empty());
    }

    #[test]
    fn pool_completes_every_job() {
        let mut scheduler = Scheduler::new(Arc::new(Flat), 3);
        assert_eq!(scheduler.worker_count(), 3);

        let keys: BTreeSet<_> = ChunkKey::new(0, 0).square_around(2).collect();
        for &key in &keys {
            scheduler.dispatch(key);
        }
        assert_eq!(scheduler.dispatched(), 25);

        let done = collect_all(&mut scheduler, keys.len());
        let returned: BTreeSet<_> = done.iter().map(|c| c.key).collect();
        assert_eq!(returned, keys);
        assert_eq!(scheduler.in_flight(), 0);
        assert!(scheduler.shutdown().is_empty());
    }

    #[test]
    fn panics_become_worker_faults_and_pool_survives() {
        let mut scheduler = Scheduler::new(Arc::new(Faulty), 1);
        scheduler.dispatch(ChunkKey::new(-1, 0));
        scheduler.dispatch(ChunkKey::new(1, 0));

        let done = collect_all(&mut scheduler, 2);
        assert_eq!(done.len(), 2);
        for completion in done {
            match (completion.key.x, completion.result) {
                (-1, Err(GenerationError::WorkerFault { key, reason })) => {
                    assert_eq!(key, ChunkKey::new(-1, 0));
                    assert_eq!(reason, "corrupt noise table");
                }
                (1, Ok(output)) => assert_eq!(output.placements.len(), 1),
                other => panic!("unexpected completion {other:?}"),
            }
        }
    }

    #[test]
    fn inline_panics_are_captured_too() {
        let mut scheduler = Scheduler::new(Arc::new(Faulty), 0);
        scheduler.dispatch(ChunkKey::new(-4, 4));
        let done = scheduler.poll();
        assert!(matches!(
            done[0].result,
            Err(GenerationError::WorkerFault { .. })
        ));
    }

    #[test]
    fn lost_pool_hands_over_finished_jobs() {
        let mut scheduler = Scheduler::new(Arc::new(Flat), 2);
        for x in 0..5 {
            scheduler.dispatch(ChunkKey::new(x, 0));
        }
        // Closing the job channel makes the next send fail.
        if let Mode::Pool(pool) = &mut scheduler.mode {
            pool.jobs.take();
        }
        scheduler.dispatch(ChunkKey::new(5, 0));
        assert_eq!(scheduler.worker_count(), 0);

        let done = scheduler.poll();
        let returned: BTreeSet<_> = done.iter().map(|c| c.key).collect();
        let expected: BTreeSet<_> = (0..6).map(|x| ChunkKey::new(x, 0)).collect();
        assert_eq!(returned, expected);
        assert_eq!(scheduler.in_flight(), 0);
    }

    #[test]
    fn shutdown_drains_queued_jobs() {
        let mut scheduler = Scheduler::new(Arc::new(Flat), 2);
        for key in ChunkKey::new(0, 0).square_around(3) {
            scheduler.dispatch(key);
        }
        let leftover = scheduler.shutdown();
        assert_eq!(leftover.len(), 49);
        assert_eq!(scheduler.worker_count(), 0);

        // Dispatch after shutdown degrades to inline generation.
        scheduler.dispatch(ChunkKey::new(9, 9));
        assert_eq!(scheduler.poll().len(), 1);
    }
}
