//! Flush Coordinator
//!
//! Owns the pending-request counter and the single-writer loop.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::memtable::MemTable;
use crate::storage::FileStore;
use crate::worker::{spawn_or_run, Completion, Executor};

/// Coordinates snapshot writes for one store
///
/// ## Ownership:
/// The request that moves `pending` off zero becomes the owner and runs
/// the write loop; every other request only bumps the counter. The owner
/// keeps writing until a write finishes with no new request arriving during
/// it, so a request is always covered by a write that started after it.
///
/// ## Cycles:
/// Each owner loop has one `Completion<bool>`. The counter bump and the
/// cycle lookup happen under `cycle`, so a waiting `commit()` always gets
/// the result of the loop that will persist its data.
pub struct FlushCoordinator {
    table: Arc<MemTable>,
    store: FileStore,
    executor: Arc<dyn Executor>,

    /// Requests not yet covered by a finished write
    pending: AtomicUsize,

    /// Result latch of the current owner loop
    cycle: Mutex<Arc<Completion<bool>>>,

    /// Physical writes attempted (diagnostics)
    writes: AtomicU64,
}

impl FlushCoordinator {
    pub fn new(table: Arc<MemTable>, store: FileStore, executor: Arc<dyn Executor>) -> Self {
        Self {
            table,
            store,
            executor,
            pending: AtomicUsize::new(0),
            cycle: Mutex::new(Arc::new(Completion::new())),
            writes: AtomicU64::new(0),
        }
    }

    /// Request a flush and wait until the caller's data is written
    ///
    /// If no flush is running, writes on the calling thread. Should more
    /// requests arrive during that write, the rest of the loop moves to the
    /// executor and this call returns its own write's result. Otherwise
    /// waits for the running loop to finish and returns its result.
    pub fn request_sync(self: &Arc<Self>) -> bool {
        let (owner, cycle) = self.enter();
        if !owner {
            return cycle.wait();
        }

        let started = self.pending.load(Ordering::SeqCst);
        let success = self.write_once();
        if self.try_finish(started) {
            cycle.complete(success);
            return success;
        }

        tracing::debug!("Flush requested during synchronous write, continuing in background");
        self.spawn_loop(cycle);
        success
    }

    /// Request a flush without waiting for it
    pub fn request_async(self: &Arc<Self>) {
        let (owner, cycle) = self.enter();
        if owner {
            self.spawn_loop(cycle);
        }
    }

    /// No flush is running or owed
    pub fn is_idle(&self) -> bool {
        self.pending.load(Ordering::SeqCst) == 0
    }

    /// Number of physical snapshot writes attempted so far
    pub fn writes_performed(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Register a request; returns whether the caller owns the loop
    fn enter(&self) -> (bool, Arc<Completion<bool>>) {
        let mut cycle = self.cycle.lock();
        let previous = self.pending.fetch_add(1, Ordering::SeqCst);
        if previous == 0 {
            *cycle = Arc::new(Completion::new());
        }
        (previous == 0, Arc::clone(&cycle))
    }

    fn spawn_loop(self: &Arc<Self>, cycle: Arc<Completion<bool>>) {
        let this = Arc::clone(self);
        spawn_or_run(
            self.executor.as_ref(),
            Box::new(move || {
                let success = this.run_loop();
                cycle.complete(success);
            }),
        );
    }

    /// Write until a write completes with no request arriving during it
    fn run_loop(&self) -> bool {
        let mut rounds = 0u32;
        loop {
            let started = self.pending.load(Ordering::SeqCst);
            let success = self.write_once();
            rounds += 1;
            if self.try_finish(started) {
                tracing::debug!(
                    "Flush loop finished after {} write(s), success={}",
                    rounds,
                    success
                );
                return success;
            }
        }
    }

    fn try_finish(&self, started: usize) -> bool {
        self.pending
            .compare_exchange(started, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// One snapshot write; failures are logged and reported as `false`
    fn write_once(&self) -> bool {
        let entries = self.table.snapshot();
        self.writes.fetch_add(1, Ordering::SeqCst);

        match self.store.write(&entries) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "Snapshot write to {} failed: {}",
                    self.store.path().display(),
                    e
                );
                false
            }
        }
    }
}
