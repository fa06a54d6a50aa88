//! Worker Module
//!
//! The injected execution seam for background work.
//!
//! ## Architecture
//! - `Executor`: anything that can run a boxed job somewhere else
//! - `WorkerPool`: fixed set of named threads fed by a crossbeam channel
//! - `Completion`: one-shot result latch many threads can wait on
//!
//! Two kinds of job run here: the one-time initial load and flush loops.

mod completion;
mod pool;

pub use completion::Completion;
pub use pool::{InlineExecutor, WorkerPool};

/// A unit of background work
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs on some other execution context
pub trait Executor: Send + Sync {
    /// Schedule a job
    ///
    /// Returns the job back if it cannot be accepted (e.g. the pool is shut down).
    fn execute(&self, job: Job) -> std::result::Result<(), Job>;
}

/// Schedule a job, running it on the calling thread if the executor refuses it
pub(crate) fn spawn_or_run(executor: &dyn Executor, job: Job) {
    if let Err(job) = executor.execute(job) {
        tracing::warn!("Executor rejected job, running it on the calling thread");
        job();
    }
}
