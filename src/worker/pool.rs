//! Worker pool
//!
//! Fixed-size thread pool over a crossbeam channel.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};
use parking_lot::{Mutex, RwLock};

use crate::error::{PrefError, Result};

use super::{Executor, Job};

/// A fixed set of worker threads
///
/// Jobs that panic are logged and do not take their worker down. Dropping
/// the pool closes the channel and joins the workers after they drain it.
pub struct WorkerPool {
    sender: RwLock<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Start a pool with `threads` workers named `{name}-{i}`
    pub fn new(threads: usize, name: &str) -> Result<Self> {
        if threads == 0 {
            return Err(PrefError::Config("worker pool needs at least one thread".into()));
        }

        let (sender, receiver) = channel::unbounded::<Job>();
        let mut workers = Vec::with_capacity(threads);

        for i in 0..threads {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-{}", name, i))
                .spawn(move || {
                    for job in receiver.iter() {
                        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                            tracing::error!("Worker job panicked");
                        }
                    }
                })?;
            workers.push(handle);
        }

        tracing::debug!("Started worker pool {:?} with {} threads", name, threads);

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(workers),
        })
    }

    /// Stop accepting jobs; queued jobs still run
    pub fn shutdown(&self) {
        self.sender.write().take();
    }
}

impl Executor for WorkerPool {
    fn execute(&self, job: Job) -> std::result::Result<(), Job> {
        match self.sender.read().as_ref() {
            Some(sender) => sender.send(job).map_err(|e| e.into_inner()),
            None => Err(job),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();

        // The last handle may be dropped by a job on one of our own workers
        let current = thread::current().id();
        for handle in self.workers.lock().drain(..) {
            if handle.thread().id() != current {
                let _ = handle.join();
            }
        }
    }
}

/// Runs every job on the calling thread
///
/// Useful for tests and single-threaded embedders; `apply()` then blocks on
/// the write it schedules.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) -> std::result::Result<(), Job> {
        job();
        Ok(())
    }
}
