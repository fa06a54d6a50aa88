//! Engine Module
//!
//! The store handle that ties the components together.
//!
//! ## Responsibilities
//! - Run the one-time initial load and gate every access on it
//! - Serve typed reads with caller-supplied defaults
//! - Route editor batches through merge and flush

use std::collections::{BTreeSet, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{Config, LoadMode};
use crate::editor::Editor;
use crate::error::Result;
use crate::flush::FlushCoordinator;
use crate::listener::{ChangeListener, ListenerRegistry, ListenerToken};
use crate::memtable::{MemTable, PendingBatch};
use crate::storage::FileStore;
use crate::value::Value;
use crate::worker::{spawn_or_run, Completion, Executor, WorkerPool};

/// A persistent preferences store
///
/// Cheap to clone; clones share the same table, flush state and files.
///
/// ## Concurrency Model
///
/// - **Reads** never take the merge lock; they wait only for the initial load
/// - **Merges** are serialized by the MemTable
/// - **Writes to disk** have a single owner at a time (FlushCoordinator)
#[derive(Clone)]
pub struct Preferences {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    table: Arc<MemTable>,
    flusher: Arc<FlushCoordinator>,
    gate: Arc<LoadGate>,
    listeners: ListenerRegistry,
}

/// One-shot gate opened when the initial load finishes
struct LoadGate {
    open: AtomicBool,
    done: Completion<()>,
}

impl LoadGate {
    fn new() -> Self {
        Self {
            open: AtomicBool::new(false),
            done: Completion::new(),
        }
    }

    fn wait(&self) {
        if self.open.load(Ordering::Acquire) {
            return;
        }
        self.done.wait();
    }

    fn release(&self) {
        self.open.store(true, Ordering::Release);
        self.done.complete(());
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

impl Preferences {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Open a store with its own worker pool
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.worker_threads, "prefstore-worker")?;
        Self::with_executor(config, Arc::new(pool))
    }

    /// Open a store at a path with default settings
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder().path(path.as_ref()).build();
        Self::open(config)
    }

    /// Open a store that runs background work on the given executor
    ///
    /// On startup:
    /// 1. Validate the config
    /// 2. Schedule (or run, for `LoadMode::Inline`) recovery and decode
    /// 3. Return; the first access waits for step 2
    pub fn with_executor(config: Config, executor: Arc<dyn Executor>) -> Result<Self> {
        config.validate()?;

        let store = FileStore::new(&config);
        let table = Arc::new(MemTable::new());
        let gate = Arc::new(LoadGate::new());
        let flusher = Arc::new(FlushCoordinator::new(
            Arc::clone(&table),
            store.clone(),
            Arc::clone(&executor),
        ));

        match config.load_mode {
            LoadMode::Inline => load_initial(&store, &table, &gate),
            LoadMode::Background => {
                let table = Arc::clone(&table);
                let gate = Arc::clone(&gate);
                spawn_or_run(
                    executor.as_ref(),
                    Box::new(move || load_initial(&store, &table, &gate)),
                );
            }
        }

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                table,
                flusher,
                gate,
                listeners: ListenerRegistry::new(),
            }),
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Copy every entry
    pub fn get_all(&self) -> HashMap<String, Value> {
        self.inner.gate.wait();
        self.inner.table.snapshot().into_iter().collect()
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.gate.wait();
        self.inner.table.get(key)
    }

    /// Get a string; `default` if absent or not a string
    pub fn get_string(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(Value::String(v)) => v,
            _ => default.to_string(),
        }
    }

    /// Get a string set; `default` if absent or not a set
    pub fn get_string_set(&self, key: &str, default: BTreeSet<String>) -> BTreeSet<String> {
        match self.get(key) {
            Some(Value::StringSet(v)) => v,
            _ => default,
        }
    }

    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        self.get(key).and_then(|v| v.as_int()).unwrap_or(default)
    }

    pub fn get_long(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(|v| v.as_long()).unwrap_or(default)
    }

    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        self.get(key).and_then(|v| v.as_float()).unwrap_or(default)
    }

    pub fn get_boolean(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
    }

    /// Check whether a key holds a value
    pub fn contains(&self, key: &str) -> bool {
        self.inner.gate.wait();
        self.inner.table.contains(key)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Start a new batch of changes
    pub fn edit(&self) -> Editor {
        Editor::new(self.clone())
    }

    /// Wait for any in-flight write and persist the current state
    pub fn flush(&self) -> bool {
        self.edit().commit()
    }

    pub(crate) fn commit_batch(&self, batch: PendingBatch) -> bool {
        self.merge(batch);
        self.inner.flusher.request_sync()
    }

    pub(crate) fn apply_batch(&self, batch: PendingBatch) {
        self.merge(batch);
        self.inner.flusher.request_async();
    }

    fn merge(&self, batch: PendingBatch) {
        // A merge must not race the initial load
        self.inner.gate.wait();
        self.inner.table.merge(Arc::new(batch));
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    pub fn register_change_listener(&self, listener: Arc<dyn ChangeListener>) -> ListenerToken {
        self.inner.listeners.register(listener)
    }

    pub fn unregister_change_listener(&self, token: ListenerToken) -> bool {
        self.inner.listeners.unregister(token)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the canonical file path
    pub fn path(&self) -> &Path {
        &self.inner.config.path
    }

    /// Get the backup artifact path
    pub fn backup_path(&self) -> PathBuf {
        self.inner.config.backup_path()
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.inner.gate.wait();
        self.inner.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the initial load has finished
    pub fn is_loaded(&self) -> bool {
        self.inner.gate.is_open()
    }

    /// Whether no flush is running or owed
    pub fn flush_idle(&self) -> bool {
        self.inner.flusher.is_idle()
    }

    /// Number of physical snapshot writes attempted
    pub fn writes_performed(&self) -> u64 {
        self.inner.flusher.writes_performed()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}

/// Recover and decode the snapshot, then open the gate
///
/// Every failure, including a panic, leaves the store empty.
fn load_initial(store: &FileStore, table: &MemTable, gate: &LoadGate) {
    match panic::catch_unwind(AssertUnwindSafe(|| store.recover())) {
        Ok(Ok((entries, result))) => {
            tracing::info!(
                "Loaded {} entries from {} (restored_from_backup={}, file_missing={})",
                result.entries_loaded,
                store.path().display(),
                result.restored_from_backup,
                result.file_missing
            );
            table.load(entries);
        }
        Ok(Err(e)) => {
            tracing::warn!(
                "Could not load {}, starting empty: {}",
                store.path().display(),
                e
            );
        }
        Err(_) => {
            tracing::error!(
                "Loader panicked reading {}, starting empty",
                store.path().display()
            );
        }
    }

    gate.release();
}
