//! MemTable implementation
//!
//! DashMap-backed table with a published overlay and a merge epoch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use crate::value::Value;

use super::{Pending, PendingBatch, Resolution};

/// The authoritative in-memory table
///
/// ## Concurrency:
/// - `data`: sharded map, point reads never take `merge_lock`
/// - `overlay`: the batch being merged; its lock is held only to swap the pointer
/// - `epoch`: odd while a merge is mutating `data`
/// - `merge_lock`: serializes merges, snapshots and the initial load
///
/// A reader that sees an even epoch reads `data` and re-checks the epoch; if a
/// merge started in between it retries. A reader that sees an odd epoch
/// resolves through the overlay, which already describes the merge's end state.
pub struct MemTable {
    data: DashMap<String, Value>,
    overlay: RwLock<Option<Arc<PendingBatch>>>,
    epoch: AtomicU64,
    merge_lock: Mutex<()>,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            overlay: RwLock::new(None),
            epoch: AtomicU64::new(0),
            merge_lock: Mutex::new(()),
        }
    }

    /// Get a value by key
    ///
    /// Returns the value either strictly before or strictly after any merge
    /// running concurrently, never a mixture.
    pub fn get(&self, key: &str) -> Option<Value> {
        loop {
            let start = self.epoch.load(Ordering::SeqCst);

            if start & 1 == 1 {
                let overlay = self.overlay.read().clone();
                match overlay {
                    Some(batch) => {
                        return match batch.resolve(key) {
                            Resolution::Value(value) => Some(value),
                            Resolution::Absent => None,
                            // Untouched by the merge, so stable in `data`
                            Resolution::PassThrough => self.read_base(key),
                        };
                    }
                    None => {
                        // Merge finished between the epoch load and the overlay read
                        std::hint::spin_loop();
                        continue;
                    }
                }
            }

            let value = self.read_base(key);
            if self.epoch.load(Ordering::SeqCst) == start {
                return value;
            }
        }
    }

    /// Check whether a key resolves to a value
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Merge a batch into the table as one atomic step
    ///
    /// Steps:
    /// 1. Take the merge lock
    /// 2. Publish the overlay, then mark the epoch odd
    /// 3. Clear (if requested), remove deletions, insert values
    /// 4. Mark the epoch even, then withdraw the overlay
    pub fn merge(&self, batch: Arc<PendingBatch>) {
        let _merge_guard = self.merge_lock.lock();

        *self.overlay.write() = Some(Arc::clone(&batch));
        self.epoch.fetch_add(1, Ordering::SeqCst);

        if batch.clear_first() {
            self.data.clear();
        }
        for (key, pending) in batch.changes() {
            match pending {
                Pending::Keep(value) => {
                    self.data.insert(key.clone(), value.clone());
                }
                Pending::Delete => {
                    self.data.remove(key);
                }
            }
        }

        self.epoch.fetch_add(1, Ordering::SeqCst);
        *self.overlay.write() = None;
    }

    /// Install entries decoded from disk
    pub fn load(&self, entries: Vec<(String, Value)>) {
        let mut batch = PendingBatch::new();
        for (key, value) in entries {
            batch.put(key, value);
        }
        self.merge(Arc::new(batch));
    }

    /// Copy every entry, sorted by key
    ///
    /// Taken under the merge lock, so it never reflects half a merge. The
    /// overlay is not consulted: no merge is running while the lock is held.
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        let mut entries: Vec<(String, Value)> = {
            let _merge_guard = self.merge_lock.lock();
            self.data
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect()
        };
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Get entry count (base table only)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether a merge is mutating the table right now
    pub fn is_merging(&self) -> bool {
        self.epoch.load(Ordering::SeqCst) & 1 == 1
    }

    fn read_base(&self, key: &str) -> Option<Value> {
        self.data.get(key).map(|entry| entry.value().clone())
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
