//! Editor
//!
//! Batches mutations and hands them to the store on commit/apply.

use std::collections::BTreeSet;

use crate::codec::MAX_UTF_LEN;
use crate::engine::Preferences;
use crate::memtable::PendingBatch;
use crate::value::Value;

/// A batch of pending changes against one store
///
/// Nothing is visible to readers until `commit()` or `apply()`; then the
/// whole batch lands at once. The editor is empty afterwards and can be
/// reused for the next batch.
pub struct Editor {
    prefs: Preferences,
    batch: PendingBatch,
}

impl Editor {
    pub(crate) fn new(prefs: Preferences) -> Self {
        Self {
            prefs,
            batch: PendingBatch::new(),
        }
    }

    /// Stage any value
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        if exceeds_utf_limit(&key, &value) {
            tracing::warn!(
                "Key {:?} holds a string over {} bytes; snapshot writes will fail until it is replaced or removed",
                key,
                MAX_UTF_LEN
            );
        }
        self.batch.put(key, value);
        self
    }

    /// Stage a string
    ///
    /// Strings over 65535 UTF-8 bytes cannot be persisted: the value stays
    /// readable in memory but every write fails while it is present.
    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.put(key, Value::String(value.into()))
    }

    pub fn put_string_set<I, S>(&mut self, key: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        self.put(key, Value::StringSet(set))
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i32) -> &mut Self {
        self.put(key, Value::Int(value))
    }

    pub fn put_long(&mut self, key: impl Into<String>, value: i64) -> &mut Self {
        self.put(key, Value::Long(value))
    }

    pub fn put_float(&mut self, key: impl Into<String>, value: f32) -> &mut Self {
        self.put(key, Value::Float(value))
    }

    pub fn put_boolean(&mut self, key: impl Into<String>, value: bool) -> &mut Self {
        self.put(key, Value::Bool(value))
    }

    /// Stage a deletion
    pub fn remove(&mut self, key: impl Into<String>) -> &mut Self {
        self.batch.remove(key);
        self
    }

    /// Wipe the store before applying this batch
    ///
    /// Puts staged after `clear()` survive it.
    pub fn clear(&mut self) -> &mut Self {
        self.batch.clear();
        self
    }

    /// Merge the batch and wait until it is on disk
    ///
    /// Returns whether the snapshot write carrying this batch succeeded.
    pub fn commit(&mut self) -> bool {
        let batch = std::mem::take(&mut self.batch);
        self.prefs.commit_batch(batch)
    }

    /// Merge the batch and schedule a write without waiting for it
    pub fn apply(&mut self) {
        let batch = std::mem::take(&mut self.batch);
        self.prefs.apply_batch(batch);
    }

    /// Number of keys staged so far
    pub fn pending_len(&self) -> usize {
        self.batch.len()
    }
}

/// Whether an entry has a string the snapshot format cannot length-prefix
fn exceeds_utf_limit(key: &str, value: &Value) -> bool {
    key.len() > MAX_UTF_LEN
        || match value {
            Value::String(s) => s.len() > MAX_UTF_LEN,
            Value::StringSet(set) => set.iter().any(|s| s.len() > MAX_UTF_LEN),
            _ => false,
        }
}
