//! Pending batch
//!
//! The mutations an editor accumulates before a commit.

use std::collections::HashMap;

use crate::value::Value;

/// A staged change for one key
#[derive(Debug, Clone, PartialEq)]
pub enum Pending {
    /// Store this value
    Keep(Value),

    /// Delete the key
    Delete,
}

/// What a batch says about a key, as seen by a reader
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The batch installs this value
    Value(Value),

    /// The batch removes the key (explicitly, or by clearing the table)
    Absent,

    /// The batch does not touch the key
    PassThrough,
}

/// A set of staged changes plus the clear-first flag
#[derive(Debug, Default, Clone)]
pub struct PendingBatch {
    clear_first: bool,
    changes: HashMap<String, Pending>,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a value for a key
    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        self.changes.insert(key.into(), Pending::Keep(value));
    }

    /// Stage a deletion for a key
    pub fn remove(&mut self, key: impl Into<String>) {
        self.changes.insert(key.into(), Pending::Delete);
    }

    /// Wipe the table before applying the batch
    ///
    /// Changes staged before the clear are discarded; changes staged after
    /// it survive the wipe.
    pub fn clear(&mut self) {
        self.changes.clear();
        self.clear_first = true;
    }

    pub fn clear_first(&self) -> bool {
        self.clear_first
    }

    pub fn changes(&self) -> &HashMap<String, Pending> {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.clear_first && self.changes.is_empty()
    }

    /// Resolve a key against this batch as the end state it installs
    pub fn resolve(&self, key: &str) -> Resolution {
        match self.changes.get(key) {
            Some(Pending::Keep(value)) => Resolution::Value(value.clone()),
            Some(Pending::Delete) => Resolution::Absent,
            None if self.clear_first => Resolution::Absent,
            None => Resolution::PassThrough,
        }
    }
}
