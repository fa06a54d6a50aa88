//! One-shot completion latch

use parking_lot::{Condvar, Mutex};

/// A value that is set once and awaited by any number of threads
pub struct Completion<T> {
    state: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T: Clone> Completion<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Set the value and wake every waiter
    ///
    /// Returns false if the latch was already completed (the first value wins).
    pub fn complete(&self, value: T) -> bool {
        let mut state = self.state.lock();
        if state.is_some() {
            return false;
        }
        *state = Some(value);
        self.ready.notify_all();
        true
    }

    /// Block until the value is set, then return a copy of it
    pub fn wait(&self) -> T {
        let mut state = self.state.lock();
        loop {
            if let Some(value) = state.as_ref() {
                return value.clone();
            }
            self.ready.wait(&mut state);
        }
    }
}

impl<T: Clone> Default for Completion<T> {
    fn default() -> Self {
        Self::new()
    }
}
