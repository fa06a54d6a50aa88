//! Change listener registry
//!
//! Registration bookkeeping only; the store does not deliver notifications.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Something interested in changes to a store
pub trait ChangeListener: Send + Sync {
    /// Called with the key that changed
    fn on_change(&self, key: &str);
}

impl<F> ChangeListener for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_change(&self, key: &str) {
        self(key)
    }
}

/// Opaque handle returned by registration, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(u64);

/// The set of registered listeners, keyed by token
#[derive(Default)]
pub struct ListenerRegistry {
    next_token: AtomicU64,
    listeners: Mutex<HashMap<ListenerToken, Arc<dyn ChangeListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener; the same listener may be registered more than once
    pub fn register(&self, listener: Arc<dyn ChangeListener>) -> ListenerToken {
        let token = ListenerToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().insert(token, listener);
        token
    }

    /// Remove a listener; returns false if the token was not registered
    pub fn unregister(&self, token: ListenerToken) -> bool {
        self.listeners.lock().remove(&token).is_some()
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}
