//! Per-resource mutual exclusion for the create path.
//!
//! Creations on the same resource serialize their check-then-insert; creations
//! on different resources never contend. Lock entries are held weakly and
//! dropped once no creation is using them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::checker::ResourceScope;

/// What a creation locks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LockKey {
    /// Everything: used when any slot may conflict with any other.
    Global,
    Resource(String),
}

impl LockKey {
    /// The narrowest key that still serializes every creation `scope` could
    /// consider conflicting with one on `resource`.
    pub fn for_slot(scope: ResourceScope, resource: Option<&str>) -> Self {
        match (scope, resource) {
            (ResourceScope::SameResource, Some(resource)) => LockKey::Resource(resource.to_string()),
            _ => LockKey::Global,
        }
    }
}

/// Registry of async mutexes keyed by [`LockKey`].
#[derive(Default)]
pub struct ResourceLocks {
    slots: Mutex<HashMap<LockKey, Weak<AsyncMutex<()>>>>,
}

impl ResourceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `key`. Released when the guard drops.
    pub async fn acquire(&self, key: LockKey) -> OwnedMutexGuard<()> {
        let mutex = self.mutex_for(key);
        mutex.lock_owned().await
    }

    /// Number of keys with a live lock.
    pub fn active(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.values().filter(|w| w.strong_count() > 0).count()
    }

    fn mutex_for(&self, key: LockKey) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = slots.get(&key).and_then(Weak::upgrade) {
            return existing;
        }
        slots.retain(|_, w| w.strong_count() > 0);
        let mutex = Arc::new(AsyncMutex::new(()));
        slots.insert(key, Arc::downgrade(&mutex));
        mutex
    }
}
