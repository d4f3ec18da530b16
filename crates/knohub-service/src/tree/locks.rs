//! Per-scope async locks.
//!
//! Every mutating engine operation holds the lock of each sibling scope it
//! touches until its transaction commits. Scopes are locked in sorted order,
//! so two operations can never wait on each other in a cycle.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use knohub_entity::file_item::SiblingScope;

/// Idle lock entries kept before a prune pass.
const PRUNE_THRESHOLD: usize = 1024;

/// Registry of sibling-scope mutexes.
#[derive(Debug, Default)]
pub struct ScopeLocks {
    locks: DashMap<SiblingScope, Arc<Mutex<()>>>,
}

/// Holds a set of scope locks; dropping it releases them.
#[derive(Debug)]
pub struct ScopeGuard {
    scopes: Vec<SiblingScope>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl ScopeGuard {
    /// Scopes covered by this guard, sorted.
    pub fn scopes(&self) -> &[SiblingScope] {
        &self.scopes
    }

    pub fn covers(&self, scope: &SiblingScope) -> bool {
        self.scopes.binary_search(scope).is_ok()
    }
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every scope in `scopes`, waiting as needed.
    pub async fn acquire(&self, scopes: impl IntoIterator<Item = SiblingScope>) -> ScopeGuard {
        let mut scopes: Vec<SiblingScope> = scopes.into_iter().collect();
        scopes.sort();
        scopes.dedup();

        if self.locks.len() > PRUNE_THRESHOLD {
            self.prune();
        }

        let mut guards = Vec::with_capacity(scopes.len());
        for scope in &scopes {
            let mutex = Arc::clone(self.locks.entry(*scope).or_default().value());
            guards.push(mutex.lock_owned().await);
        }

        ScopeGuard {
            scopes,
            _guards: guards,
        }
    }

    /// Drop entries nobody holds or waits on.
    pub fn prune(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
