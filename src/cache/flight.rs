use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-tag population locks.
///
/// A tag has an entry only while some caller is populating it; the entry is
/// removed when the holding guard drops. Waiters keep their own handle to the
/// mutex, so removal never strands them.
#[derive(Default, Clone)]
pub struct PopulationLocks {
    tags: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl PopulationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other caller is populating `tag`, then hold its lock.
    pub async fn acquire(&self, tag: &str) -> PopulationGuard {
        let lock = Arc::clone(self.tags.entry(tag.to_string()).or_default().value());
        let guard = Arc::clone(&lock).lock_owned().await;
        PopulationGuard {
            tag: tag.to_string(),
            lock,
            tags: Arc::clone(&self.tags),
            _guard: guard,
        }
    }

    /// Number of tags with a population currently running or queued.
    pub fn in_flight(&self) -> usize {
        self.tags.len()
    }
}

pub struct PopulationGuard {
    tag: String,
    lock: Arc<Mutex<()>>,
    tags: Arc<DashMap<String, Arc<Mutex<()>>>>,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for PopulationGuard {
    fn drop(&mut self) {
        self.tags
            .remove_if(&self.tag, |_, current| Arc::ptr_eq(current, &self.lock));
    }
}
