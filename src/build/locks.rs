//! Per-path build locks.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<PathBuf, Arc<Mutex<()>>>;

/// Async mutexes keyed by path, created on demand and dropped when uncontended.
#[derive(Debug, Clone, Default)]
pub struct PathLocks {
    inner: Arc<LockMap>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `path`.
    pub async fn acquire(&self, path: &Path) -> PathGuard {
        let lock = self
            .inner
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;
        PathGuard {
            guard: Some(guard),
            path: path.to_path_buf(),
            locks: self.inner.clone(),
        }
    }

    /// Number of paths with a live lock entry.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Held for the duration of one build.
#[derive(Debug)]
pub struct PathGuard {
    guard: Option<OwnedMutexGuard<()>>,
    path: PathBuf,
    locks: Arc<LockMap>,
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        // Release first so the guard's own Arc is gone before the count check.
        drop(self.guard.take());
        // Only the map's reference left: nobody holds or waits on this lock.
        self.locks
            .remove_if(&self.path, |_, lock| Arc::strong_count(lock) == 1);
    }
}
