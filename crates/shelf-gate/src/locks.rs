use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Table of per-record locks keyed by canonical record path.
///
/// Locks are created on first use and retained for the table's lifetime, so
/// two callers addressing the same path always contend on the same mutex.
/// The table only grows.
#[derive(Default)]
pub struct PathLocks {
    table: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `path`. Callers hold `lock_for(p).lock()` for the
    /// duration of their file operation.
    pub fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(table.entry(path.to_path_buf()).or_default())
    }

    /// Number of distinct paths that have been locked.
    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PathLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathLocks").field("paths", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn same_path_same_lock() {
        let locks = PathLocks::new();
        let a = locks.lock_for(Path::new("/s/W/abc/1.json"));
        let b = locks.lock_for(Path::new("/s/W/abc/1.json"));
        let c = locks.lock_for(Path::new("/s/W/abc/2.json"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn table_retains_locks() {
        let locks = PathLocks::new();
        drop(locks.lock_for(Path::new("/x.json")));
        assert_eq!(locks.len(), 1);
        assert!(!locks.is_empty());
    }

    #[test]
    fn holders_of_one_path_are_serialized() {
        let locks = PathLocks::new();
        let inside = AtomicUsize::new(0);
        let max_inside = AtomicUsize::new(0);
        let path = Path::new("/s/W/abc/1.json");

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..20 {
                        let lock = locks.lock_for(path);
                        let _held = lock.lock().unwrap();
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_micros(50));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}
