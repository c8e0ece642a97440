//! Single-value TTL cache for published pattern sets and DNA profiles.
//!
//! The lock is held only to clone or swap an `Arc`, so a reader sees either
//! the previous complete value or the new one. There is no way to mutate a
//! cached value in place.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Entry<T> {
    value: Arc<T>,
    written_at: Instant,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            written_at: self.written_at,
        }
    }
}

#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: Duration,
    slot: RwLock<Option<Entry<T>>>,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entry(&self) -> Option<Entry<T>> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The cached value, or `None` when empty or older than the TTL.
    pub fn get(&self) -> Option<Arc<T>> {
        self.entry()
            .filter(|e| e.written_at.elapsed() < self.ttl)
            .map(|e| e.value)
    }

    /// The cached value regardless of age.
    pub fn get_stale(&self) -> Option<Arc<T>> {
        self.entry().map(|e| e.value)
    }

    pub fn is_fresh(&self) -> bool {
        self.get().is_some()
    }

    /// Replace the whole cached value and return the shared handle.
    pub fn set(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        let entry = Entry {
            value: Arc::clone(&value),
            written_at: Instant::now(),
        };
        *self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(entry);
        value
    }

    pub fn clear(&self) {
        *self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn empty_cache_returns_none() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        assert!(cache.get().is_none());
        assert!(cache.get_stale().is_none());
    }

    #[test]
    fn set_then_get() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set(vec![1, 2, 3]);
        assert_eq!(*cache.get().unwrap(), vec![1, 2, 3]);
        assert!(cache.is_fresh());
    }

    #[test]
    fn expired_value_is_only_served_stale() {
        let cache = TtlCache::new(Duration::from_millis(10));
        cache.set("old");
        thread::sleep(Duration::from_millis(20));
        assert!(cache.get().is_none());
        assert_eq!(*cache.get_stale().unwrap(), "old");
    }

    #[test]
    fn readers_keep_their_snapshot_across_replace() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set(String::from("first"));
        let held = cache.get().unwrap();
        cache.set(String::from("second"));
        assert_eq!(*held, "first");
        assert_eq!(*cache.get().unwrap(), "second");
    }

    #[test]
    fn concurrent_readers_see_whole_values() {
        let cache = Arc::new(TtlCache::new(Duration::from_secs(60)));
        cache.set(vec![0u32; 64]);
        let writer = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 1..200u32 {
                    cache.set(vec![i; 64]);
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let v = cache.get().unwrap();
                        assert!(v.iter().all(|&x| x == v[0]));
                    }
                })
            })
            .collect();
        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
    }

    #[test]
    fn clear_empties() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set(1);
        cache.clear();
        assert!(cache.get_stale().is_none());
    }
}
