//! Free-list object pools for the per-parse lookup table and circular
//! guard.
//!
//! Repeated parse calls on one [`Parser`](crate::parser::Parser) would
//! otherwise allocate and drop a fresh map and set each time. The pools
//! hand out reset instances and take them back at the end of every call,
//! on success and failure alike. Checkout is call-stack scoped: a pooled
//! instance is owned by exactly one parse call at a time, which is why the
//! pools require `&mut` access rather than interior mutability.
//!
//! Pooling is a performance device only. Dropping this module and
//! allocating fresh instances per call would not change any observable
//! parser behavior.

use std::collections::{HashMap, HashSet};

/// An object that can be wiped back to its empty state for reuse. Reset
/// must leave no trace of the previous checkout; capacity may be retained,
/// that is the point.
pub trait Reusable: Default {
    fn reset(&mut self);
}

impl<K, V> Reusable for HashMap<K, V> {
    fn reset(&mut self) {
        self.clear();
    }
}

impl<T> Reusable for HashSet<T> {
    fn reset(&mut self) {
        self.clear();
    }
}

/// A bounded free list of reusable instances.
#[derive(Debug)]
pub struct Pool<T: Reusable> {
    free: Vec<T>,
    max_size: usize,
}

impl<T: Reusable> Pool<T> {
    pub fn new(max_size: usize) -> Self {
        Pool {
            free: Vec::new(),
            max_size,
        }
    }

    /// Take an instance from the free list, or create one.
    pub fn acquire(&mut self) -> T {
        self.free.pop().unwrap_or_default()
    }

    /// Reset an instance and return it to the free list. Instances beyond
    /// `max_size` are dropped instead of retained.
    pub fn release(&mut self, mut instance: T) {
        if self.free.len() < self.max_size {
            instance.reset();
            self.free.push(instance);
        }
    }

    pub fn clear(&mut self) {
        self.free.clear();
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}

/// Pool of `included` lookup tables (canonical key → index into the
/// document's `included` array).
pub type MapPool = Pool<HashMap<String, usize>>;

/// Pool of circular-reference guard sets.
pub type SetPool = Pool<HashSet<String>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_from_empty_pool_creates() {
        let mut pool: MapPool = Pool::new(4);
        let map = pool.acquire();
        assert!(map.is_empty());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_release_resets_and_retains() {
        let mut pool: SetPool = Pool::new(4);
        let mut set = pool.acquire();
        set.insert("article-1".to_string());
        pool.release(set);
        assert_eq!(pool.len(), 1);

        // The reused instance must carry no state from the last checkout.
        let set = pool.acquire();
        assert!(set.is_empty());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_release_beyond_capacity_drops() {
        let mut pool: MapPool = Pool::new(1);
        pool.release(HashMap::new());
        pool.release(HashMap::new());
        assert_eq!(pool.len(), 1);
    }
}
