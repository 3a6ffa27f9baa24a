//! Hot pool cache.
//!
//! A bounded, most-recent-first set of memory ids that were promoted into
//! the Hot tier. The selector treats pool members as Hot-pass candidates
//! even when their current query-relative score has dipped below the band,
//! which keeps freshly reinforced memories in play between requests.
//!
//! Correctness never depends on this cache; it only widens the Hot pass.

use std::collections::VecDeque;
use std::sync::Mutex;

use mnemo_types::{Temperature, TransitionEvent};

/// Bounded LRU-ish id cache fed by transition events.
#[derive(Debug)]
pub struct HotPool {
    capacity: usize,
    inner: Mutex<VecDeque<String>>,
}

impl HotPool {
    /// Create a pool holding at most `capacity` ids.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Apply a transition event: promotions into Hot insert, departures
    /// from Hot evict.
    pub fn apply(&self, event: &TransitionEvent) {
        if event.is_hot_promotion() {
            self.insert(&event.memory_id);
        } else if event.from == Temperature::Hot {
            self.remove(&event.memory_id);
        }
    }

    /// Insert an id at the front, deduplicating and honoring capacity.
    pub fn insert(&self, id: &str) {
        let mut inner = self.inner.lock().expect("hot pool lock poisoned");
        inner.retain(|existing| existing != id);
        inner.push_front(id.to_string());
        inner.truncate(self.capacity);
    }

    /// Evict an id (archival, demotion, merge).
    pub fn remove(&self, id: &str) {
        let mut inner = self.inner.lock().expect("hot pool lock poisoned");
        inner.retain(|existing| existing != id);
    }

    /// Membership check.
    pub fn contains(&self, id: &str) -> bool {
        let inner = self.inner.lock().expect("hot pool lock poisoned");
        inner.iter().any(|existing| existing == id)
    }

    /// Current ids, most recently promoted first.
    pub fn snapshot(&self) -> Vec<String> {
        let inner = self.inner.lock().expect("hot pool lock poisoned");
        inner.iter().cloned().collect()
    }

    /// Number of cached ids.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("hot pool lock poisoned").len()
    }

    /// True when no ids are cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promotion(id: &str) -> TransitionEvent {
        TransitionEvent::detect(id, Temperature::Warm, Temperature::Hot).unwrap()
    }

    fn demotion(id: &str) -> TransitionEvent {
        TransitionEvent::detect(id, Temperature::Hot, Temperature::Warm).unwrap()
    }

    #[test]
    fn test_promotion_inserts() {
        let pool = HotPool::new(4);
        pool.apply(&promotion("a"));
        assert!(pool.contains("a"));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_demotion_evicts() {
        let pool = HotPool::new(4);
        pool.apply(&promotion("a"));
        pool.apply(&demotion("a"));
        assert!(!pool.contains("a"));
    }

    #[test]
    fn test_non_hot_transition_ignored() {
        let pool = HotPool::new(4);
        let event = TransitionEvent::detect("a", Temperature::Cool, Temperature::Warm).unwrap();
        pool.apply(&event);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_capacity_bound() {
        let pool = HotPool::new(2);
        pool.insert("a");
        pool.insert("b");
        pool.insert("c");
        assert_eq!(pool.len(), 2);
        // Oldest falls off.
        assert!(!pool.contains("a"));
        assert_eq!(pool.snapshot(), vec!["c".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_reinsert_moves_to_front() {
        let pool = HotPool::new(4);
        pool.insert("a");
        pool.insert("b");
        pool.insert("a");
        assert_eq!(pool.snapshot(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(pool.len(), 2);
    }
}
