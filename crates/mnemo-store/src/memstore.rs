//! In-memory reference store.
//!
//! Implements the full `MemoryStore` contract over a `Mutex<HashMap>`:
//! real per-key CAS semantics, scope isolation, naive word-overlap semantic
//! search, and bidirectional `related_ids` adjacency. Used by every test in
//! the workspace and suitable for demos; production deployments plug in a
//! durable adapter instead.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use mnemo_types::{Memory, Result};

use crate::traits::{CasOutcome, MemoryFilter, MemoryStore, ScoredId};

/// Keyed by (owner_scope, id).
type Key = (String, String);

/// Reference in-memory store with per-key CAS.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<HashMap<Key, Memory>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all scopes (archived included).
    pub fn len(&self) -> usize {
        self.inner.lock().expect("store lock poisoned").len()
    }

    /// True when the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn word_set(text: &str) -> BTreeSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect()
    }

    /// Jaccard overlap of lowercased word sets, in [0, 1].
    fn overlap(query: &BTreeSet<String>, content: &str) -> f32 {
        if query.is_empty() {
            return 0.0;
        }
        let words = Self::word_set(content);
        if words.is_empty() {
            return 0.0;
        }
        let shared = query.intersection(&words).count();
        let union = query.union(&words).count();
        shared as f32 / union as f32
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn get(&self, scope: &str, id: &str) -> Result<Option<Memory>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.get(&(scope.to_string(), id.to_string())).cloned())
    }

    async fn upsert(&self, memory: Memory) -> Result<()> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.insert((memory.owner_scope.clone(), memory.id.clone()), memory);
        Ok(())
    }

    async fn compare_and_swap(&self, expected: &Memory, updated: Memory) -> Result<CasOutcome> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let key = (expected.owner_scope.clone(), expected.id.clone());
        match inner.get(&key) {
            Some(stored) if stored == expected => {
                inner.insert(key, updated);
                Ok(CasOutcome::Committed)
            }
            _ => Ok(CasOutcome::Conflict),
        }
    }

    async fn query(&self, scope: &str, filter: &MemoryFilter) -> Result<Vec<Memory>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let mut results: Vec<Memory> = inner
            .iter()
            .filter(|((s, _), m)| s == scope && filter.matches(m))
            .map(|(_, m)| m.clone())
            .collect();
        // Deterministic order for callers that iterate.
        results.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(results)
    }

    async fn semantic_search(&self, scope: &str, query: &str, k: usize) -> Result<Vec<ScoredId>> {
        let query_words = Self::word_set(query);
        let inner = self.inner.lock().expect("store lock poisoned");
        let mut hits: Vec<ScoredId> = inner
            .iter()
            .filter(|((s, _), m)| s == scope && !m.archived)
            .map(|((_, id), m)| ScoredId {
                id: id.clone(),
                similarity: Self::overlap(&query_words, &m.content),
            })
            .filter(|hit| hit.similarity > 0.0)
            .collect();
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    async fn graph_neighbors(&self, scope: &str, id: &str) -> Result<Vec<String>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let mut neighbors = BTreeSet::new();
        // Forward edges from the memory itself.
        if let Some(m) = inner.get(&(scope.to_string(), id.to_string())) {
            neighbors.extend(m.related_ids.iter().cloned());
        }
        // Reverse edges: anything in scope pointing at this id.
        for ((s, other_id), m) in inner.iter() {
            if s == scope && other_id != id && m.related_ids.contains(id) {
                neighbors.insert(other_id.clone());
            }
        }
        neighbors.remove(id);
        Ok(neighbors.into_iter().collect())
    }
}
