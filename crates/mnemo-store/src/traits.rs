//! Store adapter contract.
//!
//! The hierarchy treats persistence (relational store, vector index, graph
//! store) as pluggable backends behind this trait. Adapters must provide
//! per-key atomicity via `compare_and_swap` and must never leak memories
//! across owner scopes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mnemo_types::{Memory, Result};

/// Outcome of a compare-and-swap upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The expected record matched and the update was persisted.
    Committed,
    /// Another writer got there first; nothing was written.
    Conflict,
}

/// A semantic search hit: memory id plus similarity in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredId {
    /// Id of the matching memory.
    pub id: String,
    /// Similarity of the memory content to the query.
    pub similarity: f32,
}

/// Filters for scoped range queries.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilter {
    /// Include soft-archived memories. Off by default: archived memories are
    /// excluded from normal queries but stay retrievable by id.
    pub include_archived: bool,

    /// Restrict to memories carrying every listed tag.
    pub tags: Vec<String>,

    /// Restrict to importance at or above this value.
    pub min_importance: Option<f32>,

    /// Restrict to importance strictly below this value.
    pub max_importance: Option<f32>,
}

impl MemoryFilter {
    /// Filter matching every active (non-archived) memory.
    pub fn active() -> Self {
        Self::default()
    }

    /// Builder: include archived memories.
    pub fn with_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }

    /// Builder: require a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Builder: require importance at or above `min`.
    pub fn with_min_importance(mut self, min: f32) -> Self {
        self.min_importance = Some(min);
        self
    }

    /// Builder: require importance strictly below `max`.
    pub fn with_max_importance(mut self, max: f32) -> Self {
        self.max_importance = Some(max);
        self
    }

    /// Check a memory against this filter. Scope is checked by the adapter,
    /// not here.
    pub fn matches(&self, memory: &Memory) -> bool {
        if memory.archived && !self.include_archived {
            return false;
        }
        if let Some(min) = self.min_importance {
            if memory.importance < min {
                return false;
            }
        }
        if let Some(max) = self.max_importance {
            if memory.importance >= max {
                return false;
            }
        }
        self.tags.iter().all(|t| memory.tags.contains(t))
    }
}

/// Abstract persistence contract consumed by the hierarchy.
///
/// # Scoping
///
/// Every method takes an `owner_scope`; implementations must never return
/// another scope's memories, including from semantic search and graph
/// traversal.
///
/// # Atomicity
///
/// `compare_and_swap` is the only write path the reinforcement updater uses.
/// Implementations must compare the stored record against `expected` and
/// apply `updated` only when they match, atomically per key.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Point lookup by id. Returns `Ok(None)` when absent; archived memories
    /// are still returned here.
    async fn get(&self, scope: &str, id: &str) -> Result<Option<Memory>>;

    /// Unconditional upsert.
    async fn upsert(&self, memory: Memory) -> Result<()>;

    /// Conditional upsert: write `updated` only if the stored record equals
    /// `expected`.
    async fn compare_and_swap(&self, expected: &Memory, updated: Memory) -> Result<CasOutcome>;

    /// Scoped range query with filters.
    async fn query(&self, scope: &str, filter: &MemoryFilter) -> Result<Vec<Memory>>;

    /// Top-k semantic matches for a free-text query, best first.
    async fn semantic_search(&self, scope: &str, query: &str, k: usize) -> Result<Vec<ScoredId>>;

    /// Ids adjacent to `id` in the relationship graph.
    async fn graph_neighbors(&self, scope: &str, id: &str) -> Result<Vec<String>>;
}
