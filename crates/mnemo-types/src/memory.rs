//! The core `Memory` entity.
//!
//! A memory is the stored unit of recall: a text payload plus the statistics
//! the hierarchy needs to score, tier, protect, and eventually archive it.
//!
//! ## Mutation discipline
//!
//! - `importance` moves up only through the reinforcement updater or an
//!   explicit user override; nothing decays it automatically (decay is
//!   expressed through recency in the score, never by mutating importance).
//! - `access_count` and `last_accessed_at` move forward together, only via
//!   the updater.
//! - `archived` is a soft flag. This subsystem never hard-deletes.
//! - Score and temperature are derived on demand and never persisted as
//!   authoritative state.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single stored memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// Opaque unique identifier (ULID), immutable.
    pub id: String,

    /// Partition key: all queries are scoped to the owning user/session.
    pub owner_scope: String,

    /// The remembered fact, decision, or note.
    pub content: String,

    /// Long-term significance in [0.0, 1.0].
    pub importance: f32,

    /// How many times this memory has been recalled.
    pub access_count: u32,

    /// Creation timestamp, immutable.
    pub created_at: DateTime<Utc>,

    /// Timestamp of the most recent recall.
    pub last_accessed_at: DateTime<Utc>,

    /// Unordered tag set used for filtering and curator clustering.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    /// Weak references to related memories. Adjacency is owned by the graph
    /// collaborator behind the store adapter; these are hints, not owning
    /// pointers.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub related_ids: BTreeSet<String>,

    /// Soft-archive flag. Archived memories are excluded from normal queries
    /// but stay retrievable by id or explicit search.
    #[serde(default)]
    pub archived: bool,

    /// When the memory was archived, if ever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,

    /// When the memory was first observed in the Cold tier by the curator
    /// sweep. Cleared whenever the memory is observed outside Cold. Retention
    /// rule 3 reads this to measure the cold grace period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cold_since: Option<DateTime<Utc>>,
}

impl Memory {
    /// Create a new memory with a generated ULID and a caller-supplied
    /// initial importance (clamped into [0, 1]).
    pub fn new(
        owner_scope: impl Into<String>,
        content: impl Into<String>,
        importance: f32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            owner_scope: owner_scope.into(),
            content: content.into(),
            importance: importance.clamp(0.0, 1.0),
            access_count: 0,
            created_at: now,
            last_accessed_at: now,
            tags: BTreeSet::new(),
            related_ids: BTreeSet::new(),
            archived: false,
            archived_at: None,
            cold_since: None,
        }
    }

    /// Builder: add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Builder: link a related memory id.
    pub fn with_related(mut self, id: impl Into<String>) -> Self {
        self.related_ids.insert(id.into());
        self
    }

    /// Days elapsed since the last recall (fractional).
    pub fn idle_days(&self, now: DateTime<Utc>) -> f32 {
        let idle = now.signed_duration_since(self.last_accessed_at);
        (idle.num_seconds().max(0) as f32) / 86_400.0
    }

    /// Absorb another memory into this one (curator merge rule).
    ///
    /// Keeps the higher importance, sums access counts (saturating), unions
    /// tags and related ids, keeps the earliest creation time and the latest
    /// access time. The other record is expected to be archived by the
    /// caller; merge never deletes.
    pub fn merge_from(&mut self, other: &Memory) {
        self.importance = self.importance.max(other.importance);
        self.access_count = self.access_count.saturating_add(other.access_count);
        self.created_at = self.created_at.min(other.created_at);
        self.last_accessed_at = self.last_accessed_at.max(other.last_accessed_at);
        self.tags.extend(other.tags.iter().cloned());
        self.related_ids
            .extend(other.related_ids.iter().cloned());
        // The merged record must not point at itself.
        let own_id = self.id.clone();
        self.related_ids.remove(&own_id);
        self.related_ids.remove(&other.id);
    }
}
