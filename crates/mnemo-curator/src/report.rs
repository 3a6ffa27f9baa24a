//! Analysis report types.
//!
//! Every suggested action carries a ULID `action_id`; Phase B executes only
//! the ids its approval source accepts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generate a fresh action id.
pub(crate) fn new_action_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Two memories whose content similarity crossed the duplicate threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicatePair {
    /// Approval handle for this merge.
    pub action_id: String,
    /// First memory of the pair.
    pub first_id: String,
    /// Second memory of the pair.
    pub second_id: String,
    /// Measured content similarity.
    pub similarity: f32,
}

/// A memory the retention policy will allow to be archived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveCandidate {
    /// Approval handle for this archival.
    pub action_id: String,
    /// The candidate memory.
    pub memory_id: String,
    /// Human-readable eligibility summary.
    pub reason: String,
    /// When the cold grace period ends (may already have passed).
    pub grace_ends: Option<DateTime<Utc>>,
}

/// A frequently recalled memory that sits below the protection threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectionSuggestion {
    /// Approval handle for this upgrade.
    pub action_id: String,
    /// The memory to upgrade.
    pub memory_id: String,
    /// Importance today.
    pub current_importance: f32,
    /// Importance after the upgrade.
    pub suggested_importance: f32,
    /// Why the upgrade is suggested.
    pub reason: String,
}

/// A high-degree node in the relationship graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentralNode {
    /// The memory id.
    pub memory_id: String,
    /// Number of graph edges touching it.
    pub degree: usize,
}

/// Structure of the relationship graph within one scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphInsights {
    /// Connected components with at least two members.
    pub cluster_count: usize,
    /// Memories with no edges at all.
    pub orphan_count: usize,
    /// Highest-degree nodes, best first.
    pub most_central: Vec<CentralNode>,
}

/// Output of the curator's read-only analysis phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Scope the analysis covered.
    pub owner_scope: String,
    /// When the analysis ran.
    pub generated_at: DateTime<Utc>,
    /// Merge candidates.
    pub duplicates: Vec<DuplicatePair>,
    /// Archival candidates.
    pub archive_candidates: Vec<ArchiveCandidate>,
    /// Importance-upgrade candidates.
    pub protection_suggestions: Vec<ProtectionSuggestion>,
    /// Relationship-graph structure.
    pub graph: GraphInsights,
}

impl AnalysisReport {
    /// All action ids in the report, in execution order.
    pub fn action_ids(&self) -> Vec<String> {
        self.duplicates
            .iter()
            .map(|d| d.action_id.clone())
            .chain(self.archive_candidates.iter().map(|a| a.action_id.clone()))
            .chain(
                self.protection_suggestions
                    .iter()
                    .map(|p| p.action_id.clone()),
            )
            .collect()
    }

    /// True when the report proposes nothing.
    pub fn is_empty(&self) -> bool {
        self.duplicates.is_empty()
            && self.archive_candidates.is_empty()
            && self.protection_suggestions.is_empty()
    }
}
