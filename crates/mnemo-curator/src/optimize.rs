//! Phase B: execute approved actions from an analysis report.
//!
//! Phase C (autonomous curation) is this same path with [`AutoApprove`] as
//! the approval source. Every action re-validates against live store state
//! before writing, because the report may be stale by execution time. One
//! action failing never aborts the rest.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use mnemo_store::CasOutcome;
use mnemo_types::{HierarchyError, Memory, Result};

use crate::approval::ApprovalSource;
use crate::report::{AnalysisReport, ArchiveCandidate, DuplicatePair, ProtectionSuggestion};
use crate::Curator;

const UPGRADE_RETRY_LIMIT: u32 = 3;

/// What an action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    MergeDuplicates,
    Archive,
    ProtectionUpgrade,
}

/// How an approved action ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// The write landed.
    Applied,
    /// Live state no longer justified the action.
    Skipped(String),
    /// The write was attempted and failed.
    Failed(String),
}

/// Outcome of one approved action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub action_id: String,
    pub kind: ActionKind,
    pub status: ActionStatus,
}

/// Outcome of an optimize run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeOutcome {
    /// Scope the run covered.
    pub owner_scope: String,
    /// One entry per approved action, in execution order.
    pub actions: Vec<ActionResult>,
    /// True when cancellation stopped the run before all approved actions ran.
    pub cancelled: bool,
}

impl OptimizeOutcome {
    /// Actions whose write landed.
    pub fn applied_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| a.status == ActionStatus::Applied)
            .count()
    }
}

impl Curator {
    /// Execute the approved subset of a report against live store state.
    pub async fn optimize(
        &self,
        scope: &str,
        report: &AnalysisReport,
        approval: &dyn ApprovalSource,
        cancel: &CancellationToken,
    ) -> Result<OptimizeOutcome> {
        let mut outcome = OptimizeOutcome {
            owner_scope: scope.to_string(),
            actions: Vec::new(),
            cancelled: false,
        };

        for pair in &report.duplicates {
            if !approval.approves(&pair.action_id) {
                continue;
            }
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                return Ok(outcome);
            }
            let status = self.execute_merge(scope, pair).await;
            outcome.actions.push(ActionResult {
                action_id: pair.action_id.clone(),
                kind: ActionKind::MergeDuplicates,
                status,
            });
        }

        for candidate in &report.archive_candidates {
            if !approval.approves(&candidate.action_id) {
                continue;
            }
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                return Ok(outcome);
            }
            let status = self.execute_archive(scope, candidate).await;
            outcome.actions.push(ActionResult {
                action_id: candidate.action_id.clone(),
                kind: ActionKind::Archive,
                status,
            });
        }

        for suggestion in &report.protection_suggestions {
            if !approval.approves(&suggestion.action_id) {
                continue;
            }
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                return Ok(outcome);
            }
            let status = self.execute_upgrade(scope, suggestion).await;
            outcome.actions.push(ActionResult {
                action_id: suggestion.action_id.clone(),
                kind: ActionKind::ProtectionUpgrade,
                status,
            });
        }

        debug!(
            scope,
            applied = outcome.applied_count(),
            total = outcome.actions.len(),
            cancelled = outcome.cancelled,
            "optimize run finished"
        );
        Ok(outcome)
    }

    /// Merge a duplicate pair: the higher-importance memory survives, the
    /// other is archived.
    async fn execute_merge(&self, scope: &str, pair: &DuplicatePair) -> ActionStatus {
        let first = match self.fetch_active(scope, &pair.first_id).await {
            Ok(m) => m,
            Err(status) => return status,
        };
        let second = match self.fetch_active(scope, &pair.second_id).await {
            Ok(m) => m,
            Err(status) => return status,
        };

        let (mut survivor, mut loser) = if second.importance > first.importance {
            (second, first)
        } else {
            (first, second)
        };
        // Archiving the losing half is still an automated archival; protected
        // memories are exempt from those no matter how they were reached.
        if self.policy.is_protected(&loser) {
            return ActionStatus::Skipped("losing half is protected".to_string());
        }
        survivor.merge_from(&loser);
        loser.archived = true;
        loser.archived_at = Some(self.clock.now());

        if let Err(e) = self.store.upsert(survivor).await {
            return ActionStatus::Failed(e.to_string());
        }
        if let Err(e) = self.store.upsert(loser).await {
            warn!(scope, id = %pair.second_id, error = %e, "merge archived half failed");
            return ActionStatus::Failed(e.to_string());
        }
        ActionStatus::Applied
    }

    /// Archive a candidate, re-checking eligibility at write time.
    async fn execute_archive(&self, scope: &str, candidate: &ArchiveCandidate) -> ActionStatus {
        let mut memory = match self.fetch_active(scope, &candidate.memory_id).await {
            Ok(m) => m,
            Err(status) => return status,
        };
        let now = self.clock.now();
        if !self.policy.should_archive(&memory, now) {
            return ActionStatus::Skipped("no longer eligible for archival".to_string());
        }
        memory.archived = true;
        memory.archived_at = Some(now);
        match self.store.upsert(memory).await {
            Ok(()) => ActionStatus::Applied,
            Err(e) => ActionStatus::Failed(e.to_string()),
        }
    }

    /// Raise importance to the suggested level via compare-and-swap.
    async fn execute_upgrade(
        &self,
        scope: &str,
        suggestion: &ProtectionSuggestion,
    ) -> ActionStatus {
        for _ in 0..UPGRADE_RETRY_LIMIT {
            let current = match self.fetch_active(scope, &suggestion.memory_id).await {
                Ok(m) => m,
                Err(status) => return status,
            };
            if current.importance >= suggestion.suggested_importance {
                return ActionStatus::Skipped("already at or above suggested level".to_string());
            }
            let mut updated = current.clone();
            updated.importance = suggestion.suggested_importance.min(1.0);
            match self.store.compare_and_swap(&current, updated).await {
                Ok(CasOutcome::Committed) => return ActionStatus::Applied,
                Ok(CasOutcome::Conflict) => continue,
                Err(e) => return ActionStatus::Failed(e.to_string()),
            }
        }
        ActionStatus::Failed(
            HierarchyError::ConcurrentUpdate {
                id: suggestion.memory_id.clone(),
                attempts: UPGRADE_RETRY_LIMIT,
            }
            .to_string(),
        )
    }

    /// Load a memory, mapping absence and archival to skip statuses.
    async fn fetch_active(
        &self,
        scope: &str,
        id: &str,
    ) -> std::result::Result<Memory, ActionStatus> {
        match self.store.get(scope, id).await {
            Ok(Some(m)) if !m.archived => Ok(m),
            Ok(Some(_)) => Err(ActionStatus::Skipped("already archived".to_string())),
            Ok(None) => Err(ActionStatus::Skipped("memory no longer exists".to_string())),
            Err(e) => Err(ActionStatus::Failed(e.to_string())),
        }
    }
}
