//! Periodic maintenance sweep.
//!
//! Temperature is derived, so "continuously Cold" has to be observed: the
//! sweep stamps `cold_since` the first time it sees a memory score into the
//! Cold band, clears it when the memory is seen anywhere warmer, and archives
//! whatever the retention policy allows. All writes go through CAS; a
//! conflicting record is left for the next sweep.

use serde::{Deserialize, Serialize};
use tracing::debug;

use mnemo_store::CasOutcome;
use mnemo_types::{Result, Temperature};

use crate::Curator;

/// What one sweep of a scope did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepOutcome {
    /// Active memories inspected.
    pub examined: usize,
    /// Memories newly stamped as entering the Cold tier.
    pub cold_stamped: usize,
    /// Memories whose cold tracking was cleared after warming back up.
    pub warmed: usize,
    /// Memories archived this sweep.
    pub archived: usize,
}

impl Curator {
    /// Sweep one scope: maintain `cold_since` and archive eligible memories.
    pub async fn sweep(&self, scope: &str) -> Result<SweepOutcome> {
        let now = self.clock.now();
        let active = self
            .store
            .query(scope, &mnemo_store::MemoryFilter::active())
            .await?;

        let mut outcome = SweepOutcome {
            examined: active.len(),
            ..SweepOutcome::default()
        };

        for memory in active {
            let score = self.scorer.maintenance_score(&memory, now);
            let temperature = self.classifier.classify(score);

            let mut updated = memory.clone();
            match (temperature, memory.cold_since) {
                (Temperature::Cold, None) => {
                    updated.cold_since = Some(now);
                }
                (Temperature::Cold, Some(_)) => {}
                (_, Some(_)) => {
                    updated.cold_since = None;
                }
                (_, None) => {}
            }

            if self.policy.should_archive(&updated, now) {
                updated.archived = true;
                updated.archived_at = Some(now);
            }

            if updated == memory {
                continue;
            }
            match self.store.compare_and_swap(&memory, updated.clone()).await? {
                CasOutcome::Committed => {
                    if updated.cold_since.is_some() && memory.cold_since.is_none() {
                        outcome.cold_stamped += 1;
                    }
                    if updated.cold_since.is_none() && memory.cold_since.is_some() {
                        outcome.warmed += 1;
                    }
                    if updated.archived {
                        outcome.archived += 1;
                    }
                }
                CasOutcome::Conflict => {
                    // Concurrent recall; its fresher state wins this round.
                    debug!(scope, id = %memory.id, "sweep write lost a race, deferring");
                }
            }
        }

        debug!(
            scope,
            examined = outcome.examined,
            cold_stamped = outcome.cold_stamped,
            warmed = outcome.warmed,
            archived = outcome.archived,
            "sweep complete"
        );
        Ok(outcome)
    }
}
