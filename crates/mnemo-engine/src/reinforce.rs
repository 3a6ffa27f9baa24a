//! Usage reinforcement ("Hebbian learner").
//!
//! Every recall strengthens the recalled memory: access count and timestamp
//! move forward together and importance rises by the learning rate, capped
//! at 1.0. This is the only path that increases importance automatically and
//! it never decreases it.
//!
//! Concurrency: the read-modify-write is serialized per key through the
//! store's compare-and-swap, retried a bounded number of times. Exhausting
//! the retries surfaces `ConcurrentUpdate`; callers on the recall path treat
//! that as a degraded bookkeeping failure, not a recall failure.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use mnemo_store::{CasOutcome, Clock, MemoryStore};
use mnemo_types::{HierarchyError, Memory, Result, Temperature, TransitionEvent};

use crate::classifier::TemperatureClassifier;
use crate::scorer::RecallScorer;

/// Capacity of the transition broadcast channel. Laggy subscribers drop old
/// events; the hot pool tolerates that.
const TRANSITION_CHANNEL_CAPACITY: usize = 256;

/// Pure reinforcement step: the state `memory` transitions to when recalled
/// at `now` with the given learning rate.
pub fn apply_recall(memory: &Memory, now: chrono::DateTime<chrono::Utc>, learning_rate: f32) -> Memory {
    let mut updated = memory.clone();
    updated.access_count = memory.access_count.saturating_add(1);
    updated.last_accessed_at = now;
    updated.importance = (memory.importance + learning_rate).min(1.0);
    updated
}

/// The usage-reinforcement write path.
pub struct HebbianUpdater {
    store: Arc<dyn MemoryStore>,
    clock: Arc<dyn Clock>,
    scorer: RecallScorer,
    classifier: TemperatureClassifier,
    learning_rate: f32,
    retry_limit: u32,
    transitions: broadcast::Sender<TransitionEvent>,
}

impl HebbianUpdater {
    /// Wire the updater against a store and clock.
    pub fn new(
        store: Arc<dyn MemoryStore>,
        clock: Arc<dyn Clock>,
        scorer: RecallScorer,
        classifier: TemperatureClassifier,
        learning_rate: f32,
        retry_limit: u32,
    ) -> Self {
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);
        Self {
            store,
            clock,
            scorer,
            classifier,
            learning_rate,
            retry_limit,
            transitions,
        }
    }

    /// Subscribe to tier-transition events (promotions feed the hot pool).
    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.transitions.subscribe()
    }

    /// Record one recall of `id` in `scope` and return the updated memory.
    ///
    /// Atomic per key: concurrent recalls of the same memory never lose an
    /// update. Retries the CAS up to the configured limit before surfacing
    /// `ConcurrentUpdate`.
    pub async fn on_recall(&self, scope: &str, id: &str) -> Result<Memory> {
        self.on_recall_scored(scope, id, None).await
    }

    /// Like `on_recall`, carrying the semantic similarity the caller already
    /// computed for this recall. The selector uses this path so the
    /// temperature recomputation sees the same score the selection did;
    /// without a similarity component the Hot band is out of reach.
    pub async fn on_recall_scored(
        &self,
        scope: &str,
        id: &str,
        similarity: Option<f32>,
    ) -> Result<Memory> {
        for attempt in 1..=self.retry_limit {
            let current = self
                .store
                .get(scope, id)
                .await?
                .ok_or_else(|| HierarchyError::not_found(scope, id))?;

            let now = self.clock.now();
            let mut ctx = crate::scorer::QueryContext::maintenance(now);
            ctx.similarity = similarity;
            let old_temperature = self.classifier.classify(self.scorer.score(&current, &ctx));

            let mut updated = apply_recall(&current, now, self.learning_rate);
            let new_temperature = self.classifier.classify(self.scorer.score(&updated, &ctx));
            // A recall that lifts the memory out of Cold resets the
            // grace-period tracking.
            if new_temperature != Temperature::Cold {
                updated.cold_since = None;
            }

            match self.store.compare_and_swap(&current, updated.clone()).await? {
                CasOutcome::Committed => {
                    if let Some(event) =
                        self.classifier
                            .detect_transition(id, old_temperature, new_temperature)
                    {
                        // No subscribers is fine.
                        let _ = self.transitions.send(event);
                    }
                    debug!(
                        scope,
                        id,
                        access_count = updated.access_count,
                        importance = updated.importance,
                        "recall reinforced"
                    );
                    return Ok(updated);
                }
                CasOutcome::Conflict => {
                    debug!(scope, id, attempt, "reinforcement CAS conflict, retrying");
                }
            }
        }

        warn!(scope, id, attempts = self.retry_limit, "reinforcement retries exhausted");
        Err(HierarchyError::ConcurrentUpdate {
            id: id.to_string(),
            attempts: self.retry_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use mnemo_store::{FixedClock, InMemoryStore};
    use mnemo_types::ScoreWeights;

    use crate::decay::ExponentialDecay;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn updater(store: Arc<InMemoryStore>, clock: Arc<FixedClock>) -> HebbianUpdater {
        let scorer = RecallScorer::new(
            ScoreWeights::default(),
            Arc::new(ExponentialDecay::with_defaults()),
        )
        .unwrap();
        HebbianUpdater::new(
            store,
            clock,
            scorer,
            TemperatureClassifier::with_defaults(),
            0.05,
            3,
        )
    }

    #[test]
    fn test_apply_recall_pure() {
        let m = Memory::new("s", "text", 0.5, t0());
        let updated = apply_recall(&m, t0() + Duration::hours(1), 0.05);

        assert_eq!(updated.access_count, 1);
        assert_eq!(updated.last_accessed_at, t0() + Duration::hours(1));
        assert!((updated.importance - 0.55).abs() < 1e-6);
        // Original untouched.
        assert_eq!(m.access_count, 0);
    }

    #[test]
    fn test_apply_recall_importance_capped() {
        let m = Memory::new("s", "text", 0.98, t0());
        let updated = apply_recall(&m, t0(), 0.05);
        assert!((updated.importance - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_on_recall_updates_store() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(t0()));
        let m = Memory::new("s", "text", 0.5, t0());
        let id = m.id.clone();
        store.upsert(m).await.unwrap();

        let updater = updater(store.clone(), clock.clone());
        clock.advance(Duration::days(1));
        let updated = updater.on_recall("s", &id).await.unwrap();

        assert_eq!(updated.access_count, 1);
        assert!((updated.importance - 0.55).abs() < 1e-6);
        assert_eq!(updated.last_accessed_at, t0() + Duration::days(1));

        let stored = store.get("s", &id).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_on_recall_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(t0()));
        let updater = updater(store, clock);

        let err = updater.on_recall("s", "missing").await.unwrap_err();
        assert!(matches!(err, HierarchyError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_repeated_recalls_accumulate() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(t0()));
        let m = Memory::new("s", "text", 0.5, t0());
        let id = m.id.clone();
        store.upsert(m).await.unwrap();

        let updater = updater(store.clone(), clock);
        for _ in 0..4 {
            updater.on_recall("s", &id).await.unwrap();
        }

        let stored = store.get("s", &id).await.unwrap().unwrap();
        assert_eq!(stored.access_count, 4);
        assert!((stored.importance - 0.70).abs() < 1e-5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_recalls_no_lost_update() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(t0()));
        let mut m = Memory::new("s", "text", 0.1, t0());
        m.access_count = 5;
        let id = m.id.clone();
        store.upsert(m).await.unwrap();

        let updater = Arc::new(updater(store.clone(), clock));
        let a = {
            let updater = updater.clone();
            let id = id.clone();
            tokio::spawn(async move { updater.on_recall("s", &id).await })
        };
        let b = {
            let updater = updater.clone();
            let id = id.clone();
            tokio::spawn(async move { updater.on_recall("s", &id).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let stored = store.get("s", &id).await.unwrap().unwrap();
        assert_eq!(stored.access_count, 7);
        assert!((stored.importance - 0.20).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_promotion_event_emitted() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(t0()));
        // High importance and frequency: the next recall crosses into Hot.
        let mut m = Memory::new("s", "text", 0.95, t0());
        m.access_count = 40;
        m.last_accessed_at = t0() - Duration::days(60);
        let id = m.id.clone();
        store.upsert(m).await.unwrap();

        let updater = updater(store, clock);
        let mut events = updater.subscribe();
        // Strong semantic match: the refreshed recency pushes the score
        // across the Hot boundary.
        updater.on_recall_scored("s", &id, Some(1.0)).await.unwrap();

        let event = events.try_recv().unwrap();
        assert!(event.is_hot_promotion());
        assert_eq!(event.memory_id, id);
    }

    #[tokio::test]
    async fn test_recall_clears_cold_since() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(t0()));
        let mut m = Memory::new("s", "text", 0.6, t0() - Duration::days(200));
        m.cold_since = Some(t0() - Duration::days(50));
        let id = m.id.clone();
        store.upsert(m).await.unwrap();

        let updater = updater(store.clone(), clock);
        updater.on_recall("s", &id).await.unwrap();

        let stored = store.get("s", &id).await.unwrap().unwrap();
        assert!(stored.cold_since.is_none());
    }
}
