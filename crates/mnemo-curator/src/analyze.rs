//! Phase A: read-only analysis.
//!
//! Produces a structured report of duplicate candidates, archive candidates,
//! protection-upgrade suggestions, and graph insights. Never mutates the
//! store; cancellation is honored between analysis sections.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use mnemo_types::{Memory, Result};

use crate::report::{
    new_action_id, AnalysisReport, ArchiveCandidate, CentralNode, DuplicatePair, GraphInsights,
    ProtectionSuggestion,
};
use crate::Curator;

impl Curator {
    /// Analyze one scope and report what could be optimized.
    pub async fn analyze(
        &self,
        scope: &str,
        cancel: &CancellationToken,
    ) -> Result<AnalysisReport> {
        let now = self.clock.now();
        let active = self
            .store
            .query(scope, &mnemo_store::MemoryFilter::active())
            .await?;

        let mut report = AnalysisReport {
            owner_scope: scope.to_string(),
            generated_at: now,
            duplicates: Vec::new(),
            archive_candidates: Vec::new(),
            protection_suggestions: Vec::new(),
            graph: GraphInsights::default(),
        };

        if !cancel.is_cancelled() {
            report.duplicates = self.find_duplicates(&active);
        }
        if !cancel.is_cancelled() {
            report.archive_candidates = self.find_archive_candidates(&active, now);
        }
        if !cancel.is_cancelled() {
            report.protection_suggestions = self.find_protection_suggestions(&active);
        }
        if !cancel.is_cancelled() {
            report.graph = self.graph_insights(&active);
        }

        debug!(
            scope,
            duplicates = report.duplicates.len(),
            archive_candidates = report.archive_candidates.len(),
            protection_suggestions = report.protection_suggestions.len(),
            "analysis complete"
        );
        Ok(report)
    }

    /// Pairwise content similarity above the configured threshold.
    fn find_duplicates(&self, memories: &[Memory]) -> Vec<DuplicatePair> {
        let mut pairs = Vec::new();
        for (i, a) in memories.iter().enumerate() {
            for b in memories.iter().skip(i + 1) {
                let similarity = self.similarity.similarity(&a.content, &b.content);
                if similarity >= self.config.duplicate_similarity_threshold {
                    pairs.push(DuplicatePair {
                        action_id: new_action_id(),
                        first_id: a.id.clone(),
                        second_id: b.id.clone(),
                        similarity,
                    });
                }
            }
        }
        pairs.sort_by(|x, y| {
            y.similarity
                .partial_cmp(&x.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pairs
    }

    /// Memories the retention policy tracks toward archival: unprotected,
    /// outside the retention window, below the archive ceiling, and observed
    /// Cold. The grace period may still be running; `grace_ends` says when
    /// it stops.
    fn find_archive_candidates(
        &self,
        memories: &[Memory],
        now: chrono::DateTime<chrono::Utc>,
    ) -> Vec<ArchiveCandidate> {
        let retention = self.policy.config();
        memories
            .iter()
            .filter(|m| !self.policy.is_protected(m))
            .filter(|m| m.importance < retention.archive_importance_ceiling)
            .filter(|m| m.idle_days(now) as i64 >= retention.min_retention_days)
            .filter(|m| m.cold_since.is_some())
            .map(|m| ArchiveCandidate {
                action_id: new_action_id(),
                memory_id: m.id.clone(),
                reason: format!(
                    "importance {:.2} below archive ceiling {:.2}, idle {} days",
                    m.importance,
                    retention.archive_importance_ceiling,
                    m.idle_days(now) as i64
                ),
                grace_ends: self.policy.grace_ends(m),
            })
            .collect()
    }

    /// Frequently recalled memories sitting below the protection threshold.
    fn find_protection_suggestions(&self, memories: &[Memory]) -> Vec<ProtectionSuggestion> {
        memories
            .iter()
            .filter(|m| m.access_count >= self.config.protection_access_threshold)
            .filter(|m| !self.policy.is_protected(m))
            .map(|m| ProtectionSuggestion {
                action_id: new_action_id(),
                memory_id: m.id.clone(),
                current_importance: m.importance,
                suggested_importance: (m.importance + self.config.protection_boost).min(1.0),
                reason: format!("accessed {} times", m.access_count),
            })
            .collect()
    }

    /// Cluster/orphan/centrality statistics over the in-scope relationship
    /// graph (undirected, restricted to active members).
    fn graph_insights(&self, memories: &[Memory]) -> GraphInsights {
        let ids: BTreeSet<&str> = memories.iter().map(|m| m.id.as_str()).collect();
        let mut adjacency: BTreeMap<&str, BTreeSet<&str>> =
            ids.iter().map(|id| (*id, BTreeSet::new())).collect();
        for m in memories {
            for related in &m.related_ids {
                if let Some(&related) = ids.get(related.as_str()) {
                    if let Some(edges) = adjacency.get_mut(m.id.as_str()) {
                        edges.insert(related);
                    }
                    if let Some(edges) = adjacency.get_mut(related) {
                        edges.insert(m.id.as_str());
                    }
                }
            }
        }

        let orphan_count = adjacency.values().filter(|edges| edges.is_empty()).count();

        // Connected components of size >= 2 via BFS.
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut cluster_count = 0;
        for start in adjacency.keys() {
            if visited.contains(start) || adjacency[start].is_empty() {
                continue;
            }
            let mut size = 0;
            let mut queue = VecDeque::from([*start]);
            visited.insert(start);
            while let Some(node) = queue.pop_front() {
                size += 1;
                for next in &adjacency[node] {
                    if visited.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
            if size >= 2 {
                cluster_count += 1;
            }
        }

        let mut degrees: Vec<CentralNode> = adjacency
            .iter()
            .filter(|(_, edges)| !edges.is_empty())
            .map(|(id, edges)| CentralNode {
                memory_id: (*id).to_string(),
                degree: edges.len(),
            })
            .collect();
        degrees.sort_by(|a, b| b.degree.cmp(&a.degree).then_with(|| a.memory_id.cmp(&b.memory_id)));
        degrees.truncate(self.config.central_node_limit);

        GraphInsights {
            cluster_count,
            orphan_count,
            most_central: degrees,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use mnemo_engine::{ExponentialDecay, RecallScorer, RetentionPolicy, TemperatureClassifier};
    use mnemo_store::{FixedClock, InMemoryStore, MemoryStore};
    use mnemo_types::{CuratorConfig, ScoreWeights};

    use crate::similarity::TokenOverlap;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn curator(store: Arc<InMemoryStore>) -> Curator {
        let scorer = RecallScorer::new(
            ScoreWeights::default(),
            Arc::new(ExponentialDecay::with_defaults()),
        )
        .unwrap();
        Curator::new(
            store,
            Arc::new(FixedClock::new(t0())),
            scorer,
            TemperatureClassifier::with_defaults(),
            RetentionPolicy::with_defaults(),
            Arc::new(TokenOverlap),
            CuratorConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_detection() {
        let store = Arc::new(InMemoryStore::new());
        let a = Memory::new("s", "we fixed the JWT refresh bug", 0.5, t0());
        let b = Memory::new("s", "we fixed the jwt refresh bug", 0.5, t0());
        let c = Memory::new("s", "grocery list apples oranges", 0.5, t0());
        store.upsert(a.clone()).await.unwrap();
        store.upsert(b.clone()).await.unwrap();
        store.upsert(c).await.unwrap();

        let report = curator(store)
            .analyze("s", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.duplicates.len(), 1);
        let pair = &report.duplicates[0];
        let ids = [pair.first_id.as_str(), pair.second_id.as_str()];
        assert!(ids.contains(&a.id.as_str()) && ids.contains(&b.id.as_str()));
        assert!(pair.similarity >= 0.85);
    }

    #[tokio::test]
    async fn test_archive_candidates_respect_protection() {
        let store = Arc::new(InMemoryStore::new());
        // Eligible: unimportant, long idle, tracked cold.
        let mut eligible = Memory::new("s", "stale detail", 0.1, t0() - Duration::days(150));
        eligible.cold_since = Some(t0() - Duration::days(40));
        let eligible_id = eligible.id.clone();
        // Protected: same staleness, high importance.
        let mut protected = Memory::new("s", "core decision", 0.9, t0() - Duration::days(150));
        protected.cold_since = Some(t0() - Duration::days(40));
        store.upsert(eligible).await.unwrap();
        store.upsert(protected).await.unwrap();

        let report = curator(store)
            .analyze("s", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.archive_candidates.len(), 1);
        let candidate = &report.archive_candidates[0];
        assert_eq!(candidate.memory_id, eligible_id);
        assert_eq!(
            candidate.grace_ends,
            Some(t0() - Duration::days(40) + Duration::days(30))
        );
    }

    #[tokio::test]
    async fn test_protection_suggestions() {
        let store = Arc::new(InMemoryStore::new());
        let mut hot = Memory::new("s", "build command", 0.4, t0());
        hot.access_count = 15;
        let hot_id = hot.id.clone();
        let mut already = Memory::new("s", "protected already", 0.8, t0());
        already.access_count = 50;
        store.upsert(hot).await.unwrap();
        store.upsert(already).await.unwrap();

        let report = curator(store)
            .analyze("s", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.protection_suggestions.len(), 1);
        let suggestion = &report.protection_suggestions[0];
        assert_eq!(suggestion.memory_id, hot_id);
        assert!((suggestion.suggested_importance - 0.6).abs() < 1e-6);
        assert!(suggestion.reason.contains("15"));
    }

    #[tokio::test]
    async fn test_graph_insights() {
        let store = Arc::new(InMemoryStore::new());
        let a = Memory::new("s", "a", 0.5, t0());
        let b = Memory::new("s", "b", 0.5, t0()).with_related(&a.id);
        let c = Memory::new("s", "c", 0.5, t0()).with_related(&a.id);
        let orphan = Memory::new("s", "d", 0.5, t0());
        let a_id = a.id.clone();
        for m in [a, b, c, orphan] {
            store.upsert(m).await.unwrap();
        }

        let report = curator(store)
            .analyze("s", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.graph.cluster_count, 1);
        assert_eq!(report.graph.orphan_count, 1);
        assert_eq!(report.graph.most_central[0].memory_id, a_id);
        assert_eq!(report.graph.most_central[0].degree, 2);
    }

    #[tokio::test]
    async fn test_analyze_never_mutates() {
        let store = Arc::new(InMemoryStore::new());
        let mut stale = Memory::new("s", "stale", 0.1, t0() - Duration::days(150));
        stale.cold_since = Some(t0() - Duration::days(40));
        let id = stale.id.clone();
        store.upsert(stale.clone()).await.unwrap();

        curator(store.clone())
            .analyze("s", &CancellationToken::new())
            .await
            .unwrap();

        let after = store.get("s", &id).await.unwrap().unwrap();
        assert_eq!(after, stale);
        assert!(!after.archived);
    }

    #[tokio::test]
    async fn test_cancelled_analysis_is_partial_but_ok() {
        let store = Arc::new(InMemoryStore::new());
        store
            .upsert(Memory::new("s", "anything", 0.5, t0()))
            .await
            .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = curator(store)
            .analyze("s", &cancel)
            .await
            .unwrap();
        assert!(report.is_empty());
    }
}
