//! Four-pass token-budgeted context assembly.
//!
//! The budget is partitioned across four sequential passes (Hot, protected,
//! semantic, graph) with fixed ratios. Each pass greedily adds its pool's
//! candidates in priority order, skipping whole candidates that do not fit
//! (content is never truncated). Unused budget rolls forward; no pass
//! borrows from a later pass in advance.
//!
//! When no query is supplied, or the semantic backend fails, the semantic
//! pass is skipped and its share redistributes proportionally across the
//! remaining passes (logged, never raised).
//!
//! Every memory in the final list triggers exactly one reinforcement update
//! after assembly completes, so no score moves mid-assembly.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use mnemo_engine::{HebbianUpdater, QueryContext, RecallScorer, TemperatureClassifier};
use mnemo_store::{Clock, MemoryFilter, MemoryStore, TokenCounter};
use mnemo_types::{
    BudgetSplit, HierarchyConfig, HierarchyError, Memory, Result, Temperature, TransitionEvent,
};

use crate::hot_pool::HotPool;

/// A scored candidate within one selection request.
#[derive(Debug, Clone)]
struct Candidate {
    memory: Memory,
    score: f32,
    temperature: Temperature,
}

/// Assembles token-bounded context sets.
pub struct ContextSelector {
    store: Arc<dyn MemoryStore>,
    clock: Arc<dyn Clock>,
    counter: Arc<dyn TokenCounter>,
    scorer: RecallScorer,
    classifier: TemperatureClassifier,
    updater: Arc<HebbianUpdater>,
    budget: BudgetSplit,
    protection_threshold: f32,
    semantic_top_k: usize,
    hot_pool: HotPool,
    transitions: Mutex<broadcast::Receiver<TransitionEvent>>,
}

impl ContextSelector {
    /// Wire a selector. Validates the budget split up front.
    pub fn new(
        store: Arc<dyn MemoryStore>,
        clock: Arc<dyn Clock>,
        counter: Arc<dyn TokenCounter>,
        scorer: RecallScorer,
        classifier: TemperatureClassifier,
        updater: Arc<HebbianUpdater>,
        config: &HierarchyConfig,
    ) -> Result<Self> {
        config.budget.validate()?;
        let transitions = Mutex::new(updater.subscribe());
        Ok(Self {
            store,
            clock,
            counter,
            scorer,
            classifier,
            updater,
            budget: config.budget,
            protection_threshold: config.retention.protection_threshold,
            semantic_top_k: config.semantic_top_k,
            hot_pool: HotPool::new(config.hot_pool_capacity),
            transitions,
        })
    }

    /// The hot pool cache fed by this selector's updater.
    pub fn hot_pool(&self) -> &HotPool {
        &self.hot_pool
    }

    /// Drain pending transition events into the hot pool.
    fn absorb_transitions(&self) {
        let mut receiver = self.transitions.lock().expect("transition receiver poisoned");
        loop {
            match receiver.try_recv() {
                Ok(event) => self.hot_pool.apply(&event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "hot pool missed transition events");
                }
                Err(_) => break,
            }
        }
    }

    /// Assemble an ordered context for `query` within `max_tokens`.
    ///
    /// Returns memories ordered by pass (Hot first) and, within a pass, by
    /// descending score. An empty result is a valid answer, distinguishable
    /// from `NotFound`. Cancellation mid-assembly returns whatever has been
    /// assembled so far; partial-but-valid beats nothing, and the partial
    /// list is still reinforced like a full one.
    pub async fn select_context(
        &self,
        query: Option<&str>,
        max_tokens: usize,
        scope: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Memory>> {
        if max_tokens == 0 || cancel.is_cancelled() {
            return Ok(Vec::new());
        }
        self.absorb_transitions();

        let now = self.clock.now();

        // The primary scoped scan backs the Hot and protected passes; its
        // failure is fatal for the request.
        let active = self.store.query(scope, &MemoryFilter::active()).await?;

        // Semantic search is an optional pass: degrade to the no-query
        // shape on backend failure instead of failing the recall.
        let semantic_hits = match query {
            Some(q) => match self.store.semantic_search(scope, q, self.semantic_top_k).await {
                Ok(hits) => Some(hits),
                Err(e) => {
                    warn!(scope, error = %e, "semantic backend unavailable, skipping pass");
                    None
                }
            },
            None => None,
        };
        let similarity: HashMap<String, f32> = semantic_hits
            .iter()
            .flatten()
            .map(|hit| (hit.id.clone(), hit.similarity))
            .collect();

        let candidates: HashMap<String, Candidate> = active
            .into_iter()
            .map(|memory| {
                let ctx = QueryContext {
                    now,
                    similarity: similarity.get(&memory.id).copied(),
                    graph_hops: None,
                };
                let score = self.scorer.score(&memory, &ctx);
                let temperature = self.classifier.classify(score);
                (
                    memory.id.clone(),
                    Candidate {
                        memory,
                        score,
                        temperature,
                    },
                )
            })
            .collect();

        let budgets = pass_budgets(&self.budget, max_tokens, semantic_hits.is_some());

        let mut selected: Vec<(Memory, f32)> = Vec::new();
        let mut selected_ids: HashSet<String> = HashSet::new();
        let mut carry = 0usize;

        // Pass 1: Hot tier, score descending. Pool members count as Hot
        // even when their query-relative score dipped below the band.
        let mut hot: Vec<&Candidate> = candidates
            .values()
            .filter(|c| {
                c.temperature == Temperature::Hot || self.hot_pool.contains(&c.memory.id)
            })
            .collect();
        hot.sort_by(|a, b| cmp_score_desc(a, b));

        carry = self.fill(&hot, budgets[0] + carry, &mut selected, &mut selected_ids);

        if cancel.is_cancelled() {
            return self.conclude(scope, selected, &similarity).await;
        }

        // Pass 2: protected importance, importance descending.
        let mut protected: Vec<&Candidate> = candidates
            .values()
            .filter(|c| c.memory.importance >= self.protection_threshold)
            .collect();
        protected.sort_by(|a, b| {
            b.memory
                .importance
                .partial_cmp(&a.memory.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.memory.id.cmp(&b.memory.id))
        });
        let pass_start = selected.len();
        carry = self.fill(&protected, budgets[1] + carry, &mut selected, &mut selected_ids);
        sort_segment(&mut selected[pass_start..]);

        if cancel.is_cancelled() {
            return self.conclude(scope, selected, &similarity).await;
        }

        // Pass 3: semantic matches, selected in backend rank order.
        if let Some(hits) = &semantic_hits {
            let ranked: Vec<&Candidate> = hits
                .iter()
                .filter_map(|hit| candidates.get(&hit.id))
                .collect();
            let pass_start = selected.len();
            carry = self.fill(&ranked, budgets[2] + carry, &mut selected, &mut selected_ids);
            sort_segment(&mut selected[pass_start..]);
        } else {
            carry += budgets[2];
        }

        if cancel.is_cancelled() {
            return self.conclude(scope, selected, &similarity).await;
        }

        // Pass 4: graph neighbors of everything selected so far, one hop,
        // score descending with the graph bonus applied.
        let anchor_ids: Vec<String> = selected_ids.iter().cloned().collect();
        let mut neighbor_ids: HashSet<String> = HashSet::new();
        for id in &anchor_ids {
            if cancel.is_cancelled() {
                return self.conclude(scope, selected, &similarity).await;
            }
            match self.store.graph_neighbors(scope, id).await {
                Ok(ids) => neighbor_ids.extend(ids),
                Err(e) => {
                    warn!(scope, id, error = %e, "graph neighbor lookup failed, skipping");
                }
            }
        }
        let mut neighbors: Vec<Candidate> = neighbor_ids
            .iter()
            .filter_map(|id| candidates.get(id))
            .map(|c| {
                let ctx = QueryContext {
                    now,
                    similarity: similarity.get(&c.memory.id).copied(),
                    graph_hops: Some(1),
                };
                let score = self.scorer.score(&c.memory, &ctx);
                Candidate {
                    memory: c.memory.clone(),
                    score,
                    temperature: self.classifier.classify(score),
                }
            })
            .collect();
        neighbors.sort_by(cmp_score_desc);
        let neighbor_refs: Vec<&Candidate> = neighbors.iter().collect();
        let leftover = self.fill(&neighbor_refs, budgets[3] + carry, &mut selected, &mut selected_ids);

        debug!(
            scope,
            selected = selected.len(),
            max_tokens,
            unused_tokens = leftover,
            "context assembled"
        );

        self.conclude(scope, selected, &similarity).await
    }

    /// Reinforce exactly once per returned memory, then hand the list back.
    /// Runs on the cancellation paths too, so every returned memory gets its
    /// recall no matter how assembly ended.
    async fn conclude(
        &self,
        scope: &str,
        selected: Vec<(Memory, f32)>,
        similarity: &HashMap<String, f32>,
    ) -> Result<Vec<Memory>> {
        for (memory, _) in &selected {
            let sim = similarity.get(&memory.id).copied();
            if let Err(e) = self
                .updater
                .on_recall_scored(scope, &memory.id, sim)
                .await
            {
                match e {
                    HierarchyError::ConcurrentUpdate { .. } | HierarchyError::Storage(_) => {
                        warn!(scope, id = %memory.id, error = %e, "reinforcement dropped");
                    }
                    other => return Err(other),
                }
            }
        }
        self.absorb_transitions();
        Ok(finish(selected))
    }

    /// Greedy fill under a token budget. Returns the unused budget.
    fn fill(
        &self,
        pool: &[&Candidate],
        budget: usize,
        selected: &mut Vec<(Memory, f32)>,
        selected_ids: &mut HashSet<String>,
    ) -> usize {
        let mut remaining = budget;
        for candidate in pool {
            if selected_ids.contains(&candidate.memory.id) {
                continue;
            }
            let cost = self.counter.count(&candidate.memory.content);
            if cost > remaining {
                // Whole candidate or nothing; keep trying smaller ones.
                continue;
            }
            remaining -= cost;
            selected_ids.insert(candidate.memory.id.clone());
            selected.push((candidate.memory.clone(), candidate.score));
        }
        remaining
    }
}

fn cmp_score_desc(a: &Candidate, b: &Candidate) -> std::cmp::Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.memory.id.cmp(&b.memory.id))
}

fn finish(selected: Vec<(Memory, f32)>) -> Vec<Memory> {
    selected.into_iter().map(|(memory, _)| memory).collect()
}

/// Order one pass's selections by descending score. Passes whose selection
/// priority is not score order (protected, semantic) still come back
/// score-ordered.
fn sort_segment(segment: &mut [(Memory, f32)]) {
    segment.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.id.cmp(&b.0.id))
    });
}

/// Split `max_tokens` across the four passes. Without a semantic pass, its
/// share redistributes proportionally over the other three. The last active
/// pass absorbs rounding remainders so the shares always cover the budget.
fn pass_budgets(split: &BudgetSplit, max_tokens: usize, with_semantic: bool) -> [usize; 4] {
    let total = max_tokens as f32;
    let shares: [f32; 4] = if with_semantic {
        [split.hot, split.protected, split.semantic, split.graph]
    } else {
        let rest = split.hot + split.protected + split.graph;
        if rest <= f32::EPSILON {
            // Degenerate split (everything on semantic): treat the other
            // passes evenly.
            [1.0 / 3.0, 1.0 / 3.0, 0.0, 1.0 / 3.0]
        } else {
            [
                split.hot / rest,
                split.protected / rest,
                0.0,
                split.graph / rest,
            ]
        }
    };

    let mut budgets = [0usize; 4];
    let mut allocated = 0usize;
    for (i, share) in shares.iter().enumerate() {
        budgets[i] = (share * total).floor() as usize;
        allocated += budgets[i];
    }
    // Rounding remainder goes to the final pass; carry-forward moves it
    // anywhere it is needed.
    budgets[3] += max_tokens.saturating_sub(allocated);
    budgets
}
