//! Composite recall scoring.
//!
//! `score = w_sim * similarity + w_rec * recency + w_freq * frequency
//!        + w_graph * graph + w_imp * importance`
//!
//! All five sub-scores are normalized to [0, 1] and the weights are validated
//! to sum to 1.0, so the composite stays in [0, 1]. Scoring is pure: time is
//! injected through the context, never read from a global clock, and nothing
//! here mutates the memory.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use mnemo_types::{Memory, Result, ScoreWeights};

use crate::decay::RecencyDecay;

/// Access counts saturate against this constant: `count / (count + 5)`.
const FREQUENCY_SATURATION: f32 = 5.0;

/// Per-query inputs to scoring.
///
/// `similarity` is supplied by whoever ran the semantic backend (the selector
/// maps search hits onto candidates); `graph_hops` is the selector's
/// graph-distance hint. Both default to absent, which zeroes their sub-score.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext {
    /// Injected current time.
    pub now: DateTime<Utc>,

    /// Semantic similarity of this memory to the query, if known.
    pub similarity: Option<f32>,

    /// Graph hops from already-selected memories, if known.
    pub graph_hops: Option<u32>,
}

impl QueryContext {
    /// Maintenance-mode context: no query, no graph hint. Used by the
    /// curator and the archival sweep.
    pub fn maintenance(now: DateTime<Utc>) -> Self {
        Self {
            now,
            similarity: None,
            graph_hops: None,
        }
    }

    /// Builder: attach a similarity value.
    pub fn with_similarity(mut self, similarity: f32) -> Self {
        self.similarity = Some(similarity);
        self
    }

    /// Builder: attach a graph-distance hint.
    pub fn with_graph_hops(mut self, hops: u32) -> Self {
        self.graph_hops = Some(hops);
        self
    }
}

/// Computes the composite relevance score for a memory.
#[derive(Clone)]
pub struct RecallScorer {
    weights: ScoreWeights,
    decay: Arc<dyn RecencyDecay>,
}

impl RecallScorer {
    /// Build a scorer from validated weights and a decay strategy.
    pub fn new(weights: ScoreWeights, decay: Arc<dyn RecencyDecay>) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights, decay })
    }

    /// Composite score in [0, 1]. Deterministic given identical inputs.
    pub fn score(&self, memory: &Memory, ctx: &QueryContext) -> f32 {
        let similarity = ctx.similarity.unwrap_or(0.0).clamp(0.0, 1.0);
        let recency = self.decay.weight(memory.idle_days(ctx.now)).clamp(0.0, 1.0);
        let frequency = frequency_score(memory.access_count);
        let graph = graph_score(ctx.graph_hops);
        let importance = memory.importance.clamp(0.0, 1.0);

        let score = self.weights.similarity * similarity
            + self.weights.recency * recency
            + self.weights.frequency * frequency
            + self.weights.graph * graph
            + self.weights.importance * importance;

        score.clamp(0.0, 1.0)
    }

    /// Score with no query and no graph context. This is the value the
    /// curator and archival sweep classify against.
    pub fn maintenance_score(&self, memory: &Memory, now: DateTime<Utc>) -> f32 {
        self.score(memory, &QueryContext::maintenance(now))
    }

    /// The configured weights.
    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }
}

/// Monotonically increasing, saturating in access count.
fn frequency_score(access_count: u32) -> f32 {
    let count = access_count as f32;
    count / (count + FREQUENCY_SATURATION)
}

/// Closer neighbors score higher; no hint scores zero.
fn graph_score(hops: Option<u32>) -> f32 {
    match hops {
        Some(hops) => 1.0 / (1.0 + hops as f32),
        None => 0.0,
    }
}
