//! Configuration tree for the memory hierarchy.
//!
//! Every knob is an explicit immutable value threaded through constructors.
//! Validation rejects bad configuration with a `Config` error; nothing is
//! ever silently renormalized or corrected.

use serde::{Deserialize, Serialize};

use crate::error::{HierarchyError, Result};

/// Tolerance for "sums to 1.0" checks on f32 weight sets.
const WEIGHT_SUM_TOLERANCE: f32 = 1e-4;

/// Weights for the five recall sub-scores. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Semantic similarity to the query.
    #[serde(default = "default_similarity_weight")]
    pub similarity: f32,

    /// Recency decay on time since last access.
    #[serde(default = "default_recency_weight")]
    pub recency: f32,

    /// Saturating access-frequency score.
    #[serde(default = "default_frequency_weight")]
    pub frequency: f32,

    /// Graph proximity to already-selected memories.
    #[serde(default = "default_graph_weight")]
    pub graph: f32,

    /// Stored importance, used directly.
    #[serde(default = "default_importance_weight")]
    pub importance: f32,
}

fn default_similarity_weight() -> f32 {
    0.30
}

fn default_recency_weight() -> f32 {
    0.20
}

fn default_frequency_weight() -> f32 {
    0.15
}

fn default_graph_weight() -> f32 {
    0.15
}

fn default_importance_weight() -> f32 {
    0.20
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            similarity: default_similarity_weight(),
            recency: default_recency_weight(),
            frequency: default_frequency_weight(),
            graph: default_graph_weight(),
            importance: default_importance_weight(),
        }
    }
}

impl ScoreWeights {
    /// Validate that all weights are non-negative and sum to 1.0.
    pub fn validate(&self) -> Result<()> {
        let parts = [
            ("similarity", self.similarity),
            ("recency", self.recency),
            ("frequency", self.frequency),
            ("graph", self.graph),
            ("importance", self.importance),
        ];
        for (name, value) in parts {
            if !(0.0..=1.0).contains(&value) {
                return Err(HierarchyError::Config(format!(
                    "score weight '{name}' must be in [0, 1], got {value}"
                )));
            }
        }
        let sum: f32 = parts.iter().map(|(_, v)| v).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(HierarchyError::Config(format!(
                "score weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

/// Inclusive lower bounds of the Hot/Warm/Cool bands. Anything below
/// `cool_min` is Cold. The four bands partition [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TemperatureBands {
    /// Score at or above this is Hot.
    #[serde(default = "default_hot_min")]
    pub hot_min: f32,

    /// Score at or above this (and below `hot_min`) is Warm.
    #[serde(default = "default_warm_min")]
    pub warm_min: f32,

    /// Score at or above this (and below `warm_min`) is Cool.
    #[serde(default = "default_cool_min")]
    pub cool_min: f32,
}

fn default_hot_min() -> f32 {
    0.8
}

fn default_warm_min() -> f32 {
    0.5
}

fn default_cool_min() -> f32 {
    0.2
}

impl Default for TemperatureBands {
    fn default() -> Self {
        Self {
            hot_min: default_hot_min(),
            warm_min: default_warm_min(),
            cool_min: default_cool_min(),
        }
    }
}

impl TemperatureBands {
    /// Validate strict ordering `0 < cool_min < warm_min < hot_min <= 1`,
    /// which guarantees the bands partition [0, 1] with no gaps or overlaps.
    pub fn validate(&self) -> Result<()> {
        if !(self.cool_min > 0.0
            && self.cool_min < self.warm_min
            && self.warm_min < self.hot_min
            && self.hot_min <= 1.0)
        {
            return Err(HierarchyError::Config(format!(
                "temperature bands must satisfy 0 < cool_min < warm_min < hot_min <= 1, \
                 got cool_min={}, warm_min={}, hot_min={}",
                self.cool_min, self.warm_min, self.hot_min
            )));
        }
        Ok(())
    }
}

/// Protection and retention thresholds for the archival policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Importance at or above this is never auto-archived.
    #[serde(default = "default_protection_threshold")]
    pub protection_threshold: f32,

    /// Minimum days since last access before a memory is archive-eligible.
    #[serde(default = "default_min_retention_days")]
    pub min_retention_days: i64,

    /// Importance must be strictly below this for archival.
    #[serde(default = "default_archive_importance_ceiling")]
    pub archive_importance_ceiling: f32,

    /// Days a memory must sit continuously in Cold before archival.
    #[serde(default = "default_cold_grace_days")]
    pub cold_grace_days: i64,
}

fn default_protection_threshold() -> f32 {
    0.7
}

fn default_min_retention_days() -> i64 {
    90
}

fn default_archive_importance_ceiling() -> f32 {
    0.2
}

fn default_cold_grace_days() -> i64 {
    30
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            protection_threshold: default_protection_threshold(),
            min_retention_days: default_min_retention_days(),
            archive_importance_ceiling: default_archive_importance_ceiling(),
            cold_grace_days: default_cold_grace_days(),
        }
    }
}

impl RetentionConfig {
    /// Validate threshold ordering and positive windows.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.protection_threshold) {
            return Err(HierarchyError::Config(format!(
                "protection_threshold must be in [0, 1], got {}",
                self.protection_threshold
            )));
        }
        if self.archive_importance_ceiling >= self.protection_threshold {
            return Err(HierarchyError::Config(format!(
                "archive_importance_ceiling ({}) must be below protection_threshold ({})",
                self.archive_importance_ceiling, self.protection_threshold
            )));
        }
        if self.archive_importance_ceiling < 0.0 {
            return Err(HierarchyError::Config(format!(
                "archive_importance_ceiling must be non-negative, got {}",
                self.archive_importance_ceiling
            )));
        }
        if self.min_retention_days <= 0 || self.cold_grace_days <= 0 {
            return Err(HierarchyError::Config(format!(
                "retention windows must be positive, got min_retention_days={}, cold_grace_days={}",
                self.min_retention_days, self.cold_grace_days
            )));
        }
        Ok(())
    }
}

/// Budget ratios for the four selector passes. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BudgetSplit {
    /// Share for Hot-tier memories.
    #[serde(default = "default_hot_share")]
    pub hot: f32,

    /// Share for protected/high-importance memories.
    #[serde(default = "default_protected_share")]
    pub protected: f32,

    /// Share for semantic matches to the query.
    #[serde(default = "default_semantic_share")]
    pub semantic: f32,

    /// Share for graph neighbors of already-selected memories.
    #[serde(default = "default_graph_share")]
    pub graph: f32,
}

fn default_hot_share() -> f32 {
    0.20
}

fn default_protected_share() -> f32 {
    0.30
}

fn default_semantic_share() -> f32 {
    0.40
}

fn default_graph_share() -> f32 {
    0.10
}

impl Default for BudgetSplit {
    fn default() -> Self {
        Self {
            hot: default_hot_share(),
            protected: default_protected_share(),
            semantic: default_semantic_share(),
            graph: default_graph_share(),
        }
    }
}

impl BudgetSplit {
    /// Validate non-negative shares summing to 1.0.
    pub fn validate(&self) -> Result<()> {
        let parts = [
            ("hot", self.hot),
            ("protected", self.protected),
            ("semantic", self.semantic),
            ("graph", self.graph),
        ];
        for (name, value) in parts {
            if !(0.0..=1.0).contains(&value) {
                return Err(HierarchyError::Config(format!(
                    "budget share '{name}' must be in [0, 1], got {value}"
                )));
            }
        }
        let sum: f32 = parts.iter().map(|(_, v)| v).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(HierarchyError::Config(format!(
                "budget shares must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

/// Recency decay curve parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecayConfig {
    /// Days of idleness that halve the recency score.
    #[serde(default = "default_half_life_days")]
    pub half_life_days: f32,

    /// Asymptotic floor of the recency score. Must be strictly positive so
    /// no memory is ever mathematically unreachable.
    #[serde(default = "default_decay_floor")]
    pub floor: f32,
}

fn default_half_life_days() -> f32 {
    30.0
}

fn default_decay_floor() -> f32 {
    0.05
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            half_life_days: default_half_life_days(),
            floor: default_decay_floor(),
        }
    }
}

impl DecayConfig {
    /// Validate a positive half-life and a floor in (0, 1).
    pub fn validate(&self) -> Result<()> {
        if self.half_life_days <= 0.0 {
            return Err(HierarchyError::Config(format!(
                "decay half_life_days must be positive, got {}",
                self.half_life_days
            )));
        }
        if !(self.floor > 0.0 && self.floor < 1.0) {
            return Err(HierarchyError::Config(format!(
                "decay floor must be in (0, 1), got {}",
                self.floor
            )));
        }
        Ok(())
    }
}

/// Knobs for the curator's analysis phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CuratorConfig {
    /// Pairwise text similarity at or above this flags a duplicate candidate.
    #[serde(default = "default_duplicate_similarity_threshold")]
    pub duplicate_similarity_threshold: f32,

    /// Access count at or above this suggests a protection upgrade.
    #[serde(default = "default_protection_access_threshold")]
    pub protection_access_threshold: u32,

    /// Importance boost suggested for frequently accessed memories.
    #[serde(default = "default_protection_boost")]
    pub protection_boost: f32,

    /// How many most-central graph nodes to report.
    #[serde(default = "default_central_node_limit")]
    pub central_node_limit: usize,
}

fn default_duplicate_similarity_threshold() -> f32 {
    0.85
}

fn default_protection_access_threshold() -> u32 {
    10
}

fn default_protection_boost() -> f32 {
    0.2
}

fn default_central_node_limit() -> usize {
    5
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            duplicate_similarity_threshold: default_duplicate_similarity_threshold(),
            protection_access_threshold: default_protection_access_threshold(),
            protection_boost: default_protection_boost(),
            central_node_limit: default_central_node_limit(),
        }
    }
}

impl CuratorConfig {
    /// Validate thresholds.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.duplicate_similarity_threshold) {
            return Err(HierarchyError::Config(format!(
                "duplicate_similarity_threshold must be in [0, 1], got {}",
                self.duplicate_similarity_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.protection_boost) {
            return Err(HierarchyError::Config(format!(
                "protection_boost must be in [0, 1], got {}",
                self.protection_boost
            )));
        }
        Ok(())
    }
}

/// The full immutable configuration for one hierarchy instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Recall scorer weights.
    #[serde(default)]
    pub weights: ScoreWeights,

    /// Temperature band boundaries.
    #[serde(default)]
    pub bands: TemperatureBands,

    /// Protection and retention policy thresholds.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Selector pass budget ratios.
    #[serde(default)]
    pub budget: BudgetSplit,

    /// Recency decay curve.
    #[serde(default)]
    pub decay: DecayConfig,

    /// Curator analysis knobs.
    #[serde(default)]
    pub curator: CuratorConfig,

    /// Importance gained per recall.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,

    /// Bounded CAS retries inside the reinforcement updater.
    #[serde(default = "default_recall_retry_limit")]
    pub recall_retry_limit: u32,

    /// Candidates requested from the semantic search backend.
    #[serde(default = "default_semantic_top_k")]
    pub semantic_top_k: usize,

    /// Capacity of the in-process hot pool cache.
    #[serde(default = "default_hot_pool_capacity")]
    pub hot_pool_capacity: usize,
}

fn default_learning_rate() -> f32 {
    0.05
}

fn default_recall_retry_limit() -> u32 {
    3
}

fn default_semantic_top_k() -> usize {
    32
}

fn default_hot_pool_capacity() -> usize {
    64
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            bands: TemperatureBands::default(),
            retention: RetentionConfig::default(),
            budget: BudgetSplit::default(),
            decay: DecayConfig::default(),
            curator: CuratorConfig::default(),
            learning_rate: default_learning_rate(),
            recall_retry_limit: default_recall_retry_limit(),
            semantic_top_k: default_semantic_top_k(),
            hot_pool_capacity: default_hot_pool_capacity(),
        }
    }
}

impl HierarchyConfig {
    /// Validate every nested section. Called once at construction; failures
    /// are fatal.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        self.bands.validate()?;
        self.retention.validate()?;
        self.budget.validate()?;
        self.decay.validate()?;
        self.curator.validate()?;
        if !(0.0..=1.0).contains(&self.learning_rate) {
            return Err(HierarchyError::Config(format!(
                "learning_rate must be in [0, 1], got {}",
                self.learning_rate
            )));
        }
        if self.recall_retry_limit == 0 {
            return Err(HierarchyError::Config(
                "recall_retry_limit must be at least 1".to_string(),
            ));
        }
        if self.semantic_top_k == 0 {
            return Err(HierarchyError::Config(
                "semantic_top_k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(HierarchyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let weights = ScoreWeights {
            similarity: 0.5,
            ..Default::default()
        };
        let err = weights.validate().unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn test_weights_reject_negative() {
        let weights = ScoreWeights {
            similarity: -0.1,
            recency: 0.6,
            ..Default::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_weights_no_silent_renormalization() {
        // A config that would be fine after renormalization still fails.
        let weights = ScoreWeights {
            similarity: 0.6,
            recency: 0.4,
            frequency: 0.3,
            graph: 0.3,
            importance: 0.4,
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_bands_ordering() {
        let bands = TemperatureBands {
            hot_min: 0.5,
            warm_min: 0.8,
            cool_min: 0.2,
        };
        assert!(bands.validate().is_err());

        let bands = TemperatureBands {
            hot_min: 0.8,
            warm_min: 0.5,
            cool_min: 0.0,
        };
        assert!(bands.validate().is_err());

        assert!(TemperatureBands::default().validate().is_ok());
    }

    #[test]
    fn test_retention_ceiling_below_protection() {
        let retention = RetentionConfig {
            archive_importance_ceiling: 0.7,
            protection_threshold: 0.7,
            ..Default::default()
        };
        let err = retention.validate().unwrap_err();
        assert!(err.to_string().contains("below protection_threshold"));
    }

    #[test]
    fn test_retention_windows_positive() {
        let retention = RetentionConfig {
            min_retention_days: 0,
            ..Default::default()
        };
        assert!(retention.validate().is_err());
    }

    #[test]
    fn test_budget_split_sum() {
        let budget = BudgetSplit {
            hot: 0.5,
            ..Default::default()
        };
        assert!(budget.validate().is_err());
        assert!(BudgetSplit::default().validate().is_ok());
    }

    #[test]
    fn test_decay_floor_strictly_positive() {
        let decay = DecayConfig {
            floor: 0.0,
            ..Default::default()
        };
        assert!(decay.validate().is_err());
    }

    #[test]
    fn test_config_deserialize_with_defaults() {
        let config: HierarchyConfig = serde_json::from_str("{}").unwrap();
        assert!(config.validate().is_ok());
        assert!((config.learning_rate - 0.05).abs() < f32::EPSILON);
        assert_eq!(config.recall_retry_limit, 3);
    }

    #[test]
    fn test_config_rejects_zero_retry_limit() {
        let config = HierarchyConfig {
            recall_retry_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
