//! # mnemo-engine
//!
//! The computation core of the memory hierarchy:
//!
//! - `RecallScorer`: composite [0,1] relevance score from five sub-scores
//! - `RecencyDecay`: pluggable decay curve (exponential with a floor by default)
//! - `TemperatureClassifier`: score -> Hot/Warm/Cool/Cold with transition detection
//! - `RetentionPolicy`: pure archival eligibility rules
//! - `HebbianUpdater`: the usage-reinforcement write path (bounded CAS retry)
//!
//! Everything except the updater is pure and never suspends; the updater
//! suspends only on store adapter calls.

pub mod classifier;
pub mod decay;
pub mod policy;
pub mod reinforce;
pub mod scorer;

pub use classifier::TemperatureClassifier;
pub use decay::{ExponentialDecay, RecencyDecay};
pub use policy::RetentionPolicy;
pub use reinforce::{apply_recall, HebbianUpdater};
pub use scorer::{QueryContext, RecallScorer};
