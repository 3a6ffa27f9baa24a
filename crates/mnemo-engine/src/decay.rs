//! Recency decay strategies.
//!
//! The decay curve is an injected strategy: it must be monotonically
//! decreasing in idle time and must approach a floor strictly above zero, so
//! no memory ever becomes mathematically unreachable through recency alone.

use mnemo_types::{DecayConfig, HierarchyError, Result};

/// Maps idle time (days since last access) to a recency score in [0, 1].
pub trait RecencyDecay: Send + Sync {
    /// Recency score for a memory idle for `idle_days`.
    fn weight(&self, idle_days: f32) -> f32;
}

/// Exponential half-life decay with an asymptotic floor:
/// `floor + (1 - floor) * 0.5^(idle_days / half_life_days)`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialDecay {
    half_life_days: f32,
    floor: f32,
}

impl ExponentialDecay {
    /// Build from validated configuration.
    pub fn new(config: DecayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            half_life_days: config.half_life_days,
            floor: config.floor,
        })
    }

    /// Reference curve: 30-day half-life, 0.05 floor.
    pub fn with_defaults() -> Self {
        Self::new(DecayConfig::default()).expect("default decay config is valid")
    }
}

impl RecencyDecay for ExponentialDecay {
    fn weight(&self, idle_days: f32) -> f32 {
        let idle = idle_days.max(0.0);
        self.floor + (1.0 - self.floor) * 0.5_f32.powf(idle / self.half_life_days)
    }
}

impl TryFrom<DecayConfig> for ExponentialDecay {
    type Error = HierarchyError;

    fn try_from(config: DecayConfig) -> Result<Self> {
        Self::new(config)
    }
}
