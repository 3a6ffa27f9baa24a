//! Protection and retention policy.
//!
//! Decides, independent of score, whether a memory may ever be archived.
//! The policy is pure and side-effect-free; the archival sweep consumes it
//! and must re-evaluate at execution time, since importance can rise through
//! reinforcement between flagging and archiving.

use chrono::{DateTime, Duration, Utc};

use mnemo_types::{Memory, Result, RetentionConfig};

/// Pure archival-eligibility rules, evaluated in order; the first applicable
/// rule decides.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    config: RetentionConfig,
}

impl RetentionPolicy {
    /// Build from validated configuration.
    pub fn new(config: RetentionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Reference thresholds: protect >= 0.7, retain 90 days, archive below
    /// 0.2 after 30 cold days.
    pub fn with_defaults() -> Self {
        Self::new(RetentionConfig::default()).expect("default retention config is valid")
    }

    /// May this memory be archived right now?
    ///
    /// Rules in order:
    /// 1. Protected importance: never archive.
    /// 2. Accessed within the retention window: not yet.
    /// 3. Unimportant and continuously Cold past the grace period: archive.
    /// 4. Otherwise: no.
    pub fn should_archive(&self, memory: &Memory, now: DateTime<Utc>) -> bool {
        if memory.archived {
            return false;
        }
        if memory.importance >= self.config.protection_threshold {
            return false;
        }
        let idle = now.signed_duration_since(memory.last_accessed_at);
        if idle < Duration::days(self.config.min_retention_days) {
            return false;
        }
        if memory.importance < self.config.archive_importance_ceiling {
            if let Some(cold_since) = memory.cold_since {
                let cold_for = now.signed_duration_since(cold_since);
                return cold_for >= Duration::days(self.config.cold_grace_days);
            }
        }
        false
    }

    /// When the cold grace period ends for this memory, if it is being
    /// tracked as Cold. Used for curator reporting.
    pub fn grace_ends(&self, memory: &Memory) -> Option<DateTime<Utc>> {
        memory
            .cold_since
            .map(|cold_since| cold_since + Duration::days(self.config.cold_grace_days))
    }

    /// True when importance alone shields this memory from archival.
    pub fn is_protected(&self, memory: &Memory) -> bool {
        memory.importance >= self.config.protection_threshold
    }

    /// The configured thresholds.
    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }
}
