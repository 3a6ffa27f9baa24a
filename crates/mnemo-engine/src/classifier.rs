//! Score-to-temperature classification.
//!
//! Temperature is a pure function of score over validated bands. The four
//! bands partition [0, 1]: lower bounds are inclusive, so every valid score
//! maps to exactly one tier.

use mnemo_types::{Result, Temperature, TemperatureBands, TransitionEvent};
use tracing::debug;

/// Maps scores to tiers and detects tier transitions.
#[derive(Debug, Clone, Copy)]
pub struct TemperatureClassifier {
    bands: TemperatureBands,
}

impl TemperatureClassifier {
    /// Build from validated band boundaries.
    pub fn new(bands: TemperatureBands) -> Result<Self> {
        bands.validate()?;
        Ok(Self { bands })
    }

    /// Reference bands: 0.8 / 0.5 / 0.2.
    pub fn with_defaults() -> Self {
        Self::new(TemperatureBands::default()).expect("default bands are valid")
    }

    /// Classify a score. Out-of-range inputs are clamped into [0, 1] first.
    pub fn classify(&self, score: f32) -> Temperature {
        let score = score.clamp(0.0, 1.0);
        if score >= self.bands.hot_min {
            Temperature::Hot
        } else if score >= self.bands.warm_min {
            Temperature::Warm
        } else if score >= self.bands.cool_min {
            Temperature::Cool
        } else {
            Temperature::Cold
        }
    }

    /// Emit a transition event when the tier changed.
    pub fn detect_transition(
        &self,
        memory_id: &str,
        old: Temperature,
        new: Temperature,
    ) -> Option<TransitionEvent> {
        let event = TransitionEvent::detect(memory_id, old, new)?;
        debug!(
            memory_id,
            from = %event.from,
            to = %event.to,
            direction = ?event.direction,
            "temperature transition"
        );
        Some(event)
    }

    /// The configured bands.
    pub fn bands(&self) -> &TemperatureBands {
        &self.bands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_types::TransitionDirection;

    #[test]
    fn test_reference_thresholds() {
        let c = TemperatureClassifier::with_defaults();
        assert_eq!(c.classify(1.0), Temperature::Hot);
        assert_eq!(c.classify(0.8), Temperature::Hot);
        assert_eq!(c.classify(0.79), Temperature::Warm);
        assert_eq!(c.classify(0.5), Temperature::Warm);
        assert_eq!(c.classify(0.49), Temperature::Cool);
        assert_eq!(c.classify(0.2), Temperature::Cool);
        assert_eq!(c.classify(0.19), Temperature::Cold);
        assert_eq!(c.classify(0.0), Temperature::Cold);
    }

    #[test]
    fn test_bands_partition_unit_interval() {
        // Every sampled score maps to exactly one tier, and tiers are
        // monotonically non-increasing as the score falls.
        let c = TemperatureClassifier::with_defaults();
        let mut previous_rank = Temperature::Hot.rank();
        for i in (0..=1000).rev() {
            let score = i as f32 / 1000.0;
            let tier = c.classify(score);
            assert!(tier.rank() <= previous_rank, "rank rose as score fell");
            previous_rank = tier.rank();
        }
    }

    #[test]
    fn test_out_of_range_clamped() {
        let c = TemperatureClassifier::with_defaults();
        assert_eq!(c.classify(1.5), Temperature::Hot);
        assert_eq!(c.classify(-0.5), Temperature::Cold);
        assert_eq!(c.classify(f32::NAN), Temperature::Cold);
    }

    #[test]
    fn test_detect_transition() {
        let c = TemperatureClassifier::with_defaults();
        assert!(c
            .detect_transition("m1", Temperature::Warm, Temperature::Warm)
            .is_none());

        let event = c
            .detect_transition("m1", Temperature::Warm, Temperature::Hot)
            .unwrap();
        assert_eq!(event.direction, TransitionDirection::Promotion);
        assert_eq!(event.memory_id, "m1");
    }

    #[test]
    fn test_custom_bands() {
        let c = TemperatureClassifier::new(TemperatureBands {
            hot_min: 0.9,
            warm_min: 0.6,
            cool_min: 0.3,
        })
        .unwrap();
        assert_eq!(c.classify(0.85), Temperature::Warm);
        assert_eq!(c.classify(0.25), Temperature::Cold);
    }
}
