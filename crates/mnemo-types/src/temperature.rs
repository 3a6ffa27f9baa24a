//! Temperature tiers and tier-transition events.
//!
//! A memory's temperature is a pure function of its composite score. It is
//! never stored as authoritative state, only derived on demand, so it can
//! never go stale relative to the score.

use serde::{Deserialize, Serialize};

/// Discrete relevance tier derived from a memory's composite score.
///
/// Band boundaries live in `TemperatureBands`; the reference thresholds are
/// Hot >= 0.8, Warm >= 0.5, Cool >= 0.2, Cold below that. Lower bounds are
/// inclusive and the four bands partition [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Temperature {
    /// Actively in play; eligible for the hot pool cache.
    Hot,
    /// Recently useful, cheap to bring back.
    Warm,
    /// Fading; still part of normal queries.
    Cool,
    /// Dormant; the only tier from which archival is possible.
    Cold,
}

impl Temperature {
    /// Returns the display name for this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Temperature::Hot => "hot",
            Temperature::Warm => "warm",
            Temperature::Cool => "cool",
            Temperature::Cold => "cold",
        }
    }

    /// Rank used to decide promotion vs. demotion (Hot is highest).
    pub fn rank(&self) -> u8 {
        match self {
            Temperature::Hot => 3,
            Temperature::Warm => 2,
            Temperature::Cool => 1,
            Temperature::Cold => 0,
        }
    }

    /// Parse a tier from its lowercase display name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hot" => Some(Temperature::Hot),
            "warm" => Some(Temperature::Warm),
            "cool" => Some(Temperature::Cool),
            "cold" => Some(Temperature::Cold),
            _ => None,
        }
    }
}

impl std::fmt::Display for Temperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of a tier transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionDirection {
    /// Moved to a hotter tier.
    Promotion,
    /// Moved to a colder tier.
    Demotion,
}

/// Emitted when a memory's derived temperature changes tier.
///
/// Promotions to `Hot` feed the selector's hot pool cache; all transitions
/// are useful observability signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// Id of the memory that changed tier.
    pub memory_id: String,
    /// Tier before the change.
    pub from: Temperature,
    /// Tier after the change.
    pub to: Temperature,
    /// Promotion or demotion.
    pub direction: TransitionDirection,
}

impl TransitionEvent {
    /// Build an event for a tier change, or `None` when the tier is unchanged.
    pub fn detect(memory_id: impl Into<String>, from: Temperature, to: Temperature) -> Option<Self> {
        if from == to {
            return None;
        }
        let direction = if to.rank() > from.rank() {
            TransitionDirection::Promotion
        } else {
            TransitionDirection::Demotion
        };
        Some(Self {
            memory_id: memory_id.into(),
            from,
            to,
            direction,
        })
    }

    /// True when this event promotes the memory into the `Hot` tier.
    pub fn is_hot_promotion(&self) -> bool {
        self.direction == TransitionDirection::Promotion && self.to == Temperature::Hot
    }
}
