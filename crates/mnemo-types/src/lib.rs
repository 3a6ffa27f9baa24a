//! # mnemo-types
//!
//! Shared domain types for the mnemo temperature-based memory hierarchy.
//!
//! This crate defines the core data structures used throughout the system:
//! - `Memory`: The stored unit of recall (content, importance, access stats, graph edges)
//! - `Temperature`: Discrete relevance tier derived from a composite score
//! - `TransitionEvent`: Promotion/demotion notification between tiers
//! - `HierarchyConfig`: The full immutable configuration tree
//! - `HierarchyError`: Unified error type for all hierarchy operations
//!
//! Configuration is always passed as an explicit value. Nothing in this
//! workspace reads process-wide mutable state, so several tenants can run
//! different policies in one process.

pub mod config;
pub mod error;
pub mod memory;
pub mod temperature;

pub use config::{
    BudgetSplit, CuratorConfig, DecayConfig, HierarchyConfig, RetentionConfig, ScoreWeights,
    TemperatureBands,
};
pub use error::{HierarchyError, Result};
pub use memory::Memory;
pub use temperature::{Temperature, TransitionDirection, TransitionEvent};
