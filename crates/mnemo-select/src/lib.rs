//! # mnemo-select
//!
//! The context budget selector: assembles a token-bounded working set of
//! memories for a query by drawing from four pools (Hot, protected,
//! semantically relevant, graph-adjacent) under a fixed budget split.
//!
//! Also home to the `HotPool`, the in-process cache of recently promoted
//! memory ids fed by the reinforcement updater's transition events.

pub mod hot_pool;
pub mod selector;

pub use hot_pool::HotPool;
pub use selector::ContextSelector;
