//! # mnemo-store
//!
//! Contracts for the external collaborators of the memory hierarchy:
//!
//! - `MemoryStore`: persistence adapter (point lookups, scoped queries,
//!   compare-and-swap upserts, semantic search, graph neighbors)
//! - `Clock`: injected time source so scoring stays deterministic in tests
//! - `TokenCounter`: injected token measurement for the budget selector
//!
//! The hierarchy performs no I/O of its own; everything flows through these
//! traits. `InMemoryStore` is a reference implementation with real per-key
//! CAS semantics, used by tests and demos.

pub mod clock;
pub mod memstore;
pub mod tokens;
pub mod traits;

pub use clock::{Clock, FixedClock, SystemClock};
pub use memstore::InMemoryStore;
pub use tokens::{CharEstimateCounter, TiktokenCounter, TokenCounter};
pub use traits::{CasOutcome, MemoryFilter, MemoryStore, ScoredId};
