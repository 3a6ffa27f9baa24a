//! # mnemo-mirror
//!
//! Human-readable Markdown mirror of the memory store: one document per
//! memory at `<root>/<scope>/<tier>/<id>.md`, YAML frontmatter over the
//! content body. Tier directories follow the current maintenance-mode
//! temperature; archived memories live under `archive/`.
//!
//! The store stays authoritative. Export is idempotent (same memory, same
//! clock, same bytes); import merges edited files back with
//! last-writer-wins on `last_accessed_at` and never treats the mirrored
//! `score` field as input, since score is derived state.

pub mod export;
pub mod import;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mnemo_engine::{RecallScorer, TemperatureClassifier};
use mnemo_store::{Clock, MemoryStore};

pub use export::ExportOutcome;
pub use import::ImportOutcome;

/// The tier directories an exported memory can live in.
pub(crate) const TIER_DIRS: [&str; 5] = ["hot", "warm", "cool", "cold", "archive"];

/// Markdown mirror over one store.
pub struct MarkdownMirror {
    pub(crate) store: Arc<dyn MemoryStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) scorer: RecallScorer,
    pub(crate) classifier: TemperatureClassifier,
    pub(crate) root: PathBuf,
}

impl MarkdownMirror {
    /// Wire a mirror rooted at `root`. The directory tree is created lazily
    /// on first export.
    pub fn new(
        store: Arc<dyn MemoryStore>,
        clock: Arc<dyn Clock>,
        scorer: RecallScorer,
        classifier: TemperatureClassifier,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            clock,
            scorer,
            classifier,
            root: root.into(),
        }
    }

    /// The mirror's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
