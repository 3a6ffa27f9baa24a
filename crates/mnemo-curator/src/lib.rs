//! # mnemo-curator
//!
//! Offline analysis and maintenance for the memory hierarchy, in three
//! escalating autonomy phases sharing one execution engine:
//!
//! - **Analyze** (read-only): duplicate candidates, archive candidates,
//!   protection-upgrade suggestions, graph insights.
//! - **Optimize**: executes the approved subset of an analysis report,
//!   reporting per-action success or failure.
//! - **Autonomous**: the same execution path with `AutoApprove` as the
//!   approval source.
//!
//! The `sweep` entry point is the periodic maintenance job: it stamps
//! cold-tier observations and archives whatever the retention policy allows,
//! re-evaluated at write time.

pub mod analyze;
pub mod approval;
pub mod optimize;
pub mod report;
pub mod similarity;
pub mod sweep;

use std::sync::Arc;

use mnemo_engine::{RecallScorer, RetentionPolicy, TemperatureClassifier};
use mnemo_store::{Clock, MemoryStore};
use mnemo_types::{CuratorConfig, Result};

pub use approval::{ApprovalSource, AutoApprove, ManualApproval};
pub use optimize::{ActionKind, ActionResult, ActionStatus, OptimizeOutcome};
pub use report::{
    AnalysisReport, ArchiveCandidate, CentralNode, DuplicatePair, GraphInsights,
    ProtectionSuggestion,
};
pub use similarity::{TextSimilarity, TokenOverlap};
pub use sweep::SweepOutcome;

/// The curation pipeline over one store.
pub struct Curator {
    pub(crate) store: Arc<dyn MemoryStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) scorer: RecallScorer,
    pub(crate) classifier: TemperatureClassifier,
    pub(crate) policy: RetentionPolicy,
    pub(crate) similarity: Arc<dyn TextSimilarity>,
    pub(crate) config: CuratorConfig,
}

impl Curator {
    /// Wire a curator. Validates its configuration up front.
    pub fn new(
        store: Arc<dyn MemoryStore>,
        clock: Arc<dyn Clock>,
        scorer: RecallScorer,
        classifier: TemperatureClassifier,
        policy: RetentionPolicy,
        similarity: Arc<dyn TextSimilarity>,
        config: CuratorConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            clock,
            scorer,
            classifier,
            policy,
            similarity,
            config,
        })
    }
}
