//! # mnemo-hierarchy
//!
//! The facade over the temperature-based memory hierarchy. One
//! `MemoryHierarchy` wires the scorer, classifier, retention policy,
//! reinforcement updater, context selector, curator, and Markdown mirror
//! over a caller-supplied store, clock, and token counter.
//!
//! Configuration is validated once at construction; every value object
//! downstream can then assume well-formed thresholds. Multiple hierarchies
//! with different configurations can coexist in one process, sharing or not
//! sharing a store as the caller prefers.

pub mod capabilities;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use mnemo_curator::{AnalysisReport, ApprovalSource, Curator, OptimizeOutcome, SweepOutcome, TokenOverlap};
use mnemo_engine::{
    ExponentialDecay, HebbianUpdater, RecallScorer, RetentionPolicy, TemperatureClassifier,
};
use mnemo_mirror::{ExportOutcome, ImportOutcome, MarkdownMirror};
use mnemo_select::ContextSelector;
use mnemo_store::{Clock, MemoryStore, TokenCounter};
use mnemo_types::{HierarchyConfig, HierarchyError, Memory, Result, TransitionEvent};

pub use capabilities::{DecisionRecorder, ErrorRecorder, SessionTracker};
pub use mnemo_curator::{ActionKind, ActionResult, ActionStatus, AutoApprove, ManualApproval};
pub use mnemo_types::Temperature;

/// Importance given to `remember` calls that do not specify one.
pub const DEFAULT_IMPORTANCE: f32 = 0.5;

/// The assembled memory hierarchy.
pub struct MemoryHierarchy {
    store: Arc<dyn MemoryStore>,
    clock: Arc<dyn Clock>,
    config: HierarchyConfig,
    updater: Arc<HebbianUpdater>,
    selector: ContextSelector,
    curator: Curator,
    scorer: RecallScorer,
    classifier: TemperatureClassifier,
}

impl MemoryHierarchy {
    /// Wire a hierarchy over a store, clock, and token counter.
    ///
    /// Fails fast with `Config` when any threshold, weight, or share in the
    /// configuration is out of range; nothing downstream revalidates.
    pub fn new(
        store: Arc<dyn MemoryStore>,
        clock: Arc<dyn Clock>,
        counter: Arc<dyn TokenCounter>,
        config: HierarchyConfig,
    ) -> Result<Self> {
        config.validate()?;

        let decay = Arc::new(ExponentialDecay::new(config.decay)?);
        let scorer = RecallScorer::new(config.weights, decay)?;
        let classifier = TemperatureClassifier::new(config.bands)?;
        let policy = RetentionPolicy::new(config.retention)?;

        let updater = Arc::new(HebbianUpdater::new(
            store.clone(),
            clock.clone(),
            scorer.clone(),
            classifier,
            config.learning_rate,
            config.recall_retry_limit,
        ));
        let selector = ContextSelector::new(
            store.clone(),
            clock.clone(),
            counter,
            scorer.clone(),
            classifier,
            updater.clone(),
            &config,
        )?;
        let curator = Curator::new(
            store.clone(),
            clock.clone(),
            scorer.clone(),
            classifier,
            policy,
            Arc::new(TokenOverlap),
            config.curator,
        )?;

        Ok(Self {
            store,
            clock,
            config,
            updater,
            selector,
            curator,
            scorer,
            classifier,
        })
    }

    /// Store a new memory and return it.
    pub async fn remember(
        &self,
        scope: &str,
        content: impl Into<String>,
        importance: Option<f32>,
    ) -> Result<Memory> {
        let memory = Memory::new(
            scope,
            content,
            importance.unwrap_or(DEFAULT_IMPORTANCE),
            self.clock.now(),
        );
        self.store.upsert(memory.clone()).await?;
        debug!(scope, id = %memory.id, importance = memory.importance, "memory stored");
        Ok(memory)
    }

    /// Fetch one memory by id.
    pub async fn get(&self, scope: &str, id: &str) -> Result<Option<Memory>> {
        self.store.get(scope, id).await
    }

    /// Assemble a context window within a token budget.
    ///
    /// Selected memories are reinforced exactly once; the returned records
    /// show their pre-reinforcement state.
    pub async fn select_context(
        &self,
        query: Option<&str>,
        max_tokens: usize,
        scope: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Memory>> {
        self.selector
            .select_context(query, max_tokens, scope, cancel)
            .await
    }

    /// Record one recall of a memory and return its updated state.
    pub async fn on_recall(&self, scope: &str, id: &str) -> Result<Memory> {
        self.updater.on_recall(scope, id).await
    }

    /// Explicitly override a memory's importance (clamped into [0, 1]).
    ///
    /// This is the only importance path besides reinforcement; it exists for
    /// user-driven pinning and unpinning.
    pub async fn set_importance(&self, scope: &str, id: &str, importance: f32) -> Result<Memory> {
        let importance = importance.clamp(0.0, 1.0);
        for _ in 0..self.config.recall_retry_limit {
            let current = self
                .store
                .get(scope, id)
                .await?
                .ok_or_else(|| HierarchyError::not_found(scope, id))?;
            let mut updated = current.clone();
            updated.importance = importance;
            match self.store.compare_and_swap(&current, updated.clone()).await? {
                mnemo_store::CasOutcome::Committed => return Ok(updated),
                mnemo_store::CasOutcome::Conflict => continue,
            }
        }
        Err(HierarchyError::ConcurrentUpdate {
            id: id.to_string(),
            attempts: self.config.recall_retry_limit,
        })
    }

    /// Current maintenance-mode temperature of a memory.
    pub async fn temperature(&self, scope: &str, id: &str) -> Result<Temperature> {
        let memory = self
            .store
            .get(scope, id)
            .await?
            .ok_or_else(|| HierarchyError::not_found(scope, id))?;
        let score = self.scorer.maintenance_score(&memory, self.clock.now());
        Ok(self.classifier.classify(score))
    }

    /// Curator Phase A: read-only analysis of a scope.
    pub async fn analyze(
        &self,
        scope: &str,
        cancel: &CancellationToken,
    ) -> Result<AnalysisReport> {
        self.curator.analyze(scope, cancel).await
    }

    /// Curator Phase B/C: execute the approved subset of a report.
    pub async fn optimize(
        &self,
        scope: &str,
        report: &AnalysisReport,
        approval: &dyn ApprovalSource,
        cancel: &CancellationToken,
    ) -> Result<OptimizeOutcome> {
        self.curator.optimize(scope, report, approval, cancel).await
    }

    /// Periodic maintenance sweep: cold tracking and archival.
    pub async fn sweep(&self, scope: &str) -> Result<SweepOutcome> {
        self.curator.sweep(scope).await
    }

    /// Mirror a scope to Markdown under `root`.
    pub async fn export_all(&self, scope: &str, root: &Path) -> Result<ExportOutcome> {
        self.mirror(root).export_all(scope).await
    }

    /// Merge Markdown documents under `path` back into the store.
    pub async fn import_path(&self, path: &Path) -> Result<ImportOutcome> {
        self.mirror(path).import_path(path).await
    }

    /// Subscribe to tier-transition events.
    pub fn subscribe_transitions(&self) -> broadcast::Receiver<TransitionEvent> {
        self.updater.subscribe()
    }

    fn mirror(&self, root: &Path) -> MarkdownMirror {
        MarkdownMirror::new(
            self.store.clone(),
            self.clock.clone(),
            self.scorer.clone(),
            self.classifier,
            root,
        )
    }
}
