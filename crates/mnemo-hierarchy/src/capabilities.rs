//! Narrow capability interfaces over the hierarchy.
//!
//! Callers that only track sessions, errors, or decisions depend on these
//! traits instead of the whole facade. Each capability is plain delegation
//! to `remember` with a well-known tag and a default importance chosen for
//! the kind of record: decisions are long-lived, errors matter until fixed,
//! session summaries fade fastest.

use async_trait::async_trait;

use mnemo_store::MemoryFilter;
use mnemo_types::{Memory, Result};

use crate::MemoryHierarchy;

/// Tag marking session-summary memories.
pub const SESSION_TAG: &str = "session";
/// Tag marking recorded errors.
pub const ERROR_TAG: &str = "error";
/// Tag marking recorded decisions.
pub const DECISION_TAG: &str = "decision";

const SESSION_IMPORTANCE: f32 = 0.4;
const ERROR_IMPORTANCE: f32 = 0.6;
const DECISION_IMPORTANCE: f32 = 0.8;

/// Records and retrieves per-session summaries.
#[async_trait]
pub trait SessionTracker: Send + Sync {
    /// Store a session summary.
    async fn record_session(&self, scope: &str, summary: &str) -> Result<Memory>;

    /// The most recent session summaries, newest first.
    async fn recent_sessions(&self, scope: &str, limit: usize) -> Result<Vec<Memory>>;
}

/// Records encountered errors worth remembering.
#[async_trait]
pub trait ErrorRecorder: Send + Sync {
    /// Store an error description.
    async fn record_error(&self, scope: &str, description: &str) -> Result<Memory>;
}

/// Records decisions and their rationale.
#[async_trait]
pub trait DecisionRecorder: Send + Sync {
    /// Store a decision with its rationale.
    async fn record_decision(&self, scope: &str, decision: &str, rationale: &str)
        -> Result<Memory>;
}

#[async_trait]
impl SessionTracker for MemoryHierarchy {
    async fn record_session(&self, scope: &str, summary: &str) -> Result<Memory> {
        self.record_tagged(scope, summary, SESSION_IMPORTANCE, SESSION_TAG)
            .await
    }

    async fn recent_sessions(&self, scope: &str, limit: usize) -> Result<Vec<Memory>> {
        let mut sessions = self
            .store
            .query(scope, &MemoryFilter::active().with_tag(SESSION_TAG))
            .await?;
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        sessions.truncate(limit);
        Ok(sessions)
    }
}

#[async_trait]
impl ErrorRecorder for MemoryHierarchy {
    async fn record_error(&self, scope: &str, description: &str) -> Result<Memory> {
        self.record_tagged(scope, description, ERROR_IMPORTANCE, ERROR_TAG)
            .await
    }
}

#[async_trait]
impl DecisionRecorder for MemoryHierarchy {
    async fn record_decision(
        &self,
        scope: &str,
        decision: &str,
        rationale: &str,
    ) -> Result<Memory> {
        self.record_tagged(
            scope,
            format!("{decision}\n\nRationale: {rationale}"),
            DECISION_IMPORTANCE,
            DECISION_TAG,
        )
        .await
    }
}

impl MemoryHierarchy {
    async fn record_tagged(
        &self,
        scope: &str,
        content: impl Into<String>,
        importance: f32,
        tag: &str,
    ) -> Result<Memory> {
        let memory = Memory::new(scope, content, importance, self.clock.now()).with_tag(tag);
        self.store.upsert(memory.clone()).await?;
        Ok(memory)
    }
}
