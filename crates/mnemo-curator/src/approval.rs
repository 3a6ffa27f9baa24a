//! Approval sources.
//!
//! The optimize phase is a single execution engine parameterized by where
//! approval comes from: a caller-provided set of action ids (human in the
//! loop) or a policy that approves everything (autonomous mode). The two
//! never diverge in capability because only the gate differs.

use std::collections::HashSet;

/// Decides which proposed actions may execute.
pub trait ApprovalSource: Send + Sync {
    /// May the action with this id run?
    fn approves(&self, action_id: &str) -> bool;
}

/// Caller-approved subset of action ids.
#[derive(Debug, Default, Clone)]
pub struct ManualApproval {
    approved: HashSet<String>,
}

impl ManualApproval {
    /// Approve exactly the listed action ids.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            approved: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl ApprovalSource for ManualApproval {
    fn approves(&self, action_id: &str) -> bool {
        self.approved.contains(action_id)
    }
}

/// Autonomous mode: every proposed action is approved.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

impl ApprovalSource for AutoApprove {
    fn approves(&self, _action_id: &str) -> bool {
        true
    }
}
