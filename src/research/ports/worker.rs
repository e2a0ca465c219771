//! Delegation port for the external research worker.

use crate::research::domain::{ResearchTask, TaskId};
use async_trait::async_trait;

/// Synchronous outcome of a delegation call.
///
/// A non-success response, a timeout, and a transport error are all folded
/// into `ok == false` with diagnostic detail; callers only branch on `ok`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    ok: bool,
    detail: String,
}

impl Acknowledgement {
    /// Creates a success acknowledgement.
    #[must_use]
    pub fn success(detail: impl Into<String>) -> Self {
        Self {
            ok: true,
            detail: detail.into(),
        }
    }

    /// Creates a failure acknowledgement carrying diagnostic detail.
    #[must_use]
    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: detail.into(),
        }
    }

    /// Returns `true` when the worker accepted the request.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.ok
    }

    /// Returns the diagnostic detail.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// Outbound protocol adapter asking the remote worker to start or stop a
/// task.
///
/// Implementations perform no retries; retry policy, if any, belongs to the
/// caller. Calls block for up to the configured delegation timeout, so
/// callers must not hold any store lock across them.
#[async_trait]
pub trait WorkerClient: Send + Sync {
    /// Asks the worker to start executing the given task.
    async fn start(&self, task: &ResearchTask) -> Acknowledgement;

    /// Asks the worker to halt the given task.
    async fn stop(&self, task_id: &TaskId) -> Acknowledgement;
}
