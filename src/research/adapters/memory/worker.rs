//! Scripted worker client for lifecycle service tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::research::domain::{ResearchTask, TaskId};
use crate::research::ports::{Acknowledgement, WorkerClient};

/// One recorded delegation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCall {
    /// A start delegation for the given task.
    Start(TaskId),
    /// A stop delegation for the given task.
    Stop(TaskId),
}

/// Worker client returning pre-scripted acknowledgements and recording
/// every call it receives.
#[derive(Debug, Clone)]
pub struct ScriptedWorkerClient {
    start_response: Acknowledgement,
    stop_response: Acknowledgement,
    calls: Arc<Mutex<Vec<WorkerCall>>>,
}

impl ScriptedWorkerClient {
    /// Creates a client acknowledging every request.
    #[must_use]
    pub fn acknowledging() -> Self {
        Self {
            start_response: Acknowledgement::success("accepted"),
            stop_response: Acknowledgement::success("accepted"),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Overrides the acknowledgement returned for start delegations.
    #[must_use]
    pub fn with_start_response(mut self, response: Acknowledgement) -> Self {
        self.start_response = response;
        self
    }

    /// Overrides the acknowledgement returned for stop delegations.
    #[must_use]
    pub fn with_stop_response(mut self, response: Acknowledgement) -> Self {
        self.stop_response = response;
        self
    }

    /// Returns a snapshot of the calls received so far.
    ///
    /// Returns an empty list if the call log mutex was poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<WorkerCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: WorkerCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl WorkerClient for ScriptedWorkerClient {
    async fn start(&self, task: &ResearchTask) -> Acknowledgement {
        self.record(WorkerCall::Start(task.task_id().clone()));
        self.start_response.clone()
    }

    async fn stop(&self, task_id: &TaskId) -> Acknowledgement {
        self.record(WorkerCall::Stop(task_id.clone()));
        self.stop_response.clone()
    }
}
