//! HTTP adapter delegating task execution to the remote research worker.
//!
//! Wire contract: `POST <base>/start` with the task handoff payload and
//! `POST <base>/stop` with the task identifier. A success status code is
//! the sole success signal; everything else folds into a failure
//! acknowledgement.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::research::domain::{ResearchTask, TaskId};
use crate::research::ports::{Acknowledgement, WorkerClient};

/// Fixed timeout applied to every delegation call.
pub const DELEGATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Error returned when the HTTP worker client cannot be constructed.
#[derive(Debug, Error)]
#[error("failed to build worker HTTP client: {0}")]
pub struct WorkerClientBuildError(#[from] reqwest::Error);

/// Worker client speaking HTTP to a configured worker endpoint.
#[derive(Debug, Clone)]
pub struct HttpWorkerClient {
    client: reqwest::Client,
    base_url: String,
}

/// Handoff payload for a start delegation.
#[derive(Debug, Serialize)]
struct StartPayload<'a> {
    task_id: &'a str,
    region_name: &'a str,
    region_id: &'a str,
    options: StartOptions<'a>,
}

/// Effort and configuration options passed through to the worker.
#[derive(Debug, Serialize)]
struct StartOptions<'a> {
    breadth: u32,
    depth: u32,
    config: &'a Value,
}

/// Payload for a stop delegation.
#[derive(Debug, Serialize)]
struct StopPayload<'a> {
    task_id: &'a str,
}

impl HttpWorkerClient {
    /// Creates a client for the given worker base URL.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerClientBuildError`] when the underlying HTTP client
    /// cannot be initialised.
    pub fn new(base_url: impl Into<String>) -> Result<Self, WorkerClientBuildError> {
        let client = reqwest::Client::builder()
            .timeout(DELEGATION_TIMEOUT)
            .build()?;
        let base = base_url.into();
        Ok(Self {
            client,
            base_url: base.trim_end_matches('/').to_owned(),
        })
    }

    /// Posts a payload and folds every failure mode into the
    /// acknowledgement.
    async fn post_for_ack<T: Serialize + Sync>(&self, path: &str, payload: &T) -> Acknowledgement {
        let url = format!("{}/{path}", self.base_url);
        match self.client.post(&url).json(payload).send().await {
            Ok(response) if response.status().is_success() => {
                Acknowledgement::success("accepted")
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::error!(%url, %status, body, "worker rejected delegation request");
                Acknowledgement::failure(format!("worker returned {status}: {body}"))
            }
            Err(err) => {
                tracing::error!(%url, error = %err, "worker delegation request failed");
                Acknowledgement::failure(format!("worker request failed: {err}"))
            }
        }
    }
}

#[async_trait]
impl WorkerClient for HttpWorkerClient {
    async fn start(&self, task: &ResearchTask) -> Acknowledgement {
        let payload = StartPayload {
            task_id: task.task_id().as_str(),
            region_name: task.region_name().as_str(),
            region_id: task.region_id().as_str(),
            options: StartOptions {
                breadth: task.effort().breadth(),
                depth: task.effort().depth(),
                config: task.config(),
            },
        };
        self.post_for_ack("start", &payload).await
    }

    async fn stop(&self, task_id: &TaskId) -> Acknowledgement {
        let payload = StopPayload {
            task_id: task_id.as_str(),
        };
        self.post_for_ack("stop", &payload).await
    }
}
