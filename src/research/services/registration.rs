//! Worker-facing registration and pending-task pull services.
//!
//! This is the pull side of a push-free handoff: the worker registers
//! tasks it has begun and polls for queued backlog instead of the
//! coordinator pushing work at it, so worker restarts lose nothing.

use crate::research::domain::{
    EffortProfile, NewResearchTask, ParseTaskStatusError, Progress, RegionId, RegionName,
    RegistrationSnapshot, ResearchDomainError, ResearchTask, TaskId, TaskStatus,
};
use crate::research::ports::{TaskStore, TaskStoreError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for worker-initiated task registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterTaskRequest {
    task_id: String,
    region_name: String,
    region_id: String,
    status: TaskStatus,
    title: Option<String>,
    progress: Option<u8>,
    current_step: Option<String>,
    start_time: Option<DateTime<Utc>>,
}

impl RegisterTaskRequest {
    /// Creates a request with the required registration fields.
    #[must_use]
    pub fn new(
        task_id: impl Into<String>,
        region_name: impl Into<String>,
        region_id: impl Into<String>,
        status: TaskStatus,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            region_name: region_name.into(),
            region_id: region_id.into(),
            status,
            title: None,
            progress: None,
            current_step: None,
            start_time: None,
        }
    }

    /// Sets the display title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the reported completion percentage.
    #[must_use]
    pub const fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets the reported in-progress phase label.
    #[must_use]
    pub fn with_current_step(mut self, step: impl Into<String>) -> Self {
        self.current_step = Some(step.into());
        self
    }

    /// Sets the reported start time instead of defaulting to now.
    #[must_use]
    pub const fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }
}

/// Outcome of an idempotent registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The task did not exist and was created.
    Created(ResearchTask),
    /// The task already existed; the stored record is returned unchanged.
    AlreadyRegistered(ResearchTask),
}

impl RegistrationOutcome {
    /// Returns the registered task.
    #[must_use]
    pub const fn task(&self) -> &ResearchTask {
        match self {
            Self::Created(task) | Self::AlreadyRegistered(task) => task,
        }
    }

    /// Returns `true` when the registration created a new record.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Service-level errors for registration operations.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A required wire field is absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The supplied status string is not a known lifecycle status.
    #[error(transparent)]
    Status(#[from] ParseTaskStatusError),

    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] ResearchDomainError),

    /// Store operation failed.
    #[error(transparent)]
    Store(TaskStoreError),
}

/// Result type for registration operations.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Idempotent registration and pending-pull service.
pub struct RegistrationService<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync + 'static,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> Clone for RegistrationService<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S, C> RegistrationService<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a new registration service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Registers a task the worker picked up outside the normal create
    /// flow.
    ///
    /// Idempotent under at-least-once delivery: an existing task is
    /// returned unchanged, including when a concurrent registration wins
    /// the create race.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Domain`] on invalid fields or
    /// [`RegistrationError::Store`] when persistence fails.
    pub async fn register_task(
        &self,
        request: RegisterTaskRequest,
    ) -> RegistrationResult<RegistrationOutcome> {
        let task_id = TaskId::new(request.task_id)?;
        if let Some(existing) = self
            .store
            .get(&task_id)
            .await
            .map_err(RegistrationError::Store)?
        {
            return Ok(RegistrationOutcome::AlreadyRegistered(existing));
        }

        let region_name = RegionName::new(request.region_name)?;
        let region_id = RegionId::new(request.region_id)?;
        let progress = Progress::new(request.progress.unwrap_or(0))?;

        let task = ResearchTask::registered(
            NewResearchTask {
                task_id: task_id.clone(),
                title: request.title,
                region_name,
                region_id,
                effort: EffortProfile::default(),
                config: Value::Object(serde_json::Map::new()),
                municipality_id: None,
            },
            RegistrationSnapshot {
                status: request.status,
                progress,
                current_step: request.current_step,
                start_time: request.start_time,
            },
            &*self.clock,
        );

        match self.store.create(&task).await {
            Ok(()) => Ok(RegistrationOutcome::Created(task)),
            Err(TaskStoreError::Conflict(_)) => {
                let existing = self
                    .store
                    .get(&task_id)
                    .await
                    .map_err(RegistrationError::Store)?
                    .ok_or(RegistrationError::Store(TaskStoreError::NotFound(task_id)))?;
                Ok(RegistrationOutcome::AlreadyRegistered(existing))
            }
            Err(other) => Err(RegistrationError::Store(other)),
        }
    }

    /// Returns the backlog of tasks awaiting execution, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Store`] when the listing fails.
    pub async fn pending_tasks(&self) -> RegistrationResult<Vec<ResearchTask>> {
        self.store
            .list_pending()
            .await
            .map_err(RegistrationError::Store)
    }
}

/// Wire payload for worker-initiated registration.
///
/// Every field is optional at the protocol boundary; the gateway enforces
/// presence of the required ones before touching the service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterTaskPayload {
    /// Task identifier chosen by the worker.
    pub task_id: Option<String>,
    /// Target region name.
    pub region_name: Option<String>,
    /// Target region code.
    pub region_id: Option<String>,
    /// Reported lifecycle status.
    pub status: Option<String>,
    /// Display title.
    pub title: Option<String>,
    /// Reported completion percentage.
    pub progress: Option<u8>,
    /// Reported in-progress phase label.
    pub current_step: Option<String>,
    /// Reported start time.
    pub start_time: Option<DateTime<Utc>>,
}

/// Protocol-facing wrapper over [`RegistrationService`].
///
/// Validates field presence on the wire payload and surfaces the missing
/// field name verbatim, then delegates to the service.
#[derive(Clone)]
pub struct RegistrationGateway<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync + 'static,
{
    service: RegistrationService<S, C>,
}

impl<S, C> RegistrationGateway<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync + 'static,
{
    /// Wraps a registration service.
    #[must_use]
    pub const fn new(service: RegistrationService<S, C>) -> Self {
        Self { service }
    }

    /// Validates a registration payload and registers the task.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::MissingField`] naming the first absent
    /// required field, [`RegistrationError::Status`] for an unknown status
    /// string, or any service-level error.
    pub async fn register_task(
        &self,
        payload: RegisterTaskPayload,
    ) -> RegistrationResult<RegistrationOutcome> {
        let task_id = payload
            .task_id
            .ok_or(RegistrationError::MissingField("task_id"))?;
        let region_name = payload
            .region_name
            .ok_or(RegistrationError::MissingField("region_name"))?;
        let region_id = payload
            .region_id
            .ok_or(RegistrationError::MissingField("region_id"))?;
        let status_raw = payload
            .status
            .ok_or(RegistrationError::MissingField("status"))?;
        let status = TaskStatus::try_from(status_raw.as_str())?;

        let mut request = RegisterTaskRequest::new(task_id, region_name, region_id, status);
        if let Some(title) = payload.title {
            request = request.with_title(title);
        }
        if let Some(progress) = payload.progress {
            request = request.with_progress(progress);
        }
        if let Some(step) = payload.current_step {
            request = request.with_current_step(step);
        }
        if let Some(start_time) = payload.start_time {
            request = request.with_start_time(start_time);
        }

        self.service.register_task(request).await
    }

    /// Returns the backlog of tasks awaiting execution, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Store`] when the listing fails.
    pub async fn pending_tasks(&self) -> RegistrationResult<Vec<ResearchTask>> {
        self.service.pending_tasks().await
    }
}
