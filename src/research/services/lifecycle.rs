//! Service layer for research task lifecycle orchestration.
//!
//! Owns the create → delegate → track → finish flow: tasks are persisted
//! as queued before any delegation attempt, so a worker timeout always
//! leaves a well-defined record behind, and no store lock is ever held
//! across the delegation boundary.

use crate::research::domain::{
    EffortProfile, MunicipalityId, NewResearchTask, Progress, RegionId, RegionName, Report,
    ReportBody, ReportType, ResearchDomainError, ResearchTask, StatusUpdate, TaskId, TaskStatus,
};
use crate::research::ports::{
    CatalogError, MunicipalityCatalog, PageRequest, TaskFilter, TaskPage, TaskStore,
    TaskStoreError, WorkerClient,
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for creating a research task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    region_name: String,
    region_id: String,
    task_id: Option<String>,
    title: Option<String>,
    breadth: Option<u32>,
    depth: Option<u32>,
    config: Option<Value>,
    municipality_id: Option<i64>,
}

impl CreateTaskRequest {
    /// Creates a request with the required region fields.
    #[must_use]
    pub fn new(region_name: impl Into<String>, region_id: impl Into<String>) -> Self {
        Self {
            region_name: region_name.into(),
            region_id: region_id.into(),
            task_id: None,
            title: None,
            breadth: None,
            depth: None,
            config: None,
            municipality_id: None,
        }
    }

    /// Supplies a client-chosen task identifier instead of a generated one.
    #[must_use]
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Sets the display title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the research breadth.
    #[must_use]
    pub const fn with_breadth(mut self, breadth: u32) -> Self {
        self.breadth = Some(breadth);
        self
    }

    /// Sets the research depth.
    #[must_use]
    pub const fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Sets the opaque worker configuration payload.
    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }

    /// References a municipality in the external catalog.
    #[must_use]
    pub const fn with_municipality_id(mut self, id: i64) -> Self {
        self.municipality_id = Some(id);
        self
    }
}

/// Request payload for a worker-driven status callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusUpdateRequest {
    status: Option<TaskStatus>,
    progress: Option<u8>,
    current_step: Option<String>,
    error_message: Option<String>,
    report: Option<String>,
}

impl StatusUpdateRequest {
    /// Creates an empty update request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reported status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
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

    /// Sets the reported error message.
    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Attaches markdown report content to the update.
    #[must_use]
    pub fn with_report(mut self, content: impl Into<String>) -> Self {
        self.report = Some(content.into());
        self
    }
}

/// How worker-reported status updates are validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateValidation {
    /// Any update is accepted: the worker is the sole authority on forward
    /// progress. This is the contract the worker protocol relies on, not a
    /// missing check.
    #[default]
    TrustWorker,
    /// Reject transitions the domain state machine disallows.
    Strict,
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] ResearchDomainError),

    /// Store operation failed.
    #[error(transparent)]
    Store(TaskStoreError),

    /// The municipality catalog could not be queried.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The referenced municipality does not exist in the catalog.
    #[error("municipality not found: {0}")]
    UnknownMunicipality(MunicipalityId),

    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// Stop was requested for a task that is not queued or running.
    #[error("task {task_id} is not in a stoppable state: {status}")]
    NotStoppable {
        /// Task the stop was requested for.
        task_id: TaskId,
        /// Status the task currently holds.
        status: TaskStatus,
    },

    /// The worker rejected the delegation or could not be reached.
    ///
    /// For create, the task record survives in `failed` state and this
    /// error carries its identifier so the caller can still inspect it.
    #[error("delegation failed for task {task_id}: {detail}")]
    Delegation {
        /// Task the delegation was attempted for.
        task_id: TaskId,
        /// Diagnostic detail from the acknowledgement.
        detail: String,
    },

    /// No report of the requested type exists for the task.
    #[error("no {report_type} report available for task {task_id}")]
    ReportNotFound {
        /// Task the report was requested for.
        task_id: TaskId,
        /// Requested report format tag.
        report_type: ReportType,
    },
}

impl TaskLifecycleError {
    /// Maps store errors, folding the store's not-found into the service's.
    fn from_store(err: TaskStoreError) -> Self {
        match err {
            TaskStoreError::NotFound(task_id) => Self::TaskNotFound(task_id),
            TaskStoreError::Domain(domain) => Self::Domain(domain),
            other => Self::Store(other),
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
pub struct TaskLifecycleService<S, W, M, C>
where
    S: TaskStore,
    W: WorkerClient,
    M: MunicipalityCatalog,
    C: Clock + Send + Sync + 'static,
{
    store: Arc<S>,
    worker: Arc<W>,
    catalog: Arc<M>,
    clock: Arc<C>,
    validation: UpdateValidation,
}

impl<S, W, M, C> Clone for TaskLifecycleService<S, W, M, C>
where
    S: TaskStore,
    W: WorkerClient,
    M: MunicipalityCatalog,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            worker: Arc::clone(&self.worker),
            catalog: Arc::clone(&self.catalog),
            clock: Arc::clone(&self.clock),
            validation: self.validation,
        }
    }
}

impl<S, W, M, C> TaskLifecycleService<S, W, M, C>
where
    S: TaskStore,
    W: WorkerClient,
    M: MunicipalityCatalog,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a lifecycle service trusting worker updates (the default
    /// contract).
    #[must_use]
    pub const fn new(store: Arc<S>, worker: Arc<W>, catalog: Arc<M>, clock: Arc<C>) -> Self {
        Self {
            store,
            worker,
            catalog,
            clock,
            validation: UpdateValidation::TrustWorker,
        }
    }

    /// Overrides how worker status updates are validated.
    #[must_use]
    pub const fn with_validation(mut self, validation: UpdateValidation) -> Self {
        self.validation = validation;
        self
    }

    /// Creates a task and hands it to the worker.
    ///
    /// The task is persisted as queued before delegation; a successful
    /// acknowledgement moves it to running, a failed one moves it to failed
    /// and the failure is returned with the surviving task identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] on validation failure, an unresolved
    /// municipality reference, a duplicate task identifier, or a delegation
    /// failure.
    pub async fn create_task(
        &self,
        request: CreateTaskRequest,
    ) -> TaskLifecycleResult<ResearchTask> {
        let region_name = RegionName::new(request.region_name)?;
        let region_id = RegionId::new(request.region_id)?;
        let effort = EffortProfile::new(
            request.breadth.unwrap_or(EffortProfile::DEFAULT_BREADTH),
            request.depth.unwrap_or(EffortProfile::DEFAULT_DEPTH),
        )?;

        let municipality_id = request.municipality_id.map(MunicipalityId::new);
        if let Some(id) = municipality_id {
            let record = self.catalog.find(id).await?;
            if record.is_none() {
                return Err(TaskLifecycleError::UnknownMunicipality(id));
            }
        }

        let task_id = match request.task_id {
            Some(value) => TaskId::new(value)?,
            None => TaskId::generate(&region_id),
        };

        let task = ResearchTask::queued(
            NewResearchTask {
                task_id,
                title: request.title,
                region_name,
                region_id,
                effort,
                config: request.config.unwrap_or_else(|| Value::Object(serde_json::Map::new())),
                municipality_id,
            },
            &*self.clock,
        );
        self.store
            .create(&task)
            .await
            .map_err(TaskLifecycleError::from_store)?;

        let ack = self.worker.start(&task).await;
        if ack.is_ok() {
            let clock = Arc::clone(&self.clock);
            let running = self
                .store
                .update_with(
                    task.task_id(),
                    Box::new(move |record| {
                        record.mark_running(&*clock);
                        Ok(())
                    }),
                )
                .await
                .map_err(TaskLifecycleError::from_store)?;
            Ok(running)
        } else {
            let detail = ack.detail().to_owned();
            tracing::error!(task_id = %task.task_id(), %detail, "worker start delegation failed");
            let clock = Arc::clone(&self.clock);
            let failure_detail = detail.clone();
            self.store
                .update_with(
                    task.task_id(),
                    Box::new(move |record| {
                        record.mark_failed(failure_detail, &*clock);
                        Ok(())
                    }),
                )
                .await
                .map_err(TaskLifecycleError::from_store)?;
            Err(TaskLifecycleError::Delegation {
                task_id: task.task_id().clone(),
                detail,
            })
        }
    }

    /// Applies a worker-driven status callback.
    ///
    /// Report content, when supplied, is appended as a markdown report
    /// titled from the region name. A callback carrying no fields and no
    /// report leaves the task untouched, including its `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] for an unknown task,
    /// [`TaskLifecycleError::Domain`] for invalid progress or, in strict
    /// mode, a disallowed transition.
    pub async fn apply_status_update(
        &self,
        task_id: &TaskId,
        request: StatusUpdateRequest,
    ) -> TaskLifecycleResult<ResearchTask> {
        let mut update = StatusUpdate::new();
        if let Some(status) = request.status {
            update = update.with_status(status);
        }
        if let Some(progress) = request.progress {
            update = update.with_progress(Progress::new(progress)?);
        }
        if let Some(step) = request.current_step {
            update = update.with_current_step(step);
        }
        if let Some(message) = request.error_message {
            update = update.with_error_message(message);
        }

        if update.is_empty() && request.report.is_none() {
            return self.get_task(task_id).await;
        }

        let validation = self.validation;
        let clock = Arc::clone(&self.clock);
        let updated = self
            .store
            .update_with(
                task_id,
                Box::new(move |record| {
                    if validation == UpdateValidation::Strict
                        && let Some(next) = update.status()
                        && next != record.status()
                        && !record.status().can_transition_to(next)
                    {
                        return Err(ResearchDomainError::InvalidStatusTransition {
                            from: record.status(),
                            to: next,
                        });
                    }
                    record.apply_update(update, &*clock);
                    Ok(())
                }),
            )
            .await
            .map_err(TaskLifecycleError::from_store)?;

        if let Some(content) = request.report {
            let report = Report::new(
                ReportType::markdown(),
                format!("Region research report: {}", updated.region_name()),
                ReportBody::Inline { content },
                &*self.clock,
            )?;
            self.store
                .append_report(task_id, report)
                .await
                .map_err(TaskLifecycleError::from_store)?;
        }

        Ok(updated)
    }

    /// Requests the worker to halt a task and marks it stopped on
    /// acknowledgement.
    ///
    /// On a delegation failure the task is left untouched so the stop can
    /// be retried without side effects.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotStoppable`] unless the task is
    /// queued or running, or [`TaskLifecycleError::Delegation`] when the
    /// worker does not acknowledge.
    pub async fn stop_task(&self, task_id: &TaskId) -> TaskLifecycleResult<ResearchTask> {
        let current = self.get_task(task_id).await?;
        if !current.status().is_stoppable() {
            return Err(TaskLifecycleError::NotStoppable {
                task_id: task_id.clone(),
                status: current.status(),
            });
        }

        let ack = self.worker.stop(task_id).await;
        if !ack.is_ok() {
            tracing::error!(%task_id, detail = ack.detail(), "worker stop delegation failed");
            return Err(TaskLifecycleError::Delegation {
                task_id: task_id.clone(),
                detail: ack.detail().to_owned(),
            });
        }

        let clock = Arc::clone(&self.clock);
        self.store
            .update_with(
                task_id,
                Box::new(move |record| {
                    record.mark_stopped(&*clock);
                    Ok(())
                }),
            )
            .await
            .map_err(TaskLifecycleError::from_store)
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] for an unknown task.
    pub async fn get_task(&self, task_id: &TaskId) -> TaskLifecycleResult<ResearchTask> {
        self.store
            .get(task_id)
            .await
            .map_err(TaskLifecycleError::from_store)?
            .ok_or_else(|| TaskLifecycleError::TaskNotFound(task_id.clone()))
    }

    /// Returns one page of tasks matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Store`] when the listing fails.
    pub async fn list_tasks(
        &self,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> TaskLifecycleResult<TaskPage> {
        self.store
            .list(filter, page)
            .await
            .map_err(TaskLifecycleError::from_store)
    }

    /// Retrieves the newest report of the given type for a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] for an unknown task and
    /// [`TaskLifecycleError::ReportNotFound`] when the task has no report
    /// of the requested type.
    pub async fn get_report(
        &self,
        task_id: &TaskId,
        report_type: &ReportType,
    ) -> TaskLifecycleResult<Report> {
        // Distinguish an unknown task from a task without reports.
        let task = self.get_task(task_id).await?;
        self.store
            .latest_report(task.task_id(), report_type)
            .await
            .map_err(TaskLifecycleError::from_store)?
            .ok_or_else(|| TaskLifecycleError::ReportNotFound {
                task_id: task_id.clone(),
                report_type: report_type.clone(),
            })
    }
}
