//! Research task aggregate root and its lifecycle mutations.

use super::{EffortProfile, MunicipalityId, Progress, RegionId, RegionName, TaskId, TaskStatus};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameter object for creating a research task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResearchTask {
    /// Task identifier, client-supplied or generated.
    pub task_id: TaskId,
    /// Display title; defaulted from the region name when absent.
    pub title: Option<String>,
    /// Name of the target region.
    pub region_name: RegionName,
    /// Code of the target region.
    pub region_id: RegionId,
    /// Worker effort parameters.
    pub effort: EffortProfile,
    /// Opaque configuration passed through to the worker unmodified.
    pub config: Value,
    /// Optional weak reference into the municipality catalog.
    pub municipality_id: Option<MunicipalityId>,
}

/// Caller-supplied lifecycle snapshot used by worker self-registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationSnapshot {
    /// Status the worker reports the task to be in.
    pub status: TaskStatus,
    /// Reported completion percentage.
    pub progress: Progress,
    /// Reported in-progress phase label.
    pub current_step: Option<String>,
    /// Reported start time; defaults to now when absent.
    pub start_time: Option<DateTime<Utc>>,
}

/// Partial field set applied by a worker status callback.
///
/// The default update contract accepts whatever the worker reports: the
/// worker is the sole authority on forward progress and no transition
/// legality check is applied here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusUpdate {
    status: Option<TaskStatus>,
    progress: Option<Progress>,
    current_step: Option<String>,
    error_message: Option<String>,
}

impl StatusUpdate {
    /// Creates an empty update.
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

    /// Sets the reported progress.
    #[must_use]
    pub const fn with_progress(mut self, progress: Progress) -> Self {
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

    /// Returns the reported status, if any.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    /// Returns `true` when the update carries no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.progress.is_none()
            && self.current_step.is_none()
            && self.error_message.is_none()
    }
}

/// Research task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchTask {
    task_id: TaskId,
    title: String,
    status: TaskStatus,
    progress: Progress,
    current_step: Option<String>,
    error_message: Option<String>,
    region_name: RegionName,
    region_id: RegionId,
    effort: EffortProfile,
    config: Value,
    municipality_id: Option<MunicipalityId>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted research task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedResearchTaskData {
    /// Persisted task identifier.
    pub task_id: TaskId,
    /// Persisted display title.
    pub title: String,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted completion percentage.
    pub progress: Progress,
    /// Persisted in-progress phase label, if any.
    pub current_step: Option<String>,
    /// Persisted error message, if any.
    pub error_message: Option<String>,
    /// Persisted region name.
    pub region_name: RegionName,
    /// Persisted region code.
    pub region_id: RegionId,
    /// Persisted effort parameters.
    pub effort: EffortProfile,
    /// Persisted opaque worker configuration.
    pub config: Value,
    /// Persisted municipality reference, if any.
    pub municipality_id: Option<MunicipalityId>,
    /// Persisted delegation start timestamp, if any.
    pub start_time: Option<DateTime<Utc>>,
    /// Persisted terminal-state timestamp, if any.
    pub end_time: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ResearchTask {
    /// Creates a task awaiting delegation, in [`TaskStatus::Queued`].
    #[must_use]
    pub fn queued(params: NewResearchTask, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        let title = params
            .title
            .unwrap_or_else(|| default_title(&params.region_name));
        Self {
            task_id: params.task_id,
            title,
            status: TaskStatus::Queued,
            progress: Progress::ZERO,
            current_step: None,
            error_message: None,
            region_name: params.region_name,
            region_id: params.region_id,
            effort: params.effort,
            config: params.config,
            municipality_id: params.municipality_id,
            start_time: None,
            end_time: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Creates a task declared after the fact by a worker that already
    /// picked it up outside the normal create flow.
    ///
    /// `start_time` defaults to now; a terminal snapshot status sets
    /// `end_time` so the terminal-state invariant holds from the start.
    #[must_use]
    pub fn registered(
        params: NewResearchTask,
        snapshot: RegistrationSnapshot,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        let title = params
            .title
            .unwrap_or_else(|| default_title(&params.region_name));
        let end_time = snapshot.status.is_terminal().then_some(timestamp);
        Self {
            task_id: params.task_id,
            title,
            status: snapshot.status,
            progress: snapshot.progress,
            current_step: snapshot.current_step,
            error_message: None,
            region_name: params.region_name,
            region_id: params.region_id,
            effort: params.effort,
            config: params.config,
            municipality_id: params.municipality_id,
            start_time: Some(snapshot.start_time.unwrap_or(timestamp)),
            end_time,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedResearchTaskData) -> Self {
        Self {
            task_id: data.task_id,
            title: data.title,
            status: data.status,
            progress: data.progress,
            current_step: data.current_step,
            error_message: data.error_message,
            region_name: data.region_name,
            region_id: data.region_id,
            effort: data.effort,
            config: data.config,
            municipality_id: data.municipality_id,
            start_time: data.start_time,
            end_time: data.end_time,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the completion percentage.
    #[must_use]
    pub const fn progress(&self) -> Progress {
        self.progress
    }

    /// Returns the in-progress phase label, if any.
    #[must_use]
    pub fn current_step(&self) -> Option<&str> {
        self.current_step.as_deref()
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns the target region name.
    #[must_use]
    pub const fn region_name(&self) -> &RegionName {
        &self.region_name
    }

    /// Returns the target region code.
    #[must_use]
    pub const fn region_id(&self) -> &RegionId {
        &self.region_id
    }

    /// Returns the worker effort parameters.
    #[must_use]
    pub const fn effort(&self) -> EffortProfile {
        self.effort
    }

    /// Returns the opaque worker configuration.
    #[must_use]
    pub const fn config(&self) -> &Value {
        &self.config
    }

    /// Returns the municipality reference, if any.
    #[must_use]
    pub const fn municipality_id(&self) -> Option<MunicipalityId> {
        self.municipality_id
    }

    /// Returns the delegation start timestamp, if any.
    #[must_use]
    pub const fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Returns the terminal-state timestamp, if any.
    #[must_use]
    pub const fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns how long the task has run: start to end for finished tasks,
    /// start to now for tasks still running.
    #[must_use]
    pub fn duration(&self, clock: &impl Clock) -> Option<Duration> {
        self.start_time
            .map(|start| self.end_time.unwrap_or_else(|| clock.utc()) - start)
    }

    /// Marks the task as delegated: [`TaskStatus::Running`] with the start
    /// time taken from the clock.
    pub fn mark_running(&mut self, clock: &impl Clock) {
        self.status = TaskStatus::Running;
        self.start_time = Some(clock.utc());
        self.touch(clock);
    }

    /// Marks the task as failed with the given diagnostic detail.
    pub fn mark_failed(&mut self, detail: impl Into<String>, clock: &impl Clock) {
        self.status = TaskStatus::Failed;
        self.error_message = Some(detail.into());
        self.finish_if_unfinished(clock);
        self.touch(clock);
    }

    /// Marks the task as stopped on request.
    pub fn mark_stopped(&mut self, clock: &impl Clock) {
        self.status = TaskStatus::Stopped;
        self.finish_if_unfinished(clock);
        self.touch(clock);
    }

    /// Applies a partial worker-reported update.
    ///
    /// A terminal status sets `end_time` exactly once; re-applying the same
    /// terminal status leaves an already-set `end_time` unchanged. A
    /// non-terminal status clears `end_time` so it is set exactly when the
    /// status is terminal, whatever sequence the worker reports.
    pub fn apply_update(&mut self, update: StatusUpdate, clock: &impl Clock) {
        if let Some(status) = update.status {
            self.status = status;
            if status.is_terminal() {
                self.finish_if_unfinished(clock);
            } else {
                self.end_time = None;
            }
        }
        if let Some(progress) = update.progress {
            self.progress = progress;
        }
        if let Some(step) = update.current_step {
            self.current_step = Some(step);
        }
        if let Some(message) = update.error_message {
            self.error_message = Some(message);
        }
        self.touch(clock);
    }

    /// Sets `end_time` from the clock unless it is already set.
    fn finish_if_unfinished(&mut self, clock: &impl Clock) {
        if self.end_time.is_none() {
            self.end_time = Some(clock.utc());
        }
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

/// Builds the default display title from the region name.
fn default_title(region_name: &RegionName) -> String {
    format!("Region research: {region_name}")
}
