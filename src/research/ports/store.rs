//! Store port for durable task and report persistence.

use crate::research::domain::{
    MunicipalityId, Report, ReportType, ResearchDomainError, ResearchTask, TaskId, TaskStatus,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Mutation applied to one task as a single atomic read-modify-write.
pub type TaskMutator = Box<dyn FnOnce(&mut ResearchTask) -> Result<(), ResearchDomainError> + Send>;

/// Durable record of tasks and their attached reports; the source of truth
/// for lifecycle state.
///
/// Implementations must make every operation atomic with respect to
/// concurrent callers acting on the same task: [`TaskStore::update_with`]
/// runs the mutator under the store's own synchronisation so two concurrent
/// updates to one task cannot interleave into a partial write.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Conflict`] when the task identifier
    /// already exists.
    async fn create(&self, task: &ResearchTask) -> TaskStoreResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn get(&self, task_id: &TaskId) -> TaskStoreResult<Option<ResearchTask>>;

    /// Applies a mutation to one task atomically and returns the updated
    /// task. Domain mutators refresh `updated_at` through the clock.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist,
    /// or [`TaskStoreError::Domain`] when the mutator rejects the change.
    async fn update_with(
        &self,
        task_id: &TaskId,
        mutate: TaskMutator,
    ) -> TaskStoreResult<ResearchTask>;

    /// Appends a report to a task's history.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist.
    async fn append_report(&self, task_id: &TaskId, report: Report) -> TaskStoreResult<()>;

    /// Returns the newest report of the given type, or `None` when the task
    /// has none (or does not exist).
    async fn latest_report(
        &self,
        task_id: &TaskId,
        report_type: &ReportType,
    ) -> TaskStoreResult<Option<Report>>;

    /// Returns one page of tasks matching the filter, ordered
    /// newest-created-first.
    async fn list(&self, filter: &TaskFilter, page: PageRequest) -> TaskStoreResult<TaskPage>;

    /// Returns every task still in [`TaskStatus::Queued`], ordered by
    /// creation time ascending (FIFO fairness for worker pickup).
    async fn list_pending(&self) -> TaskStoreResult<Vec<ResearchTask>>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    Conflict(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A mutation was rejected by domain validation.
    #[error(transparent)]
    Domain(#[from] ResearchDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Listing filter over the task collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    status: Option<TaskStatus>,
    region_name: Option<String>,
    municipality_id: Option<MunicipalityId>,
}

impl TaskFilter {
    /// Creates an empty filter matching every task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the listing to one lifecycle status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts the listing to region names containing the given fragment,
    /// case-insensitively.
    #[must_use]
    pub fn with_region_name(mut self, fragment: impl Into<String>) -> Self {
        self.region_name = Some(fragment.into());
        self
    }

    /// Restricts the listing to tasks referencing one municipality.
    #[must_use]
    pub const fn with_municipality_id(mut self, id: MunicipalityId) -> Self {
        self.municipality_id = Some(id);
        self
    }

    /// Returns the status restriction, if any.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    /// Returns the region-name fragment restriction, if any.
    #[must_use]
    pub fn region_name(&self) -> Option<&str> {
        self.region_name.as_deref()
    }

    /// Returns the municipality restriction, if any.
    #[must_use]
    pub const fn municipality_id(&self) -> Option<MunicipalityId> {
        self.municipality_id
    }
}

/// Validated pagination request.
///
/// The page size is clamped server-side to [`PageRequest::MAX_PER_PAGE`]
/// regardless of what the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Hard upper bound on items per page.
    pub const MAX_PER_PAGE: u32 = 100;

    /// Page size used when the caller does not ask for one.
    pub const DEFAULT_PER_PAGE: u32 = 20;

    /// Creates a pagination request, clamping `page` to at least 1 and
    /// `per_page` into `1..=100`.
    #[must_use]
    pub const fn new(page: u32, per_page: u32) -> Self {
        let page = if page == 0 { 1 } else { page };
        let per_page = if per_page == 0 {
            1
        } else if per_page > Self::MAX_PER_PAGE {
            Self::MAX_PER_PAGE
        } else {
            per_page
        };
        Self { page, per_page }
    }

    /// Returns the 1-based page number.
    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    /// Returns the clamped page size.
    #[must_use]
    pub const fn per_page(self) -> u32 {
        self.per_page
    }

    /// Returns the number of items preceding this page.
    #[must_use]
    pub const fn offset(self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PER_PAGE)
    }
}

/// One page of a task listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPage {
    /// Tasks on this page, newest-created-first.
    pub items: Vec<ResearchTask>,
    /// Total number of tasks matching the filter.
    pub total: u64,
    /// Total number of pages at the clamped page size.
    pub pages: u64,
    /// 1-based page number served.
    pub page: u32,
    /// Clamped page size served.
    pub per_page: u32,
}

impl TaskPage {
    /// Assembles a page from its items, the filter-wide total, and the
    /// request that produced it.
    #[must_use]
    pub fn new(items: Vec<ResearchTask>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            pages: total.div_ceil(u64::from(request.per_page())),
            page: request.page(),
            per_page: request.per_page(),
        }
    }
}
