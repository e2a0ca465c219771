//! Thread-safe in-memory task store.
//!
//! Backs service tests and doubles as a reference implementation of the
//! store contract: per-task atomicity comes from running every mutation
//! under the single state lock.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::research::domain::{Report, ReportType, ResearchTask, TaskId, TaskStatus};
use crate::research::ports::{
    PageRequest, TaskFilter, TaskMutator, TaskPage, TaskStore, TaskStoreError, TaskStoreResult,
};

/// Thread-safe in-memory task store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<String, StoredTask>,
    next_seq: u64,
}

/// Task record with its report history and an insertion sequence number.
///
/// The sequence number breaks creation-time ties so FIFO ordering stays
/// deterministic under a mocked clock.
#[derive(Debug)]
struct StoredTask {
    task: ResearchTask,
    seq: u64,
    reports: Vec<Report>,
}

impl InMemoryTaskStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> TaskStoreResult<std::sync::RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state
            .read()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write_state(&self) -> TaskStoreResult<std::sync::RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state
            .write()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))
    }
}

fn matches_filter(task: &ResearchTask, filter: &TaskFilter) -> bool {
    if let Some(status) = filter.status()
        && task.status() != status
    {
        return false;
    }
    if let Some(fragment) = filter.region_name() {
        let haystack = task.region_name().as_str().to_lowercase();
        if !haystack.contains(&fragment.to_lowercase()) {
            return false;
        }
    }
    if let Some(id) = filter.municipality_id()
        && task.municipality_id() != Some(id)
    {
        return false;
    }
    true
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: &ResearchTask) -> TaskStoreResult<()> {
        let mut state = self.write_state()?;
        let key = task.task_id().as_str().to_owned();
        if state.tasks.contains_key(&key) {
            return Err(TaskStoreError::Conflict(task.task_id().clone()));
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.tasks.insert(
            key,
            StoredTask {
                task: task.clone(),
                seq,
                reports: Vec::new(),
            },
        );
        Ok(())
    }

    async fn get(&self, task_id: &TaskId) -> TaskStoreResult<Option<ResearchTask>> {
        let state = self.read_state()?;
        Ok(state
            .tasks
            .get(task_id.as_str())
            .map(|stored| stored.task.clone()))
    }

    async fn update_with(
        &self,
        task_id: &TaskId,
        mutate: TaskMutator,
    ) -> TaskStoreResult<ResearchTask> {
        let mut state = self.write_state()?;
        let stored = state
            .tasks
            .get_mut(task_id.as_str())
            .ok_or_else(|| TaskStoreError::NotFound(task_id.clone()))?;
        mutate(&mut stored.task)?;
        Ok(stored.task.clone())
    }

    async fn append_report(&self, task_id: &TaskId, report: Report) -> TaskStoreResult<()> {
        let mut state = self.write_state()?;
        let stored = state
            .tasks
            .get_mut(task_id.as_str())
            .ok_or_else(|| TaskStoreError::NotFound(task_id.clone()))?;
        stored.reports.push(report);
        Ok(())
    }

    async fn latest_report(
        &self,
        task_id: &TaskId,
        report_type: &ReportType,
    ) -> TaskStoreResult<Option<Report>> {
        let state = self.read_state()?;
        Ok(state.tasks.get(task_id.as_str()).and_then(|stored| {
            // Appended in creation order, so the last match is the newest.
            stored
                .reports
                .iter()
                .rev()
                .find(|report| report.report_type() == report_type)
                .cloned()
        }))
    }

    async fn list(&self, filter: &TaskFilter, page: PageRequest) -> TaskStoreResult<TaskPage> {
        let state = self.read_state()?;
        let mut matching: Vec<&StoredTask> = state
            .tasks
            .values()
            .filter(|stored| matches_filter(&stored.task, filter))
            .collect();
        matching.sort_by(|a, b| {
            (b.task.created_at(), b.seq).cmp(&(a.task.created_at(), a.seq))
        });

        let total = u64::try_from(matching.len()).map_err(TaskStoreError::persistence)?;
        let offset = usize::try_from(page.offset()).map_err(TaskStoreError::persistence)?;
        let per_page = usize::try_from(page.per_page()).map_err(TaskStoreError::persistence)?;
        let items = matching
            .into_iter()
            .skip(offset)
            .take(per_page)
            .map(|stored| stored.task.clone())
            .collect();
        Ok(TaskPage::new(items, total, page))
    }

    async fn list_pending(&self) -> TaskStoreResult<Vec<ResearchTask>> {
        let state = self.read_state()?;
        let mut pending: Vec<&StoredTask> = state
            .tasks
            .values()
            .filter(|stored| stored.task.status() == TaskStatus::Queued)
            .collect();
        pending.sort_by(|a, b| {
            (a.task.created_at(), a.seq).cmp(&(b.task.created_at(), b.seq))
        });
        Ok(pending
            .into_iter()
            .map(|stored| stored.task.clone())
            .collect())
    }
}
