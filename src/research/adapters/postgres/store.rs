//! `PostgreSQL` store implementation for research task persistence.

use super::{
    models::{NewReportRow, NewTaskRow, ReportRow, TaskRow},
    schema::{research_reports, research_tasks},
};
use crate::research::domain::{
    EffortProfile, MunicipalityId, PersistedReportData, PersistedResearchTaskData, Progress,
    RegionId, RegionName, Report, ReportBody, ReportType, ResearchTask, TaskId, TaskStatus,
};
use crate::research::ports::{
    PageRequest, TaskFilter, TaskMutator, TaskPage, TaskStore, TaskStoreError, TaskStoreResult,
};
use async_trait::async_trait;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by the task store.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task store.
#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    pool: TaskPgPool,
}

impl From<DieselError> for TaskStoreError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

impl PostgresTaskStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskStoreError::persistence)?
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    async fn create(&self, task: &ResearchTask) -> TaskStoreResult<()> {
        let task_id = task.task_id().clone();
        let new_row = to_new_row(task)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(research_tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskStoreError::Conflict(task_id.clone())
                    }
                    other => TaskStoreError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn get(&self, task_id: &TaskId) -> TaskStoreResult<Option<ResearchTask>> {
        let id = task_id.clone();
        self.run_blocking(move |connection| {
            let row = research_tasks::table
                .find(id.as_str())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn update_with(
        &self,
        task_id: &TaskId,
        mutate: TaskMutator,
    ) -> TaskStoreResult<ResearchTask> {
        let id = task_id.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<ResearchTask, TaskStoreError, _>(|conn| {
                // Row lock makes the read-modify-write atomic against
                // concurrent updates to the same task.
                let row = research_tasks::table
                    .find(id.as_str())
                    .select(TaskRow::as_select())
                    .for_update()
                    .first::<TaskRow>(conn)
                    .optional()
                    .map_err(TaskStoreError::persistence)?
                    .ok_or_else(|| TaskStoreError::NotFound(id.clone()))?;

                let mut task = row_to_task(row)?;
                mutate(&mut task)?;

                diesel::update(research_tasks::table.find(id.as_str()))
                    .set((
                        research_tasks::status.eq(task.status().as_str()),
                        research_tasks::progress.eq(i32::from(task.progress().value())),
                        research_tasks::current_step.eq(task.current_step().map(ToOwned::to_owned)),
                        research_tasks::error_message
                            .eq(task.error_message().map(ToOwned::to_owned)),
                        research_tasks::start_time.eq(task.start_time()),
                        research_tasks::end_time.eq(task.end_time()),
                        research_tasks::updated_at.eq(task.updated_at()),
                    ))
                    .execute(conn)
                    .map_err(TaskStoreError::persistence)?;

                Ok(task)
            })
        })
        .await
    }

    async fn append_report(&self, task_id: &TaskId, report: Report) -> TaskStoreResult<()> {
        let id = task_id.clone();
        let new_row = report_to_new_row(task_id, &report);
        self.run_blocking(move |connection| {
            connection.transaction::<(), TaskStoreError, _>(|conn| {
                let owner: Option<String> = research_tasks::table
                    .find(id.as_str())
                    .select(research_tasks::task_id)
                    .first::<String>(conn)
                    .optional()
                    .map_err(TaskStoreError::persistence)?;
                if owner.is_none() {
                    return Err(TaskStoreError::NotFound(id.clone()));
                }

                diesel::insert_into(research_reports::table)
                    .values(&new_row)
                    .execute(conn)
                    .map_err(TaskStoreError::persistence)?;
                Ok(())
            })
        })
        .await
    }

    async fn latest_report(
        &self,
        task_id: &TaskId,
        report_type: &ReportType,
    ) -> TaskStoreResult<Option<Report>> {
        let id = task_id.clone();
        let requested_type = report_type.clone();
        self.run_blocking(move |connection| {
            let row = research_reports::table
                .filter(research_reports::task_id.eq(id.as_str()))
                .filter(research_reports::report_type.eq(requested_type.as_str()))
                .order(research_reports::created_at.desc())
                .select(ReportRow::as_select())
                .first::<ReportRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map(row_to_report).transpose()
        })
        .await
    }

    async fn list(&self, filter: &TaskFilter, page: PageRequest) -> TaskStoreResult<TaskPage> {
        let list_filter = filter.clone();
        self.run_blocking(move |connection| {
            let total_rows: i64 = filtered_tasks(&list_filter)
                .count()
                .get_result(connection)
                .map_err(TaskStoreError::persistence)?;

            let offset = i64::try_from(page.offset()).map_err(TaskStoreError::persistence)?;
            let rows = filtered_tasks(&list_filter)
                .order((
                    research_tasks::created_at.desc(),
                    research_tasks::task_id.desc(),
                ))
                .offset(offset)
                .limit(i64::from(page.per_page()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskStoreError::persistence)?;

            let items = rows
                .into_iter()
                .map(row_to_task)
                .collect::<TaskStoreResult<Vec<_>>>()?;
            let total = u64::try_from(total_rows).map_err(TaskStoreError::persistence)?;
            Ok(TaskPage::new(items, total, page))
        })
        .await
    }

    async fn list_pending(&self) -> TaskStoreResult<Vec<ResearchTask>> {
        self.run_blocking(move |connection| {
            let rows = research_tasks::table
                .filter(research_tasks::status.eq(TaskStatus::Queued.as_str()))
                .order((
                    research_tasks::created_at.asc(),
                    research_tasks::task_id.asc(),
                ))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskStoreError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }
}

/// Builds the filtered base query shared by the count and page selects.
fn filtered_tasks(filter: &TaskFilter) -> research_tasks::BoxedQuery<'static, Pg> {
    let mut query = research_tasks::table.into_boxed();
    if let Some(status) = filter.status() {
        query = query.filter(research_tasks::status.eq(status.as_str()));
    }
    if let Some(fragment) = filter.region_name() {
        query = query.filter(research_tasks::region_name.ilike(format!("%{fragment}%")));
    }
    if let Some(id) = filter.municipality_id() {
        query = query.filter(research_tasks::municipality_id.eq(id.value()));
    }
    query
}

fn to_new_row(task: &ResearchTask) -> TaskStoreResult<NewTaskRow> {
    Ok(NewTaskRow {
        task_id: task.task_id().as_str().to_owned(),
        title: task.title().to_owned(),
        status: task.status().as_str().to_owned(),
        progress: i32::from(task.progress().value()),
        current_step: task.current_step().map(ToOwned::to_owned),
        error_message: task.error_message().map(ToOwned::to_owned),
        region_name: task.region_name().as_str().to_owned(),
        region_id: task.region_id().as_str().to_owned(),
        breadth: i32::try_from(task.effort().breadth()).map_err(TaskStoreError::persistence)?,
        depth: i32::try_from(task.effort().depth()).map_err(TaskStoreError::persistence)?,
        config: task.config().clone(),
        municipality_id: task.municipality_id().map(MunicipalityId::value),
        start_time: task.start_time(),
        end_time: task.end_time(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

fn row_to_task(row: TaskRow) -> TaskStoreResult<ResearchTask> {
    let TaskRow {
        task_id,
        title,
        status: persisted_status,
        progress,
        current_step,
        error_message,
        region_name,
        region_id,
        breadth,
        depth,
        config,
        municipality_id,
        start_time,
        end_time,
        created_at,
        updated_at,
    } = row;

    let status =
        TaskStatus::try_from(persisted_status.as_str()).map_err(TaskStoreError::persistence)?;
    let progress =
        Progress::new(u8::try_from(progress).map_err(TaskStoreError::persistence)?)?;
    let effort = EffortProfile::new(
        u32::try_from(breadth).map_err(TaskStoreError::persistence)?,
        u32::try_from(depth).map_err(TaskStoreError::persistence)?,
    )?;

    let data = PersistedResearchTaskData {
        task_id: TaskId::new(task_id)?,
        title,
        status,
        progress,
        current_step,
        error_message,
        region_name: RegionName::new(region_name)?,
        region_id: RegionId::new(region_id)?,
        effort,
        config,
        municipality_id: municipality_id.map(MunicipalityId::new),
        start_time,
        end_time,
        created_at,
        updated_at,
    };
    Ok(ResearchTask::from_persisted(data))
}

fn report_to_new_row(task_id: &TaskId, report: &Report) -> NewReportRow {
    let (content, file_path) = match report.body() {
        ReportBody::Inline { content } => (Some(content.clone()), None),
        ReportBody::File { path } => (None, Some(path.clone())),
    };
    NewReportRow {
        id: uuid::Uuid::new_v4(),
        task_id: task_id.as_str().to_owned(),
        report_type: report.report_type().as_str().to_owned(),
        title: report.title().to_owned(),
        content,
        file_path,
        created_at: report.created_at(),
    }
}

fn row_to_report(row: ReportRow) -> TaskStoreResult<Report> {
    let ReportRow {
        report_type,
        title,
        content,
        file_path,
        created_at,
        ..
    } = row;

    let body = file_path.map_or_else(
        || ReportBody::Inline {
            content: content.unwrap_or_default(),
        },
        |path| ReportBody::File { path },
    );
    let data = PersistedReportData {
        report_type: ReportType::new(report_type)?,
        title,
        body,
        created_at,
    };
    Ok(Report::from_persisted(data))
}
