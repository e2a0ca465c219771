//! Service-level tests for task lifecycle orchestration, wired against the
//! in-memory adapters.

use crate::research::adapters::{
    InMemoryMunicipalityCatalog, InMemoryTaskStore, ScriptedWorkerClient, WorkerCall,
};
use crate::research::domain::{
    MunicipalityId, ReportBody, ReportType, ResearchDomainError, StatusUpdate, TaskId, TaskStatus,
};
use crate::research::ports::{
    Acknowledgement, CatalogError, CatalogResult, MunicipalityCatalog, MunicipalityRecord,
    TaskStore, TaskStoreError,
};
use async_trait::async_trait;
use crate::research::services::{
    CreateTaskRequest, StatusUpdateRequest, TaskLifecycleError, TaskLifecycleService,
    UpdateValidation,
};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;

type TestService =
    TaskLifecycleService<InMemoryTaskStore, ScriptedWorkerClient, InMemoryMunicipalityCatalog, DefaultClock>;

struct Harness {
    service: TestService,
    store: Arc<InMemoryTaskStore>,
    worker: Arc<ScriptedWorkerClient>,
}

fn harness_with(worker: ScriptedWorkerClient, catalog: InMemoryMunicipalityCatalog) -> Harness {
    let store = Arc::new(InMemoryTaskStore::new());
    let worker = Arc::new(worker);
    let service = TaskLifecycleService::new(
        Arc::clone(&store),
        Arc::clone(&worker),
        Arc::new(catalog),
        Arc::new(DefaultClock),
    );
    Harness {
        service,
        store,
        worker,
    }
}

fn harness() -> Harness {
    harness_with(
        ScriptedWorkerClient::acknowledging(),
        InMemoryMunicipalityCatalog::new(),
    )
}

fn boleslawiec_request() -> CreateTaskRequest {
    CreateTaskRequest::new("Bolesławiec", "0201011")
}

#[rstest]
#[tokio::test]
async fn create_task_delegates_and_marks_running() {
    let harness = harness();

    let task = harness
        .service
        .create_task(boleslawiec_request())
        .await
        .expect("create succeeds");

    assert_eq!(task.status(), TaskStatus::Running);
    assert!(task.start_time().is_some());
    assert!(task.task_id().as_str().starts_with("region_0201011_"));
    assert_eq!(
        harness.worker.calls(),
        vec![WorkerCall::Start(task.task_id().clone())]
    );
}

#[rstest]
#[tokio::test]
async fn create_task_survives_delegation_failure_as_failed_record() {
    let harness = harness_with(
        ScriptedWorkerClient::acknowledging()
            .with_start_response(Acknowledgement::failure("worker unreachable")),
        InMemoryMunicipalityCatalog::new(),
    );

    let error = harness
        .service
        .create_task(boleslawiec_request())
        .await
        .expect_err("delegation failure surfaces");

    let TaskLifecycleError::Delegation { task_id, detail } = error else {
        panic!("expected delegation error");
    };
    assert_eq!(detail, "worker unreachable");

    // The record survives so the failure stays inspectable.
    let stored = harness
        .service
        .get_task(&task_id)
        .await
        .expect("record exists after failure");
    assert_eq!(stored.status(), TaskStatus::Failed);
    assert_eq!(stored.error_message(), Some("worker unreachable"));
    assert!(stored.end_time().is_some());
}

#[rstest]
#[tokio::test]
async fn create_task_honours_client_supplied_fields() {
    let harness = harness();

    let task = harness
        .service
        .create_task(
            boleslawiec_request()
                .with_task_id("custom-research-1")
                .with_title("Pilot study")
                .with_breadth(8)
                .with_depth(3),
        )
        .await
        .expect("create succeeds");

    assert_eq!(task.task_id().as_str(), "custom-research-1");
    assert_eq!(task.title(), "Pilot study");
    assert_eq!(task.effort().breadth(), 8);
    assert_eq!(task.effort().depth(), 3);
}

#[rstest]
#[tokio::test]
async fn create_task_rejects_duplicate_client_supplied_id() {
    let harness = harness();
    let request = boleslawiec_request().with_task_id("custom-research-2");
    harness
        .service
        .create_task(request.clone())
        .await
        .expect("first create succeeds");

    let error = harness
        .service
        .create_task(request)
        .await
        .expect_err("duplicate id is rejected");

    assert!(matches!(
        error,
        TaskLifecycleError::Store(TaskStoreError::Conflict(_))
    ));
}

#[rstest]
#[tokio::test]
async fn create_task_rejects_empty_region_name() {
    let harness = harness();

    let error = harness
        .service
        .create_task(CreateTaskRequest::new("  ", "0201011"))
        .await
        .expect_err("empty region name is rejected");

    assert!(matches!(
        error,
        TaskLifecycleError::Domain(ResearchDomainError::EmptyRegionName)
    ));
    assert!(harness.worker.calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn create_task_rejects_unknown_municipality_before_persisting() {
    let harness = harness();

    let error = harness
        .service
        .create_task(boleslawiec_request().with_municipality_id(99))
        .await
        .expect_err("unresolved reference is rejected");

    assert!(matches!(
        error,
        TaskLifecycleError::UnknownMunicipality(id) if id == MunicipalityId::new(99)
    ));
    assert!(harness.worker.calls().is_empty());
    let pending = harness.store.list_pending().await.expect("listing succeeds");
    assert!(pending.is_empty());
}

#[rstest]
#[tokio::test]
async fn create_task_accepts_resolvable_municipality() {
    let harness = harness_with(
        ScriptedWorkerClient::acknowledging(),
        InMemoryMunicipalityCatalog::new()
            .with_record(MunicipalityRecord::new(MunicipalityId::new(42), "Bolesławiec")),
    );

    let task = harness
        .service
        .create_task(boleslawiec_request().with_municipality_id(42))
        .await
        .expect("create succeeds");

    assert_eq!(task.municipality_id(), Some(MunicipalityId::new(42)));
}

/// Catalog double whose lookups always fail at the infrastructure level.
struct UnreachableCatalog;

#[async_trait]
impl MunicipalityCatalog for UnreachableCatalog {
    async fn find(&self, _id: MunicipalityId) -> CatalogResult<Option<MunicipalityRecord>> {
        Err(CatalogError::lookup(std::io::Error::other(
            "catalog offline",
        )))
    }
}

#[rstest]
#[tokio::test]
async fn catalog_lookup_failure_surfaces_without_persisting() {
    let store = Arc::new(InMemoryTaskStore::new());
    let service = TaskLifecycleService::new(
        Arc::clone(&store),
        Arc::new(ScriptedWorkerClient::acknowledging()),
        Arc::new(UnreachableCatalog),
        Arc::new(DefaultClock),
    );

    let error = service
        .create_task(boleslawiec_request().with_municipality_id(7))
        .await
        .expect_err("catalog failure surfaces");

    assert!(matches!(error, TaskLifecycleError::Catalog(_)));
    let pending = store.list_pending().await.expect("listing succeeds");
    assert!(pending.is_empty());
}

#[rstest]
#[tokio::test]
async fn catalog_records_resolve_by_identifier() {
    let catalog = InMemoryMunicipalityCatalog::new()
        .with_record(MunicipalityRecord::new(MunicipalityId::new(7), "Zgorzelec"));

    let record = catalog
        .find(MunicipalityId::new(7))
        .await
        .expect("lookup succeeds")
        .expect("record exists");

    assert_eq!(record.id(), MunicipalityId::new(7));
    assert_eq!(record.name(), "Zgorzelec");
}

#[rstest]
#[tokio::test]
async fn status_update_for_unknown_task_is_not_found() {
    let harness = harness();
    let id = TaskId::new("region_0201011_missing9").expect("valid task id");

    let error = harness
        .service
        .apply_status_update(&id, StatusUpdateRequest::new().with_progress(50))
        .await
        .expect_err("unknown task is rejected");

    assert!(matches!(error, TaskLifecycleError::TaskNotFound(missing) if missing == id));
}

#[rstest]
#[tokio::test]
async fn empty_status_update_leaves_the_task_untouched() {
    let harness = harness();
    let task = harness
        .service
        .create_task(boleslawiec_request())
        .await
        .expect("create succeeds");

    let unchanged = harness
        .service
        .apply_status_update(task.task_id(), StatusUpdateRequest::new())
        .await
        .expect("empty update succeeds");

    assert_eq!(unchanged, task);
    assert_eq!(unchanged.updated_at(), task.updated_at());
}

#[rstest]
#[tokio::test]
async fn completion_update_attaches_retrievable_report() {
    let harness = harness();
    let task = harness
        .service
        .create_task(boleslawiec_request())
        .await
        .expect("create succeeds");

    let updated = harness
        .service
        .apply_status_update(
            task.task_id(),
            StatusUpdateRequest::new()
                .with_status(TaskStatus::Completed)
                .with_progress(100)
                .with_report("# Report\n\nBolesławiec findings."),
        )
        .await
        .expect("update succeeds");
    assert_eq!(updated.status(), TaskStatus::Completed);
    assert!(updated.end_time().is_some());

    let report = harness
        .service
        .get_report(task.task_id(), &ReportType::markdown())
        .await
        .expect("report exists");
    assert_eq!(report.title(), "Region research report: Bolesławiec");
    assert!(matches!(
        report.body(),
        ReportBody::Inline { content } if content == "# Report\n\nBolesławiec findings."
    ));
}

#[rstest]
#[tokio::test]
async fn repeated_terminal_updates_keep_the_first_end_time() {
    let harness = harness();
    let task = harness
        .service
        .create_task(boleslawiec_request())
        .await
        .expect("create succeeds");

    let first = harness
        .service
        .apply_status_update(
            task.task_id(),
            StatusUpdateRequest::new().with_status(TaskStatus::Completed),
        )
        .await
        .expect("update succeeds");
    let second = harness
        .service
        .apply_status_update(
            task.task_id(),
            StatusUpdateRequest::new().with_status(TaskStatus::Completed),
        )
        .await
        .expect("update succeeds");

    assert_eq!(second.end_time(), first.end_time());
}

#[rstest]
#[tokio::test]
async fn trust_mode_accepts_transition_strict_mode_rejects() {
    // Same queued→completed jump under both validation policies.
    let trusting = harness();
    let task = trusting
        .service
        .create_task(boleslawiec_request().with_task_id("custom-research-3"))
        .await
        .expect("create succeeds");
    // Rewind to queued so the jump skips running.
    trusting
        .store
        .update_with(
            task.task_id(),
            Box::new(|record| {
                record.apply_update(
                    StatusUpdate::new().with_status(TaskStatus::Queued),
                    &DefaultClock,
                );
                Ok(())
            }),
        )
        .await
        .expect("rewind succeeds");

    let accepted = trusting
        .service
        .apply_status_update(
            task.task_id(),
            StatusUpdateRequest::new().with_status(TaskStatus::Completed),
        )
        .await
        .expect("trusting policy accepts the worker's word");
    assert_eq!(accepted.status(), TaskStatus::Completed);

    let strict = harness();
    let strict_service = strict.service.clone().with_validation(UpdateValidation::Strict);
    let task = strict
        .service
        .create_task(boleslawiec_request().with_task_id("custom-research-4"))
        .await
        .expect("create succeeds");
    strict
        .store
        .update_with(
            task.task_id(),
            Box::new(|record| {
                record.apply_update(
                    StatusUpdate::new().with_status(TaskStatus::Queued),
                    &DefaultClock,
                );
                Ok(())
            }),
        )
        .await
        .expect("rewind succeeds");

    let error = strict_service
        .apply_status_update(
            task.task_id(),
            StatusUpdateRequest::new().with_status(TaskStatus::Completed),
        )
        .await
        .expect_err("strict policy rejects the jump");
    assert!(matches!(
        error,
        TaskLifecycleError::Domain(ResearchDomainError::InvalidStatusTransition {
            from: TaskStatus::Queued,
            to: TaskStatus::Completed,
        })
    ));
}

#[rstest]
#[tokio::test]
async fn stop_task_halts_a_running_task() {
    let harness = harness();
    let task = harness
        .service
        .create_task(boleslawiec_request())
        .await
        .expect("create succeeds");

    let stopped = harness
        .service
        .stop_task(task.task_id())
        .await
        .expect("stop succeeds");

    assert_eq!(stopped.status(), TaskStatus::Stopped);
    assert!(stopped.end_time().is_some());
    assert_eq!(
        harness.worker.calls(),
        vec![
            WorkerCall::Start(task.task_id().clone()),
            WorkerCall::Stop(task.task_id().clone()),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn stop_task_rejects_finished_tasks() {
    let harness = harness();
    let task = harness
        .service
        .create_task(boleslawiec_request())
        .await
        .expect("create succeeds");
    harness
        .service
        .apply_status_update(
            task.task_id(),
            StatusUpdateRequest::new().with_status(TaskStatus::Completed),
        )
        .await
        .expect("update succeeds");

    let error = harness
        .service
        .stop_task(task.task_id())
        .await
        .expect_err("finished tasks cannot be stopped");

    assert!(matches!(
        error,
        TaskLifecycleError::NotStoppable {
            status: TaskStatus::Completed,
            ..
        }
    ));
    let current = harness
        .service
        .get_task(task.task_id())
        .await
        .expect("task exists");
    assert_eq!(current.status(), TaskStatus::Completed);
}

#[rstest]
#[tokio::test]
async fn stop_task_leaves_state_untouched_when_worker_declines() {
    let harness = harness_with(
        ScriptedWorkerClient::acknowledging()
            .with_stop_response(Acknowledgement::failure("worker busy")),
        InMemoryMunicipalityCatalog::new(),
    );
    let task = harness
        .service
        .create_task(boleslawiec_request())
        .await
        .expect("create succeeds");

    let error = harness
        .service
        .stop_task(task.task_id())
        .await
        .expect_err("declined stop surfaces");

    assert!(matches!(
        error,
        TaskLifecycleError::Delegation { detail, .. } if detail == "worker busy"
    ));
    // Still running, so the stop can simply be retried.
    let current = harness
        .service
        .get_task(task.task_id())
        .await
        .expect("task exists");
    assert_eq!(current.status(), TaskStatus::Running);
    assert_eq!(current.end_time(), None);
}

#[rstest]
#[tokio::test]
async fn get_report_distinguishes_unknown_task_from_missing_report() {
    let harness = harness();
    let unknown = TaskId::new("region_0201011_missing8").expect("valid task id");
    let markdown = ReportType::markdown();

    let error = harness
        .service
        .get_report(&unknown, &markdown)
        .await
        .expect_err("unknown task is not found");
    assert!(matches!(error, TaskLifecycleError::TaskNotFound(_)));

    let task = harness
        .service
        .create_task(boleslawiec_request())
        .await
        .expect("create succeeds");
    let error = harness
        .service
        .get_report(task.task_id(), &markdown)
        .await
        .expect_err("task without reports yields a report error");
    assert!(matches!(error, TaskLifecycleError::ReportNotFound { .. }));
}
