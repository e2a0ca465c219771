//! Domain-focused tests for the research task aggregate and its scalars.

use crate::research::domain::{
    EffortProfile, NewResearchTask, Progress, RegionId, RegionName, RegistrationSnapshot, Report,
    ReportBody, ReportType, ResearchDomainError, ResearchTask, StatusUpdate, TaskId, TaskStatus,
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

fn new_task_params(task_id: &str) -> NewResearchTask {
    NewResearchTask {
        task_id: TaskId::new(task_id).expect("valid task id"),
        title: None,
        region_name: RegionName::new("Bolesławiec").expect("valid region name"),
        region_id: RegionId::new("0201011").expect("valid region id"),
        effort: EffortProfile::default(),
        config: json!({}),
        municipality_id: None,
    }
}

#[rstest]
fn task_id_rejects_empty_input() {
    assert_eq!(TaskId::new("   "), Err(ResearchDomainError::EmptyTaskId));
}

#[rstest]
fn task_id_trims_surrounding_whitespace() {
    let id = TaskId::new("  region_x_1  ").expect("valid task id");
    assert_eq!(id.as_str(), "region_x_1");
}

#[rstest]
fn generated_task_id_follows_region_pattern() {
    let region_id = RegionId::new("0201011").expect("valid region id");
    let id = TaskId::generate(&region_id);

    let suffix = id
        .as_str()
        .strip_prefix("region_0201011_")
        .expect("generated id carries the region prefix");
    assert_eq!(suffix.len(), 8);
    assert!(
        suffix
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    );
}

#[rstest]
fn region_fields_reject_empty_input() {
    assert_eq!(
        RegionName::new(""),
        Err(ResearchDomainError::EmptyRegionName)
    );
    assert_eq!(RegionId::new(" "), Err(ResearchDomainError::EmptyRegionId));
}

#[rstest]
fn progress_rejects_values_over_one_hundred() {
    assert_eq!(
        Progress::new(101),
        Err(ResearchDomainError::InvalidProgress(101))
    );
    assert_eq!(Progress::new(100).map(Progress::value), Ok(100));
}

#[rstest]
#[case(0, 2, "breadth")]
#[case(4, 0, "depth")]
fn effort_rejects_non_positive_parameters(
    #[case] breadth: u32,
    #[case] depth: u32,
    #[case] field: &'static str,
) {
    let result = EffortProfile::new(breadth, depth);
    assert!(matches!(
        result,
        Err(ResearchDomainError::InvalidEffort { field: f, .. }) if f == field
    ));
}

#[rstest]
fn effort_defaults_match_the_worker_contract() {
    let effort = EffortProfile::default();
    assert_eq!(effort.breadth(), 4);
    assert_eq!(effort.depth(), 2);
}

#[rstest]
fn queued_task_starts_with_defaults(clock: DefaultClock) {
    let task = ResearchTask::queued(new_task_params("region_0201011_aaaa1111"), &clock);

    assert_eq!(task.status(), TaskStatus::Queued);
    assert_eq!(task.progress(), Progress::ZERO);
    assert_eq!(task.title(), "Region research: Bolesławiec");
    assert_eq!(task.start_time(), None);
    assert_eq!(task.end_time(), None);
    assert_eq!(task.created_at(), task.updated_at());
}

#[rstest]
fn registered_task_defaults_start_time_to_now(clock: DefaultClock) {
    let task = ResearchTask::registered(
        new_task_params("region_0201011_bbbb2222"),
        RegistrationSnapshot {
            status: TaskStatus::Running,
            progress: Progress::new(30).expect("valid progress"),
            current_step: Some("Collecting sources".to_owned()),
            start_time: None,
        },
        &clock,
    );

    assert_eq!(task.status(), TaskStatus::Running);
    assert_eq!(task.progress().value(), 30);
    assert_eq!(task.current_step(), Some("Collecting sources"));
    assert!(task.start_time().is_some());
    assert_eq!(task.end_time(), None);
}

#[rstest]
fn registered_task_with_terminal_status_is_finished(clock: DefaultClock) {
    let task = ResearchTask::registered(
        new_task_params("region_0201011_cccc3333"),
        RegistrationSnapshot {
            status: TaskStatus::Failed,
            progress: Progress::ZERO,
            current_step: None,
            start_time: None,
        },
        &clock,
    );

    assert!(task.end_time().is_some());
}

#[rstest]
fn mark_running_sets_start_time(clock: DefaultClock) {
    let mut task = ResearchTask::queued(new_task_params("region_0201011_dddd4444"), &clock);
    task.mark_running(&clock);

    assert_eq!(task.status(), TaskStatus::Running);
    assert!(task.start_time().is_some());
    assert_eq!(task.end_time(), None);
}

#[rstest]
fn mark_failed_records_detail_and_finishes(clock: DefaultClock) {
    let mut task = ResearchTask::queued(new_task_params("region_0201011_eeee5555"), &clock);
    task.mark_failed("worker unreachable", &clock);

    assert_eq!(task.status(), TaskStatus::Failed);
    assert_eq!(task.error_message(), Some("worker unreachable"));
    assert!(task.end_time().is_some());
}

#[rstest]
fn terminal_update_sets_end_time_exactly_once(clock: DefaultClock) {
    let mut task = ResearchTask::queued(new_task_params("region_0201011_ffff6666"), &clock);
    task.apply_update(
        StatusUpdate::new().with_status(TaskStatus::Completed),
        &clock,
    );
    let first_end = task.end_time().expect("terminal update sets end time");

    task.apply_update(
        StatusUpdate::new().with_status(TaskStatus::Completed),
        &clock,
    );

    assert_eq!(task.end_time(), Some(first_end));
}

#[rstest]
fn update_accepts_any_transition_the_worker_reports(clock: DefaultClock) {
    // Worker-trust contract: queued straight to completed is accepted.
    let mut task = ResearchTask::queued(new_task_params("region_0201011_aaaa7777"), &clock);
    task.apply_update(
        StatusUpdate::new()
            .with_status(TaskStatus::Completed)
            .with_progress(Progress::new(100).expect("valid progress")),
        &clock,
    );

    assert_eq!(task.status(), TaskStatus::Completed);
    assert_eq!(task.progress().value(), 100);
    assert!(task.end_time().is_some());
}

#[rstest]
fn reverting_to_a_non_terminal_status_clears_end_time(clock: DefaultClock) {
    let mut task = ResearchTask::queued(new_task_params("region_0201011_dddd7777"), &clock);
    task.apply_update(
        StatusUpdate::new().with_status(TaskStatus::Completed),
        &clock,
    );
    assert!(task.end_time().is_some());

    task.apply_update(StatusUpdate::new().with_status(TaskStatus::Running), &clock);

    assert_eq!(task.status(), TaskStatus::Running);
    assert_eq!(task.end_time(), None);
}

#[rstest]
fn partial_update_leaves_unmentioned_fields_alone(clock: DefaultClock) {
    let mut task = ResearchTask::queued(new_task_params("region_0201011_bbbb8888"), &clock);
    task.mark_running(&clock);
    task.apply_update(
        StatusUpdate::new().with_current_step("Analysing documents"),
        &clock,
    );

    assert_eq!(task.status(), TaskStatus::Running);
    assert_eq!(task.current_step(), Some("Analysing documents"));
    assert_eq!(task.error_message(), None);
}

#[rstest]
fn duration_is_absent_before_delegation(clock: DefaultClock) {
    let task = ResearchTask::queued(new_task_params("region_0201011_cccc9999"), &clock);
    assert_eq!(task.duration(&clock), None);
}

#[rstest]
fn report_type_normalises_to_lowercase() {
    let report_type = ReportType::new(" Markdown ").expect("valid report type");
    assert_eq!(report_type, ReportType::markdown());
}

#[rstest]
fn report_rejects_empty_title(clock: DefaultClock) {
    let result = Report::new(
        ReportType::markdown(),
        "  ",
        ReportBody::Inline {
            content: "# Report".to_owned(),
        },
        &clock,
    );
    assert_eq!(result, Err(ResearchDomainError::EmptyReportTitle));
}

#[rstest]
fn report_body_distinguishes_inline_and_file_storage(clock: DefaultClock) {
    let inline = Report::new(
        ReportType::markdown(),
        "Region research report: Bolesławiec",
        ReportBody::Inline {
            content: "# Report".to_owned(),
        },
        &clock,
    )
    .expect("valid report");
    let file = Report::new(
        ReportType::new("pdf").expect("valid report type"),
        "Region research report: Bolesławiec",
        ReportBody::File {
            path: "/var/reports/bolec.pdf".to_owned(),
        },
        &clock,
    )
    .expect("valid report");

    assert!(matches!(inline.body(), ReportBody::Inline { .. }));
    assert!(matches!(file.body(), ReportBody::File { .. }));
}
