//! Diesel row models for research task persistence.

use super::schema::{research_reports, research_tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = research_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Public task identifier.
    pub task_id: String,
    /// Display title.
    pub title: String,
    /// Lifecycle status.
    pub status: String,
    /// Completion percentage.
    pub progress: i32,
    /// In-progress phase label.
    pub current_step: Option<String>,
    /// Failure diagnostic text.
    pub error_message: Option<String>,
    /// Target region name.
    pub region_name: String,
    /// Target region code.
    pub region_id: String,
    /// Research breadth parameter.
    pub breadth: i32,
    /// Research depth parameter.
    pub depth: i32,
    /// Opaque worker configuration payload.
    pub config: Value,
    /// Weak reference into the municipality catalog.
    pub municipality_id: Option<i64>,
    /// Delegation start timestamp.
    pub start_time: Option<DateTime<Utc>>,
    /// Terminal-state timestamp.
    pub end_time: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = research_tasks)]
pub struct NewTaskRow {
    /// Public task identifier.
    pub task_id: String,
    /// Display title.
    pub title: String,
    /// Lifecycle status.
    pub status: String,
    /// Completion percentage.
    pub progress: i32,
    /// In-progress phase label.
    pub current_step: Option<String>,
    /// Failure diagnostic text.
    pub error_message: Option<String>,
    /// Target region name.
    pub region_name: String,
    /// Target region code.
    pub region_id: String,
    /// Research breadth parameter.
    pub breadth: i32,
    /// Research depth parameter.
    pub depth: i32,
    /// Opaque worker configuration payload.
    pub config: Value,
    /// Weak reference into the municipality catalog.
    pub municipality_id: Option<i64>,
    /// Delegation start timestamp.
    pub start_time: Option<DateTime<Utc>>,
    /// Terminal-state timestamp.
    pub end_time: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for report records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = research_reports)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReportRow {
    /// Report row identifier.
    pub id: uuid::Uuid,
    /// Owning task identifier.
    pub task_id: String,
    /// Report format tag.
    pub report_type: String,
    /// Report title.
    pub title: String,
    /// Inline payload for textual formats.
    pub content: Option<String>,
    /// Path to externally stored bytes for file-based formats.
    pub file_path: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for report records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = research_reports)]
pub struct NewReportRow {
    /// Report row identifier.
    pub id: uuid::Uuid,
    /// Owning task identifier.
    pub task_id: String,
    /// Report format tag.
    pub report_type: String,
    /// Report title.
    pub title: String,
    /// Inline payload for textual formats.
    pub content: Option<String>,
    /// Path to externally stored bytes for file-based formats.
    pub file_path: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
