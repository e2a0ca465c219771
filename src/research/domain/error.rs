//! Error types for research domain validation and parsing.

use super::TaskStatus;
use thiserror::Error;

/// Errors returned while constructing or mutating domain research values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResearchDomainError {
    /// The task identifier is empty after trimming.
    #[error("task identifier must not be empty")]
    EmptyTaskId,

    /// The region name is empty after trimming.
    #[error("region name must not be empty")]
    EmptyRegionName,

    /// The region identifier is empty after trimming.
    #[error("region identifier must not be empty")]
    EmptyRegionId,

    /// The progress value exceeds 100 percent.
    #[error("invalid progress {0}, expected a value between 0 and 100")]
    InvalidProgress(u8),

    /// An effort parameter is zero or exceeds the schema-backed maximum.
    #[error("invalid {field} {value}, expected a positive integer")]
    InvalidEffort {
        /// Name of the offending effort parameter.
        field: &'static str,
        /// Rejected value.
        value: u32,
    },

    /// The report format tag is empty after trimming.
    #[error("report type must not be empty")]
    EmptyReportType,

    /// The report title is empty after trimming.
    #[error("report title must not be empty")]
    EmptyReportTitle,

    /// A status transition the state machine disallows was requested while
    /// strict update validation is enabled.
    #[error("invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Status the task currently holds.
        from: TaskStatus,
        /// Status the update asked for.
        to: TaskStatus,
    },
}

/// Error returned while parsing task statuses from persistence or wire input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
