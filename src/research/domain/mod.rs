//! Domain model for research task lifecycle coordination.
//!
//! The research domain models task creation, worker delegation outcomes,
//! worker-reported status updates, and report attachment while keeping all
//! infrastructure concerns outside of the domain boundary.

mod effort;
mod error;
mod ids;
mod report;
mod status;
mod task;

pub use effort::{EffortProfile, Progress};
pub use error::{ParseTaskStatusError, ResearchDomainError};
pub use ids::{MunicipalityId, RegionId, RegionName, TaskId};
pub use report::{PersistedReportData, Report, ReportBody, ReportType};
pub use status::TaskStatus;
pub use task::{
    NewResearchTask, PersistedResearchTaskData, RegistrationSnapshot, ResearchTask, StatusUpdate,
};
