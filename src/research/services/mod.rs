//! Application services for research task coordination.

mod lifecycle;
mod registration;

pub use lifecycle::{
    CreateTaskRequest, StatusUpdateRequest, TaskLifecycleError, TaskLifecycleResult,
    TaskLifecycleService, UpdateValidation,
};
pub use registration::{
    RegisterTaskPayload, RegisterTaskRequest, RegistrationError, RegistrationGateway,
    RegistrationOutcome, RegistrationResult, RegistrationService,
};
