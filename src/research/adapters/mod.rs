//! Adapter implementations of the research coordination ports.

pub mod http;
pub mod memory;
pub mod postgres;

pub use http::{DELEGATION_TIMEOUT, HttpWorkerClient, WorkerClientBuildError};
pub use memory::{InMemoryMunicipalityCatalog, InMemoryTaskStore, ScriptedWorkerClient, WorkerCall};
pub use postgres::{PostgresTaskStore, TaskPgPool};
