//! In-memory adapters for research coordination tests and reference use.

mod catalog;
mod store;
mod worker;

pub use catalog::InMemoryMunicipalityCatalog;
pub use store::InMemoryTaskStore;
pub use worker::{ScriptedWorkerClient, WorkerCall};
