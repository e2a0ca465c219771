//! Port contracts for research task coordination.
//!
//! Ports define infrastructure-agnostic interfaces used by research
//! services: durable task storage, outbound worker delegation, and the
//! external municipality reference catalog.

pub mod catalog;
pub mod store;
pub mod worker;

pub use catalog::{CatalogError, CatalogResult, MunicipalityCatalog, MunicipalityRecord};
pub use store::{
    PageRequest, TaskFilter, TaskMutator, TaskPage, TaskStore, TaskStoreError, TaskStoreResult,
};
pub use worker::{Acknowledgement, WorkerClient};
