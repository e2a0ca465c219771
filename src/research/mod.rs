//! Research task lifecycle coordination.
//!
//! This module implements the coordinator core: creating research tasks,
//! delegating execution to the external worker, applying worker-reported
//! status updates, attaching reports, and the idempotent-registration and
//! pending-pull protocol the worker uses to discover work. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
