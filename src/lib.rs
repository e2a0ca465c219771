//! Kataster: coordination service for long-running municipal research jobs.
//!
//! This crate provides the task lifecycle core of a system that researches
//! administrative regions: it accepts job-creation requests, delegates
//! execution to an external worker process over HTTP, tracks state and
//! progress as the worker reports back, and persists the resulting
//! reports.
//!
//! # Architecture
//!
//! Kataster follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, HTTP, etc.)
//!
//! # Modules
//!
//! - [`research`]: Task lifecycle coordination, worker delegation, and the
//!   worker registration protocol

pub mod research;
