//! HTTP adapters for outbound worker delegation.

mod worker;

pub use worker::{DELEGATION_TIMEOUT, HttpWorkerClient, WorkerClientBuildError};
