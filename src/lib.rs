//! # VarHub Client Library
//!
//! Async SDK for the VarHub genomics data-management REST service:
//! session lifecycle with transparent re-authentication, and polling of
//! asynchronous analysis jobs until they reach a terminal state.
//!
//! Modules:
//! - `config` — client configuration, file loading and validation
//! - `auth` — login handler capability and shared session state
//! - `rest` — response envelope and the generic per-category client
//! - `jobs` — job status model and the polling waiter
//! - `client` — the `VarhubClient` facade tying it all together

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod jobs;
pub mod rest;
#[cfg(test)]
pub mod tests;

pub use crate::client::{VarhubClient, VarhubClientBuilder};
pub use crate::config::loader::load_config;
pub use crate::config::settings::ClientConfiguration;
pub use crate::error::{ClientError, Result};
pub use crate::jobs::{ExecutionStatus, JobStatus, JobTarget, MIN_POLL_INTERVAL};
pub use crate::rest::resource::{ResourceClient, ResourceRequest};
pub use crate::rest::response::RestResponse;
