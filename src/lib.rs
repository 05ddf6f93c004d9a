//! Deterministic lead scoring and rule evaluation service.
//!
//! The [`scoring`] module holds the pure engine and its versioned
//! configuration service; the remaining modules are the HTTP and CLI shell
//! around it.

pub mod config;
pub mod error;
pub mod infra;
pub mod routes;
pub mod scoring;
pub mod telemetry;

mod cli;
mod server;

use crate::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
