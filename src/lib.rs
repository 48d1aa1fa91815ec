//! `phony`: a small, dependency-ordered runner for phony targets.
//!
//! Targets are declared once (in `phony.toml` or the built-in table), resolved into an
//! [`ExecutionPlan`](models::ExecutionPlan) with dependencies first, and executed one
//! command at a time with fail-fast semantics.

include!(concat!(env!("OUT_DIR"), "/translations.rs"));

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;

pub use system::cancellation::CancellationToken;
