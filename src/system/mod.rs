//! # System Interaction Layer
//!
//! The boundary between target orchestration and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: spawns a single command with inherited stdio, maps its exit status
//!   and forwards operator interrupts to it.
//! - **`cancellation`**: the shared `CancellationToken` and the signal listener that
//!   sets it.

pub mod cancellation;
pub mod executor;
