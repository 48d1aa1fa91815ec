// src/core/mod.rs

//! Target declaration, planning and execution.

pub mod config_loader;
pub mod graph_display;
pub mod paths;
pub mod registry;
pub mod resolver;
pub mod task_executor;
