// src/cli/handlers/mod.rs

//! One module per CLI action.

pub mod commons;
pub mod list;
pub mod plan;
pub mod run;
