// src/cli/handlers/commons.rs

//! Shared argument groups and helpers used by several handlers.

use crate::{
    constants::TARGETS_FILE_ENV,
    core::{config_loader, registry::Registry},
};
use anyhow::{Context, Result};
use clap::Args;
use std::{env, path::PathBuf};

/// Selects where targets are declared.
#[derive(Args, Debug, Default, Clone)]
pub struct RegistryArgs {
    /// Path to the targets file. Defaults to `phony.toml` in the current directory,
    /// then to the built-in targets.
    #[arg(long, short, env = TARGETS_FILE_ENV, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

/// Loads the registry for this invocation from the current directory.
pub fn load_registry(args: &RegistryArgs) -> Result<Registry> {
    let cwd = env::current_dir().context(t!("commons.error.cwd"))?;
    let registry = config_loader::load(args.file.as_deref(), &cwd)?;
    log::debug!(
        "Registry loaded from {} with {} target(s).",
        registry.source(),
        registry.len()
    );
    Ok(registry)
}
