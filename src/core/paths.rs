// src/core/paths.rs

//! Locating the targets file and expanding working directories.

use crate::constants::TARGETS_FILENAME;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Failed to expand path template '{template}': {message}")]
    Expansion { template: String, message: String },
    #[error("Path template is empty.")]
    Empty,
}

/// Finds the targets file for this invocation.
///
/// An explicit path always wins (even if it does not exist, so the caller can report
/// it). Otherwise `phony.toml` in `cwd` is used if present. `None` means the built-in
/// declaration applies.
pub fn locate_targets_file(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(cwd.join(path)),
        None => {
            let candidate = cwd.join(TARGETS_FILENAME);
            candidate.is_file().then_some(candidate)
        }
    }
}

/// Expands a working-directory template from the targets file.
///
/// `~` and environment variables (`$VAR`, `${VAR}`) are expanded; a relative
/// result is anchored at `base_dir`, the directory holding the targets file.
pub fn expand_working_directory(template: &str, base_dir: &Path) -> Result<PathBuf, PathError> {
    if template.trim().is_empty() {
        return Err(PathError::Empty);
    }

    let expanded = shellexpand::full(template).map_err(|e| PathError::Expansion {
        template: template.to_string(),
        message: e.to_string(),
    })?;

    let path = PathBuf::from(expanded.into_owned());
    let anchored = if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    };
    Ok(dunce::simplified(&anchored).to_path_buf())
}
