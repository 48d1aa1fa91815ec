// src/core/registry.rs

//! The set of declared targets, keyed by name.

use crate::models::Target;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while filling or querying a `Registry`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two targets share a name.
    #[error("Target '{0}' is already registered.")]
    DuplicateTarget(String),
    /// No target with this name was registered.
    #[error("Unknown target '{0}'.")]
    UnknownTarget(String),
}

/// Where the registered targets were declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// The table compiled into the binary.
    BuiltIn,
    /// A targets file on disk.
    File(PathBuf),
}

impl fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuiltIn => f.write_str("built-in targets"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Owns every `Target` for the lifetime of the process.
///
/// Targets are kept in declaration order so listings and dependency traversal are
/// reproducible. The registry is filled once by the loader and only borrowed afterwards.
#[derive(Debug, Clone)]
pub struct Registry {
    targets: Vec<Target>,
    by_name: HashMap<String, usize>,
    source: RegistrySource,
}

impl Registry {
    /// Creates an empty registry for targets declared in `source`.
    pub fn new(source: RegistrySource) -> Self {
        Self {
            targets: Vec::new(),
            by_name: HashMap::new(),
            source,
        }
    }

    /// Adds a target. Fails if a target with the same name already exists.
    pub fn register(&mut self, target: Target) -> Result<(), RegistryError> {
        if self.by_name.contains_key(&target.name) {
            return Err(RegistryError::DuplicateTarget(target.name));
        }
        log::trace!("Registering target '{}'.", target.name);
        self.by_name.insert(target.name.clone(), self.targets.len());
        self.targets.push(target);
        Ok(())
    }

    /// Returns the target called `name`.
    pub fn lookup(&self, name: &str) -> Result<&Target, RegistryError> {
        self.by_name
            .get(name)
            .and_then(|&position| self.targets.get(position))
            .ok_or_else(|| RegistryError::UnknownTarget(name.to_string()))
    }

    /// `true` if a target called `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Iterates over targets in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    /// Number of registered targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Where the targets were declared.
    pub fn source(&self) -> &RegistrySource {
        &self.source
    }
}
