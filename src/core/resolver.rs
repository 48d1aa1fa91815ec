// src/core/resolver.rs

//! Turns a requested target into an `ExecutionPlan`, dependencies first.

use crate::{
    core::registry::Registry,
    models::{ExecutionPlan, Target},
};
use std::collections::HashMap;
use thiserror::Error;

/// Why a target could not be planned. Detected before any command runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The requested target, or one of its dependencies, is not declared.
    #[error("Unknown target '{}'{}.", .name, required_by_suffix(.required_by.as_deref()))]
    UnknownTarget {
        name: String,
        /// The target whose dependency list named the missing target.
        required_by: Option<String>,
    },
    /// The dependency graph reachable from the requested target has a cycle.
    #[error("Cyclic dependency detected: {}.", .cycle.join(" -> "))]
    CyclicDependency {
        /// The path that closes the cycle; first and last entries are the same target.
        cycle: Vec<String>,
    },
}

fn required_by_suffix(required_by: Option<&str>) -> String {
    required_by
        .map(|parent| format!(" (required by '{}')", parent))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Computes execution plans against a borrowed `Registry`. Holds no state between calls.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a Registry,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over `registry`.
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Resolves `target_name` into a duplicate-free plan where every dependency
    /// precedes the targets that declare it.
    ///
    /// Dependencies are visited depth-first in declaration order and emitted
    /// post-order, so the result is the same on every run. Cycles and unknown names
    /// are reported before anything is planned.
    pub fn resolve(&self, target_name: &str) -> Result<ExecutionPlan, ResolveError> {
        let mut walk = Walk {
            registry: self.registry,
            marks: HashMap::new(),
            stack: Vec::new(),
            order: Vec::new(),
        };
        walk.run(target_name)?;
        log::debug!("Resolved '{}' to plan {:?}", target_name, walk.order);
        Ok(ExecutionPlan::new(walk.order))
    }
}

/// Convenience wrapper around `Resolver::resolve`.
pub fn resolve(registry: &Registry, target_name: &str) -> Result<ExecutionPlan, ResolveError> {
    Resolver::new(registry).resolve(target_name)
}

/// A target being visited and how many of its dependencies have been entered.
struct Frame<'a> {
    target: &'a Target,
    next_dependency: usize,
}

/// Depth-first walk on an explicit stack, so deep chains cannot exhaust the call stack.
/// The frames on `stack` are exactly the targets marked `Visiting`, outermost first.
struct Walk<'a> {
    registry: &'a Registry,
    marks: HashMap<&'a str, Mark>,
    stack: Vec<Frame<'a>>,
    order: Vec<String>,
}

impl<'a> Walk<'a> {
    fn run(&mut self, root: &str) -> Result<(), ResolveError> {
        self.enter(root, None)?;

        while let Some(frame) = self.stack.last_mut() {
            let target = frame.target;
            match target.dependencies.get(frame.next_dependency) {
                Some(dependency) => {
                    frame.next_dependency += 1;
                    self.enter(dependency, Some(target.name.as_str()))?;
                }
                None => {
                    self.stack.pop();
                    self.marks.insert(target.name.as_str(), Mark::Done);
                    self.order.push(target.name.clone());
                }
            }
        }
        Ok(())
    }

    /// Pushes `name` unless it is already planned. Fails on unknown names and on
    /// a name that is still being visited (a cycle).
    fn enter(&mut self, name: &str, required_by: Option<&str>) -> Result<(), ResolveError> {
        let registry = self.registry;
        let target = registry
            .lookup(name)
            .map_err(|_| ResolveError::UnknownTarget {
                name: name.to_string(),
                required_by: required_by.map(str::to_string),
            })?;
        let name = target.name.as_str();

        match self.marks.get(name) {
            Some(Mark::Done) => Ok(()),
            Some(Mark::Visiting) => {
                let start = self
                    .stack
                    .iter()
                    .position(|frame| frame.target.name == name)
                    .unwrap_or(0);
                let mut cycle: Vec<String> = self
                    .stack
                    .iter()
                    .skip(start)
                    .map(|frame| frame.target.name.clone())
                    .collect();
                cycle.push(name.to_string());
                Err(ResolveError::CyclicDependency { cycle })
            }
            None => {
                self.marks.insert(name, Mark::Visiting);
                self.stack.push(Frame {
                    target,
                    next_dependency: 0,
                });
                Ok(())
            }
        }
    }
}
