// src/models.rs

//! Data types shared across the crate: what the targets file deserializes into and
//! the runtime types the resolver and executor work with.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

// --- `phony.toml` MODELS (what is read from the targets file) ---

/// A single command as written in `phony.toml`. Uses `untagged` so both the
/// short string form and the explicit argument array are accepted.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum TomlCommand {
    /// `"ruff check src tests"`, split with POSIX shell word rules.
    Line(String),
    /// `["ruff", "check", "src", "tests"]`, used verbatim.
    Argv(Vec<String>),
}

/// One `[[target]]` table of the targets file.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct TomlTarget {
    pub name: String,
    pub description: Option<String>,
    /// Targets that run first, in this order.
    #[serde(default, alias = "dependencies")]
    pub deps: Vec<String>,
    #[serde(default)]
    pub commands: Vec<TomlCommand>,
    /// Relative to the targets file; `~` and `$VAR` are expanded.
    pub working_directory: Option<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Do not echo this target's commands.
    #[serde(default)]
    pub silent: bool,
}

/// The deserialized structure of a `phony.toml` file.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct TargetsFile {
    #[serde(default, rename = "target")]
    pub targets: Vec<TomlTarget>,
}

// --- RUNTIME MODELS ---

/// An opaque argument vector handed to a subprocess. Never interpreted by a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Builds a command line from an argument vector. Returns `None` when the
    /// vector is empty or the program name is blank.
    pub fn from_argv(argv: Vec<String>) -> Option<Self> {
        let mut parts = argv.into_iter();
        let program = parts.next()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Splits a command string with POSIX shell word rules.
    /// Returns `None` for unbalanced quotes or an empty line.
    pub fn parse(line: &str) -> Option<Self> {
        shlex::split(line.trim()).and_then(Self::from_argv)
    }

    /// The executable, looked up on `PATH` when not a path.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments after the program, passed through untouched.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    /// Renders the command in a form that could be pasted back into a shell.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = shlex::try_join(
            std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str)),
        )
        .unwrap_or_else(|_| {
            let mut joined = self.program.clone();
            for arg in &self.args {
                joined.push(' ');
                joined.push_str(arg);
            }
            joined
        });
        f.write_str(&rendered)
    }
}

/// A named unit of work. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Unique within a registry.
    pub name: String,
    pub description: Option<String>,
    /// Names of the targets that must run first, in declaration order.
    pub dependencies: Vec<String>,
    /// Run in order; the first failure stops the plan.
    pub commands: Vec<CommandLine>,
    /// Always `true`: a target has no output artifact and runs whenever it is reached.
    pub phony: bool,
    /// `None` runs commands in the orchestrator's working directory.
    pub working_directory: Option<PathBuf>,
    /// Added to the inherited environment of each command.
    pub env: Vec<(String, String)>,
    /// Commands are not echoed before they run.
    pub silent: bool,
}

impl Target {
    /// Creates a phony target with no overrides.
    pub fn new(
        name: impl Into<String>,
        dependencies: impl IntoIterator<Item = impl Into<String>>,
        commands: Vec<CommandLine>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            commands,
            phony: true,
            working_directory: None,
            env: Vec::new(),
            silent: false,
        }
    }

    /// Sets the text shown by `phony list`.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The deduplicated, dependency-ordered sequence of targets for one request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionPlan {
    targets: Vec<String>,
}

impl ExecutionPlan {
    pub(crate) fn new(targets: Vec<String>) -> Self {
        Self { targets }
    }

    /// Target names in execution order.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(String::as_str)
    }

    /// The requested target, which is always planned last.
    pub fn requested(&self) -> Option<&str> {
        self.targets.last().map(String::as_str)
    }
}

/// Lifecycle of a planned target while the executor walks the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// Planned, not reached yet.
    Pending,
    /// Its commands are being run.
    Running,
    /// Every command exited with status 0.
    Succeeded,
    /// A command failed or could not be launched; the plan stops here.
    Failed,
    /// Interrupted by the operator; the plan stops here.
    Cancelled,
}

impl TargetState {
    /// `true` once the target can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}
