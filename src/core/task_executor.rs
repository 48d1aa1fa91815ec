// src/core/task_executor.rs

//! Runs an execution plan: ordering, per-target state and fail-fast.

use crate::{
    CancellationToken,
    core::registry::Registry,
    models::{ExecutionPlan, Target, TargetState},
    system::executor::{self, ExecutionError, Invocation},
};
use colored::*;

// --- Command runners ---

/// How a single command is carried out. The executor owns ordering, state and
/// fail-fast; a runner only runs one command to completion.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Runs one command to completion, or fails with the reason it did not complete.
    async fn run(
        &self,
        invocation: &Invocation<'_>,
        cancellation_token: &CancellationToken,
    ) -> Result<(), ExecutionError>;
}

/// Runs commands as real subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        invocation: &Invocation<'_>,
        cancellation_token: &CancellationToken,
    ) -> Result<(), ExecutionError> {
        executor::execute_command(invocation, cancellation_token).await
    }
}

/// Prints what would run and launches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    async fn run(
        &self,
        invocation: &Invocation<'_>,
        _cancellation_token: &CancellationToken,
    ) -> Result<(), ExecutionError> {
        let mut line = format!(
            "{} {}",
            "→".blue(),
            invocation.command.to_string().green()
        );
        if let Some(cwd) = invocation.cwd {
            line.push_str(&format!(" {}", format!("(in {})", cwd.display()).dimmed()));
        }
        for (key, value) in invocation.env {
            line.push_str(&format!(" {}", format!("{}={}", key, value).dimmed()));
        }
        println!("{}", line);
        Ok(())
    }
}

// --- Executor ---

/// What the executor prints around the commands it runs.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorOptions {
    /// Print a header line before each target.
    pub show_headers: bool,
    /// Echo each command before it runs. Targets marked `silent` are never echoed.
    pub echo_commands: bool,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            show_headers: true,
            echo_commands: true,
        }
    }
}

impl ExecutorOptions {
    /// No headers and no command echo.
    pub fn quiet() -> Self {
        Self {
            show_headers: false,
            echo_commands: false,
        }
    }
}

/// The outcome of walking an execution plan.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Every planned target with the state it ended in, in plan order.
    pub states: Vec<(String, TargetState)>,
    /// Number of commands handed to the runner.
    pub commands_run: usize,
    /// The error that halted the plan, if any.
    pub error: Option<ExecutionError>,
}

impl ExecutionResult {
    /// `true` if every planned target succeeded.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The final state of `target`, or `None` if it was not planned.
    pub fn state_of(&self, target: &str) -> Option<TargetState> {
        self.states
            .iter()
            .find(|(name, _)| name == target)
            .map(|(_, state)| *state)
    }

    /// Number of targets that ran all of their commands.
    pub fn succeeded_count(&self) -> usize {
        self.states
            .iter()
            .filter(|(_, state)| *state == TargetState::Succeeded)
            .count()
    }

    /// Process exit code for this run: 0 on success.
    pub fn exit_code(&self) -> i32 {
        self.error.as_ref().map_or(0, ExecutionError::exit_code)
    }

    /// Turns a halted run into its error.
    pub fn into_result(self) -> Result<Self, ExecutionError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}

/// Runs the targets of a plan strictly in order, one command at a time.
///
/// Every command of every planned target always runs: there is no up-to-date
/// check. The first failing or interrupted command halts the whole plan.
#[derive(Debug)]
pub struct Executor<'a, R> {
    registry: &'a Registry,
    runner: R,
    options: ExecutorOptions,
    cancellation_token: CancellationToken,
}

impl<'a, R: CommandRunner> Executor<'a, R> {
    /// Creates an executor that runs targets from `registry` through `runner`.
    pub fn new(
        registry: &'a Registry,
        runner: R,
        options: ExecutorOptions,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            registry,
            runner,
            options,
            cancellation_token,
        }
    }

    /// Walks `plan` in order and stops at the first failed or cancelled target.
    /// Targets after that point stay `Pending`.
    pub async fn execute(&self, plan: &ExecutionPlan) -> ExecutionResult {
        let mut states: Vec<(String, TargetState)> = plan
            .iter()
            .map(|name| (name.to_string(), TargetState::Pending))
            .collect();
        let mut commands_run = 0;
        let mut error = None;

        for (name, state) in states.iter_mut() {
            let name = name.as_str();
            let target = match self.registry.lookup(name) {
                Ok(target) => target,
                Err(_) => {
                    error = Some(ExecutionError::UnknownTarget(name.to_string()));
                    break;
                }
            };

            transition(name, state, TargetState::Running);
            match self.run_target(target, &mut commands_run).await {
                Ok(()) => transition(name, state, TargetState::Succeeded),
                Err(e) => {
                    let next = if e.is_cancellation() {
                        TargetState::Cancelled
                    } else {
                        TargetState::Failed
                    };
                    transition(name, state, next);
                    error = Some(e);
                    break;
                }
            }
        }

        ExecutionResult {
            states,
            commands_run,
            error,
        }
    }

    async fn run_target(
        &self,
        target: &Target,
        commands_run: &mut usize,
    ) -> Result<(), ExecutionError> {
        if self.options.show_headers {
            println!("{} {}", "::".cyan().bold(), target.name.bold());
        }

        if let Some(dir) = &target.working_directory
            && !dir.is_dir()
        {
            return Err(ExecutionError::WorkingDirectory {
                target: target.name.clone(),
                path: dir.clone(),
            });
        }

        if target.commands.is_empty() {
            log::debug!("Target '{}' has no commands.", target.name);
        }

        for command in &target.commands {
            if self.cancellation_token.is_cancelled() {
                return Err(ExecutionError::Cancelled {
                    target: target.name.clone(),
                    command: None,
                });
            }
            if self.options.echo_commands && !target.silent {
                println!("{} {}", "→".blue(), command.to_string().green());
            }

            let invocation = Invocation {
                target: &target.name,
                command,
                cwd: target.working_directory.as_deref(),
                env: &target.env,
            };
            *commands_run += 1;
            self.runner
                .run(&invocation, &self.cancellation_token)
                .await?;
        }
        Ok(())
    }
}

fn transition(target: &str, state: &mut TargetState, next: TargetState) {
    debug_assert!(!state.is_terminal(), "'{}' is already {}", target, state);
    log::debug!("Target '{}': {} -> {}", target, state, next);
    *state = next;
}
