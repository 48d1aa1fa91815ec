// src/system/executor.rs

//! Launching a single command as a subprocess.

use crate::{
    CancellationToken, constants::CANCEL_GRACE_PERIOD_MS, models::CommandLine,
    system::cancellation::Signal,
};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};

/// Why a command, and with it the plan, did not complete.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The command ran and reported a failing exit code.
    #[error("Command '{command}' in target '{target}' exited with code {code}.")]
    NonZeroExit {
        target: String,
        command: String,
        code: i32,
    },
    /// The command ended without an exit code, e.g. killed by a signal.
    #[error("Command '{command}' in target '{target}' was terminated without an exit code.")]
    Terminated { target: String, command: String },
    /// The program could not be launched (not found, not executable).
    #[error("Command '{command}' in target '{target}' could not be executed: {source}")]
    Spawn {
        target: String,
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// The target's working directory is missing.
    #[error("Working directory '{}' for target '{target}' does not exist.", .path.display())]
    WorkingDirectory { target: String, path: PathBuf },
    /// The plan named a target the registry does not hold.
    #[error("Planned target '{0}' is not registered.")]
    UnknownTarget(String),
    /// The operator interrupted the run. `command` is the one that was running, if any.
    #[error("Target '{target}' was cancelled by the user.")]
    Cancelled {
        target: String,
        command: Option<String>,
    },
}

impl ExecutionError {
    /// The process exit code this error should surface as.
    pub fn exit_code(&self) -> i32 {
        use crate::constants::{
            EXIT_CANCELLED, EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_SPAWN_FAILURE,
        };
        match self {
            Self::NonZeroExit { code, .. } if *code != 0 => *code,
            Self::NonZeroExit { .. } | Self::Terminated { .. } => EXIT_FAILURE,
            Self::Spawn { .. } | Self::WorkingDirectory { .. } => EXIT_SPAWN_FAILURE,
            Self::UnknownTarget(_) => EXIT_CONFIG_ERROR,
            Self::Cancelled { .. } => EXIT_CANCELLED,
        }
    }

    /// `true` for operator interrupts, as opposed to command failures.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Everything needed to launch one command of one target.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Name of the target the command belongs to.
    pub target: &'a str,
    pub command: &'a CommandLine,
    /// `None` inherits the orchestrator's working directory.
    pub cwd: Option<&'a Path>,
    /// Added to (or overriding) the inherited environment of this subprocess only.
    pub env: &'a [(String, String)],
}

/// Runs a command to completion with inherited stdio.
///
/// The orchestrator blocks on the child until it exits. If the cancellation token
/// fires meanwhile, the same signal is forwarded to the child, which gets
/// `CANCEL_GRACE_PERIOD_MS` to exit before it is killed.
pub async fn execute_command(
    invocation: &Invocation<'_>,
    cancellation_token: &CancellationToken,
) -> Result<(), ExecutionError> {
    let command_str = invocation.command.to_string();

    if cancellation_token.is_cancelled() {
        return Err(ExecutionError::Cancelled {
            target: invocation.target.to_string(),
            command: None,
        });
    }

    let mut command = Command::new(invocation.command.program());
    command
        .args(invocation.command.args())
        .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    if let Some(cwd) = invocation.cwd {
        command.current_dir(dunce::simplified(cwd));
    }

    let mut child = command.spawn().map_err(|e| ExecutionError::Spawn {
        target: invocation.target.to_string(),
        command: command_str.clone(),
        source: e,
    })?;
    log::trace!(
        "Spawned '{}' for target '{}' (PID: {:?}).",
        command_str,
        invocation.target,
        child.id()
    );

    // The branches only produce values; the child is handled once `select!` has
    // released its borrow.
    let outcome = tokio::select! {
        status = child.wait() => Ok(status),
        signal = cancellation_token.cancelled() => Err(signal),
    };

    match outcome {
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(status)) => Err(classify_failure(
            invocation.target,
            command_str,
            status,
            cancellation_token,
        )),
        Ok(Err(e)) => Err(ExecutionError::Spawn {
            target: invocation.target.to_string(),
            command: command_str,
            source: e,
        }),
        Err(signal) => {
            forward_signal(&mut child, signal).await;
            Err(ExecutionError::Cancelled {
                target: invocation.target.to_string(),
                command: Some(command_str),
            })
        }
    }
}

/// Maps an unsuccessful exit status to an error.
///
/// A terminal's Ctrl+C reaches the child directly too, so the child may exit before
/// the token is observed. Once the token is set, any failure counts as a cancellation.
fn classify_failure(
    target: &str,
    command: String,
    status: ExitStatus,
    cancellation_token: &CancellationToken,
) -> ExecutionError {
    if cancellation_token.is_cancelled() {
        return ExecutionError::Cancelled {
            target: target.to_string(),
            command: Some(command),
        };
    }
    match status.code() {
        Some(code) if code != 0 => ExecutionError::NonZeroExit {
            target: target.to_string(),
            command,
            code,
        },
        _ => ExecutionError::Terminated {
            target: target.to_string(),
            command,
        },
    }
}

/// Delivers `signal` to the child, waits for the grace period, then kills it.
async fn forward_signal(child: &mut Child, signal: Signal) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        log::debug!("Forwarding {:?} to child process (PID: {}).", signal, pid);
        let forwarded = Command::new("kill")
            .arg(signal.kill_flag())
            .arg(pid.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if let Err(e) = forwarded {
            log::warn!("Failed to signal child process {}: {}", pid, e);
        }
    }
    #[cfg(not(unix))]
    let _ = signal;

    let grace = Duration::from_millis(CANCEL_GRACE_PERIOD_MS);
    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => log::debug!("Child exited after interrupt with {}.", status),
        Ok(Err(e)) => log::warn!("Failed to wait for interrupted child: {}", e),
        Err(_) => {
            log::debug!("Child did not exit within {:?}, killing it.", grace);
            if let Err(e) = child.kill().await {
                log::warn!("Failed to kill child process: {}", e);
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sh(script: &str) -> CommandLine {
        CommandLine::from_argv(vec!["sh".into(), "-c".into(), script.into()]).unwrap()
    }

    fn invocation<'a>(command: &'a CommandLine, cwd: Option<&'a Path>, env: &'a [(String, String)]) -> Invocation<'a> {
        Invocation {
            target: "demo",
            command,
            cwd,
            env,
        }
    }

    #[tokio::test]
    async fn test_success_and_exit_code_propagation() {
        let token = CancellationToken::new();
        let ok = sh("exit 0");
        assert!(execute_command(&invocation(&ok, None, &[]), &token).await.is_ok());

        let failing = sh("exit 7");
        let err = execute_command(&invocation(&failing, None, &[]), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::NonZeroExit { code: 7, .. }));
        assert_eq!(err.exit_code(), 7);
    }

    #[tokio::test]
    async fn test_missing_program_is_a_spawn_error() {
        let token = CancellationToken::new();
        let missing =
            CommandLine::from_argv(vec!["phony-definitely-not-a-program".into()]).unwrap();
        let err = execute_command(&invocation(&missing, None, &[]), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Spawn { .. }));
        assert_eq!(err.exit_code(), crate::constants::EXIT_SPAWN_FAILURE);
    }

    #[tokio::test]
    async fn test_cwd_and_env_overrides_reach_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();
        let env = vec![("PHONY_GREETING".to_string(), "hello".to_string())];
        let cmd = sh("printf '%s' \"$PHONY_GREETING\" > greeting.txt");

        execute_command(&invocation(&cmd, Some(dir.path()), &env), &token)
            .await
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("greeting.txt")).unwrap();
        assert_eq!(written, "hello");
        assert!(std::env::var("PHONY_GREETING").is_err());
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_running_child() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            canceller.cancel(Signal::Interrupt);
        });

        let long_running = sh("sleep 30");
        let started = Instant::now();
        let err = execute_command(&invocation(&long_running, None, &[]), &token)
            .await
            .unwrap_err();

        assert!(err.is_cancellation());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_failure_after_cancellation_counts_as_cancelled() {
        let status = std::process::Command::new("sh")
            .args(["-c", "exit 3"])
            .status()
            .unwrap();
        assert!(!status.success());

        let token = CancellationToken::new();
        let err = classify_failure("slow", "sleep 30".into(), status, &token);
        assert!(matches!(err, ExecutionError::NonZeroExit { code: 3, .. }));

        token.cancel(Signal::Interrupt);
        let err = classify_failure("slow", "sleep 30".into(), status, &token);
        assert!(matches!(
            err,
            ExecutionError::Cancelled { ref command, .. } if command.as_deref() == Some("sleep 30")
        ));
        assert_eq!(err.exit_code(), crate::constants::EXIT_CANCELLED);
    }

    #[tokio::test]
    async fn test_no_launch_after_cancellation() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();
        token.cancel(Signal::Terminate);

        let cmd = sh("touch launched");
        let err = execute_command(&invocation(&cmd, Some(dir.path()), &[]), &token)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Cancelled { command: None, .. }));
        assert!(!dir.path().join("launched").exists());
    }
}
