//! `phony run`: resolve a target and execute its plan.

use crate::{
    CancellationToken,
    cli::handlers::commons::{self, RegistryArgs},
    core::{
        resolver,
        task_executor::{DryRunRunner, Executor, ExecutorOptions, ProcessRunner},
    },
    system::cancellation,
};
use anyhow::{Context, Result};
use clap::Parser;
use colored::*;

#[derive(Parser, Debug, Default)]
#[command(
    name = "phony run",
    no_binary_name = true,
    about = "Resolves a target and runs it after its dependencies."
)]
struct RunArgs {
    /// The target to run.
    target: String,

    #[command(flatten)]
    source: RegistryArgs,

    /// Print the commands that would run without launching anything.
    #[arg(long, short = 'n')]
    dry_run: bool,

    /// Do not print target headers, command echo or the summary.
    #[arg(long, short)]
    quiet: bool,
}

/// Main entry point for the `run` action.
///
/// Configuration problems (unknown target, cycle, invalid targets file) surface here
/// before the runtime is even started, so no command runs in that case.
pub fn handle(args: Vec<String>, cancellation_token: &CancellationToken) -> Result<()> {
    let run_args = RunArgs::try_parse_from(&args)?;

    let registry = commons::load_registry(&run_args.source)?;
    let plan = resolver::resolve(&registry, &run_args.target)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context(t!("run.error.runtime"))?;

    let result = runtime.block_on(async {
        cancellation::listen_for_signals(cancellation_token)
            .context(t!("run.error.signals"))?;

        let result = if run_args.dry_run {
            let options = ExecutorOptions {
                show_headers: !run_args.quiet,
                echo_commands: false,
            };
            Executor::new(&registry, DryRunRunner, options, cancellation_token.clone())
                .execute(&plan)
                .await
        } else {
            let options = if run_args.quiet {
                ExecutorOptions::quiet()
            } else {
                ExecutorOptions::default()
            };
            Executor::new(&registry, ProcessRunner, options, cancellation_token.clone())
                .execute(&plan)
                .await
        };
        anyhow::Ok(result)
    })?;

    let result = result.into_result()?;

    if !run_args.quiet {
        let summary = if run_args.dry_run {
            format!(t!("run.summary.dry_run"), count = result.commands_run)
        } else {
            format!(t!("run.summary.success"), count = result.succeeded_count())
        };
        println!("\n{} {}", "✓".green().bold(), summary.green().bold());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_parse_flags_after_target() {
        let args = RunArgs::try_parse_from(["install-dev", "--dry-run", "-q", "-f", "ci.toml"])
            .unwrap();
        assert_eq!(args.target, "install-dev");
        assert!(args.dry_run);
        assert!(args.quiet);
        assert_eq!(args.source.file.as_deref(), Some(std::path::Path::new("ci.toml")));
    }

    #[test]
    fn test_run_args_require_a_target() {
        let err = RunArgs::try_parse_from(Vec::<String>::new()).unwrap_err();
        assert!(err.render().to_string().contains("Usage: phony run"));
    }
}
