//! Command-line surface: argument parsing, dispatch and exit codes.

use crate::{
    constants::{EXIT_CONFIG_ERROR, EXIT_FAILURE},
    core::{config_loader::ConfigError, registry::RegistryError, resolver::ResolveError},
    system::executor::ExecutionError,
};
use clap::Parser;

pub mod dispatcher;
pub mod handlers;

/// Builds the color-aware help string at runtime.
fn build_help_string() -> &'static str {
    // Replaces semantic placeholders like `<title>` with ANSI styles.
    let use_colors = colored::control::SHOULD_COLORIZE.should_colorize();

    let template = t!("cli.help.template");

    let title = if use_colors { "\x1b[1;33m" } else { "" }; // Bold Yellow
    let hl = if use_colors { "\x1b[1;36m" } else { "" }; // Bold Cyan
    let cmd = if use_colors { "\x1b[36m" } else { "" }; // Cyan
    let group = if use_colors { "\x1b[1;32m" } else { "" }; // Bold Green
    let dim = if use_colors { "\x1b[2m" } else { "" };
    let reset = if use_colors { "\x1b[0m" } else { "" };

    let formatted_string = template
        .replace("<title>", title)
        .replace("</title>", reset)
        .replace("<hl>", hl)
        .replace("</hl>", reset)
        .replace("<cmd>", cmd)
        .replace("</cmd>", reset)
        .replace("<group>", group)
        .replace("</group>", reset)
        .replace("<dim>", dim)
        .replace("</dim>", reset);

    Box::leak(formatted_string.into_boxed_str())
}

/// phony: run dependency-ordered phony targets.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    help_template = { build_help_string() },
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
// The help template documents every action, so clap's `help` subcommand is not needed.
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// The raw arguments; the dispatcher decides which action they belong to.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Maps an error that reached the top level to the process exit code.
///
/// Execution errors carry their own code (the failing command's code, 127 for launch
/// failures, 130 for interrupts). Graph and targets-file errors are configuration
/// errors detected before any command runs.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    if let Some(execution_error) = error.downcast_ref::<ExecutionError>() {
        return execution_error.exit_code();
    }
    if error.downcast_ref::<ResolveError>().is_some()
        || error.downcast_ref::<RegistryError>().is_some()
        || error.downcast_ref::<ConfigError>().is_some()
    {
        return EXIT_CONFIG_ERROR;
    }
    EXIT_FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{EXIT_CANCELLED, EXIT_SPAWN_FAILURE};
    use anyhow::Context;

    #[test]
    fn test_exit_codes_by_error_kind() {
        let failed = anyhow::Error::new(ExecutionError::NonZeroExit {
            target: "test".into(),
            command: "pytest tests".into(),
            code: 5,
        });
        assert_eq!(exit_code(&failed), 5);

        let cancelled = anyhow::Error::new(ExecutionError::Cancelled {
            target: "test".into(),
            command: None,
        });
        assert_eq!(exit_code(&cancelled), EXIT_CANCELLED);

        let spawn = anyhow::Error::new(ExecutionError::Spawn {
            target: "lint".into(),
            command: "ruff".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        assert_eq!(exit_code(&spawn), EXIT_SPAWN_FAILURE);

        let unknown = anyhow::Error::new(ResolveError::UnknownTarget {
            name: "bogus".into(),
            required_by: None,
        });
        assert_eq!(exit_code(&unknown), EXIT_CONFIG_ERROR);

        let duplicate = anyhow::Error::new(RegistryError::DuplicateTarget("lint".into()));
        assert_eq!(exit_code(&duplicate), EXIT_CONFIG_ERROR);

        assert_eq!(exit_code(&anyhow::anyhow!("something else")), EXIT_FAILURE);
    }

    #[test]
    fn test_exit_code_survives_added_context() {
        let result: Result<(), ResolveError> = Err(ResolveError::CyclicDependency {
            cycle: vec!["a".into(), "a".into()],
        });
        let error = result.context("while planning 'a'").unwrap_err();
        assert_eq!(exit_code(&error), EXIT_CONFIG_ERROR);
    }

    #[test]
    fn test_cli_keeps_hyphenated_arguments() {
        let cli = Cli::try_parse_from(["phony", "run", "test", "--dry-run"]).unwrap();
        assert_eq!(cli.args, ["run", "test", "--dry-run"]);

        let cli = Cli::try_parse_from(["phony", "--file", "ci.toml", "lint"]).unwrap();
        assert_eq!(cli.args, ["--file", "ci.toml", "lint"]);
    }
}
