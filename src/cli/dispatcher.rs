//! Routes raw arguments to a system action or to `run`.

use anyhow::Result;

use crate::{CancellationToken, cli::handlers};

/// Defines a system action, its aliases, and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &CancellationToken) -> Result<()>,
}

/// The single source of truth for all system actions.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "list",
        aliases: &["ls"],
        handler: handlers::list::handle,
    },
    CommandDefinition {
        name: "plan",
        aliases: &[],
        handler: handlers::plan::handle,
    },
    CommandDefinition {
        name: "run",
        aliases: &[],
        handler: handlers::run::handle,
    },
];

/// Finds an action definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Splits the raw arguments into the action to perform and the arguments for it.
///
/// - `phony` lists the available targets.
/// - `phony <action> [args...]` runs a system action (`run`, `plan`, `list`).
/// - `phony <target> [args...]` is a shortcut for `phony run <target> [args...]`.
///
/// System actions take precedence, so a target named like an action must be run
/// with an explicit `phony run <target>`.
fn route(all_args: Vec<String>) -> (&'static str, Vec<String>) {
    let mut args = all_args.into_iter();
    match args.next() {
        None => ("list", Vec::new()),
        Some(first) => match find_command(&first) {
            Some(command) => (command.name, args.collect()),
            None => {
                let mut run_args = vec![first];
                run_args.extend(args);
                ("run", run_args)
            }
        },
    }
}

/// The main application dispatcher.
pub fn dispatch(all_args: Vec<String>, cancellation_token: &CancellationToken) -> Result<()> {
    log::debug!("Dispatching args: {:?}", all_args);

    let (action, handler_args) = route(all_args);
    match find_command(action) {
        Some(command) => (command.handler)(handler_args, cancellation_token),
        None => handlers::run::handle(handler_args, cancellation_token),
    }
}
