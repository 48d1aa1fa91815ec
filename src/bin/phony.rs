// src/bin/phony.rs

use clap::Parser;
use colored::*;
use phony::{
    CancellationToken,
    cli::{self, Cli, dispatcher},
    constants::EXIT_CANCELLED,
    t,
};

/// The main entry point of `phony`.
/// Sets up logging, parses arguments, dispatches to the right handler and turns
/// whatever error comes back into an exit code.
fn main() {
    env_logger::init();
    let cancellation_token = CancellationToken::new();

    let cli = Cli::parse();
    log::debug!("CLI args parsed: {:?}", cli);

    if let Err(e) = dispatcher::dispatch(cli.args, &cancellation_token) {
        // Handlers parse their own arguments; let clap print help, version and usage errors.
        if let Some(clap_error) = e.downcast_ref::<clap::Error>() {
            clap_error.exit();
        }

        let code = cli::exit_code(&e);
        if code == EXIT_CANCELLED {
            eprintln!("\n{}", t!("main.interrupted").yellow());
        } else {
            eprintln!("\n{}: {}", t!("main.error").red().bold(), e);
        }
        std::process::exit(code);
    }
}
