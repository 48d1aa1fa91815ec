//! `phony list`: the declared targets in declaration order.

use crate::{
    CancellationToken,
    cli::handlers::commons::{self, RegistryArgs},
};
use anyhow::Result;
use clap::Parser;
use colored::*;

#[derive(Parser, Debug, Default)]
#[command(
    name = "phony list",
    no_binary_name = true,
    about = "Lists the declared targets."
)]
struct ListArgs {
    #[command(flatten)]
    source: RegistryArgs,
}

/// Main entry point for the `list` action.
pub fn handle(args: Vec<String>, _cancellation_token: &CancellationToken) -> Result<()> {
    let list_args = ListArgs::try_parse_from(&args)?;
    let registry = commons::load_registry(&list_args.source)?;

    if registry.is_empty() {
        println!("{}", t!("list.empty").yellow());
        return Ok(());
    }

    println!(
        "\n{}",
        format!(t!("list.header"), source = registry.source()).bold()
    );

    let width = registry.iter().map(|t| t.name.len()).max().unwrap_or(0);
    for target in registry.iter() {
        let padded = format!("{:<width$}", target.name, width = width);
        let mut line = format!("  {}", padded.cyan());
        if let Some(description) = &target.description {
            line.push_str(&format!("  {}", description));
        }
        if !target.dependencies.is_empty() {
            let after = format!("({} {})", t!("list.label.after"), target.dependencies.join(", "));
            line.push_str(&format!("  {}", after.dimmed()));
        }
        println!("{}", line);
    }
    Ok(())
}
