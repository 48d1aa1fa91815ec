//! `phony plan`: what `run` would do, without running it.

use crate::{
    CancellationToken,
    cli::handlers::commons::{self, RegistryArgs},
    core::{graph_display, resolver},
};
use anyhow::Result;
use clap::Parser;
use colored::*;

#[derive(Parser, Debug, Default)]
#[command(
    name = "phony plan",
    no_binary_name = true,
    about = "Shows the execution plan of a target without running it."
)]
struct PlanArgs {
    /// The target to plan.
    target: String,

    /// Show the dependency tree instead of the flat execution order.
    #[arg(long, short)]
    tree: bool,

    #[command(flatten)]
    source: RegistryArgs,
}

/// Main entry point for the `plan` action. Nothing is executed.
pub fn handle(args: Vec<String>, _cancellation_token: &CancellationToken) -> Result<()> {
    let plan_args = PlanArgs::try_parse_from(&args)?;
    let registry = commons::load_registry(&plan_args.source)?;

    if plan_args.tree {
        graph_display::display_dependency_tree(&registry, &plan_args.target)?;
        return Ok(());
    }

    let plan = resolver::resolve(&registry, &plan_args.target)?;
    println!(
        "{}",
        format!(
            t!("plan.header"),
            target = plan_args.target.cyan(),
            source = registry.source()
        )
        .bold()
    );

    for (i, name) in plan.iter().enumerate() {
        println!("  {}. {}", i + 1, name.yellow());
        let target = registry.lookup(name)?;
        for command in &target.commands {
            println!("       {}", command.to_string().dimmed());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_args_tree_flag() {
        let args = PlanArgs::try_parse_from(["ci", "--tree"]).unwrap();
        assert_eq!(args.target, "ci");
        assert!(args.tree);
    }

    #[test]
    fn test_usage_names_the_action() {
        let err = PlanArgs::try_parse_from(Vec::<String>::new()).unwrap_err();
        assert!(err.render().to_string().contains("Usage: phony plan"));
    }
}
