// src/core/graph_display.rs

//! Text rendering of a target's dependency tree.

use crate::core::{
    registry::Registry,
    resolver::{self, ResolveError},
};
use std::collections::HashSet;

/// Renders the dependency tree of `root` as ASCII art.
///
/// The graph is resolved first, so unknown targets and cycles are reported instead of
/// drawn. A target reached a second time is printed once more with a `(*)` marker and
/// its subtree is not repeated.
pub fn render_dependency_tree(registry: &Registry, root: &str) -> Result<String, ResolveError> {
    resolver::resolve(registry, root)?;

    let mut out = String::new();
    let mut expanded = HashSet::new();
    out.push_str(&format!("{}\n", root));
    expanded.insert(root.to_string());
    render_children(registry, root, "", &mut expanded, &mut out);
    Ok(out)
}

/// Prints the dependency tree of `root` to stdout.
pub fn display_dependency_tree(registry: &Registry, root: &str) -> Result<(), ResolveError> {
    print!("{}", render_dependency_tree(registry, root)?);
    Ok(())
}

fn render_children(
    registry: &Registry,
    name: &str,
    prefix: &str,
    expanded: &mut HashSet<String>,
    out: &mut String,
) {
    let Ok(target) = registry.lookup(name) else {
        return;
    };

    let count = target.dependencies.len();
    for (i, dependency) in target.dependencies.iter().enumerate() {
        let is_last = i + 1 == count;
        let connector = if is_last { "└─" } else { "├─" };

        if !expanded.insert(dependency.clone()) {
            out.push_str(&format!("{}{}{} (*)\n", prefix, connector, dependency));
            continue;
        }
        out.push_str(&format!("{}{}{}\n", prefix, connector, dependency));

        let child_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
        render_children(registry, dependency, &child_prefix, expanded, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::RegistrySource;
    use crate::models::Target;

    fn registry(decls: &[(&str, &[&str])]) -> Registry {
        let mut registry = Registry::new(RegistrySource::BuiltIn);
        for (name, deps) in decls {
            registry
                .register(Target::new(*name, deps.iter().copied(), Vec::new()))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_tree_marks_repeated_subtrees() {
        let reg = registry(&[
            ("install", &[]),
            ("lint", &["install"]),
            ("test", &["install"]),
            ("ci", &["lint", "test"]),
        ]);

        let tree = render_dependency_tree(&reg, "ci").unwrap();

        let expected = "\
ci
├─lint
│  └─install
└─test
   └─install (*)
";
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_leaf_target_renders_alone() {
        let reg = registry(&[("lint", &[])]);
        assert_eq!(render_dependency_tree(&reg, "lint").unwrap(), "lint\n");
    }

    #[test]
    fn test_cycles_are_not_drawn() {
        let reg = registry(&[("a", &["b"]), ("b", &["a"])]);
        assert!(matches!(
            render_dependency_tree(&reg, "a"),
            Err(ResolveError::CyclicDependency { .. })
        ));
    }
}
