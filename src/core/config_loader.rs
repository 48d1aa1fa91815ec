//! # Config Loader
//!
//! Builds the `Registry` for an invocation, either from a `phony.toml` targets file or
//! from the built-in declaration of the project's development targets.
use crate::{
    core::{
        paths::{self, PathError},
        registry::{Registry, RegistryError, RegistrySource},
    },
    models::{CommandLine, Target, TargetsFile, TomlCommand, TomlTarget},
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read targets file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse targets file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Target '{target}' declares a command that could not be parsed: {command}")]
    InvalidCommand { target: String, command: String },
    #[error("Target '{target}' declares an empty command.")]
    EmptyCommand { target: String },
    #[error("Target '{target}' has an invalid working directory: {source}")]
    WorkingDirectory {
        target: String,
        #[source]
        source: PathError,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

// --- Built-in declaration ---

/// A target compiled into the binary. Commands are stored as argument vectors.
struct BuiltinTarget {
    name: &'static str,
    description: &'static str,
    commands: &'static [&'static [&'static str]],
}

/// The development targets of the project, used when no targets file is present.
static BUILTIN_TARGETS: &[BuiltinTarget] = &[
    BuiltinTarget {
        name: "install",
        description: "Editable install of the current project",
        commands: &[&["uv", "pip", "install", "-e", "."]],
    },
    BuiltinTarget {
        name: "install-dev",
        description: "Sync every optional dependency group, then install in editable mode",
        commands: &[
            &["uv", "sync", "--all-extras"],
            &["uv", "pip", "install", "-e", "."],
        ],
    },
    BuiltinTarget {
        name: "lint",
        description: "Check sources and tests with the linter",
        commands: &[&["ruff", "check", "src", "tests"]],
    },
    BuiltinTarget {
        name: "format",
        description: "Rewrite sources and tests with the formatter",
        commands: &[&["ruff", "format", "src", "tests"]],
    },
    BuiltinTarget {
        name: "test",
        description: "Run the test suite",
        commands: &[&["pytest", "tests"]],
    },
    BuiltinTarget {
        name: "test-cov",
        description: "Run the test suite with coverage",
        commands: &[&["pytest", "--cov=src", "tests"]],
    },
    BuiltinTarget {
        name: "clean",
        description: "Remove caches left by the tooling",
        commands: &[&["python", "scripts/clean.py"]],
    },
];

/// Builds the registry from the built-in declaration.
pub fn builtin_registry() -> Result<Registry, ConfigError> {
    let mut registry = Registry::new(RegistrySource::BuiltIn);
    for builtin in BUILTIN_TARGETS {
        let commands = builtin
            .commands
            .iter()
            .map(|argv| {
                CommandLine::from_argv(argv.iter().map(|s| s.to_string()).collect()).ok_or_else(
                    || ConfigError::EmptyCommand {
                        target: builtin.name.to_string(),
                    },
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let target = Target::new(builtin.name, Vec::<String>::new(), commands)
            .with_description(builtin.description);
        registry.register(target)?;
    }
    Ok(registry)
}

// --- Targets file ---

/// Loads the registry for an invocation: the explicit file if given, `phony.toml`
/// in `cwd` if present, and the built-in declaration otherwise.
pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Registry, ConfigError> {
    match paths::locate_targets_file(explicit, cwd) {
        Some(path) => load_file(&path),
        None => {
            log::debug!("No targets file in '{}', using built-in targets.", cwd.display());
            builtin_registry()
        }
    }
}

/// Reads and compiles a targets file. Relative working directories are anchored at
/// the file's directory.
pub fn load_file(path: &Path) -> Result<Registry, ConfigError> {
    log::debug!("Loading targets file '{}'.", path.display());
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    load_from_str(
        &content,
        RegistrySource::File(path.to_path_buf()),
        base_dir,
    )
}

/// Compiles targets-file content into a registry.
pub fn load_from_str(
    content: &str,
    source: RegistrySource,
    base_dir: &Path,
) -> Result<Registry, ConfigError> {
    let file: TargetsFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: match &source {
            RegistrySource::File(path) => path.clone(),
            RegistrySource::BuiltIn => PathBuf::from("<inline>"),
        },
        source: e,
    })?;

    let mut registry = Registry::new(source);
    for toml_target in file.targets {
        registry.register(compile_target(toml_target, base_dir)?)?;
    }
    log::debug!("Loaded {} target(s) from {}.", registry.len(), registry.source());
    Ok(registry)
}

/// Turns a `[[target]]` table into a runtime `Target`.
fn compile_target(toml_target: TomlTarget, base_dir: &Path) -> Result<Target, ConfigError> {
    let TomlTarget {
        name,
        description,
        deps,
        commands,
        working_directory,
        env,
        silent,
    } = toml_target;

    let commands = commands
        .into_iter()
        .map(|command| compile_command(&name, command))
        .collect::<Result<Vec<_>, _>>()?;

    let working_directory = working_directory
        .map(|template| {
            paths::expand_working_directory(&template, base_dir).map_err(|e| {
                ConfigError::WorkingDirectory {
                    target: name.clone(),
                    source: e,
                }
            })
        })
        .transpose()?;

    Ok(Target {
        description,
        dependencies: deps,
        commands,
        phony: true,
        working_directory,
        env: env.into_iter().collect(),
        silent,
        name,
    })
}

fn compile_command(target: &str, command: TomlCommand) -> Result<CommandLine, ConfigError> {
    match command {
        TomlCommand::Line(line) => {
            if line.trim().is_empty() {
                return Err(ConfigError::EmptyCommand {
                    target: target.to_string(),
                });
            }
            CommandLine::parse(&line).ok_or(ConfigError::InvalidCommand {
                target: target.to_string(),
                command: line,
            })
        }
        TomlCommand::Argv(argv) => {
            CommandLine::from_argv(argv).ok_or_else(|| ConfigError::EmptyCommand {
                target: target.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_inline(content: &str) -> Result<Registry, ConfigError> {
        load_from_str(content, RegistrySource::BuiltIn, Path::new("/work"))
    }

    #[test]
    fn test_builtin_declaration_matches_the_project_targets() {
        let registry = builtin_registry().unwrap();
        let names: Vec<&str> = registry.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            ["install", "install-dev", "lint", "format", "test", "test-cov", "clean"]
        );
        assert!(registry.iter().all(|t| t.phony && t.dependencies.is_empty()));

        let install_dev = registry.lookup("install-dev").unwrap();
        let rendered: Vec<String> = install_dev.commands.iter().map(|c| c.to_string()).collect();
        assert_eq!(rendered, ["uv sync --all-extras", "uv pip install -e ."]);
    }

    #[test]
    fn test_full_target_table() {
        let registry = load_inline(
            r#"
            [[target]]
            name = "install"
            commands = ["uv pip install -e ."]

            [[target]]
            name = "docs"
            description = "Build the docs"
            deps = ["install"]
            commands = [["mkdocs", "build", "--strict"], "echo 'docs built'"]
            working_directory = "docs"
            env = { NO_COLOR = "1" }
            silent = true
            "#,
        )
        .unwrap();

        let docs = registry.lookup("docs").unwrap();
        assert_eq!(docs.description.as_deref(), Some("Build the docs"));
        assert_eq!(docs.dependencies, ["install"]);
        assert_eq!(docs.commands.len(), 2);
        assert_eq!(docs.commands[0].program(), "mkdocs");
        assert_eq!(docs.commands[1].args(), ["docs built"]);
        assert_eq!(docs.working_directory.as_deref(), Some(Path::new("/work/docs")));
        assert_eq!(docs.env, [("NO_COLOR".to_string(), "1".to_string())]);
        assert!(docs.silent);
        assert!(docs.phony);
    }

    #[test]
    fn test_dependencies_alias_is_accepted() {
        let registry = load_inline(
            r#"
            [[target]]
            name = "a"
            dependencies = ["b"]
            "#,
        )
        .unwrap();
        assert_eq!(registry.lookup("a").unwrap().dependencies, ["b"]);
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let err = load_inline(
            r#"
            [[target]]
            name = "lint"
            commands = ["ruff check src"]

            [[target]]
            name = "lint"
            commands = ["ruff check tests"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Registry(RegistryError::DuplicateTarget(ref name)) if name == "lint"
        ));
    }

    #[test]
    fn test_empty_commands_are_rejected() {
        let err = load_inline(
            r#"
            [[target]]
            name = "noop"
            commands = ["   "]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyCommand { ref target } if target == "noop"));

        let err = load_inline(
            r#"
            [[target]]
            name = "noop"
            commands = [[]]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyCommand { .. }));
    }

    #[test]
    fn test_unbalanced_quotes_are_rejected() {
        let err = load_inline(
            r#"
            [[target]]
            name = "broken"
            commands = ["echo 'unterminated"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCommand { .. }));
    }

    #[test]
    fn test_unknown_dependencies_are_left_to_the_resolver() {
        let registry = load_inline(
            r#"
            [[target]]
            name = "test"
            deps = ["missing"]
            "#,
        )
        .unwrap();
        assert!(registry.contains("test"));
        assert!(!registry.contains("missing"));
    }

    #[test]
    fn test_load_prefers_targets_file_over_builtin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(crate::constants::TARGETS_FILENAME),
            "[[target]]\nname = \"hello\"\ncommands = [\"echo hello\"]\n",
        )
        .unwrap();

        let registry = load(None, dir.path()).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(matches!(registry.source(), RegistrySource::File(_)));
    }

    #[test]
    fn test_load_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let registry = load(None, dir.path()).unwrap();
        assert_eq!(registry.source(), &RegistrySource::BuiltIn);
        assert!(registry.contains("install-dev"));
    }

    #[test]
    fn test_missing_explicit_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(Path::new("nope.toml")), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let err = load_inline("[[target]\nname = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
