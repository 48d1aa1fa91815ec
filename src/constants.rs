// src/constants.rs

//! Crate-wide constants.

/// The name of the targets file looked up in the current directory.
pub const TARGETS_FILENAME: &str = "phony.toml";

/// Environment variable that points at an explicit targets file.
pub const TARGETS_FILE_ENV: &str = "PHONY_FILE";

/// Exit code for a run that failed without a usable exit code from the command.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for configuration errors detected before any command runs
/// (unknown target, cyclic dependency, duplicate target, invalid targets file).
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Exit code when a command could not be launched at all.
pub const EXIT_SPAWN_FAILURE: i32 = 127;

/// Exit code for an operator interrupt.
pub const EXIT_CANCELLED: i32 = 130;

/// How long an interrupted subprocess may take to exit before it is killed.
pub const CANCEL_GRACE_PERIOD_MS: u64 = 3000;
