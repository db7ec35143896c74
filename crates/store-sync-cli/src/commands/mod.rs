//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function. Commands print
//! user-facing results to stdout and return how the process should exit.

pub mod export;
pub mod files;
pub mod import;
pub mod verify;

/// Exit status of a command that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// The command finished but found problems (LOW counts, failed records
    /// under `--fail-on-errors`).
    Failure,
}

impl CommandStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            CommandStatus::Success => 0,
            CommandStatus::Failure => 1,
        }
    }
}
