//! Store Sync CLI Library
//!
//! Copies storefront content from a production store to a development store
//! through the Admin API, then checks the result.
//!
//! # Overview
//!
//! - **Export**: bulk query jobs write one JSON Lines artifact per resource (`store-sync export`)
//! - **Import**: handle-matched create-or-update of every exported record (`store-sync import`)
//! - **Files**: re-create Admin files from their public URLs (`store-sync files`)
//! - **Verify**: compare record counts between both stores (`store-sync verify`)

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod files;
pub mod import;
pub mod jsonl;
pub mod progress;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use commands::CommandStatus;
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Store Sync - copy storefront content between stores
#[derive(Parser, Debug)]
#[command(name = "store-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the CLI reference as Markdown and exit
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export store data with bulk operations
    Export {
        /// Source store env file
        #[arg(long, default_value = ".env")]
        env: PathBuf,

        /// Root directory for export runs
        #[arg(long, default_value = config::DEFAULT_EXPORT_DIR)]
        out: PathBuf,

        /// Comma-separated resources (products, collections, pages, blogs, articles, metaobjects, files)
        #[arg(long)]
        only: Option<String>,

        /// List the planned exports without contacting the store
        #[arg(long)]
        dry_run: bool,
    },

    /// Import an export directory into the target store
    Import {
        /// Target store env file
        #[arg(long, default_value = "env.dev")]
        env: PathBuf,

        /// Export run directory to import
        #[arg(long)]
        input: PathBuf,

        /// File receiving one line per failed record
        #[arg(long, default_value = config::DEFAULT_ERROR_LOG)]
        error_log: PathBuf,

        /// Comma-separated entity types (products, collections, blogs, articles, pages, metaobjects)
        #[arg(long)]
        only: Option<String>,

        /// Plan every record without writing to the store
        #[arg(long)]
        dry_run: bool,

        /// Exit with status 1 when any record failed
        #[arg(long)]
        fail_on_errors: bool,
    },

    /// Re-create exported Admin files on the target store
    Files {
        /// Target store env file
        #[arg(long, default_value = "env.dev")]
        env: PathBuf,

        /// Export run directory containing files.jsonl
        #[arg(long)]
        input: PathBuf,

        /// File receiving one line per failed file
        #[arg(long, default_value = config::DEFAULT_ERROR_LOG)]
        error_log: PathBuf,

        /// Count the files without contacting the store
        #[arg(long)]
        dry_run: bool,
    },

    /// Compare record counts between the source and target stores
    Verify {
        /// Source store env file
        #[arg(long, default_value = ".env")]
        prod: PathBuf,

        /// Target store env file
        #[arg(long, default_value = "env.dev")]
        dev: PathBuf,

        /// Print `dry-run` and exit without contacting either store
        #[arg(long)]
        dry_run: bool,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_import_defaults() {
        let cli = Cli::parse_from(["store-sync", "import", "--input", "outputs/store_sync/run"]);
        match cli.command {
            Some(Commands::Import {
                env,
                error_log,
                dry_run,
                fail_on_errors,
                ..
            }) => {
                assert_eq!(env, PathBuf::from("env.dev"));
                assert_eq!(error_log, PathBuf::from(config::DEFAULT_ERROR_LOG));
                assert!(!dry_run);
                assert!(!fail_on_errors);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
