//! Store Sync CLI - Main entry point

use clap::Parser;
use std::process;
use store_sync_cli::{Cli, CommandStatus, Commands};
use store_sync_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    let Some(command) = cli.command.as_ref() else {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    };

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("store-sync")
        .build();

    // Environment variables take precedence over flags
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _ = init_logging(&log_config);

    match execute_command(command).await {
        Ok(status) => process::exit(status.exit_code()),
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            process::exit(if e.is_config() { 2 } else { 1 });
        }
    }
}

/// Execute the CLI command
async fn execute_command(command: &Commands) -> store_sync_cli::Result<CommandStatus> {
    use store_sync_cli::commands;

    match command {
        Commands::Export {
            env,
            out,
            only,
            dry_run,
        } => commands::export::run(env, out, only.as_deref(), *dry_run).await,

        Commands::Import {
            env,
            input,
            error_log,
            only,
            dry_run,
            fail_on_errors,
        } => {
            commands::import::run(
                env,
                input,
                error_log,
                only.as_deref(),
                *dry_run,
                *fail_on_errors,
            )
            .await
        }

        Commands::Files {
            env,
            input,
            error_log,
            dry_run,
        } => commands::files::run(env, input, error_log, *dry_run).await,

        Commands::Verify { prod, dev, dry_run } => {
            commands::verify::run(prod, dev, *dry_run).await
        }
    }
}
