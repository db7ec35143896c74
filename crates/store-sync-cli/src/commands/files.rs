//! `store-sync files` command implementation

use crate::api::AdminClient;
use crate::commands::CommandStatus;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::files::FilesTransfer;
use crate::progress;
use colored::Colorize;
use std::path::Path;
use store_sync_common::StoreEnv;

/// Re-create the files listed in `input/files.jsonl` on the store in `env_path`
pub async fn run(
    env_path: &Path,
    input: &Path,
    error_log: &Path,
    dry_run: bool,
) -> Result<CommandStatus> {
    let env = StoreEnv::load(env_path)?;
    let config = SyncConfig::from_env();
    let client = AdminClient::new(&env, &config)?;

    let summary = FilesTransfer::new(&client, config.files_throttle, dry_run)
        .with_progress(progress::create_progress_bar("files"))
        .run(input, error_log)
        .await?;

    if summary.dry_run {
        println!("files: {}", summary.total);
        return Ok(CommandStatus::Success);
    }

    println!("files: created {}, failed {}", summary.created, summary.failed);
    if summary.failed > 0 {
        println!(
            "{} {} failure(s) logged to {}",
            "!".yellow().bold(),
            summary.failed,
            summary.error_log.display()
        );
    }
    Ok(CommandStatus::Success)
}
