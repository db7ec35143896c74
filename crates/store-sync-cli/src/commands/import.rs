//! `store-sync import` command implementation

use crate::api::AdminClient;
use crate::commands::CommandStatus;
use crate::config::SyncConfig;
use crate::error::{CliError, Result};
use crate::export::parse_only;
use crate::import::{EntityKind, ImportDriver, ImportOptions, ImportSummary};
use crate::progress;
use colored::Colorize;
use std::path::Path;
use store_sync_common::StoreEnv;
use tracing::warn;

/// Entity types selected by `--only`; no selection imports everything.
pub fn selected_kinds(only: Option<&str>) -> Result<Vec<EntityKind>> {
    match only.filter(|list| !list.trim().is_empty()) {
        None => Ok(EntityKind::IMPORT_ORDER.to_vec()),
        Some(list) => EntityKind::from_resources(&parse_only(Some(list))?),
    }
}

/// Import the export directory `input` into the store in `env_path`
pub async fn run(
    env_path: &Path,
    input: &Path,
    error_log: &Path,
    only: Option<&str>,
    dry_run: bool,
    fail_on_errors: bool,
) -> Result<CommandStatus> {
    let kinds = selected_kinds(only)?;
    let env = StoreEnv::load(env_path)?;
    if !input.is_dir() {
        return Err(CliError::config(format!(
            "Missing input directory: {}",
            input.display()
        )));
    }

    let config = SyncConfig::from_env();
    let client = AdminClient::new(&env, &config)?;
    let options = ImportOptions {
        dry_run,
        throttle: config.throttle,
        only: kinds,
    };

    if !dry_run {
        println!("{} Importing into {}", "→".cyan(), env.shop_domain());
    }
    let summary = ImportDriver::new(&client, options, error_log)
        .with_progress(progress::create_progress_bar("importing"))
        .run(input)
        .await?;

    print_summary(&summary);

    let failures = summary.failures();
    if failures > 0 {
        warn!(failures, error_log = %summary.error_log.display(), "Import finished with failures");
        if fail_on_errors {
            return Ok(CommandStatus::Failure);
        }
    }
    Ok(CommandStatus::Success)
}

fn print_summary(summary: &ImportSummary) {
    if summary.tallies.is_empty() {
        println!("Nothing to import.");
        return;
    }

    for (kind, tally) in &summary.tallies {
        if summary.dry_run {
            println!(
                "{}: planned {}, skipped {}, failed {}",
                kind, tally.planned, tally.skipped, tally.failed
            );
        } else {
            println!(
                "{}: created {}, updated {}, skipped {}, failed {}",
                kind, tally.created, tally.updated, tally.skipped, tally.failed
            );
        }
    }

    match summary.failures() {
        0 => println!("\n{} Import finished without failures", "✓".green().bold()),
        n => println!(
            "\n{} {} failure(s) logged to {}",
            "!".yellow().bold(),
            n,
            summary.error_log.display()
        ),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_kinds() {
        assert_eq!(selected_kinds(None).unwrap(), EntityKind::IMPORT_ORDER.to_vec());
        assert_eq!(selected_kinds(Some(" ")).unwrap(), EntityKind::IMPORT_ORDER.to_vec());
        assert_eq!(
            selected_kinds(Some("articles,blogs")).unwrap(),
            vec![EntityKind::Blog, EntityKind::Article]
        );
        assert!(selected_kinds(Some("files")).unwrap_err().is_config());
        assert!(selected_kinds(Some("gadgets")).unwrap_err().is_config());
    }
}
