//! `store-sync export` command implementation
//!
//! Exports the selected resources from the source store into a fresh
//! timestamped directory and prints that directory.

use crate::api::AdminClient;
use crate::commands::CommandStatus;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::export::{parse_only, BulkExporter, ExportOutcome};
use crate::progress;
use chrono::Local;
use colored::Colorize;
use std::path::{Path, PathBuf};
use store_sync_common::StoreEnv;
use tracing::info;

/// Name of the run directory created under `--out`.
pub fn run_dir_name() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Export resources from the store in `env_path` into `out`
pub async fn run(
    env_path: &Path,
    out: &Path,
    only: Option<&str>,
    dry_run: bool,
) -> Result<CommandStatus> {
    let resources = parse_only(only)?;
    let env = StoreEnv::load(env_path)?;

    if dry_run {
        println!("Planned bulk exports:");
        for resource in &resources {
            println!("- {}", resource);
        }
        return Ok(CommandStatus::Success);
    }

    let config = SyncConfig::from_env();
    let client = AdminClient::new(&env, &config)?;

    let run_dir: PathBuf = out.join(run_dir_name());
    tokio::fs::create_dir_all(&run_dir).await?;
    info!(base_url = client.base_url(), dir = %run_dir.display(), "Export started");
    println!("{} Exporting from {}", "→".cyan(), env.shop_domain());

    let spinner = progress::create_spinner("submitting");
    let exporter = BulkExporter::new(&client, config.poll_interval).with_spinner(spinner.clone());

    for resource in resources {
        spinner.set_prefix(resource.to_string());
        spinner.set_message("submitting");
        let artifacts = match exporter.export_resource(resource, &run_dir).await {
            Ok(artifacts) => artifacts,
            Err(err) => {
                spinner.finish_and_clear();
                return Err(err);
            }
        };

        for artifact in artifacts {
            spinner.suspend(|| match artifact.outcome {
                ExportOutcome::Downloaded { bytes, .. } => println!(
                    "{} {} ({})",
                    "✓".green(),
                    artifact.label,
                    progress::format_bytes(bytes)
                ),
                ExportOutcome::Empty => {
                    println!("{} {} (no objects)", "-".yellow(), artifact.label)
                }
            });
        }
    }
    spinner.finish_and_clear();

    println!("{}", run_dir.display());
    Ok(CommandStatus::Success)
}
