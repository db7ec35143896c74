//! `store-sync verify` command implementation
//!
//! Prints one line per count target and exits non-zero if the target store
//! holds fewer records than the source for any of them.

use crate::api::AdminClient;
use crate::commands::CommandStatus;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::verify::{self, CountRow, CountStatus};
use colored::{ColoredString, Colorize};
use std::path::Path;
use store_sync_common::StoreEnv;
use tracing::warn;

/// Compare record counts between the stores in `prod` and `dev`
pub async fn run(prod: &Path, dev: &Path, dry_run: bool) -> Result<CommandStatus> {
    if dry_run {
        println!("dry-run");
        return Ok(CommandStatus::Success);
    }

    let config = SyncConfig::from_env();
    let source = AdminClient::new(&StoreEnv::load(prod)?, &config)?;
    let target = AdminClient::new(&StoreEnv::load(dev)?, &config)?;

    let report = verify::compare(&source, &target).await;
    for row in &report.rows {
        println!(
            "{}: prod={} dev={} {}",
            row.target,
            row.source,
            row.dest,
            status_label(row)
        );
    }

    if report.is_ok() {
        Ok(CommandStatus::Success)
    } else {
        let low: Vec<&str> = report.low().map(|r| r.target.as_str()).collect();
        warn!(low = ?low, "Target store is missing records");
        Ok(CommandStatus::Failure)
    }
}

fn status_label(row: &CountRow) -> ColoredString {
    let status = row.status();
    match status {
        CountStatus::Ok => status.to_string().green(),
        CountStatus::Low => status.to_string().red().bold(),
    }
}
