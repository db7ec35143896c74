//! Build automation tasks for store-sync
//!
//! - Generating the CLI reference from the clap definitions

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for store-sync", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in Markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<store_sync_cli::Cli>();

    let content = format!(
        r#"# store-sync CLI Reference

This documentation is generated from the CLI source code. Last updated: {}.

## Overview

`store-sync` copies storefront content (products, collections, pages, blogs,
articles, metaobjects and files) from a production store to a development
store through the Admin API, then compares record counts between the two.

## Quick Start

```bash
# Export everything from the store in .env
store-sync export --env .env --out outputs/store_sync

# Import the run into the store in env.dev
store-sync import --env env.dev --input outputs/store_sync/20260101-120000

# Re-create Admin files
store-sync files --env env.dev --input outputs/store_sync/20260101-120000

# Compare counts
store-sync verify --prod .env --dev env.dev
```

## Commands

{}

## Store Env Files

- `SHOPIFY_SHOP` - shop name or `*.myshopify.com` domain (required)
- `SHOPIFY_ADMIN_ACCESS_TOKEN` - Admin API access token (required)
- `SHOPIFY_ADMIN_API_VERSION` - Admin API version (default: `2026-01`)
- `SHOPIFY_ADMIN_BASE_URL` - override of the Admin API base URL

## Environment Variables

- `STORE_SYNC_API_TIMEOUT_SECS` - per-request timeout (default: 30)
- `STORE_SYNC_DOWNLOAD_TIMEOUT_SECS` - artifact download timeout (default: 300)
- `STORE_SYNC_POLL_INTERVAL_MS` - bulk operation poll interval (default: 2000)
- `STORE_SYNC_THROTTLE_MS` - pause after each imported record (default: 100)
- `STORE_SYNC_FILES_THROTTLE_MS` - pause after each created file (default: 200)
- `STORE_SYNC_LOG_LEVEL`, `STORE_SYNC_LOG_OUTPUT`, `STORE_SYNC_LOG_FORMAT`,
  `STORE_SYNC_LOG_DIR`, `STORE_SYNC_LOG_FILTER` - logging overrides

---

*This documentation is generated from the CLI source code. To update, run `cargo run -p xtask -- generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli.md");
    fs::write(&file_path, content)?;

    println!("✅ Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
