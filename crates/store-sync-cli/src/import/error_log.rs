//! Append-only import failure log
//!
//! One line per failed record: `{entity} {handle}: {detail}`. The file and
//! its parent directory are created on the first failure, so a clean run
//! leaves nothing behind.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug)]
pub struct ErrorLog {
    path: PathBuf,
    written: usize,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines appended by this run.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Format one log line. Line breaks inside `detail` are flattened so a
    /// failure always occupies exactly one line.
    pub fn format_line(entity: &str, handle: &str, detail: &str) -> String {
        let detail = detail.replace(['\r', '\n'], " ");
        format!("{} {}: {}", entity, handle, detail.trim())
    }

    pub async fn append(&mut self, entity: &str, handle: &str, detail: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut line = Self::format_line(entity, handle, detail);
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        self.written += 1;
        Ok(())
    }
}
