//! Files transfer: re-create exported Admin files on the target store
//!
//! The target fetches each file from its public URL, so nothing is
//! downloaded locally. Every file is its own failure boundary, like records
//! in an import pass.

use crate::api::types::{describe_user_errors, user_errors};
use crate::api::AdminApi;
use crate::error::{CliError, Result};
use crate::import::ErrorLog;
use crate::jsonl::{Decoded, FileRecord, JsonlFile};
use indicatif::ProgressBar;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Artifact read by the files transfer.
pub const FILES_ARTIFACT: &str = "files.jsonl";

const FILE_CREATE: &str = r#"mutation ($files: [FileCreateInput!]!) {
  fileCreate(files: $files) {
    files { id }
    userErrors { field message }
  }
}"#;

/// A file to re-create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    pub url: String,
    pub alt: Option<String>,
}

impl FileSource {
    /// Generic files carry `url`; images carry `image.url` and `image.altText`.
    pub fn from_record(record: &FileRecord) -> Option<Self> {
        if let Some(url) = record.url.as_deref().filter(|u| !u.is_empty()) {
            return Some(Self {
                url: url.to_string(),
                alt: record.alt.clone(),
            });
        }
        let image = record.image.as_ref()?;
        let url = image.url.as_deref().filter(|u| !u.is_empty())?;
        Some(Self {
            url: url.to_string(),
            alt: image.alt_text.clone(),
        })
    }
}

/// Sources from a `files.jsonl` artifact, in file order. Records with no
/// usable URL are skipped; a record of the wrong shape is kept as a failed
/// entry.
pub fn read_sources(input_dir: &Path) -> Result<Vec<Decoded<FileSource>>> {
    let path = input_dir.join(FILES_ARTIFACT);
    if !path.is_file() {
        return Err(CliError::config(format!(
            "Missing {} in {}",
            FILES_ARTIFACT,
            input_dir.display()
        )));
    }
    let sources = JsonlFile::open(&path)?
        .roots::<FileRecord>()
        .into_iter()
        .filter_map(|Decoded { id, handle, record }| {
            let record = match record {
                Ok(record) => Ok(FileSource::from_record(&record)?),
                Err(err) => Err(err),
            };
            Some(Decoded { id, handle, record })
        })
        .collect();
    Ok(sources)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesSummary {
    pub total: usize,
    pub created: usize,
    pub failed: usize,
    pub error_log: PathBuf,
    pub dry_run: bool,
}

pub struct FilesTransfer<'a> {
    api: &'a dyn AdminApi,
    throttle: Duration,
    dry_run: bool,
    progress: ProgressBar,
}

impl<'a> FilesTransfer<'a> {
    pub fn new(api: &'a dyn AdminApi, throttle: Duration, dry_run: bool) -> Self {
        Self {
            api,
            throttle,
            dry_run,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Create one file on the target, returning its new id.
    pub async fn create(&self, source: &FileSource) -> Result<Option<String>> {
        let variables = json!({
            "files": [{ "originalSource": source.url, "alt": source.alt }]
        });
        let data = self.api.graphql(FILE_CREATE, variables).await?;
        if let Some(errors) = user_errors(&data, "fileCreate") {
            return Err(CliError::upsert("file", &source.url, describe_user_errors(&errors)));
        }
        Ok(data["fileCreate"]["files"][0]["id"]
            .as_str()
            .map(str::to_string))
    }

    pub async fn run(&self, input_dir: &Path, error_log: impl Into<PathBuf>) -> Result<FilesSummary> {
        let sources = read_sources(input_dir)?;
        let mut log = ErrorLog::new(error_log);
        let mut summary = FilesSummary {
            total: sources.len(),
            error_log: log.path().to_path_buf(),
            dry_run: self.dry_run,
            ..Default::default()
        };

        if self.dry_run {
            info!(files = sources.len(), "Dry run, no files created");
            return Ok(summary);
        }

        self.progress.set_length(sources.len() as u64);
        for Decoded { id, record, .. } in sources {
            let (key, outcome) = match record {
                Ok(source) => {
                    let outcome = self.create(&source).await;
                    (source.url, outcome)
                }
                Err(err) => (id.unwrap_or_else(|| "-".to_string()), Err(err)),
            };
            match outcome {
                Ok(id) => {
                    debug!(url = %key, id = ?id, "File created");
                    summary.created += 1;
                }
                Err(err) => {
                    warn!(file = %key, error = %err, "File failed");
                    summary.failed += 1;
                    log.append("file", &key, &err.to_string()).await?;
                }
            }
            self.progress.inc(1);
            if !self.throttle.is_zero() {
                tokio::time::sleep(self.throttle).await;
            }
        }
        self.progress.finish_and_clear();

        info!(created = summary.created, failed = summary.failed, "Files transfer finished");
        Ok(summary)
    }
}
