//! One import pass over an export directory
//!
//! Files are imported in a fixed order (products, collections, blogs,
//! articles, pages, then every `metaobjects_*.jsonl` by name) so that blogs
//! exist before the articles that point at them. Every record runs inside its
//! own failure boundary: an error is written to the error log and tallied,
//! and the pass moves on to the next record.

use crate::api::AdminApi;
use crate::error::{CliError, Result};
use crate::export::Resource;
use crate::import::error_log::ErrorLog;
use crate::import::resolver::IdentifierMap;
use crate::import::upsert::{UpsertOutcome, Upserter};
use crate::jsonl::{
    ArticleRecord, BlogRecord, CollectionRecord, Decoded, JsonlFile, MetaobjectRecord, PageRecord,
    ProductGroup,
};
use indicatif::ProgressBar;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Importable entity types, in import order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Product,
    Collection,
    Blog,
    Article,
    Page,
    Metaobject,
}

impl EntityKind {
    pub const IMPORT_ORDER: [EntityKind; 6] = [
        EntityKind::Product,
        EntityKind::Collection,
        EntityKind::Blog,
        EntityKind::Article,
        EntityKind::Page,
        EntityKind::Metaobject,
    ];

    /// Singular label used in the error log.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Product => "product",
            EntityKind::Collection => "collection",
            EntityKind::Blog => "blog",
            EntityKind::Article => "article",
            EntityKind::Page => "page",
            EntityKind::Metaobject => "metaobject",
        }
    }

    /// Export resource feeding this entity type.
    pub fn resource(self) -> Resource {
        match self {
            EntityKind::Product => Resource::Products,
            EntityKind::Collection => Resource::Collections,
            EntityKind::Blog => Resource::Blogs,
            EntityKind::Article => Resource::Articles,
            EntityKind::Page => Resource::Pages,
            EntityKind::Metaobject => Resource::Metaobjects,
        }
    }

    /// Entity types for an `--only` selection. `files` is not imported here.
    pub fn from_resources(resources: &[Resource]) -> Result<Vec<EntityKind>> {
        if resources.contains(&Resource::Files) {
            return Err(CliError::config(
                "files are not imported by `import`; use the `files` subcommand",
            ));
        }
        Ok(Self::IMPORT_ORDER
            .into_iter()
            .filter(|kind| resources.contains(&kind.resource()))
            .collect())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-type outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub created: usize,
    pub updated: usize,
    pub planned: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Tally {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.planned + self.skipped + self.failed
    }

    fn add(&mut self, outcome: &Result<UpsertOutcome>) {
        match outcome {
            Ok(UpsertOutcome::Created(_)) => self.created += 1,
            Ok(UpsertOutcome::Updated(_)) | Ok(UpsertOutcome::Upserted(_)) => self.updated += 1,
            Ok(UpsertOutcome::Planned) => self.planned += 1,
            Ok(UpsertOutcome::Skipped(_)) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Result of one import pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Tallies in import order; only types whose file was present appear.
    pub tallies: Vec<(EntityKind, Tally)>,
    pub error_log: PathBuf,
    pub dry_run: bool,
}

impl ImportSummary {
    pub fn failures(&self) -> usize {
        self.tallies.iter().map(|(_, t)| t.failed).sum()
    }

    pub fn tally(&self, kind: EntityKind) -> Option<&Tally> {
        self.tallies.iter().find(|(k, _)| *k == kind).map(|(_, t)| t)
    }

    fn tally_mut(&mut self, kind: EntityKind) -> &mut Tally {
        if let Some(pos) = self.tallies.iter().position(|(k, _)| *k == kind) {
            return &mut self.tallies[pos].1;
        }
        self.tallies.push((kind, Tally::default()));
        let last = self.tallies.len() - 1;
        &mut self.tallies[last].1
    }
}

/// Options for one import pass
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub dry_run: bool,
    /// Delay after each record; not applied in dry runs.
    pub throttle: Duration,
    /// Entity types to import, in any order; import order is fixed.
    pub only: Vec<EntityKind>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            throttle: Duration::from_millis(crate::config::DEFAULT_THROTTLE_MS),
            only: EntityKind::IMPORT_ORDER.to_vec(),
        }
    }
}

/// Drives an import pass. Owns the error log and the run-scoped blog map.
pub struct ImportDriver<'a> {
    upserter: Upserter<'a>,
    options: ImportOptions,
    error_log: ErrorLog,
    blogs: IdentifierMap,
    progress: ProgressBar,
    summary: ImportSummary,
}

impl<'a> ImportDriver<'a> {
    pub fn new(api: &'a dyn AdminApi, options: ImportOptions, error_log: impl Into<PathBuf>) -> Self {
        let error_log = ErrorLog::new(error_log);
        let summary = ImportSummary {
            tallies: Vec::new(),
            error_log: error_log.path().to_path_buf(),
            dry_run: options.dry_run,
        };
        Self {
            upserter: Upserter::new(api, options.dry_run),
            options,
            error_log,
            blogs: IdentifierMap::new(),
            progress: ProgressBar::hidden(),
            summary,
        }
    }

    /// Report per-record progress on `progress`.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Import every selected file found in `input_dir`.
    pub async fn run(mut self, input_dir: &Path) -> Result<ImportSummary> {
        if !input_dir.is_dir() {
            return Err(CliError::config(format!(
                "Missing input directory: {}",
                input_dir.display()
            )));
        }

        for kind in EntityKind::IMPORT_ORDER {
            if !self.options.only.contains(&kind) {
                continue;
            }
            for path in artifact_paths(kind, input_dir)? {
                self.import_file(kind, &path).await?;
            }
        }

        self.progress.finish_and_clear();
        info!(
            failures = self.summary.failures(),
            error_log = %self.summary.error_log.display(),
            "Import pass finished"
        );
        Ok(self.summary)
    }

    async fn import_file(&mut self, kind: EntityKind, path: &Path) -> Result<()> {
        let file_label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let file = match JsonlFile::open(path) {
            Ok(file) => file,
            Err(err) => {
                // An unreadable artifact fails that file only.
                warn!(path = %path.display(), error = %err, "Skipping unreadable artifact");
                self.settle(kind, &file_label, Err(err)).await?;
                return Ok(());
            }
        };

        info!(entity = %kind, path = %path.display(), "Importing");
        self.progress.set_message(format!("{} ({})", kind, file_label));

        let batch = match kind {
            EntityKind::Product => Batch::Products(file.group_products()),
            EntityKind::Collection => Batch::Collections(file.roots()),
            EntityKind::Blog => Batch::Blogs(file.roots()),
            EntityKind::Article => Batch::Articles(file.roots()),
            EntityKind::Page => Batch::Pages(file.roots()),
            EntityKind::Metaobject => Batch::Metaobjects(file.roots()),
        };

        self.progress.set_length(batch.len() as u64);
        self.progress.set_position(0);

        // A record that failed to decode settles as a failure under its own
        // handle, like a rejected upsert.
        match batch {
            Batch::Products(groups) => {
                for Decoded { handle, record, .. } in groups {
                    let outcome = match record {
                        Ok(group) => self.upserter.product(&group).await,
                        Err(err) => Err(err),
                    };
                    self.finish_record(kind, handle.as_deref(), outcome).await?;
                }
            }
            Batch::Collections(records) => {
                for Decoded { handle, record, .. } in records {
                    let outcome = match record {
                        Ok(collection) => self.upserter.collection(&collection).await,
                        Err(err) => Err(err),
                    };
                    self.finish_record(kind, handle.as_deref(), outcome).await?;
                }
            }
            Batch::Blogs(records) => {
                for Decoded { handle, record, .. } in records {
                    let outcome = match record {
                        Ok(blog) => {
                            let outcome = self.upserter.blog(&blog).await;
                            if let (Ok(result), false) = (&outcome, blog.id.is_empty()) {
                                if let Some(target) = result.id() {
                                    self.blogs.record(blog.id.clone(), target);
                                }
                            }
                            outcome
                        }
                        Err(err) => Err(err),
                    };
                    self.finish_record(kind, handle.as_deref(), outcome).await?;
                }
            }
            Batch::Articles(records) => {
                for Decoded { handle, record, .. } in records {
                    let outcome = match record {
                        Ok(article) => self.upserter.article(&article, &self.blogs).await,
                        Err(err) => Err(err),
                    };
                    self.finish_record(kind, handle.as_deref(), outcome).await?;
                }
            }
            Batch::Pages(records) => {
                for Decoded { handle, record, .. } in records {
                    let outcome = match record {
                        Ok(page) => self.upserter.page(&page).await,
                        Err(err) => Err(err),
                    };
                    self.finish_record(kind, handle.as_deref(), outcome).await?;
                }
            }
            Batch::Metaobjects(records) => {
                for Decoded { handle, record, .. } in records {
                    let outcome = match record {
                        Ok(metaobject) => self.upserter.metaobject(&metaobject).await,
                        Err(err) => Err(err),
                    };
                    self.finish_record(kind, handle.as_deref(), outcome).await?;
                }
            }
        }

        Ok(())
    }

    /// Tally, log and throttle after one record.
    async fn finish_record(
        &mut self,
        kind: EntityKind,
        handle: Option<&str>,
        outcome: Result<UpsertOutcome>,
    ) -> Result<()> {
        let handle = handle.unwrap_or("-");
        match &outcome {
            Ok(UpsertOutcome::Skipped(reason)) => {
                debug!(entity = %kind, handle, reason = %reason, "Skipped")
            }
            Ok(result) => debug!(entity = %kind, handle, outcome = ?result, "Upserted"),
            Err(_) => {}
        }

        self.settle(kind, handle, outcome).await?;
        self.progress.inc(1);

        if !self.options.dry_run && !self.options.throttle.is_zero() {
            tokio::time::sleep(self.options.throttle).await;
        }
        Ok(())
    }

    /// Fold one per-record result into the summary. Failures go to the
    /// error log; only a failure to write that log aborts the pass.
    async fn settle(
        &mut self,
        kind: EntityKind,
        handle: &str,
        outcome: Result<UpsertOutcome>,
    ) -> Result<()> {
        self.summary.tally_mut(kind).add(&outcome);
        if let Err(err) = outcome {
            warn!(entity = %kind, handle, error = %err, "Record failed");
            self.error_log
                .append(kind.label(), handle, &err.to_string())
                .await?;
        }
        Ok(())
    }
}

/// Decoded records of one artifact
enum Batch {
    Products(Vec<Decoded<ProductGroup>>),
    Collections(Vec<Decoded<CollectionRecord>>),
    Blogs(Vec<Decoded<BlogRecord>>),
    Articles(Vec<Decoded<ArticleRecord>>),
    Pages(Vec<Decoded<PageRecord>>),
    Metaobjects(Vec<Decoded<MetaobjectRecord>>),
}

impl Batch {
    fn len(&self) -> usize {
        match self {
            Batch::Products(v) => v.len(),
            Batch::Collections(v) => v.len(),
            Batch::Blogs(v) => v.len(),
            Batch::Articles(v) => v.len(),
            Batch::Pages(v) => v.len(),
            Batch::Metaobjects(v) => v.len(),
        }
    }
}

/// Artifact files for `kind` present in `dir`. Metaobject files are sorted
/// by name.
fn artifact_paths(kind: EntityKind, dir: &Path) -> Result<Vec<PathBuf>> {
    if let Some(name) = kind.resource().file_name() {
        let path = dir.join(name);
        return Ok(if path.is_file() { vec![path] } else { vec![] });
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path.file_name().and_then(|n| n.to_str()).is_some_and(|n| {
                    n.starts_with("metaobjects_") && n.ends_with(".jsonl")
                })
        })
        .collect();
    paths.sort();
    Ok(paths)
}
