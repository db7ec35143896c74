//! Bulk export coordinator
//!
//! A bulk export is a three-step conversation with the store: start a bulk
//! query job, poll `currentBulkOperation` until the job reaches a terminal
//! status, then download the JSON Lines artifact it produced.
//!
//! A store runs one bulk query at a time. If someone else starts a job while
//! we are polling, the polled id no longer matches ours and the export fails
//! with [`CliError::JobIdentity`] rather than downloading the wrong artifact.

pub mod queries;
pub mod resource;

pub use resource::{parse_only, Resource};

use crate::api::types::{describe_user_errors, user_errors, BulkOperation, BulkStatus};
use crate::api::{paginate, AdminApi, RetryPolicy};
use crate::error::{CliError, Result};
use indicatif::ProgressBar;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Page size for metaobject definition discovery.
const DEFINITIONS_PAGE_SIZE: u32 = 250;

/// Result of one bulk export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The artifact was written to `path`.
    Downloaded { path: PathBuf, bytes: u64 },
    /// The job completed with zero objects; nothing was written.
    Empty,
}

/// One exported artifact, labelled for reporting (`products`, `metaobjects:faq`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub label: String,
    pub outcome: ExportOutcome,
}

/// Runs bulk exports against one store
pub struct BulkExporter<'a> {
    api: &'a dyn AdminApi,
    poll_interval: Duration,
    retry: RetryPolicy,
    spinner: ProgressBar,
}

impl<'a> BulkExporter<'a> {
    pub fn new(api: &'a dyn AdminApi, poll_interval: Duration) -> Self {
        Self {
            api,
            poll_interval,
            retry: RetryPolicy::default(),
            spinner: ProgressBar::hidden(),
        }
    }

    /// Show poll status on `spinner`.
    pub fn with_spinner(mut self, spinner: ProgressBar) -> Self {
        self.spinner = spinner;
        self
    }

    /// Override the retry schedule used for metaobject type discovery.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Start a bulk query job and return its id.
    pub async fn submit(&self, query: &str) -> Result<String> {
        let data = self
            .api
            .graphql(queries::RUN_BULK_QUERY, json!({ "query": query }))
            .await
            .map_err(|e| match e {
                CliError::GraphQl(detail) => CliError::Submission(detail),
                other => other,
            })?;

        if let Some(errors) = user_errors(&data, "bulkOperationRunQuery") {
            return Err(CliError::Submission(describe_user_errors(&errors)));
        }

        let id = data
            .get("bulkOperationRunQuery")
            .and_then(|p| p.get("bulkOperation"))
            .and_then(|op| op.get("id"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CliError::Submission("no bulk operation returned".to_string()))?;

        info!(job_id = %id, "Bulk operation submitted");
        Ok(id.to_string())
    }

    /// Poll until the job identified by `job_id` reaches a terminal status.
    ///
    /// There is no overall timeout; a job that never finishes blocks here.
    pub async fn wait(&self, job_id: &str) -> Result<BulkOperation> {
        let mut warned_unknown = false;
        loop {
            let data = self
                .api
                .graphql(queries::CURRENT_BULK_OPERATION, json!({}))
                .await?;

            let current = data
                .get("currentBulkOperation")
                .filter(|v| !v.is_null())
                .cloned()
                .ok_or_else(|| CliError::protocol("no current bulk operation"))?;
            let raw_status = unrecognized_status(&current);
            let operation: BulkOperation = serde_json::from_value(current)?;

            if operation.id != job_id {
                return Err(CliError::JobIdentity {
                    expected: job_id.to_string(),
                    actual: operation.id,
                });
            }

            if operation.status.is_terminal() {
                info!(
                    job_id,
                    status = %operation.status,
                    object_count = operation.object_count,
                    "Bulk operation finished"
                );
                return Ok(operation);
            }

            if let (Some(raw), false) = (&raw_status, warned_unknown) {
                warn!(job_id, status = %raw, "Unrecognized bulk operation status, still polling");
                warned_unknown = true;
            }

            debug!(
                job_id,
                status = %operation.status,
                object_count = operation.object_count,
                "Bulk operation in progress"
            );
            self.spinner.set_message(format!(
                "{} ({} objects)",
                operation.status, operation.object_count
            ));
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Submit `query`, wait for it and download the artifact to `dest`.
    pub async fn run_bulk_export(&self, query: &str, dest: &Path) -> Result<ExportOutcome> {
        let job_id = self.submit(query).await?;
        let operation = self.wait(&job_id).await?;

        if operation.status != BulkStatus::Completed {
            return Err(CliError::JobFailed {
                status: operation.status.to_string(),
                error_code: operation.error_code,
            });
        }

        if operation.object_count == 0 {
            debug!(job_id = %job_id, "Bulk operation returned no objects");
            return Ok(ExportOutcome::Empty);
        }

        let url = operation
            .url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                CliError::protocol(format!(
                    "job {} completed with {} objects but no url",
                    job_id, operation.object_count
                ))
            })?;

        let bytes = self.api.download(&url, dest).await?;
        Ok(ExportOutcome::Downloaded {
            path: dest.to_path_buf(),
            bytes,
        })
    }

    /// Every metaobject type defined on the store.
    pub async fn metaobject_types(&self) -> Result<Vec<String>> {
        let nodes = paginate(
            self.api,
            queries::METAOBJECT_DEFINITIONS,
            "metaobjectDefinitions",
            DEFINITIONS_PAGE_SIZE,
            None,
            &self.retry,
        )
        .await?;

        Ok(nodes
            .iter()
            .filter_map(|n| n.get("type").and_then(Value::as_str))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Export every metaobject type into `metaobjects_<type>.jsonl` under `out_dir`.
    pub async fn export_metaobjects(&self, out_dir: &Path) -> Result<Vec<Artifact>> {
        let types = self.metaobject_types().await?;
        if types.is_empty() {
            warn!("No metaobject definitions found");
        }

        let mut artifacts = Vec::with_capacity(types.len());
        for metaobject_type in types {
            let dest = out_dir.join(queries::metaobject_file_name(&metaobject_type));
            let outcome = self
                .run_bulk_export(&queries::metaobjects(&metaobject_type), &dest)
                .await?;
            artifacts.push(Artifact {
                label: format!("metaobjects:{}", metaobject_type),
                outcome,
            });
        }
        Ok(artifacts)
    }

    /// Export one resource into `out_dir`.
    pub async fn export_resource(&self, resource: Resource, out_dir: &Path) -> Result<Vec<Artifact>> {
        let (Some(query), Some(file_name)) = (resource.bulk_query(), resource.file_name()) else {
            return self.export_metaobjects(out_dir).await;
        };

        let outcome = self.run_bulk_export(query, &out_dir.join(file_name)).await?;
        Ok(vec![Artifact {
            label: resource.name().to_string(),
            outcome,
        }])
    }
}

/// Raw `status` of a polled operation when it maps to [`BulkStatus::Unknown`].
fn unrecognized_status(current: &Value) -> Option<String> {
    let raw = current.get("status")?;
    match serde_json::from_value::<BulkStatus>(raw.clone()) {
        Ok(BulkStatus::Unknown) => raw.as_str().map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::testing::ScriptedApi;
    use tempfile::TempDir;

    fn submitted(id: &str) -> Result<Value> {
        Ok(json!({"bulkOperationRunQuery": {
            "bulkOperation": {"id": id, "status": "CREATED"},
            "userErrors": []
        }}))
    }

    fn current(id: &str, status: &str, count: &str, url: Option<&str>) -> Result<Value> {
        Ok(json!({"currentBulkOperation": {
            "id": id, "status": status, "errorCode": null, "objectCount": count, "url": url
        }}))
    }

    fn exporter(api: &ScriptedApi) -> BulkExporter<'_> {
        BulkExporter::new(api, Duration::from_millis(1)).with_retry(RetryPolicy::none())
    }

    #[tokio::test]
    async fn test_completed_job_is_downloaded() {
        let api = ScriptedApi::new("{\"id\":\"gid://shopify/Page/1\"}\n");
        api.push_graphql(submitted("gid://shopify/BulkOperation/1"));
        api.push_graphql(current("gid://shopify/BulkOperation/1", "RUNNING", "0", None));
        api.push_graphql(current(
            "gid://shopify/BulkOperation/1",
            "COMPLETED",
            "1",
            Some("https://storage.example.com/a.jsonl"),
        ));

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("pages.jsonl");
        let outcome = exporter(&api)
            .run_bulk_export(queries::PAGES, &dest)
            .await
            .unwrap();

        assert!(matches!(outcome, ExportOutcome::Downloaded { bytes, .. } if bytes > 0));
        assert_eq!(api.downloads(), vec!["https://storage.example.com/a.jsonl"]);
        assert!(dest.exists());

        let calls = api.graphql_calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].1["query"], queries::PAGES);
    }

    #[tokio::test]
    async fn test_zero_objects_never_downloads() {
        let api = ScriptedApi::new("");
        api.push_graphql(submitted("1"));
        api.push_graphql(current("1", "COMPLETED", "0", Some("https://storage.example.com/x")));

        let dir = TempDir::new().unwrap();
        let outcome = exporter(&api)
            .run_bulk_export(queries::BLOGS, &dir.path().join("blogs.jsonl"))
            .await
            .unwrap();

        assert_eq!(outcome, ExportOutcome::Empty);
        assert!(api.downloads().is_empty());
    }

    #[tokio::test]
    async fn test_missing_url_is_protocol_error() {
        let api = ScriptedApi::new("");
        api.push_graphql(submitted("1"));
        api.push_graphql(current("1", "COMPLETED", "12", None));

        let dir = TempDir::new().unwrap();
        let err = exporter(&api)
            .run_bulk_export(queries::BLOGS, &dir.path().join("blogs.jsonl"))
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Protocol(_)));
        assert!(api.downloads().is_empty());
    }

    #[tokio::test]
    async fn test_failed_job_carries_error_code() {
        let api = ScriptedApi::new("");
        api.push_graphql(submitted("1"));
        api.push_graphql(Ok(json!({"currentBulkOperation": {
            "id": "1", "status": "FAILED", "errorCode": "ACCESS_DENIED", "objectCount": "0", "url": null
        }})));

        let dir = TempDir::new().unwrap();
        let err = exporter(&api)
            .run_bulk_export(queries::FILES, &dir.path().join("files.jsonl"))
            .await
            .unwrap_err();

        match err {
            CliError::JobFailed { status, error_code } => {
                assert_eq!(status, "FAILED");
                assert_eq!(error_code.as_deref(), Some("ACCESS_DENIED"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_superseded_job_is_identity_error() {
        let api = ScriptedApi::new("");
        api.push_graphql(submitted("gid://shopify/BulkOperation/1"));
        api.push_graphql(current("gid://shopify/BulkOperation/2", "RUNNING", "0", None));

        let dir = TempDir::new().unwrap();
        let err = exporter(&api)
            .run_bulk_export(queries::PRODUCTS, &dir.path().join("products.jsonl"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CliError::JobIdentity { ref expected, ref actual }
                if expected.ends_with("/1") && actual.ends_with("/2")
        ));
    }

    #[tokio::test]
    async fn test_submission_user_errors() {
        let api = ScriptedApi::new("");
        api.push_graphql(Ok(json!({"bulkOperationRunQuery": {
            "bulkOperation": null,
            "userErrors": [{"field": ["query"], "message": "A bulk query operation is already in progress"}]
        }})));

        let dir = TempDir::new().unwrap();
        let err = exporter(&api)
            .run_bulk_export(queries::PRODUCTS, &dir.path().join("products.jsonl"))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Submission(ref msg) if msg.contains("already in progress")));
    }

    #[tokio::test]
    async fn test_submission_top_level_errors() {
        let api = ScriptedApi::new("");
        api.push_graphql(Err(CliError::GraphQl("[{\"message\":\"Access denied\"}]".into())));

        let err = exporter(&api).submit(queries::PRODUCTS).await.unwrap_err();
        assert!(matches!(err, CliError::Submission(ref msg) if msg.contains("Access denied")));
    }

    #[tokio::test]
    async fn test_unrecognized_status_keeps_polling() {
        let api = ScriptedApi::new("");
        api.push_graphql(current("1", "PAUSED", "0", None));
        api.push_graphql(current("1", "PAUSED", "0", None));
        api.push_graphql(current("1", "COMPLETED", "0", None));

        let operation = exporter(&api).wait("1").await.unwrap();
        assert_eq!(operation.status, BulkStatus::Completed);
        assert_eq!(api.graphql_calls().len(), 3);
    }

    #[test]
    fn test_unrecognized_status_is_reported_raw() {
        assert_eq!(
            unrecognized_status(&json!({"status": "PAUSED"})).as_deref(),
            Some("PAUSED")
        );
        assert_eq!(unrecognized_status(&json!({"status": "RUNNING"})), None);
        assert_eq!(unrecognized_status(&json!({"id": "1"})), None);
    }

    #[tokio::test]
    async fn test_null_current_operation_is_protocol_error() {
        let api = ScriptedApi::new("");
        api.push_graphql(submitted("1"));
        api.push_graphql(Ok(json!({"currentBulkOperation": null})));

        let err = exporter(&api).wait("1").await;
        assert!(matches!(err, Err(CliError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_metaobjects_skip_empty_types() {
        let api = ScriptedApi::new("{\"id\":\"gid://shopify/Metaobject/9\",\"handle\":\"small\"}\n");
        api.push_graphql(Ok(json!({"metaobjectDefinitions": {
            "nodes": [{"type": "faq"}, {"type": "size-chart"}],
            "pageInfo": {"hasNextPage": false, "endCursor": null}
        }})));
        api.push_graphql(submitted("10"));
        api.push_graphql(current("10", "COMPLETED", "0", None));
        api.push_graphql(submitted("11"));
        api.push_graphql(current("11", "COMPLETED", "5", Some("https://storage.example.com/m.jsonl")));

        let dir = TempDir::new().unwrap();
        let artifacts = exporter(&api)
            .export_resource(Resource::Metaobjects, dir.path())
            .await
            .unwrap();

        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].outcome, ExportOutcome::Empty);
        assert_eq!(api.downloads().len(), 1);

        let written: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(written, vec!["metaobjects_size_chart.jsonl".to_string()]);

        let submitted_query = &api.graphql_calls()[3].1["query"];
        assert!(submitted_query.as_str().unwrap().contains("\"size-chart\""));
    }
}
