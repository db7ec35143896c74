//! HTTP client for the Admin API
//!
//! [`AdminApi`] is the seam every pipeline stage talks through; [`AdminClient`]
//! is the reqwest implementation. Calls made here are single attempts: the
//! paginated reader layers retries on top (see [`crate::api::retry`]).

use crate::api::endpoints;
use crate::api::types::{GraphQlRequest, GraphQlResponse};
use crate::config::SyncConfig;
use crate::error::{CliError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Method};
use serde_json::Value;
use std::path::{Path, PathBuf};
use store_sync_common::StoreEnv;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Header carrying the Admin API access token.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Operations the sync pipeline needs from a store
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Run a GraphQL query or mutation and return its `data` object.
    ///
    /// A non-empty top-level `errors` array is an error.
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value>;

    /// Call a REST endpoint (`path` relative to the Admin API root).
    async fn rest(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value>;

    /// Download an absolute URL to `dest`, returning the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// reqwest-backed Admin API client for one store
pub struct AdminClient {
    client: Client,
    base_url: String,
    token: String,
    download_timeout: std::time::Duration,
}

impl AdminClient {
    /// Create a client for the store described by `env`
    pub fn new(env: &StoreEnv, config: &SyncConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.api_timeout).build()?;

        Ok(Self {
            client,
            base_url: env.admin_base_url(),
            token: env.token.clone(),
            download_timeout: config.download_timeout,
        })
    }

    /// Get the Admin API base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl AdminApi for AdminClient {
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let url = endpoints::graphql_url(&self.base_url);
        let request = GraphQlRequest {
            query,
            variables: &variables,
        };

        let response = self
            .client
            .post(&url)
            .header(ACCESS_TOKEN_HEADER, &self.token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), "POST graphql.json");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CliError::api(format!("{} {}", status, body.trim())));
        }

        let body = response.text().await?;
        let envelope: GraphQlResponse = serde_json::from_str(&body)?;

        if let Some(errors) = envelope.errors {
            let empty = errors.as_array().is_some_and(|a| a.is_empty()) || errors.is_null();
            if !empty {
                return Err(CliError::GraphQl(errors.to_string()));
            }
        }

        envelope
            .data
            .filter(|d| !d.is_null())
            .ok_or_else(|| CliError::api("Missing data in GraphQL response"))
    }

    async fn rest(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = endpoints::rest_url(&self.base_url, path);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(ACCESS_TOKEN_HEADER, &self.token)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(ref payload) = body {
            request = request.json(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(method = %method, path = %path, status = status.as_u16(), "REST call");

        let text = response.text().await?;
        if !status.is_success() {
            return Err(CliError::Rest {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                detail: text.trim().to_string(),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        // The artifact URL is pre-signed; it must not receive the access token.
        let response = self
            .client
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CliError::api(format!(
                "artifact download failed with {}",
                status
            )));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let partial = partial_path(dest);
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        drop(file);
        tokio::fs::rename(&partial, dest).await?;

        info!(path = %dest.display(), bytes = written, "Artifact downloaded");
        Ok(written)
    }
}

/// `products.jsonl` -> `products.jsonl.part`
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
