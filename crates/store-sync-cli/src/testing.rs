//! In-process [`AdminApi`] doubles for unit tests

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::api::client::AdminApi;
use crate::error::{CliError, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Mutex;

/// Answers GraphQL calls from a queue of canned responses and serves every
/// download with the same body.
pub struct ScriptedApi {
    responses: Mutex<VecDeque<Result<Value>>>,
    graphql_calls: Mutex<Vec<(String, Value)>>,
    downloads: Mutex<Vec<String>>,
    download_body: String,
}

impl ScriptedApi {
    pub fn new(download_body: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            graphql_calls: Mutex::new(Vec::new()),
            downloads: Mutex::new(Vec::new()),
            download_body: download_body.to_string(),
        }
    }

    pub fn push_graphql(&self, response: Result<Value>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// `(query, variables)` of every GraphQL call, in order.
    pub fn graphql_calls(&self) -> Vec<(String, Value)> {
        self.graphql_calls.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdminApi for ScriptedApi {
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        self.graphql_calls
            .lock()
            .unwrap()
            .push((query.to_string(), variables));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CliError::api("no scripted response left")))
    }

    async fn rest(&self, method: Method, path: &str, _body: Option<Value>) -> Result<Value> {
        Err(CliError::api(format!("unexpected REST call {} {}", method, path)))
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        self.downloads.lock().unwrap().push(url.to_string());
        std::fs::write(dest, &self.download_body)?;
        Ok(self.download_body.len() as u64)
    }
}

#[derive(Default)]
struct StoreState {
    next_id: u64,
    /// REST collection name -> stored records (each with numeric `id` and `handle`)
    records: BTreeMap<String, Vec<Value>>,
    failing_handles: HashSet<String>,
    reject_full_products: bool,
    calls: Vec<String>,
}

impl StoreState {
    fn assign_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn collection(&mut self, name: &str) -> &mut Vec<Value> {
        self.records.entry(name.to_string()).or_default()
    }

    fn find_by_handle(&self, names: &[&str], handle: &str) -> Option<u64> {
        names.iter().find_map(|name| {
            self.records.get(*name)?.iter().find_map(|r| {
                (r["handle"] == handle).then(|| r["id"].as_u64()).flatten()
            })
        })
    }
}

/// A tiny store: remembers records created through REST and
/// `metaobjectUpsert`, answers handle lookups, and can be told to reject
/// specific handles.
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Every write naming `handle` is rejected.
    pub fn failing_on(self, handle: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_handles
            .insert(handle.to_string());
        self
    }

    /// Product creates carrying options, variants or images are rejected.
    pub fn rejecting_full_products(self) -> Self {
        self.state.lock().unwrap().reject_full_products = true;
        self
    }

    /// `METHOD path` for REST calls, `LOOKUP resource handle` and
    /// `GRAPHQL mutation` for GraphQL calls.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn records(&self, collection: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn rejected(method: &str, path: &str, handle: &str) -> CliError {
        CliError::Rest {
            method: method.to_string(),
            path: path.to_string(),
            status: 422,
            detail: format!("{{\"errors\":{{\"handle\":[\"{} is rejected\"]}}}}", handle),
        }
    }
}

/// `(collection, blog id, member id)` for a REST path without its query string.
fn parse_path(path: &str) -> (String, Option<String>, Option<String>) {
    let trimmed = path.trim_start_matches('/').trim_end_matches(".json");
    let segments: Vec<&str> = trimmed.split('/').collect();
    if segments.first() == Some(&"blogs") && segments.get(2) == Some(&"articles") {
        return (
            "articles".to_string(),
            segments.get(1).map(|s| s.to_string()),
            segments.get(3).map(|s| s.to_string()),
        );
    }
    (
        segments[0].to_string(),
        None,
        segments.get(1).map(|s| s.to_string()),
    )
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| urlencoding::decode(v).map(|s| s.into_owned()).ok())?
    })
}

#[async_trait]
impl AdminApi for MemoryStore {
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let mut state = self.state.lock().unwrap();

        if query.contains("metaobjectUpsert") {
            let handle = variables["handle"]["handle"].as_str().unwrap_or_default().to_string();
            let kind = variables["handle"]["type"].as_str().unwrap_or_default().to_string();
            state.calls.push(format!("GRAPHQL metaobjectUpsert {}", handle));
            if state.failing_handles.contains(&handle) {
                return Ok(json!({"metaobjectUpsert": {
                    "metaobject": null,
                    "userErrors": [{"field": ["handle"], "message": "Handle is invalid"}]
                }}));
            }
            let existing = state
                .records
                .get("metaobjects")
                .and_then(|all| all.iter().find(|r| r["handle"] == handle && r["type"] == kind))
                .and_then(|r| r["id"].as_u64());
            let id = match existing {
                Some(id) => id,
                None => state.assign_id(),
            };
            let metaobjects = state.collection("metaobjects");
            metaobjects.retain(|r| r["id"].as_u64() != Some(id));
            metaobjects.push(json!({
                "id": id,
                "type": kind,
                "handle": handle,
                "fields": variables["metaobject"]["fields"].clone(),
            }));
            return Ok(json!({"metaobjectUpsert": {
                "metaobject": {"id": format!("gid://shopify/Metaobject/{}", id)},
                "userErrors": []
            }}));
        }

        if query.contains("fileCreate") {
            let source = variables["files"][0]["originalSource"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            state.calls.push(format!("GRAPHQL fileCreate {}", source));
            if state.failing_handles.contains(&source) {
                return Ok(json!({"fileCreate": {
                    "files": [],
                    "userErrors": [{"field": ["files", "0", "originalSource"], "message": "Invalid URL"}]
                }}));
            }
            let id = state.assign_id();
            state
                .collection("files")
                .push(json!({"id": id, "url": source, "alt": variables["files"][0]["alt"].clone()}));
            return Ok(json!({"fileCreate": {
                "files": [{"id": format!("gid://shopify/File/{}", id)}],
                "userErrors": []
            }}));
        }

        for root in ["products", "collections", "pages", "blogs"] {
            if !query.contains(&format!("{}(first: 1", root)) {
                continue;
            }
            let handle = variables["query"]
                .as_str()
                .and_then(|q| q.strip_prefix("handle:"))
                .unwrap_or_default()
                .to_string();
            state.calls.push(format!("LOOKUP {} {}", root, handle));
            let names = match root {
                "collections" => vec!["custom_collections", "smart_collections"],
                other => vec![other],
            };
            let nodes: Vec<Value> = state
                .find_by_handle(&names, &handle)
                .map(|id| json!({"id": format!("gid://shopify/Record/{}", id)}))
                .into_iter()
                .collect();
            return Ok(json!({ root: { "nodes": nodes } }));
        }

        Err(CliError::api(format!("unexpected GraphQL document: {}", query)))
    }

    async fn rest(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("{} {}", method, path));

        let (path_only, query) = path.split_once('?').unwrap_or((path, ""));
        let (collection, blog_id, member_id) = parse_path(path_only);

        if method == Method::GET {
            let handle = query_param(query, "handle").unwrap_or_default();
            let found: Vec<Value> = state
                .records
                .get(&collection)
                .map(|all| {
                    all.iter()
                        .filter(|r| r["handle"] == handle.as_str())
                        .filter(|r| {
                            blog_id
                                .as_deref()
                                .map_or(true, |b| r["blog_id"].to_string() == b)
                        })
                        .take(1)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            return Ok(json!({ collection: found }));
        }

        let body = body.unwrap_or_default();
        let (root, mut record) = body
            .as_object()
            .and_then(|o| o.iter().next())
            .map(|(k, v)| (k.clone(), v.clone()))
            .unwrap_or_else(|| (String::new(), Value::Object(Map::new())));
        let handle = record["handle"].as_str().unwrap_or_default().to_string();

        if state.failing_handles.contains(&handle) {
            return Err(Self::rejected(method.as_str(), path, &handle));
        }

        match (method.as_str(), member_id) {
            ("POST", None) => {
                let full_product = collection == "products"
                    && ["options", "variants", "images"]
                        .iter()
                        .any(|k| record.get(*k).is_some());
                if state.reject_full_products && full_product {
                    return Err(Self::rejected("POST", path, &handle));
                }
                let id = state.assign_id();
                record["id"] = json!(id);
                if let Some(blog) = blog_id.and_then(|b| b.parse::<u64>().ok()) {
                    record["blog_id"] = json!(blog);
                }
                state.collection(&collection).push(record.clone());
                Ok(json!({ root: record }))
            }
            ("PUT", Some(member)) => {
                let stored = state
                    .collection(&collection)
                    .iter_mut()
                    .find(|r| r["id"].to_string() == member)
                    .ok_or_else(|| Self::rejected("PUT", path, &handle))?;
                if let (Some(target), Some(fields)) = (stored.as_object_mut(), record.as_object()) {
                    for (k, v) in fields {
                        if k != "id" {
                            target.insert(k.clone(), v.clone());
                        }
                    }
                }
                Ok(json!({ root: stored.clone() }))
            }
            _ => Err(CliError::api(format!("unsupported call {} {}", method, path))),
        }
    }

    async fn download(&self, url: &str, _dest: &Path) -> Result<u64> {
        Err(CliError::api(format!("unexpected download of {}", url)))
    }
}
