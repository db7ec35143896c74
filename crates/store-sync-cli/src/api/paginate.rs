//! Cursor-paginated GraphQL reads
//!
//! The query must declare `$first: Int!` and `$after: String` and select
//! `nodes` plus `pageInfo { hasNextPage endCursor }` on the root field.

use crate::api::client::AdminApi;
use crate::api::retry::RetryPolicy;
use crate::api::types::Connection;
use crate::error::{CliError, Result};
use serde_json::{json, Value};
use tracing::debug;

/// Default page size for connection reads.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Fetch every node of the connection at `root_key`, following cursors until
/// `hasNextPage` is false. Each page request is retried per `retry`.
///
/// `extra_variables` (a JSON object) is merged into `{first, after}`.
pub async fn paginate(
    api: &dyn AdminApi,
    query: &str,
    root_key: &str,
    page_size: u32,
    extra_variables: Option<&Value>,
    retry: &RetryPolicy,
) -> Result<Vec<Value>> {
    let mut items = Vec::new();
    let mut after: Option<String> = None;
    let mut page = 0usize;

    loop {
        let mut variables = json!({ "first": page_size, "after": after });
        if let (Some(Value::Object(extra)), Value::Object(vars)) = (extra_variables, &mut variables)
        {
            for (key, value) in extra {
                vars.insert(key.clone(), value.clone());
            }
        }

        let data = retry
            .run(root_key, move || api.graphql(query, variables.clone()))
            .await?;

        let root = data.get(root_key).cloned().ok_or_else(|| {
            CliError::api(format!("GraphQL response has no '{}' field", root_key))
        })?;
        let connection: Connection = serde_json::from_value(root)?;

        page += 1;
        debug!(
            root = root_key,
            page,
            nodes = connection.nodes.len(),
            "Fetched page"
        );
        items.extend(connection.nodes);

        match connection.page_info {
            info if info.has_next_page => {
                after = info.end_cursor;
                if after.is_none() {
                    return Err(CliError::api(format!(
                        "'{}' reports another page but no endCursor",
                        root_key
                    )));
                }
            }
            _ => break,
        }
    }

    Ok(items)
}
