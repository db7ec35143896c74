//! Admin API wire types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// GraphQL request body
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: &'a Value,
}

/// GraphQL response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Value>,
}

/// Field-level error returned inside a mutation payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field.as_deref() {
            Some(field) if !field.is_empty() => write!(f, "{}: {}", field.join("."), self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// All user errors of one payload on a single line.
pub fn describe_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(UserError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Status of a bulk operation as reported by `currentBulkOperation`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BulkStatus {
    Created,
    Running,
    Canceling,
    Completed,
    Failed,
    Canceled,
    Expired,
    /// Any status this client does not know. Polled as in progress, with a
    /// warning.
    #[serde(other)]
    Unknown,
}

impl BulkStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BulkStatus::Completed | BulkStatus::Failed | BulkStatus::Canceled | BulkStatus::Expired
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BulkStatus::Created => "CREATED",
            BulkStatus::Running => "RUNNING",
            BulkStatus::Canceling => "CANCELING",
            BulkStatus::Completed => "COMPLETED",
            BulkStatus::Failed => "FAILED",
            BulkStatus::Canceled => "CANCELED",
            BulkStatus::Expired => "EXPIRED",
            BulkStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for BulkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a bulk operation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperation {
    pub id: String,
    pub status: BulkStatus,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default, deserialize_with = "count_from_string_or_number")]
    pub object_count: u64,
    #[serde(default)]
    pub url: Option<String>,
}

/// `objectCount` is an UnsignedInt64 scalar, serialized as a string.
fn count_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
        Missing(Option<()>),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Count::Missing(_) => Ok(0),
    }
}

/// Cursor pagination info
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// A `nodes`-style connection page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(default)]
    pub nodes: Vec<Value>,
    #[serde(default)]
    pub page_info: PageInfo,
}

/// Reduce a GID such as `gid://shopify/Product/123` to the numeric id the
/// REST endpoints expect. Values without a `/` are returned unchanged.
pub fn gid_to_id(gid: &str) -> &str {
    match gid.rsplit_once('/') {
        Some((_, id)) => id,
        None => gid,
    }
}

/// Render a REST or GraphQL id (number or string) as a string.
pub fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(gid_to_id(s).to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-empty `userErrors` of the mutation payload at `data[root]`. An array
/// that does not match [`UserError`] is kept whole as one message.
pub fn user_errors(data: &Value, root: &str) -> Option<Vec<UserError>> {
    let errors = data
        .get(root)?
        .get("userErrors")
        .filter(|errors| errors.as_array().is_some_and(|a| !a.is_empty()))?;
    Some(
        Vec::<UserError>::deserialize(errors).unwrap_or_else(|_| {
            vec![UserError {
                field: None,
                message: errors.to_string(),
            }]
        }),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bulk_operation_string_count() {
        let op: BulkOperation = serde_json::from_value(json!({
            "id": "gid://shopify/BulkOperation/1",
            "status": "COMPLETED",
            "errorCode": null,
            "objectCount": "42",
            "url": "https://storage.example.com/export.jsonl"
        }))
        .unwrap();
        assert_eq!(op.status, BulkStatus::Completed);
        assert_eq!(op.object_count, 42);
        assert!(op.url.is_some());
    }

    #[test]
    fn test_bulk_operation_numeric_and_missing_count() {
        let op: BulkOperation = serde_json::from_value(json!({
            "id": "1", "status": "RUNNING", "objectCount": 7
        }))
        .unwrap();
        assert_eq!(op.object_count, 7);

        let op: BulkOperation = serde_json::from_value(json!({
            "id": "1", "status": "RUNNING", "objectCount": null
        }))
        .unwrap();
        assert_eq!(op.object_count, 0);
    }

    #[test]
    fn test_bulk_status_terminal() {
        assert!(BulkStatus::Completed.is_terminal());
        assert!(BulkStatus::Failed.is_terminal());
        assert!(BulkStatus::Canceled.is_terminal());
        assert!(!BulkStatus::Running.is_terminal());
        let unknown: BulkStatus = serde_json::from_value(json!("PAUSED")).unwrap();
        assert_eq!(unknown, BulkStatus::Unknown);
        assert!(!unknown.is_terminal());
    }

    #[test]
    fn test_gid_to_id() {
        assert_eq!(gid_to_id("gid://shopify/Product/8123"), "8123");
        assert_eq!(gid_to_id("8123"), "8123");
        assert_eq!(id_to_string(&json!(991)).as_deref(), Some("991"));
        assert_eq!(
            id_to_string(&json!("gid://shopify/Blog/5")).as_deref(),
            Some("5")
        );
        assert_eq!(id_to_string(&json!(null)), None);
    }

    #[test]
    fn test_user_errors() {
        let data = json!({
            "fileCreate": {
                "files": [],
                "userErrors": [{"field": ["files", "0"], "message": "Invalid URL"}]
            }
        });
        let errors = user_errors(&data, "fileCreate").unwrap();
        assert_eq!(errors[0].message, "Invalid URL");
        assert_eq!(describe_user_errors(&errors), "files.0: Invalid URL");

        let odd = json!({"fileCreate": {"userErrors": ["quota exceeded"]}});
        let errors = user_errors(&odd, "fileCreate").unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("quota exceeded"));

        let clean = json!({"fileCreate": {"files": [], "userErrors": []}});
        assert!(user_errors(&clean, "fileCreate").is_none());
        assert!(user_errors(&clean, "missing").is_none());
    }

    #[test]
    fn test_describe_user_errors() {
        let errors = vec![
            UserError {
                field: Some(vec!["handle".into()]),
                message: "Handle is invalid".into(),
            },
            UserError {
                field: None,
                message: "Type is unknown".into(),
            },
        ];
        assert_eq!(
            describe_user_errors(&errors),
            "handle: Handle is invalid; Type is unknown"
        );
    }
}
