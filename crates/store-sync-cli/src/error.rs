//! Error types for the store-sync CLI
//!
//! Export-side variants are fatal to the export run. `Upsert` and the
//! per-request variants surface from a single record and are caught by the
//! import driver, which logs them and moves on.

use store_sync_common::SyncError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// HTTP request failed before a response arrived (connect, timeout, TLS)
    #[error("Network request failed: {0}. Check your connection and the store domain.")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status from the GraphQL endpoint or a download
    #[error("Admin API error: {0}")]
    Api(String),

    /// Top-level `errors` array in a GraphQL response
    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    /// Non-success status from the REST endpoint
    #[error("REST {method} {path} failed: {status} {detail}")]
    Rest {
        method: String,
        path: String,
        status: u16,
        detail: String,
    },

    /// The bulk query job could not be started
    #[error("Bulk operation not started: {0}")]
    Submission(String),

    /// The store's current bulk operation is not the one we submitted
    #[error("Bulk operation id mismatch: submitted {expected}, store reports {actual}. Another bulk query may have been started on this store.")]
    JobIdentity { expected: String, actual: String },

    /// The Admin API broke the bulk operation contract
    #[error("Bulk operation protocol error: {0}")]
    Protocol(String),

    /// The bulk job ended in a non-successful terminal state
    #[error("Bulk operation {}: {}", .status, .error_code.as_deref().unwrap_or("no error code"))]
    JobFailed {
        status: String,
        error_code: Option<String>,
    },

    /// The store rejected a record with user errors. The message omits
    /// entity and handle; the import error log prefixes them.
    #[error("rejected by store: {detail}")]
    Upsert {
        entity: String,
        handle: String,
        detail: String,
    },

    /// A line of an export artifact is not valid JSON for its record type
    #[error("Invalid record at {path}:{line}: {detail}")]
    InvalidRecord {
        path: String,
        line: usize,
        detail: String,
    },

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] SyncError),
}

impl CliError {
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn upsert(
        entity: impl Into<String>,
        handle: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Upsert {
            entity: entity.into(),
            handle: handle.into(),
            detail: detail.into(),
        }
    }

    /// Whether a read request that failed this way is worth repeating.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Api(_) | Self::GraphQl(_) | Self::JsonParse(_)
        )
    }

    /// Errors that mean the configuration is unusable, raised before any network call.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Common(SyncError::Config(_))
                | Self::Common(SyncError::MissingEnvKey { .. })
        )
    }
}
