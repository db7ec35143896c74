//! Runtime tuning for store-sync commands
//!
//! Timeouts, the bulk poll interval and the import self-throttle. Store
//! credentials live in env files handled by `store_sync_common::env`.

use std::time::Duration;

// ============================================================================
// Defaults
// ============================================================================

/// Per-attempt timeout for Admin API requests.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Timeout for downloading a bulk artifact, which can be large.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Delay between `currentBulkOperation` polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Pause after each record during import.
pub const DEFAULT_THROTTLE_MS: u64 = 100;

/// Pause after each file during files transfer.
pub const DEFAULT_FILES_THROTTLE_MS: u64 = 200;

/// Default location of the import error log.
pub const DEFAULT_ERROR_LOG: &str = "outputs/store_sync/import_errors.log";

/// Default root for export runs.
pub const DEFAULT_EXPORT_DIR: &str = "outputs/store_sync";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub api_timeout: Duration,
    pub download_timeout: Duration,
    pub poll_interval: Duration,
    pub throttle: Duration,
    pub files_throttle: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            download_timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            throttle: Duration::from_millis(DEFAULT_THROTTLE_MS),
            files_throttle: Duration::from_millis(DEFAULT_FILES_THROTTLE_MS),
        }
    }
}

impl SyncConfig {
    /// Load overrides from `STORE_SYNC_*` environment variables.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_timeout: env_secs("STORE_SYNC_API_TIMEOUT_SECS").unwrap_or(defaults.api_timeout),
            download_timeout: env_secs("STORE_SYNC_DOWNLOAD_TIMEOUT_SECS")
                .unwrap_or(defaults.download_timeout),
            poll_interval: env_millis("STORE_SYNC_POLL_INTERVAL_MS")
                .unwrap_or(defaults.poll_interval),
            throttle: env_millis("STORE_SYNC_THROTTLE_MS").unwrap_or(defaults.throttle),
            files_throttle: env_millis("STORE_SYNC_FILES_THROTTLE_MS")
                .unwrap_or(defaults.files_throttle),
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_secs(key: &str) -> Option<Duration> {
    env_u64(key).map(Duration::from_secs)
}

fn env_millis(key: &str) -> Option<Duration> {
    env_u64(key).map(Duration::from_millis)
}
