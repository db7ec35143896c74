//! Store credential files
//!
//! Each store (production source, dev target) is described by a flat
//! `KEY=value` file:
//!
//! ```text
//! SHOPIFY_SHOP=my-store
//! SHOPIFY_ADMIN_ACCESS_TOKEN=shpat_...
//! SHOPIFY_ADMIN_API_VERSION=2026-01
//! ```
//!
//! `SHOPIFY_ADMIN_BASE_URL` may replace the derived Admin API base URL, which
//! is how requests get routed through a proxy or a local mock server.

use crate::error::{Result, SyncError};
use std::collections::HashMap;
use std::path::Path;

pub const SHOP_KEY: &str = "SHOPIFY_SHOP";
pub const TOKEN_KEY: &str = "SHOPIFY_ADMIN_ACCESS_TOKEN";
pub const API_VERSION_KEY: &str = "SHOPIFY_ADMIN_API_VERSION";
pub const BASE_URL_KEY: &str = "SHOPIFY_ADMIN_BASE_URL";

/// API version used when the env file does not pin one.
pub const DEFAULT_API_VERSION: &str = "2026-01";

/// Connection details for one store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEnv {
    pub shop: String,
    pub token: String,
    pub api_version: String,
    base_url_override: Option<String>,
}

impl StoreEnv {
    pub fn new(
        shop: impl Into<String>,
        token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            shop: shop.into(),
            token: token.into(),
            api_version: api_version.into(),
            base_url_override: None,
        }
    }

    /// Point the Admin API at an explicit base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    /// Load a store env file. Missing required keys are fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SyncError::Config(format!(
                "env file not found: {}",
                path.display()
            )));
        }

        let mut values = HashMap::new();
        let entries = dotenvy::from_path_iter(path).map_err(|e| map_dotenv_error(path, e))?;
        for entry in entries {
            let (key, value) = entry.map_err(|e| map_dotenv_error(path, e))?;
            values.insert(key.trim().to_string(), value.trim().to_string());
        }

        Self::from_map(&values, &path.display().to_string())
    }

    fn from_map(values: &HashMap<String, String>, source: &str) -> Result<Self> {
        let required = |key: &str| {
            values
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| SyncError::MissingEnvKey {
                    key: key.to_string(),
                    path: source.to_string(),
                })
        };

        let shop = required(SHOP_KEY)?;
        let token = required(TOKEN_KEY)?;
        let api_version = values
            .get(API_VERSION_KEY)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let mut env = Self::new(shop, token, api_version);
        if let Some(base) = values.get(BASE_URL_KEY).filter(|v| !v.is_empty()) {
            env = env.with_base_url(base.trim_end_matches('/'));
        }
        Ok(env)
    }

    /// Shop domain, accepting either a bare shop name or a full domain.
    pub fn shop_domain(&self) -> String {
        if self.shop.contains('.') {
            self.shop.clone()
        } else {
            format!("{}.myshopify.com", self.shop)
        }
    }

    /// Base URL of the Admin API, e.g. `https://shop.myshopify.com/admin/api/2026-01`
    pub fn admin_base_url(&self) -> String {
        match &self.base_url_override {
            Some(base) => base.clone(),
            None => format!(
                "https://{}/admin/api/{}",
                self.shop_domain(),
                self.api_version
            ),
        }
    }
}

fn map_dotenv_error(path: &Path, err: dotenvy::Error) -> SyncError {
    match err {
        dotenvy::Error::Io(io) => SyncError::Io(io),
        other => SyncError::Parse(format!("{}: {}", path.display(), other)),
    }
}
