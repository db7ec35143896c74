//! Export-time id to target id translation for one import run

use std::collections::HashMap;

/// Maps ids seen in the export (e.g. `gid://shopify/Blog/5`) to the ids the
/// target store assigned. Owned by the import driver and dropped with it;
/// a later run resolves by handle again.
#[derive(Debug, Clone, Default)]
pub struct IdentifierMap {
    ids: HashMap<String, String>,
}

impl IdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, export_id: impl Into<String>, target_id: impl Into<String>) {
        self.ids.insert(export_id.into(), target_id.into());
    }

    pub fn resolve(&self, export_id: &str) -> Option<&str> {
        self.ids.get(export_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
