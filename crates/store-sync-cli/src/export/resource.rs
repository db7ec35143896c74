//! Exportable resources and `--only` parsing

use crate::error::{CliError, Result};
use crate::export::queries;
use std::fmt;
use std::str::FromStr;

/// A resource with its own bulk export artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Products,
    Collections,
    Pages,
    Blogs,
    Articles,
    Metaobjects,
    Files,
}

impl Resource {
    /// Every resource, in export order.
    pub const ALL: [Resource; 7] = [
        Resource::Products,
        Resource::Collections,
        Resource::Pages,
        Resource::Blogs,
        Resource::Articles,
        Resource::Metaobjects,
        Resource::Files,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Resource::Products => "products",
            Resource::Collections => "collections",
            Resource::Pages => "pages",
            Resource::Blogs => "blogs",
            Resource::Articles => "articles",
            Resource::Metaobjects => "metaobjects",
            Resource::Files => "files",
        }
    }

    /// Artifact file name; metaobjects get one file per type instead.
    pub fn file_name(self) -> Option<String> {
        match self {
            Resource::Metaobjects => None,
            other => Some(format!("{}.jsonl", other.name())),
        }
    }

    /// Fixed bulk query; metaobject queries are built per type.
    pub fn bulk_query(self) -> Option<&'static str> {
        match self {
            Resource::Products => Some(queries::PRODUCTS),
            Resource::Collections => Some(queries::COLLECTIONS),
            Resource::Pages => Some(queries::PAGES),
            Resource::Blogs => Some(queries::BLOGS),
            Resource::Articles => Some(queries::ARTICLES),
            Resource::Files => Some(queries::FILES),
            Resource::Metaobjects => None,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        Resource::ALL
            .into_iter()
            .find(|r| r.name() == s.trim().to_lowercase())
            .ok_or_else(|| CliError::config(format!("Unknown resource: {}", s.trim())))
    }
}

/// Parse a comma-separated `--only` value. `None` or an empty value selects
/// every resource. Duplicates are dropped; order is kept.
pub fn parse_only(only: Option<&str>) -> Result<Vec<Resource>> {
    let Some(raw) = only.filter(|s| !s.trim().is_empty()) else {
        return Ok(Resource::ALL.to_vec());
    };

    let mut selected = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let resource: Resource = part.parse()?;
        if !selected.contains(&resource) {
            selected.push(resource);
        }
    }
    Ok(selected)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_only_defaults_to_all() {
        assert_eq!(parse_only(None).unwrap(), Resource::ALL.to_vec());
        assert_eq!(parse_only(Some("  ")).unwrap(), Resource::ALL.to_vec());
    }

    #[test]
    fn test_parse_only_subset() {
        let selected = parse_only(Some("pages, products,,pages")).unwrap();
        assert_eq!(selected, vec![Resource::Pages, Resource::Products]);
    }

    #[test]
    fn test_parse_only_unknown() {
        let err = parse_only(Some("products,themes")).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("themes"));
    }

    #[test]
    fn test_file_names() {
        assert_eq!(Resource::Products.file_name().as_deref(), Some("products.jsonl"));
        assert_eq!(Resource::Metaobjects.file_name(), None);
        assert!(Resource::Metaobjects.bulk_query().is_none());
        assert!(Resource::Files.bulk_query().unwrap().contains("MediaImage"));
    }
}
