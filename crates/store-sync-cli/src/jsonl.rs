//! Bulk export artifacts: JSON Lines decoding and parent/child grouping
//!
//! A bulk export flattens nested connections: a product's variants and images
//! follow it as separate lines carrying `__parentId`. Nothing tags a child
//! with its kind, so [`ChildRecord::classify`] decides once, from the fields
//! present, and everything downstream works with typed records.

use crate::error::{CliError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Field linking a child line to its parent's `id`.
pub const PARENT_ID_FIELD: &str = "__parentId";

/// `null` and missing both decode to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOption {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description_html: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<ProductOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SelectedOption {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    /// Money scalars arrive as strings; passed through untouched.
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub compare_at_price: Option<Value>,
    #[serde(default)]
    pub inventory_policy: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub taxable: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub selected_options: Vec<SelectedOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CollectionRule {
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    #[serde(default, deserialize_with = "null_as_default")]
    pub applied_disjunctively: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rules: Vec<CollectionRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description_html: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
    #[serde(default)]
    pub rule_set: Option<RuleSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BlogRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BlogRef {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub blog: Option<BlogRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_published: bool,
}

impl ArticleRecord {
    /// Export-time id of the blog this article belongs to.
    pub fn blog_id(&self) -> Option<&str> {
        self.blog.as_ref().and_then(|b| b.id.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetaobjectField {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetaobjectRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<MetaobjectField>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileImage {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image: Option<FileImage>,
}

/// A child line, classified by the fields it carries
#[derive(Debug, Clone, PartialEq)]
pub enum ChildRecord {
    Variant(VariantRecord),
    Image(ImageRecord),
    Unknown,
}

impl ChildRecord {
    /// `sku` or `selectedOptions` marks a variant; otherwise `url` or
    /// `altText` marks an image.
    pub fn classify(value: &Value) -> serde_json::Result<Self> {
        let has = |field: &str| value.get(field).is_some();
        if has("sku") || has("selectedOptions") {
            Ok(Self::Variant(VariantRecord::deserialize(value)?))
        } else if has("url") || has("altText") {
            Ok(Self::Image(ImageRecord::deserialize(value)?))
        } else {
            Ok(Self::Unknown)
        }
    }
}

/// A product with the variants and images that followed it in the stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductGroup {
    pub product: ProductRecord,
    pub variants: Vec<VariantRecord>,
    pub images: Vec<ImageRecord>,
}

/// One top-level record, decoded on its own.
///
/// `id` and `handle` are read from the raw line, so they are available for
/// the error log even when `record` failed to decode.
#[derive(Debug)]
pub struct Decoded<T> {
    pub id: Option<String>,
    pub handle: Option<String>,
    pub record: Result<T>,
}

/// One non-blank line of an artifact
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// 1-based line number in the file
    pub number: usize,
    pub value: Value,
}

impl Line {
    /// Parent id, if this line is a child. `null` and `""` count as absent.
    pub fn parent_id(&self) -> Option<&str> {
        self.value
            .get(PARENT_ID_FIELD)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    fn text_field(&self, name: &str) -> Option<String> {
        self.value
            .get(name)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// A parsed JSON Lines artifact
#[derive(Debug, Clone)]
pub struct JsonlFile {
    path: PathBuf,
    lines: Vec<Line>,
}

impl JsonlFile {
    /// Read and parse `path`. Blank lines are skipped; a line that is not
    /// valid JSON fails the whole file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::parse(path, &text)
    }

    /// Parse artifact text; `path` is only used in error messages.
    pub fn parse(path: impl AsRef<Path>, text: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut lines = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let value = serde_json::from_str(raw).map_err(|e| CliError::InvalidRecord {
                path: path.display().to_string(),
                line: idx + 1,
                detail: e.to_string(),
            })?;
            lines.push(Line {
                number: idx + 1,
                value,
            });
        }

        debug!(path = %path.display(), lines = lines.len(), "Parsed artifact");
        Ok(Self { path, lines })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn invalid(&self, line: &Line, err: serde_json::Error) -> CliError {
        CliError::InvalidRecord {
            path: self.path.display().to_string(),
            line: line.number,
            detail: err.to_string(),
        }
    }

    fn decode<T: DeserializeOwned>(&self, line: &Line) -> Decoded<T> {
        Decoded {
            id: line.text_field("id"),
            handle: line.text_field("handle"),
            record: T::deserialize(&line.value).map_err(|e| self.invalid(line, e)),
        }
    }

    /// Decode every top-level line (no parent link) as `T`, in file order.
    /// A line of the wrong shape fails only its own entry.
    pub fn roots<T: DeserializeOwned>(&self) -> Vec<Decoded<T>> {
        self.lines
            .iter()
            .filter(|line| line.parent_id().is_none())
            .map(|line| self.decode(line))
            .collect()
    }

    /// Rebuild products with their variants and images.
    ///
    /// Children whose parent has not been seen earlier in the file, and
    /// children of no known kind, are dropped. A child of the wrong shape
    /// fails its product. Products without an `id` are never merged.
    pub fn group_products(&self) -> Vec<Decoded<ProductGroup>> {
        let mut groups: Vec<Decoded<ProductGroup>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut dropped = 0usize;

        for line in &self.lines {
            let Some(parent_id) = line.parent_id() else {
                let decoded: Decoded<ProductRecord> = self.decode(line);
                let group = Decoded {
                    record: decoded.record.map(|product| ProductGroup {
                        product,
                        ..Default::default()
                    }),
                    id: decoded.id,
                    handle: decoded.handle,
                };
                match group.id.as_ref().and_then(|id| index.get(id)) {
                    Some(&slot) => groups[slot] = group,
                    None => {
                        if let Some(id) = &group.id {
                            index.insert(id.clone(), groups.len());
                        }
                        groups.push(group);
                    }
                }
                continue;
            };

            let Some(&slot) = index.get(parent_id) else {
                dropped += 1;
                continue;
            };

            let child = match ChildRecord::classify(&line.value) {
                Ok(child) => child,
                Err(e) => {
                    let err = self.invalid(line, e);
                    if groups[slot].record.is_ok() {
                        groups[slot].record = Err(err);
                    }
                    continue;
                }
            };
            match &mut groups[slot].record {
                Ok(group) => match child {
                    ChildRecord::Variant(variant) => group.variants.push(variant),
                    ChildRecord::Image(image) => group.images.push(image),
                    ChildRecord::Unknown => dropped += 1,
                },
                Err(_) => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!(path = %self.path.display(), dropped, "Dropped child lines without a known parent or kind");
        }
        groups
    }
}
