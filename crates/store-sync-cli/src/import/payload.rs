//! Export vocabulary to REST payloads
//!
//! The bulk export speaks GraphQL (`descriptionHtml`, `BEST_SELLING`,
//! `selectedOptions`); the REST endpoints want `body_html`, `best-selling`
//! and positional `option1..option3`. Absent values are omitted from the
//! serialized payload rather than sent as `null`.

use crate::jsonl::{
    ArticleRecord, BlogRecord, CollectionRecord, CollectionRule, ImageRecord, MetaobjectRecord,
    PageRecord, ProductGroup, ProductRecord, SelectedOption, VariantRecord,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Sort order used when the export value is absent or unrecognized.
pub const DEFAULT_SORT_ORDER: &str = "best-selling";

/// Status used when a product has none.
pub const DEFAULT_PRODUCT_STATUS: &str = "active";

/// Legacy product model limit on option slots per variant.
pub const MAX_OPTION_SLOTS: usize = 3;

/// GraphQL `CollectionSortOrder` to the REST `sort_order` value.
pub fn sort_order(value: Option<&str>) -> &'static str {
    match value {
        Some("MANUAL") => "manual",
        Some("BEST_SELLING") => "best-selling",
        Some("ALPHA_ASC") => "alpha-asc",
        Some("ALPHA_DESC") => "alpha-desc",
        Some("PRICE_ASC") => "price-asc",
        Some("PRICE_DESC") => "price-desc",
        Some("CREATED") => "created",
        Some("CREATED_DESC") => "created-desc",
        _ => DEFAULT_SORT_ORDER,
    }
}

fn lowercase(value: Option<&str>) -> Option<String> {
    value.map(str::to_lowercase)
}

pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}

/// Selected option values, positionally, into the three legacy slots.
/// Values past the third are dropped.
pub fn option_slots(selected: &[SelectedOption]) -> [Option<String>; MAX_OPTION_SLOTS] {
    let mut slots: [Option<String>; MAX_OPTION_SLOTS] = Default::default();
    for (slot, option) in slots.iter_mut().zip(selected) {
        *slot = option.value.clone();
    }
    slots
}

/// Wrap a payload under its REST root key: `{"product": {...}}`.
pub fn wrap<T: Serialize>(root: &str, payload: &T) -> serde_json::Result<Value> {
    let body = serde_json::to_value(payload)?;
    Ok(json!({ root: body }))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionPayload {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option3: Option<String>,
}

impl From<&VariantRecord> for VariantPayload {
    fn from(variant: &VariantRecord) -> Self {
        let [option1, option2, option3] = option_slots(&variant.selected_options);
        Self {
            title: variant.title.clone(),
            sku: variant.sku.clone(),
            price: variant.price.clone().filter(|v| !v.is_null()),
            compare_at_price: variant.compare_at_price.clone().filter(|v| !v.is_null()),
            inventory_policy: lowercase(variant.inventory_policy.as_deref()),
            barcode: variant.barcode.clone(),
            taxable: variant.taxable,
            option1,
            option2,
            option3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagePayload {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl ImagePayload {
    /// Images without a url cannot be re-uploaded.
    fn from_record(image: &ImageRecord) -> Option<Self> {
        let src = image.url.clone().filter(|u| !u.is_empty())?;
        Some(Self {
            src,
            alt: image.alt_text.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    pub tags: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<OptionPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<VariantPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImagePayload>>,
}

impl ProductPayload {
    /// Title, handle, description, vendor, type, tags and status only.
    pub fn core(product: &ProductRecord, handle: &str) -> Self {
        Self {
            id: None,
            title: product.title.clone(),
            handle: handle.to_string(),
            body_html: product.description_html.clone(),
            vendor: product.vendor.clone(),
            product_type: product.product_type.clone(),
            tags: join_tags(&product.tags),
            status: lowercase(product.status.as_deref())
                .unwrap_or_else(|| DEFAULT_PRODUCT_STATUS.to_string()),
            options: None,
            variants: None,
            images: None,
        }
    }

    /// Core fields plus options, variants and images. Empty lists are omitted.
    pub fn full(group: &ProductGroup, handle: &str) -> Self {
        let options: Vec<OptionPayload> = group
            .product
            .options
            .iter()
            .filter_map(|o| o.name.clone().filter(|n| !n.is_empty()))
            .map(|name| OptionPayload { name })
            .collect();
        let variants: Vec<VariantPayload> = group.variants.iter().map(VariantPayload::from).collect();
        let images: Vec<ImagePayload> = group.images.iter().filter_map(ImagePayload::from_record).collect();

        Self {
            options: Some(options).filter(|v| !v.is_empty()),
            variants: Some(variants).filter(|v| !v.is_empty()),
            images: Some(images).filter(|v| !v.is_empty()),
            ..Self::core(&group.product, handle)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Smart collections compute membership from rules; custom ones are curated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Smart,
    Custom,
}

impl CollectionKind {
    pub fn of(collection: &CollectionRecord) -> Self {
        match &collection.rule_set {
            Some(rule_set) if !rule_set.rules.is_empty() => Self::Smart,
            _ => Self::Custom,
        }
    }

    /// REST payload root
    pub fn root_key(self) -> &'static str {
        match self {
            Self::Smart => "smart_collection",
            Self::Custom => "custom_collection",
        }
    }

    /// REST resource
    pub fn resource(self) -> &'static str {
        match self {
            Self::Smart => "smart_collections",
            Self::Custom => "custom_collections",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RulePayload {
    pub column: String,
    pub relation: String,
    pub condition: String,
}

impl RulePayload {
    /// Rules missing a column, relation or condition are dropped.
    fn from_rule(rule: &CollectionRule) -> Option<Self> {
        let present = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        Some(Self {
            column: present(&rule.column)?.to_lowercase(),
            relation: present(&rule.relation)?.to_lowercase(),
            condition: present(&rule.condition)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    pub sort_order: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RulePayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disjunctive: Option<bool>,
}

impl CollectionPayload {
    pub fn new(collection: &CollectionRecord, handle: &str) -> (CollectionKind, Self) {
        let kind = CollectionKind::of(collection);
        let (rules, disjunctive) = match (&collection.rule_set, kind) {
            (Some(rule_set), CollectionKind::Smart) => (
                Some(rule_set.rules.iter().filter_map(RulePayload::from_rule).collect()),
                Some(rule_set.applied_disjunctively),
            ),
            _ => (None, None),
        };

        let payload = Self {
            id: None,
            title: collection.title.clone(),
            handle: handle.to_string(),
            body_html: collection.description_html.clone(),
            sort_order: sort_order(collection.sort_order.as_deref()).to_string(),
            rules,
            disjunctive,
        };
        (kind, payload)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    pub published: bool,
}

impl PagePayload {
    pub fn new(page: &PageRecord, handle: &str) -> Self {
        Self {
            title: page.title.clone(),
            handle: handle.to_string(),
            body_html: page.body.clone(),
            published: page.is_published,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub handle: String,
}

impl BlogPayload {
    pub fn new(blog: &BlogRecord, handle: &str) -> Self {
        Self {
            title: blog.title.clone(),
            handle: handle.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticlePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_html: Option<String>,
    pub published: bool,
}

impl ArticlePayload {
    pub fn new(article: &ArticleRecord, handle: &str) -> Self {
        Self {
            title: article.title.clone(),
            handle: handle.to_string(),
            body_html: article.body.clone(),
            summary_html: article.summary.clone(),
            published: article.is_published,
        }
    }
}

/// Variables for `metaobjectUpsert`. Fields without a key are dropped.
pub fn metaobject_variables(metaobject: &MetaobjectRecord, kind: &str, handle: &str) -> Value {
    let fields: Vec<Value> = metaobject
        .fields
        .iter()
        .filter_map(|f| {
            let key = f.key.as_deref().filter(|k| !k.is_empty())?;
            Some(json!({ "key": key, "value": f.value }))
        })
        .collect();

    json!({
        "handle": { "type": kind, "handle": handle },
        "metaobject": { "handle": handle, "fields": fields },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::jsonl::{MetaobjectField, ProductOption, RuleSet};

    fn selected(values: &[&str]) -> Vec<SelectedOption> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SelectedOption {
                name: Some(format!("Option {}", i + 1)),
                value: Some(v.to_string()),
            })
            .collect()
    }

    #[test]
    fn test_sort_order_table() {
        let table = [
            ("MANUAL", "manual"),
            ("BEST_SELLING", "best-selling"),
            ("ALPHA_ASC", "alpha-asc"),
            ("ALPHA_DESC", "alpha-desc"),
            ("PRICE_ASC", "price-asc"),
            ("PRICE_DESC", "price-desc"),
            ("CREATED", "created"),
            ("CREATED_DESC", "created-desc"),
        ];
        for (source, target) in table {
            assert_eq!(sort_order(Some(source)), target, "{source}");
        }
        assert_eq!(sort_order(None), "best-selling");
        assert_eq!(sort_order(Some("RELEVANCE")), "best-selling");
        assert_eq!(sort_order(Some("manual")), "best-selling");
    }

    #[test]
    fn test_four_options_fill_three_slots() {
        let variant = VariantRecord {
            sku: Some("TEE-S-RED-COTTON-XL".into()),
            selected_options: selected(&["S", "Red", "Cotton", "Long"]),
            ..Default::default()
        };
        let payload = serde_json::to_value(VariantPayload::from(&variant)).unwrap();
        assert_eq!(payload["option1"], "S");
        assert_eq!(payload["option2"], "Red");
        assert_eq!(payload["option3"], "Cotton");
        assert!(payload.get("option4").is_none());
        assert!(!payload.to_string().contains("Long"));
    }

    #[test]
    fn test_variant_omits_absent_fields() {
        let variant = VariantRecord {
            inventory_policy: Some("CONTINUE".into()),
            selected_options: selected(&["M"]),
            ..Default::default()
        };
        let payload = serde_json::to_value(VariantPayload::from(&variant)).unwrap();
        assert_eq!(payload, json!({"inventory_policy": "continue", "option1": "M"}));
    }

    #[test]
    fn test_product_payloads() {
        let group = ProductGroup {
            product: ProductRecord {
                id: "gid://shopify/Product/1".into(),
                handle: Some("hat".into()),
                title: Some("Hat".into()),
                tags: vec!["wool".into(), "winter".into()],
                status: Some("DRAFT".into()),
                options: vec![
                    ProductOption { name: Some("Size".into()), values: vec![] },
                    ProductOption { name: None, values: vec![] },
                ],
                ..Default::default()
            },
            variants: vec![VariantRecord {
                sku: Some("HAT-S".into()),
                ..Default::default()
            }],
            images: vec![
                ImageRecord { url: Some("https://cdn.example.com/hat.png".into()), alt_text: None },
                ImageRecord { url: None, alt_text: Some("orphan alt".into()) },
            ],
        };

        let full = serde_json::to_value(ProductPayload::full(&group, "hat")).unwrap();
        assert_eq!(full["tags"], "wool, winter");
        assert_eq!(full["status"], "draft");
        assert_eq!(full["options"], json!([{"name": "Size"}]));
        assert_eq!(full["variants"][0]["sku"], "HAT-S");
        assert_eq!(full["images"], json!([{"src": "https://cdn.example.com/hat.png"}]));

        let core = serde_json::to_value(ProductPayload::core(&group.product, "hat").with_id("42")).unwrap();
        assert_eq!(core["id"], "42");
        assert!(core.get("variants").is_none());
        assert!(core.get("options").is_none());
        assert!(core.get("body_html").is_none());
    }

    #[test]
    fn test_product_status_defaults_to_active() {
        let product = ProductRecord::default();
        assert_eq!(ProductPayload::core(&product, "x").status, "active");
    }

    #[test]
    fn test_smart_collection_rules() {
        let collection = CollectionRecord {
            handle: Some("sale".into()),
            sort_order: Some("PRICE_ASC".into()),
            rule_set: Some(RuleSet {
                applied_disjunctively: true,
                rules: vec![
                    CollectionRule {
                        column: Some("TAG".into()),
                        relation: Some("EQUALS".into()),
                        condition: Some("Sale".into()),
                    },
                    CollectionRule {
                        column: Some("VENDOR".into()),
                        relation: None,
                        condition: Some("Acme".into()),
                    },
                ],
            }),
            ..Default::default()
        };

        let (kind, payload) = CollectionPayload::new(&collection, "sale");
        assert_eq!(kind, CollectionKind::Smart);
        assert_eq!(kind.root_key(), "smart_collection");
        assert_eq!(payload.sort_order, "price-asc");
        assert_eq!(payload.disjunctive, Some(true));
        assert_eq!(
            payload.rules.unwrap(),
            vec![RulePayload {
                column: "tag".into(),
                relation: "equals".into(),
                condition: "Sale".into(),
            }]
        );
    }

    #[test]
    fn test_custom_collection_without_rules() {
        let collection = CollectionRecord {
            rule_set: Some(RuleSet::default()),
            ..Default::default()
        };
        let (kind, payload) = CollectionPayload::new(&collection, "frontpage");
        assert_eq!(kind, CollectionKind::Custom);
        assert_eq!(kind.resource(), "custom_collections");
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("rules").is_none());
        assert!(value.get("disjunctive").is_none());
        assert_eq!(value["sort_order"], "best-selling");
    }

    #[test]
    fn test_page_and_article_payloads() {
        let page = PageRecord {
            title: Some("About".into()),
            body: Some("<p>Hi</p>".into()),
            ..Default::default()
        };
        let value = wrap("page", &PagePayload::new(&page, "about")).unwrap();
        assert_eq!(
            value,
            json!({"page": {"title": "About", "handle": "about", "body_html": "<p>Hi</p>", "published": false}})
        );

        let article = ArticleRecord {
            summary: Some("Short".into()),
            is_published: true,
            ..Default::default()
        };
        let value = serde_json::to_value(ArticlePayload::new(&article, "news")).unwrap();
        assert_eq!(value["summary_html"], "Short");
        assert_eq!(value["published"], true);
    }

    #[test]
    fn test_metaobject_variables() {
        let record = MetaobjectRecord {
            kind: Some("faq".into()),
            handle: Some("shipping".into()),
            fields: vec![
                MetaobjectField { key: Some("question".into()), kind: None, value: Some("When?".into()) },
                MetaobjectField { key: None, kind: None, value: Some("dropped".into()) },
            ],
            ..Default::default()
        };
        let vars = metaobject_variables(&record, "faq", "shipping");
        assert_eq!(vars["handle"], json!({"type": "faq", "handle": "shipping"}));
        assert_eq!(vars["metaobject"]["fields"], json!([{"key": "question", "value": "When?"}]));
        assert!(vars["metaobject"].get("type").is_none());
    }
}
