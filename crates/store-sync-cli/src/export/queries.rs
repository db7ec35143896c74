//! GraphQL documents used by the bulk exporter

/// Starts a bulk query job. Variables: `{ query }`.
pub const RUN_BULK_QUERY: &str = r#"mutation bulkRun($query: String!) {
  bulkOperationRunQuery(query: $query) {
    bulkOperation { id status }
    userErrors { field message }
  }
}"#;

/// Snapshot of the store's current bulk operation.
pub const CURRENT_BULK_OPERATION: &str =
    "{ currentBulkOperation { id status errorCode objectCount url } }";

/// Metaobject definition discovery, read with [`crate::api::paginate`].
pub const METAOBJECT_DEFINITIONS: &str = r#"query ($first: Int!, $after: String) {
  metaobjectDefinitions(first: $first, after: $after) {
    nodes { type }
    pageInfo { hasNextPage endCursor }
  }
}"#;

pub const PRODUCTS: &str = r#"{
  products {
    edges {
      node {
        id
        handle
        title
        descriptionHtml
        vendor
        productType
        tags
        status
        options { name values }
        variants {
          edges {
            node {
              id
              title
              sku
              price
              compareAtPrice
              inventoryPolicy
              barcode
              taxable
              selectedOptions { name value }
            }
          }
        }
        images {
          edges {
            node { id url altText }
          }
        }
      }
    }
  }
}"#;

pub const COLLECTIONS: &str = r#"{
  collections {
    edges {
      node {
        id
        handle
        title
        descriptionHtml
        updatedAt
        sortOrder
        ruleSet {
          appliedDisjunctively
          rules { column relation condition }
        }
      }
    }
  }
}"#;

pub const PAGES: &str = r#"{
  pages {
    edges {
      node { id handle title body createdAt updatedAt isPublished }
    }
  }
}"#;

pub const BLOGS: &str = r#"{
  blogs {
    edges {
      node { id handle title }
    }
  }
}"#;

pub const ARTICLES: &str = r#"{
  articles {
    edges {
      node {
        id
        handle
        title
        body
        summary
        createdAt
        updatedAt
        blog { id }
        isPublished
      }
    }
  }
}"#;

pub const FILES: &str = r#"{
  files {
    edges {
      node {
        id
        alt
        createdAt
        fileStatus
        ... on GenericFile { url mimeType }
        ... on MediaImage {
          image { url altText width height }
        }
      }
    }
  }
}"#;

/// Bulk query for every metaobject of one type.
pub fn metaobjects(metaobject_type: &str) -> String {
    format!(
        r#"{{
  metaobjects(type: "{}") {{
    edges {{
      node {{
        id
        type
        handle
        fields {{ key type value }}
      }}
    }}
  }}
}}"#,
        metaobject_type.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// Replace every non-alphanumeric character with `_`, for use in file names.
pub fn sanitize_type(metaobject_type: &str) -> String {
    metaobject_type
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Artifact file name for one metaobject type.
pub fn metaobject_file_name(metaobject_type: &str) -> String {
    format!("metaobjects_{}.jsonl", sanitize_type(metaobject_type))
}
