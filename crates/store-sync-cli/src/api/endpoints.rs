//! Admin API endpoint builders
//!
//! `base_url` is the Admin API root, e.g.
//! `https://shop.myshopify.com/admin/api/2026-01`.

/// GraphQL endpoint
pub fn graphql_url(base_url: &str) -> String {
    format!("{}/graphql.json", base_url)
}

/// REST resource URL; `path` starts with a slash, e.g. `/products.json`
pub fn rest_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url, path)
}

/// Collection path for a REST resource, e.g. `/products.json`
pub fn collection_path(resource: &str) -> String {
    format!("/{}.json", resource)
}

/// Member path for a REST resource, e.g. `/products/123.json`
pub fn member_path(resource: &str, id: &str) -> String {
    format!("/{}/{}.json", resource, id)
}

/// Count path, e.g. `/products/count.json`
pub fn count_path(resource: &str) -> String {
    format!("/{}/count.json", resource)
}

/// Articles inside one blog
pub fn blog_articles_path(blog_id: &str) -> String {
    format!("/blogs/{}/articles.json", blog_id)
}

/// One article inside one blog
pub fn blog_article_path(blog_id: &str, article_id: &str) -> String {
    format!("/blogs/{}/articles/{}.json", blog_id, article_id)
}

/// Article lookup by handle inside one blog
pub fn blog_article_lookup_path(blog_id: &str, handle: &str) -> String {
    format!(
        "/blogs/{}/articles.json?handle={}&limit=1",
        blog_id,
        urlencoding::encode(handle)
    )
}
