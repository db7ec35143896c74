//! Create-or-update of single records against the target store
//!
//! The two stores share no ids, so each record is matched by handle: look up
//! the first record with that handle, then `PUT` it if found or `POST` a new
//! one otherwise. Running the same import twice therefore updates rather than
//! duplicates.

use crate::api::endpoints;
use crate::api::types::{describe_user_errors, id_to_string, user_errors};
use crate::api::AdminApi;
use crate::error::{CliError, Result};
use crate::import::payload::{
    metaobject_variables, wrap, ArticlePayload, BlogPayload, CollectionPayload, PagePayload,
    ProductPayload,
};
use crate::import::resolver::IdentifierMap;
use crate::jsonl::{
    ArticleRecord, BlogRecord, CollectionRecord, MetaobjectRecord, PageRecord, ProductGroup,
};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

const METAOBJECT_UPSERT: &str = r#"mutation ($handle: MetaobjectHandleInput!, $metaobject: MetaobjectUpsertInput!) {
  metaobjectUpsert(handle: $handle, metaobject: $metaobject) {
    metaobject { id }
    userErrors { field message }
  }
}"#;

/// First record of `resource` matching a search query.
fn lookup_query(resource: &str) -> String {
    format!(
        "query ($query: String!) {{ {}(first: 1, query: $query) {{ nodes {{ id }} }} }}",
        resource
    )
}

/// What happened to one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Created; carries the new target id when the store returned one.
    Created(Option<String>),
    /// An existing record with the same handle was updated.
    Updated(Option<String>),
    /// Created or updated by a single upsert mutation.
    Upserted(Option<String>),
    /// Dry run: the payload was built, nothing was sent.
    Planned,
    /// Not importable (no handle, unknown blog); not an error.
    Skipped(String),
}

impl UpsertOutcome {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::Upserted(id) => id.as_deref(),
            Self::Planned | Self::Skipped(_) => None,
        }
    }
}

/// Non-empty handle of a record, if any.
fn handle_of(handle: &Option<String>) -> Option<&str> {
    handle.as_deref().map(str::trim).filter(|h| !h.is_empty())
}

/// Target id in a REST response: `{"product": {"id": 123, ...}}`.
fn response_id(response: &Value, root: &str) -> Option<String> {
    response.get(root).and_then(|r| r.get("id")).and_then(id_to_string)
}

/// Per-record upserts for one target store
pub struct Upserter<'a> {
    api: &'a dyn AdminApi,
    dry_run: bool,
}

impl<'a> Upserter<'a> {
    pub fn new(api: &'a dyn AdminApi, dry_run: bool) -> Self {
        Self { api, dry_run }
    }

    /// Numeric id of the first `resource` record with this handle.
    async fn lookup(&self, resource: &str, handle: &str) -> Result<Option<String>> {
        let data = self
            .api
            .graphql(
                &lookup_query(resource),
                json!({ "query": format!("handle:{}", handle) }),
            )
            .await?;

        Ok(data
            .get(resource)
            .and_then(|c| c.get("nodes"))
            .and_then(|n| n.get(0))
            .and_then(|node| node.get("id"))
            .and_then(id_to_string))
    }

    /// REST call whose response is also checked for an `errors` body.
    async fn send(
        &self,
        entity: &str,
        handle: &str,
        method: Method,
        path: &str,
        body: Value,
    ) -> Result<Value> {
        let response = self.api.rest(method, path, Some(body)).await?;
        match response.get("errors") {
            Some(errors) if !errors.is_null() && errors != &json!([]) && errors != &json!({}) => {
                Err(CliError::upsert(entity, handle, errors.to_string()))
            }
            _ => Ok(response),
        }
    }

    /// Products: updates carry core fields only; a rejected create is retried
    /// once without options, variants and images.
    pub async fn product(&self, group: &ProductGroup) -> Result<UpsertOutcome> {
        let Some(handle) = handle_of(&group.product.handle) else {
            return Ok(UpsertOutcome::Skipped("missing handle".into()));
        };
        let full = ProductPayload::full(group, handle);
        if self.dry_run {
            return Ok(UpsertOutcome::Planned);
        }

        if let Some(id) = self.lookup("products", handle).await? {
            let payload = ProductPayload::core(&group.product, handle).with_id(id.clone());
            let response = self
                .send(
                    "product",
                    handle,
                    Method::PUT,
                    &endpoints::member_path("products", &id),
                    wrap("product", &payload)?,
                )
                .await?;
            return Ok(UpsertOutcome::Updated(
                response_id(&response, "product").or(Some(id)),
            ));
        }

        let path = endpoints::collection_path("products");
        let response = match self
            .send("product", handle, Method::POST, &path, wrap("product", &full)?)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(handle, error = %err, "Product create rejected, retrying with core fields");
                let core = ProductPayload::core(&group.product, handle);
                self.send("product", handle, Method::POST, &path, wrap("product", &core)?)
                    .await?
            }
        };
        Ok(UpsertOutcome::Created(response_id(&response, "product")))
    }

    /// Collections go to `smart_collections` when they carry rules, else
    /// `custom_collections`.
    pub async fn collection(&self, collection: &CollectionRecord) -> Result<UpsertOutcome> {
        let Some(handle) = handle_of(&collection.handle) else {
            return Ok(UpsertOutcome::Skipped("missing handle".into()));
        };
        let (kind, mut payload) = CollectionPayload::new(collection, handle);
        if self.dry_run {
            return Ok(UpsertOutcome::Planned);
        }

        let root = kind.root_key();
        match self.lookup("collections", handle).await? {
            Some(id) => {
                payload.id = Some(id.clone());
                let response = self
                    .send(
                        "collection",
                        handle,
                        Method::PUT,
                        &endpoints::member_path(kind.resource(), &id),
                        wrap(root, &payload)?,
                    )
                    .await?;
                Ok(UpsertOutcome::Updated(response_id(&response, root).or(Some(id))))
            }
            None => {
                let response = self
                    .send(
                        "collection",
                        handle,
                        Method::POST,
                        &endpoints::collection_path(kind.resource()),
                        wrap(root, &payload)?,
                    )
                    .await?;
                Ok(UpsertOutcome::Created(response_id(&response, root)))
            }
        }
    }

    pub async fn page(&self, page: &PageRecord) -> Result<UpsertOutcome> {
        let Some(handle) = handle_of(&page.handle) else {
            return Ok(UpsertOutcome::Skipped("missing handle".into()));
        };
        let body = wrap("page", &PagePayload::new(page, handle))?;
        if self.dry_run {
            return Ok(UpsertOutcome::Planned);
        }

        self.create_or_update("page", "pages", handle, body).await
    }

    /// The returned outcome carries the target blog id for article linking.
    pub async fn blog(&self, blog: &BlogRecord) -> Result<UpsertOutcome> {
        let Some(handle) = handle_of(&blog.handle) else {
            return Ok(UpsertOutcome::Skipped("missing handle".into()));
        };
        let body = wrap("blog", &BlogPayload::new(blog, handle))?;
        if self.dry_run {
            return Ok(UpsertOutcome::Planned);
        }

        self.create_or_update("blog", "blogs", handle, body).await
    }

    /// Shared path for pages and blogs: GraphQL lookup, then REST write.
    async fn create_or_update(
        &self,
        entity: &str,
        resource: &str,
        handle: &str,
        body: Value,
    ) -> Result<UpsertOutcome> {
        match self.lookup(resource, handle).await? {
            Some(id) => {
                let response = self
                    .send(entity, handle, Method::PUT, &endpoints::member_path(resource, &id), body)
                    .await?;
                Ok(UpsertOutcome::Updated(response_id(&response, entity).or(Some(id))))
            }
            None => {
                let response = self
                    .send(entity, handle, Method::POST, &endpoints::collection_path(resource), body)
                    .await?;
                Ok(UpsertOutcome::Created(response_id(&response, entity)))
            }
        }
    }

    /// Articles live inside a blog; the blog must have been imported in this
    /// run, otherwise the article is skipped.
    pub async fn article(
        &self,
        article: &ArticleRecord,
        blogs: &IdentifierMap,
    ) -> Result<UpsertOutcome> {
        let Some(target_blog) = article.blog_id().and_then(|id| blogs.resolve(id)) else {
            return Ok(UpsertOutcome::Skipped("blog not imported in this run".into()));
        };
        let Some(handle) = handle_of(&article.handle) else {
            return Ok(UpsertOutcome::Skipped("missing handle".into()));
        };
        let body = wrap("article", &ArticlePayload::new(article, handle))?;
        if self.dry_run {
            return Ok(UpsertOutcome::Planned);
        }

        let existing = self
            .api
            .rest(
                Method::GET,
                &endpoints::blog_article_lookup_path(target_blog, handle),
                None,
            )
            .await?;
        let existing_id = existing
            .get("articles")
            .and_then(|a| a.get(0))
            .and_then(|a| a.get("id"))
            .and_then(id_to_string);

        match existing_id {
            Some(id) => {
                let response = self
                    .send(
                        "article",
                        handle,
                        Method::PUT,
                        &endpoints::blog_article_path(target_blog, &id),
                        body,
                    )
                    .await?;
                Ok(UpsertOutcome::Updated(response_id(&response, "article").or(Some(id))))
            }
            None => {
                let response = self
                    .send(
                        "article",
                        handle,
                        Method::POST,
                        &endpoints::blog_articles_path(target_blog),
                        body,
                    )
                    .await?;
                Ok(UpsertOutcome::Created(response_id(&response, "article")))
            }
        }
    }

    /// Metaobjects are keyed by `(type, handle)` and written with one
    /// `metaobjectUpsert` mutation.
    pub async fn metaobject(&self, metaobject: &MetaobjectRecord) -> Result<UpsertOutcome> {
        let (Some(kind), Some(handle)) = (handle_of(&metaobject.kind), handle_of(&metaobject.handle))
        else {
            return Ok(UpsertOutcome::Skipped("missing type or handle".into()));
        };
        let variables = metaobject_variables(metaobject, kind, handle);
        if self.dry_run {
            return Ok(UpsertOutcome::Planned);
        }

        let data = self.api.graphql(METAOBJECT_UPSERT, variables).await?;
        if let Some(errors) = user_errors(&data, "metaobjectUpsert") {
            return Err(CliError::upsert("metaobject", handle, describe_user_errors(&errors)));
        }

        let id = data
            .get("metaobjectUpsert")
            .and_then(|p| p.get("metaobject"))
            .and_then(|m| m.get("id"))
            .and_then(id_to_string);
        debug!(kind, handle, "Metaobject upserted");
        Ok(UpsertOutcome::Upserted(id))
    }
}
