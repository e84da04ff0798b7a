use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::{
    datasource::Visibility,
    error::Result,
    middleware::auth::Claims,
    models::{
        audit_log::AuditAction,
        blog_post::{BlogPost, EDITORIAL_TEAM},
        record::LifecycleAction,
    },
    routes::{admin_query, detail_response, existing, list_response},
    utils::permissions::{Action, Module},
    utils::time::now,
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct PostPayload {
    /// Derived from the title when omitted; ignored on update.
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub excerpt: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(length(min = 1, max = 60))]
    pub category: String,
    pub author: Option<String>,
    #[validate(length(max = 500))]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
}

impl PostPayload {
    fn into_post(self, base: Option<&BlogPost>) -> BlogPost {
        let created_at = base.map(|p| p.created_at).unwrap_or_else(now);
        let published_at = match (self.is_published, self.published_at) {
            (_, Some(at)) => Some(at),
            (true, None) => base.and_then(|p| p.published_at).or(Some(created_at)),
            (false, None) => base.and_then(|p| p.published_at),
        };
        BlogPost {
            id: base.and_then(|p| p.id),
            slug: base
                .map(|p| p.slug.clone())
                .or(self.slug)
                .unwrap_or_default(),
            title: self.title.trim().to_string(),
            excerpt: self.excerpt,
            content: self.content,
            category: self.category.trim().to_string(),
            author: self
                .author
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| EDITORIAL_TEAM.name.to_string()),
            image_url: self.image_url,
            is_published: self.is_published,
            published_at,
            created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/blog",
    params(
        ("search" = Option<String>, Query, description = "Case-insensitive text search"),
        ("category" = Option<String>, Query, description = "Category filter"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Remembered per user when given")
    ),
    responses(
        (status = 200, description = "Stored posts including drafts")
    )
)]
#[axum::debug_handler]
pub async fn list_posts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    uri: Uri,
) -> Result<impl IntoResponse> {
    claims.require(Module::Blog, Action::View)?;
    let query = admin_query(&state, &claims, "blog", &uri)?;
    list_response(state.blog.fetch(&query, claims.upstream()).await)
}

#[utoipa::path(
    get,
    path = "/api/admin/blog/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post found"),
        (status = 404, description = "Post not found")
    )
)]
#[axum::debug_handler]
pub async fn get_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Blog, Action::View)?;
    detail_response(state.blog.detail(&slug, Visibility::All, claims.upstream()).await)
}

#[utoipa::path(
    post,
    path = "/api/admin/blog",
    responses(
        (status = 201, description = "Post created with a unique slug"),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PostPayload>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Blog, Action::Create)?;
    payload.validate()?;
    let created = state
        .blog
        .create(payload.into_post(None), claims.upstream())
        .await?;
    state.audit.created(&claims.actor(), &created).await;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/admin/blog/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post updated"),
        (status = 404, description = "Post not found")
    )
)]
#[axum::debug_handler]
pub async fn update_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(slug): Path<String>,
    Json(payload): Json<PostPayload>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Blog, Action::Update)?;
    payload.validate()?;
    let auth = claims.upstream();
    let current = existing(&state.blog, &slug, auth).await?;
    let updated = state
        .blog
        .update(&slug, payload.into_post(Some(&current)), auth)
        .await?;
    state.audit.changed(
        &claims.actor(),
        AuditAction::Update,
        Some(updated.before.as_ref().unwrap_or(&current)),
        &updated.after,
    )
    .await;
    Ok(Json(updated.after))
}

async fn transition(
    state: &AppState,
    claims: &Claims,
    slug: String,
    action: LifecycleAction,
) -> Result<Json<BlogPost>> {
    claims.require(Module::Blog, Action::Update)?;
    let updated = state.blog.transition(&slug, action, claims.upstream()).await?;
    state.audit.changed(
        &claims.actor(),
        AuditAction::from(action),
        updated.before.as_ref(),
        &updated.after,
    )
    .await;
    Ok(Json(updated.after))
}

#[utoipa::path(
    post,
    path = "/api/admin/blog/{slug}/publish",
    params(("slug" = String, Path, description = "Post slug")),
    responses((status = 200, description = "Post published"))
)]
#[axum::debug_handler]
pub async fn publish_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    transition(&state, &claims, slug, LifecycleAction::Publish).await
}

#[utoipa::path(
    post,
    path = "/api/admin/blog/{slug}/unpublish",
    params(("slug" = String, Path, description = "Post slug")),
    responses((status = 200, description = "Post moved back to draft"))
)]
#[axum::debug_handler]
pub async fn unpublish_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    transition(&state, &claims, slug, LifecycleAction::Unpublish).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/blog/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Missing blog:delete")
    )
)]
#[axum::debug_handler]
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Blog, Action::Delete)?;
    let removed = state.blog.delete(&slug, claims.upstream()).await?;
    state
        .audit
        .deleted::<BlogPost>(&claims.actor(), &slug, removed.as_ref())
        .await;
    Ok(StatusCode::NO_CONTENT)
}
