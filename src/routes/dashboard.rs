use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};
use serde::Serialize;

use crate::{
    datasource::{ListQuery, Origin, Visibility},
    error::{Error, Result},
    middleware::auth::Claims,
    services::feed::{Feed, FeedError},
    store::Stored,
    utils::pagination::PageSize,
    utils::permissions::{Action, Module},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct Tile {
    pub total: usize,
    pub origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<FeedError>,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub jobs: Tile,
    pub active_jobs: Tile,
    pub candidates: Tile,
    pub employer_requests: Tile,
    pub blog_posts: Tile,
}

async fn tile<T: Stored>(feed: &Feed<T>, query: ListQuery, auth: Option<&str>) -> Result<Tile> {
    let query = ListQuery {
        per_page: PageSize::Five,
        ..query
    };
    let result = feed.fetch(&query, auth).await;
    if result.is_unauthorized() {
        return Err(Error::Unauthorized("session_expired".into()));
    }
    Ok(Tile {
        total: result.pagination.total,
        origin: result.origin,
        warning: result.error,
    })
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Record counts per collection"),
        (status = 403, description = "Missing dashboard:view")
    )
)]
#[axum::debug_handler]
pub async fn stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Dashboard, Action::View)?;
    let auth = claims.upstream();
    let all = || ListQuery::default().with_visibility(Visibility::All);

    let (jobs, active_jobs, candidates, employer_requests, blog_posts) = tokio::try_join!(
        tile(&state.jobs, all(), auth),
        tile(&state.jobs, ListQuery::default(), auth),
        tile(&state.candidates, all(), auth),
        tile(&state.employer_requests, all(), auth),
        tile(&state.blog, all(), auth),
    )?;

    Ok(Json(DashboardStats {
        jobs,
        active_jobs,
        candidates,
        employer_requests,
        blog_posts,
    }))
}
