pub mod audit_log;
pub mod auth;
pub mod blog;
pub mod candidates;
pub mod dashboard;
pub mod employer_requests;
pub mod health;
pub mod intake;
pub mod jobs;
pub mod public;
pub mod settings;
pub mod upload;

use axum::{
    extract::Query,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::datasource::{ListQuery, Visibility};
use crate::error::{Error, Result};
use crate::middleware::auth::{require_bearer_auth, Claims};
use crate::middleware::rate_limit::{new_rps_state, rps_middleware};
use crate::models::record::Record;
use crate::services::feed::{DetailResult, Feed, FeedResult};
use crate::store::preferences::page_size_key;
use crate::store::Stored;
use crate::utils::pagination::{PageSize, Paginator};
use crate::utils::selection::BulkSelection;
use crate::AppState;

/// Full HTTP surface. Outer layers (CORS, tracing, static files) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/api/public/jobs", get(public::list_jobs))
        .route("/api/public/jobs/:id", get(public::get_job))
        .route("/api/public/blog", get(public::list_posts))
        .route("/api/public/blog/:slug", get(public::get_post))
        .route("/api/public/options", get(public::form_options))
        .route(
            "/api/employer-requests",
            post(intake::submit_employer_request),
        )
        .route(
            "/api/candidate-applications",
            post(intake::submit_application),
        )
        .route("/api/admin/login", post(auth::login))
        .layer(axum::middleware::from_fn_with_state(
            new_rps_state(state.config.public_rps),
            rps_middleware,
        ));

    let admin_api = Router::new()
        .route("/api/admin/me", get(auth::me))
        .route("/api/admin/dashboard", get(dashboard::stats))
        .route(
            "/api/admin/jobs",
            get(jobs::list_jobs).post(jobs::create_job),
        )
        .route(
            "/api/admin/jobs/:id",
            get(jobs::get_job)
                .put(jobs::update_job)
                .delete(jobs::delete_job),
        )
        .route("/api/admin/jobs/:id/archive", post(jobs::archive_job))
        .route("/api/admin/jobs/:id/activate", post(jobs::activate_job))
        .route("/api/admin/jobs/:id/deactivate", post(jobs::deactivate_job))
        .route("/api/admin/jobs/export", get(jobs::export_jobs))
        .route(
            "/api/admin/blog",
            get(blog::list_posts).post(blog::create_post),
        )
        .route(
            "/api/admin/blog/:slug",
            get(blog::get_post)
                .put(blog::update_post)
                .delete(blog::delete_post),
        )
        .route("/api/admin/blog/:slug/publish", post(blog::publish_post))
        .route("/api/admin/blog/:slug/unpublish", post(blog::unpublish_post))
        .route("/api/admin/candidates", get(candidates::list_candidates))
        .route(
            "/api/admin/candidates/:id",
            get(candidates::get_candidate)
                .put(candidates::update_candidate)
                .delete(candidates::delete_candidate),
        )
        .route(
            "/api/admin/candidates/bulk-delete",
            post(candidates::bulk_delete_candidates),
        )
        .route(
            "/api/admin/candidates/export",
            post(candidates::export_candidates),
        )
        .route(
            "/api/admin/employer-requests",
            get(employer_requests::list_requests),
        )
        .route(
            "/api/admin/employer-requests/:id",
            get(employer_requests::get_request).delete(employer_requests::delete_request),
        )
        .route(
            "/api/admin/employer-requests/bulk-delete",
            post(employer_requests::bulk_delete_requests),
        )
        .route(
            "/api/admin/employer-requests/export",
            post(employer_requests::export_requests),
        )
        .route("/api/admin/audit-log", get(audit_log::list_entries))
        .route(
            "/api/admin/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .route("/api/admin/upload-image", post(upload::upload_image))
        .layer(axum::middleware::from_fn_with_state(
            state.auth.clone(),
            require_bearer_auth,
        ))
        .layer(axum::middleware::from_fn_with_state(
            new_rps_state(state.config.admin_rps),
            rps_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(public_api)
        .merge(admin_api)
        .with_state(state)
}

/// Parses list parameters for an admin screen. An explicit `per_page` is remembered for
/// the user; without one the remembered size (or the default) is used.
pub(crate) fn admin_query(
    state: &AppState,
    claims: &Claims,
    list: &str,
    uri: &Uri,
) -> Result<ListQuery> {
    let Query(mut query) = Query::<ListQuery>::try_from_uri(uri)
        .map_err(|e| Error::BadRequest(e.body_text()))?;
    let key = page_size_key(&claims.sub, list);
    let explicit = uri
        .query()
        .is_some_and(|q| q.split('&').any(|pair| pair.starts_with("per_page=")));

    if explicit {
        if let Err(e) = Paginator::new(query.per_page).persist(state.preferences.as_ref(), &key) {
            tracing::warn!(user = %claims.sub, list = %list, error = %e, "Could not remember page size");
        }
    } else {
        query.per_page = Paginator::restore(state.preferences.as_ref(), &key).page_size();
    }
    Ok(query.with_visibility(Visibility::All))
}

/// An expired upstream session is an error, never a soft warning.
pub(crate) fn list_response<T: Serialize>(result: FeedResult<T>) -> Result<Json<FeedResult<T>>> {
    if result.is_unauthorized() {
        return Err(Error::Unauthorized("session_expired".into()));
    }
    Ok(Json(result))
}

pub(crate) fn detail_response<T: Serialize>(result: DetailResult<T>) -> Result<Response> {
    if result.not_found {
        return Ok((StatusCode::NOT_FOUND, Json(result)).into_response());
    }
    match result.item {
        Some(_) => Ok(Json(result).into_response()),
        None => Err(Error::Unauthorized("session_expired".into())),
    }
}

/// The current version of a record, for edits that need fields the payload does not carry.
pub(crate) async fn existing<T: Stored>(feed: &Feed<T>, key: &T::Key, auth: Option<&str>) -> Result<T> {
    let result = feed.detail(key, Visibility::All, auth).await;
    match result.item {
        Some(item) => Ok(item),
        None if result.not_found => Err(Error::NotFound(format!("{} {}", T::MODULE, key))),
        None => Err(Error::Unauthorized("session_expired".into())),
    }
}

/// Every record of a collection matching `query`, walking all pages.
pub(crate) async fn collect_all<T: Stored>(
    feed: &Feed<T>,
    query: ListQuery,
    auth: Option<&str>,
) -> Result<Vec<T>> {
    let mut query = ListQuery {
        page: 1,
        per_page: PageSize::Fifty,
        ..query
    };
    let mut items = Vec::new();
    loop {
        let result = feed.fetch(&query, auth).await;
        if result.is_unauthorized() {
            return Err(Error::Unauthorized("session_expired".into()));
        }
        let total_pages = result.pagination.total_pages;
        items.extend(result.items);
        if query.page >= total_pages {
            return Ok(items);
        }
        query.page += 1;
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest<K> {
    pub ids: Vec<K>,
}

#[derive(Debug, Serialize)]
pub struct BulkOutcome<K> {
    pub deleted: Vec<K>,
    pub missing: Vec<K>,
    pub failed: Vec<K>,
}

/// Deletes the selected records that still exist; ids no longer present are reported.
pub(crate) async fn bulk_delete<T: Stored>(
    state: &AppState,
    feed: &Feed<T>,
    claims: &Claims,
    ids: Vec<T::Key>,
) -> Result<BulkOutcome<T::Key>> {
    let selection = BulkSelection::from_ids(ids);
    let auth = claims.upstream();
    let all = collect_all(feed, ListQuery::default().with_visibility(Visibility::All), auth).await?;

    let mut outcome = BulkOutcome {
        deleted: Vec::new(),
        missing: selection.missing_ids(&all),
        failed: Vec::new(),
    };
    for item in selection.selected_items(&all) {
        let key = item.key();
        match feed.delete(&key, auth).await {
            Ok(removed) => {
                state
                    .audit
                    .deleted::<T>(&claims.actor(), &key, removed.as_ref().or(Some(item)))
                    .await;
                outcome.deleted.push(key);
            }
            Err(Error::Unauthorized(msg)) => return Err(Error::Unauthorized(msg)),
            Err(e) => {
                tracing::warn!(module = %T::MODULE, key = %key, error = %e, "Bulk delete item failed");
                outcome.failed.push(key);
            }
        }
    }
    tracing::info!(
        module = %T::MODULE,
        deleted = outcome.deleted.len(),
        missing = outcome.missing.len(),
        failed = outcome.failed.len(),
        "Bulk delete finished"
    );
    Ok(outcome)
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportRequest<K> {
    #[serde(default)]
    pub ids: Option<Vec<K>>,
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

/// Builds a downloadable file of the selection (or everything when nothing is selected).
pub(crate) async fn export<T>(
    state: &AppState,
    feed: &Feed<T>,
    claims: &Claims,
    request: ExportRequest<T::Key>,
) -> Result<Response>
where
    T: Stored + crate::services::export_service::ExportRow,
{
    use crate::services::export_service::ExportService;

    let all = collect_all(
        feed,
        ListQuery::default().with_visibility(Visibility::All),
        claims.upstream(),
    )
    .await?;
    let rows: Vec<T> = match request.ids {
        Some(ids) if !ids.is_empty() => BulkSelection::from_ids(ids)
            .selected_items(&all)
            .into_iter()
            .cloned()
            .collect(),
        _ => all,
    };

    let stamp = chrono::Utc::now().format("%Y%m%d");
    let module = T::MODULE.as_str();
    let (content_type, file_name, body) = match request.format {
        ExportFormat::Csv => (
            "text/csv; charset=utf-8",
            format!("{}_{}.csv", module, stamp),
            ExportService::to_csv(&rows).into_bytes(),
        ),
        ExportFormat::Xlsx => (
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            format!("{}_{}.xlsx", module, stamp),
            ExportService::to_xlsx(&rows)?,
        ),
    };
    let format_name = match request.format {
        ExportFormat::Csv => "csv",
        ExportFormat::Xlsx => "xlsx",
    };
    state
        .audit
        .downloaded(&claims.actor(), T::MODULE, rows.len(), format_name)
        .await;

    let disposition = format!("attachment; filename=\"{}\"", file_name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
