use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
    Extension,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    datasource::Visibility,
    error::Result,
    middleware::auth::Claims,
    models::{
        audit_log::AuditAction,
        bracket::{ExperienceBracket, WorkType},
        job::JobPosting,
        record::LifecycleAction,
    },
    routes::{admin_query, detail_response, existing, export, list_response, ExportFormat, ExportRequest},
    utils::permissions::{Action, Module},
    utils::salary::normalize_salary,
    utils::time::now,
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct JobPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    #[validate(length(min = 1, max = 100))]
    pub location: String,
    pub work_type: WorkType,
    pub experience: ExperienceBracket,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    pub salary_range: Option<String>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[serde(default = "crate::datasource::wire::default_true")]
    pub is_active: bool,
}

impl JobPayload {
    fn into_job(self, base: Option<&JobPosting>) -> JobPosting {
        let blank_to_none = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        JobPosting {
            id: base.map(|j| j.id).unwrap_or_default(),
            title: self.title.trim().to_string(),
            description: self.description,
            country: self.country,
            location: self.location,
            work_type: self.work_type,
            experience: self.experience,
            requirements: blank_to_none(self.requirements),
            benefits: blank_to_none(self.benefits),
            salary_range: blank_to_none(self.salary_range).map(|s| normalize_salary(&s)),
            currency: blank_to_none(self.currency).map(|c| c.to_uppercase()),
            is_active: self.is_active && !base.is_some_and(|j| j.is_archived),
            is_archived: base.is_some_and(|j| j.is_archived),
            created_at: base.map(|j| j.created_at).unwrap_or_else(now),
            updated_at: base.map(|_| now()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

#[utoipa::path(
    get,
    path = "/api/admin/jobs",
    params(
        ("search" = Option<String>, Query, description = "Case-insensitive text search"),
        ("country" = Option<String>, Query, description = "Country filter"),
        ("work_type" = Option<String>, Query, description = "Work type filter"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Remembered per user when given")
    ),
    responses(
        (status = 200, description = "All jobs including inactive and archived"),
        (status = 401, description = "Session expired")
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    uri: Uri,
) -> Result<impl IntoResponse> {
    claims.require(Module::Jobs, Action::View)?;
    let query = admin_query(&state, &claims, "jobs", &uri)?;
    list_response(state.jobs.fetch(&query, claims.upstream()).await)
}

#[utoipa::path(
    get,
    path = "/api/admin/jobs/{id}",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job found"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Jobs, Action::View)?;
    detail_response(state.jobs.detail(&id, Visibility::All, claims.upstream()).await)
}

#[utoipa::path(
    post,
    path = "/api/admin/jobs",
    responses(
        (status = 201, description = "Job created"),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Missing jobs:create")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<JobPayload>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Jobs, Action::Create)?;
    payload.validate()?;
    let created = state
        .jobs
        .create(payload.into_job(None), claims.upstream())
        .await?;
    state.audit.created(&claims.actor(), &created).await;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/admin/jobs/{id}",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job updated"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<JobPayload>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Jobs, Action::Update)?;
    payload.validate()?;
    let auth = claims.upstream();
    let current = existing(&state.jobs, &id, auth).await?;
    let updated = state
        .jobs
        .update(&id, payload.into_job(Some(&current)), auth)
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
    id: i64,
    action: LifecycleAction,
) -> Result<Json<JobPosting>> {
    let updated = state.jobs.transition(&id, action, claims.upstream()).await?;
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
    path = "/api/admin/jobs/{id}/archive",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job archived and hidden from the public site"),
        (status = 403, description = "Missing jobs:archive")
    )
)]
#[axum::debug_handler]
pub async fn archive_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Jobs, Action::Archive)?;
    transition(&state, &claims, id, LifecycleAction::Archive).await
}

#[utoipa::path(
    post,
    path = "/api/admin/jobs/{id}/activate",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job activated"),
        (status = 422, description = "Archived jobs cannot be activated")
    )
)]
#[axum::debug_handler]
pub async fn activate_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Jobs, Action::Update)?;
    transition(&state, &claims, id, LifecycleAction::Activate).await
}

#[utoipa::path(
    post,
    path = "/api/admin/jobs/{id}/deactivate",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job deactivated")
    )
)]
#[axum::debug_handler]
pub async fn deactivate_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Jobs, Action::Update)?;
    transition(&state, &claims, id, LifecycleAction::Deactivate).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/jobs/{id}",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 204, description = "Job deleted"),
        (status = 403, description = "Missing jobs:delete"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Jobs, Action::Delete)?;
    let removed = state.jobs.delete(&id, claims.upstream()).await?;
    state
        .audit
        .deleted::<JobPosting>(&claims.actor(), &id, removed.as_ref())
        .await;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/admin/jobs/export",
    params(("format" = Option<String>, Query, description = "csv (default) or xlsx")),
    responses(
        (status = 200, description = "Spreadsheet of every job")
    )
)]
#[axum::debug_handler]
pub async fn export_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Jobs, Action::View)?;
    let request = ExportRequest {
        ids: None,
        format: query.format,
    };
    export(&state, &state.jobs, &claims, request).await
}
