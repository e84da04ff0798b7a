use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
    Extension,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    datasource::Visibility,
    error::{Error, Result},
    middleware::auth::Claims,
    models::{
        audit_log::AuditAction,
        bracket::{ExperienceBracket, SalaryBracket},
        candidate::CandidateApplication,
    },
    routes::{
        admin_query, bulk_delete, detail_response, existing, export, list_response, BulkRequest,
        ExportRequest,
    },
    utils::permissions::{Action, Module},
    AppState,
};

/// Admin edits cover the applicant's details; attachments are kept as submitted.
#[derive(Debug, Deserialize, Validate)]
pub struct CandidatePayload {
    #[validate(length(min = 2, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub nationality: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    pub expected_salary: String,
    pub experience: ExperienceBracket,
}

impl CandidatePayload {
    fn apply_to(self, mut candidate: CandidateApplication) -> Result<CandidateApplication> {
        candidate.expected_salary = SalaryBracket::from_raw(&self.expected_salary)
            .map_err(|e| Error::BadRequest(format!("expected_salary: {}", e)))?;
        candidate.name = self.name.trim().to_string();
        candidate.email = self.email.trim().to_string();
        candidate.nationality = self.nationality;
        candidate.country = self.country;
        candidate.experience = self.experience;
        Ok(candidate)
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/candidates",
    params(
        ("search" = Option<String>, Query, description = "Name, email, nationality or position"),
        ("country" = Option<String>, Query, description = "Country filter"),
        ("experience" = Option<String>, Query, description = "Experience bracket filter"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Remembered per user when given")
    ),
    responses(
        (status = 200, description = "Applications, newest first"),
        (status = 401, description = "Session expired")
    )
)]
#[axum::debug_handler]
pub async fn list_candidates(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    uri: Uri,
) -> Result<impl IntoResponse> {
    claims.require(Module::Candidates, Action::View)?;
    let query = admin_query(&state, &claims, "candidates", &uri)?;
    list_response(state.candidates.fetch(&query, claims.upstream()).await)
}

#[utoipa::path(
    get,
    path = "/api/admin/candidates/{id}",
    params(("id" = i64, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application found"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Candidates, Action::View)?;
    detail_response(
        state
            .candidates
            .detail(&id, Visibility::All, claims.upstream())
            .await,
    )
}

#[utoipa::path(
    put,
    path = "/api/admin/candidates/{id}",
    params(("id" = i64, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application updated"),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn update_candidate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<CandidatePayload>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Candidates, Action::Update)?;
    payload.validate()?;
    let auth = claims.upstream();
    let current = existing(&state.candidates, &id, auth).await?;
    let edited = payload.apply_to(current.clone())?;
    let updated = state.candidates.update(&id, edited, auth).await?;
    state.audit.changed(
        &claims.actor(),
        AuditAction::Update,
        Some(updated.before.as_ref().unwrap_or(&current)),
        &updated.after,
    )
    .await;
    Ok(Json(updated.after))
}

#[utoipa::path(
    delete,
    path = "/api/admin/candidates/{id}",
    params(("id" = i64, Path, description = "Application ID")),
    responses(
        (status = 204, description = "Application deleted"),
        (status = 403, description = "Missing candidates:delete")
    )
)]
#[axum::debug_handler]
pub async fn delete_candidate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Candidates, Action::Delete)?;
    let removed = state.candidates.delete(&id, claims.upstream()).await?;
    state
        .audit
        .deleted::<CandidateApplication>(&claims.actor(), &id, removed.as_ref())
        .await;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/candidates/bulk-delete",
    responses(
        (status = 200, description = "Deleted, missing and failed ids"),
        (status = 403, description = "Missing candidates:delete")
    )
)]
#[axum::debug_handler]
pub async fn bulk_delete_candidates(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BulkRequest<i64>>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Candidates, Action::Delete)?;
    let outcome = bulk_delete(&state, &state.candidates, &claims, payload.ids).await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/admin/candidates/export",
    responses(
        (status = 200, description = "CSV or XLSX of the selected (or all) applications")
    )
)]
#[axum::debug_handler]
pub async fn export_candidates(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ExportRequest<i64>>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Candidates, Action::View)?;
    export(&state, &state.candidates, &claims, payload).await
}
