use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    datasource::Visibility,
    error::Result,
    middleware::auth::Claims,
    models::employer_request::EmployerRequest,
    routes::{
        admin_query, bulk_delete, detail_response, export, list_response, BulkRequest,
        ExportRequest,
    },
    utils::permissions::{Action, Module},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/employer-requests",
    params(
        ("search" = Option<String>, Query, description = "Firm, email or position"),
        ("country" = Option<String>, Query, description = "Country filter"),
        ("location" = Option<String>, Query, description = "Preferred location filter"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Remembered per user when given")
    ),
    responses(
        (status = 200, description = "Hiring requests, newest first")
    )
)]
#[axum::debug_handler]
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    uri: Uri,
) -> Result<impl IntoResponse> {
    claims.require(Module::EmployerRequests, Action::View)?;
    let query = admin_query(&state, &claims, "employer_requests", &uri)?;
    list_response(
        state
            .employer_requests
            .fetch(&query, claims.upstream())
            .await,
    )
}

#[utoipa::path(
    get,
    path = "/api/admin/employer-requests/{id}",
    params(("id" = i64, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request found"),
        (status = 404, description = "Request not found")
    )
)]
#[axum::debug_handler]
pub async fn get_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    claims.require(Module::EmployerRequests, Action::View)?;
    detail_response(
        state
            .employer_requests
            .detail(&id, Visibility::All, claims.upstream())
            .await,
    )
}

#[utoipa::path(
    delete,
    path = "/api/admin/employer-requests/{id}",
    params(("id" = i64, Path, description = "Request ID")),
    responses(
        (status = 204, description = "Request deleted"),
        (status = 403, description = "Missing employer_requests:delete")
    )
)]
#[axum::debug_handler]
pub async fn delete_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    claims.require(Module::EmployerRequests, Action::Delete)?;
    let removed = state
        .employer_requests
        .delete(&id, claims.upstream())
        .await?;
    state
        .audit
        .deleted::<EmployerRequest>(&claims.actor(), &id, removed.as_ref())
        .await;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/employer-requests/bulk-delete",
    responses(
        (status = 200, description = "Deleted, missing and failed ids")
    )
)]
#[axum::debug_handler]
pub async fn bulk_delete_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BulkRequest<i64>>,
) -> Result<impl IntoResponse> {
    claims.require(Module::EmployerRequests, Action::Delete)?;
    let outcome = bulk_delete(&state, &state.employer_requests, &claims, payload.ids).await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/admin/employer-requests/export",
    responses(
        (status = 200, description = "CSV or XLSX of the selected (or all) requests")
    )
)]
#[axum::debug_handler]
pub async fn export_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ExportRequest<i64>>,
) -> Result<impl IntoResponse> {
    claims.require(Module::EmployerRequests, Action::View)?;
    export(&state, &state.employer_requests, &claims, payload).await
}
