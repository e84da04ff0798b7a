use axum::{
    extract::State,
    http::Uri,
    response::IntoResponse,
    Extension,
};

use crate::{
    error::Result,
    middleware::auth::Claims,
    routes::{admin_query, list_response},
    utils::permissions::{Action, Module},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/audit-log",
    params(
        ("search" = Option<String>, Query, description = "Resource, actor or module"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Remembered per user when given")
    ),
    responses(
        (status = 200, description = "Audit entries, newest first"),
        (status = 403, description = "Missing audit_log:view")
    )
)]
#[axum::debug_handler]
pub async fn list_entries(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    uri: Uri,
) -> Result<impl IntoResponse> {
    claims.require(Module::AuditLog, Action::View)?;
    let query = admin_query(&state, &claims, "audit_log", &uri)?;
    list_response(state.audit_log.fetch(&query, claims.upstream()).await)
}
