use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    error::{Error, Result},
    middleware::auth::Claims,
    utils::permissions::permissions_for,
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
    responses(
        (status = 200, description = "Session token issued"),
        (status = 401, description = "Invalid credentials")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let session = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(session))
}

#[utoipa::path(
    get,
    path = "/api/admin/me",
    responses(
        (status = 200, description = "Current user with resolved permissions"),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn me(Extension(claims): Extension<Claims>) -> Result<impl IntoResponse> {
    let role = claims
        .principal()
        .ok_or_else(|| Error::Unauthorized("unknown_role".into()))?;
    Ok(Json(json!({
        "user": claims.actor(),
        "role": role,
        "permissions": permissions_for(role),
        "expires_at": claims.exp,
    })))
}
