use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;

use crate::{
    error::{Error, Result},
    middleware::auth::Claims,
    utils::permissions::{Action, Module},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/admin/upload-image",
    responses(
        (status = 201, description = "Image stored; returns its url"),
        (status = 400, description = "Missing, oversized or non-image file")
    )
)]
#[axum::debug_handler]
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    claims.require(Module::Blog, Action::Update)?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image.bin").to_string();
        let data = field.bytes().await?;
        let url = state
            .uploads
            .upload_image(&file_name, data, claims.upstream())
            .await?;
        tracing::info!(user = %claims.sub, url = %url, "Image uploaded");
        return Ok((StatusCode::CREATED, Json(json!({ "url": url }))));
    }
    Err(Error::BadRequest("image field is required".into()))
}
