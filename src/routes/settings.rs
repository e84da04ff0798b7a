use std::collections::BTreeMap;

use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    middleware::auth::Claims,
    store::preferences::{page_size_key, page_sizes, set_theme, theme, ThemeVariant, PAGINATED_LISTS},
    utils::pagination::{PageSize, Paginator},
    utils::permissions::{Action, Module},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub theme: ThemeVariant,
    pub page_sizes: BTreeMap<String, u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsPayload {
    pub theme: Option<ThemeVariant>,
    #[serde(default)]
    pub page_sizes: BTreeMap<String, PageSize>,
}

fn current(state: &AppState, user_id: &str) -> SettingsView {
    let storage = state.preferences.as_ref();
    SettingsView {
        theme: theme(storage, user_id),
        page_sizes: page_sizes(storage, user_id),
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/settings",
    responses(
        (status = 200, description = "Theme and remembered page sizes of the current user")
    )
)]
#[axum::debug_handler]
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Settings, Action::View)?;
    Ok(Json(current(&state, &claims.sub)))
}

#[utoipa::path(
    put,
    path = "/api/admin/settings",
    responses(
        (status = 200, description = "Preferences saved"),
        (status = 400, description = "Unknown list or unsupported page size")
    )
)]
#[axum::debug_handler]
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SettingsPayload>,
) -> Result<impl IntoResponse> {
    claims.require(Module::Settings, Action::Update)?;
    let storage = state.preferences.as_ref();

    if let Some(unknown) = payload
        .page_sizes
        .keys()
        .find(|list| !PAGINATED_LISTS.contains(&list.as_str()))
    {
        return Err(Error::BadRequest(format!("unknown list '{}'", unknown)));
    }
    if let Some(variant) = payload.theme {
        set_theme(storage, &claims.sub, variant)?;
    }
    for (list, size) in &payload.page_sizes {
        Paginator::new(*size).persist(storage, &page_size_key(&claims.sub, list))?;
    }
    tracing::info!(user = %claims.sub, "Preferences updated");
    Ok(Json(current(&state, &claims.sub)))
}
