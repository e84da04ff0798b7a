use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::models::user::{Actor, Role};
use crate::services::auth_service::AuthService;
use crate::utils::permissions::{capability, has_permission, Action, Module};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
    pub name: String,
    pub email: String,
    /// Bearer token for the remote API when the session was opened in live mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_token: Option<String>,
}

impl Claims {
    /// An unrecognized role is treated like no session at all.
    pub fn principal(&self) -> Option<Role> {
        self.role.as_deref().and_then(|r| r.parse().ok())
    }

    pub fn can(&self, module: Module, action: Action) -> bool {
        has_permission(self.principal(), &capability(module, action))
    }

    pub fn require(&self, module: Module, action: Action) -> Result<()> {
        if self.can(module, action) {
            Ok(())
        } else {
            tracing::warn!(user = %self.sub, role = ?self.role, module = %module, action = ?action, "Permission denied");
            Err(Error::Forbidden(format!(
                "missing permission {}",
                capability(module, action)
            )))
        }
    }

    pub fn actor(&self) -> Actor {
        Actor {
            id: self.sub.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    pub fn upstream(&self) -> Option<&str> {
        self.upstream_token.as_deref()
    }
}

fn reject(error: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": error }))).into_response()
}

pub async fn require_bearer_auth(
    State(auth): State<AuthService>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return reject("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return reject("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return reject("unsupported_scheme");
    };

    match auth.verify(token.trim()) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(_) => reject("invalid_token"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Option<&str>) -> Claims {
        Claims {
            sub: "u-9".into(),
            exp: 0,
            role: role.map(str::to_string),
            name: "Test".into(),
            email: "t@demo.local".into(),
            upstream_token: None,
        }
    }

    #[test]
    fn editor_may_archive_but_not_delete_jobs() {
        let editor = claims(Some("editor"));
        assert!(editor.require(Module::Jobs, Action::Archive).is_ok());
        assert!(matches!(
            editor.require(Module::Jobs, Action::Delete),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn unknown_or_missing_role_is_denied() {
        for c in [claims(None), claims(Some("owner"))] {
            assert_eq!(c.principal(), None);
            assert!(!c.can(Module::Dashboard, Action::View));
        }
    }
}
