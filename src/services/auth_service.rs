use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::{ApiMode, Config};
use crate::datasource::wire::{NameRef, WireError};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::user::{AdminUser, Role};
use crate::store::DemoStore;
use crate::utils::crypto::verify_password;

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub expires_at: chrono::DateTime<Utc>,
    pub user: AdminUser,
}

#[derive(Debug, Deserialize)]
struct WireLogin {
    #[serde(alias = "access_token")]
    token: String,
    user: WireLoginUser,
}

#[derive(Debug, Deserialize)]
struct WireLoginUser {
    id: serde_json::Value,
    name: String,
    email: String,
    role: NameRef,
}

/// Issues and verifies admin session tokens.
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
    ttl: Duration,
    mode: ApiMode,
    api_base_url: Option<String>,
    client: Client,
    store: DemoStore,
}

impl AuthService {
    pub fn new(config: &Config, client: Client, store: DemoStore) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            ttl: Duration::hours(config.session_ttl_hours.max(1)),
            mode: config.api_mode(),
            api_base_url: config
                .api_base_url
                .as_deref()
                .map(|u| u.trim_end_matches('/').to_string()),
            client,
            store,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        match (self.mode, self.api_base_url.as_deref()) {
            (ApiMode::Live, Some(base_url)) => self.login_remote(base_url, email, password).await,
            _ => self.login_demo(email, password),
        }
    }

    fn login_demo(&self, email: &str, password: &str) -> Result<Session> {
        let invalid = || Error::Unauthorized("invalid_credentials".to_string());

        let user = self.store.user_by_email(email).ok_or_else(invalid)?;
        let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
        let ok = verify_password(password, hash)
            .map_err(|e| Error::Internal(format!("Password verification failed: {}", e)))?;
        if !ok {
            tracing::warn!(email = %email, "Rejected demo login");
            return Err(invalid());
        }
        tracing::info!(user = %user.id, role = %user.role, "Demo login");
        self.issue(user, None)
    }

    async fn login_remote(&self, base_url: &str, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/api/admin/login", base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::FORBIDDEN
        ) {
            let message = response
                .json::<WireError>()
                .await
                .ok()
                .and_then(WireError::into_message);
            tracing::warn!(email = %email, status = %status, "API rejected login");
            return Err(Error::Unauthorized(
                message.unwrap_or_else(|| "invalid_credentials".to_string()),
            ));
        }
        if !status.is_success() {
            return Err(Error::Upstream(format!("Login endpoint responded with {}", status)));
        }

        let login: WireLogin = response.json().await?;
        let role: Role = login
            .user
            .role
            .into_name()
            .parse()
            .map_err(Error::Forbidden)?;
        let id = match login.user.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        let user = AdminUser {
            id,
            name: login.user.name,
            email: login.user.email,
            role,
            password_hash: None,
        };
        tracing::info!(user = %user.id, role = %user.role, "Live login");
        self.issue(user, Some(login.token))
    }

    pub fn issue(&self, mut user: AdminUser, upstream_token: Option<String>) -> Result<Session> {
        user.password_hash = None;
        let expires_at = Utc::now() + self.ttl;
        let claims = Claims {
            sub: user.id.clone(),
            exp: expires_at.timestamp() as usize,
            role: Some(user.role.as_str().to_string()),
            name: user.name.clone(),
            email: user.email.clone(),
            upstream_token,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;
        Ok(Session {
            token,
            expires_at,
            user,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }
}
