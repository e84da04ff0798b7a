use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Where entity data comes from for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiMode {
    Live,
    Demo,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub jwt_secret: String,
    pub api_base_url: Option<String>,
    pub api_live_mode: bool,
    pub api_timeout_secs: u64,
    pub demo_store_path: Option<PathBuf>,
    pub preferences_path: Option<PathBuf>,
    pub uploads_dir: PathBuf,
    pub public_rps: u32,
    pub admin_rps: u32,
    pub session_ttl_hours: i64,
    pub cors_origin: Option<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            jwt_secret: get_env("JWT_SECRET")?,
            api_base_url: get_env_opt("API_BASE_URL"),
            api_live_mode: get_env_opt("API_LIVE_MODE")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            api_timeout_secs: get_env_parse_or("API_TIMEOUT_SECS", 15)?,
            demo_store_path: get_env_opt("DEMO_STORE_PATH").map(PathBuf::from),
            preferences_path: get_env_opt("PREFERENCES_PATH").map(PathBuf::from),
            uploads_dir: get_env_opt("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./uploads")),
            public_rps: get_env_parse_or("PUBLIC_RPS", 20)?,
            admin_rps: get_env_parse_or("ADMIN_RPS", 50)?,
            session_ttl_hours: get_env_parse_or("SESSION_TTL_HOURS", 12)?,
            cors_origin: get_env_opt("CORS_ORIGIN"),
        })
    }

    /// Demo-only configuration with nothing persisted. Used by tests and local tooling.
    pub fn demo(jwt_secret: impl Into<String>) -> Self {
        Self {
            server_address: "127.0.0.1:0".to_string(),
            jwt_secret: jwt_secret.into(),
            api_base_url: None,
            api_live_mode: false,
            api_timeout_secs: 15,
            demo_store_path: None,
            preferences_path: None,
            uploads_dir: env::temp_dir().join("accounting-portal-uploads"),
            public_rps: 100,
            admin_rps: 100,
            session_ttl_hours: 12,
            cors_origin: None,
        }
    }

    /// A configured base URL alone is not enough: the live flag must be set too.
    pub fn api_mode(&self) -> ApiMode {
        match (&self.api_base_url, self.api_live_mode) {
            (Some(url), true) if !url.trim().is_empty() => ApiMode::Live,
            _ => ApiMode::Demo,
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
