pub mod config;
pub mod datasource;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::datasource::{build_client, local_source, select_source, RemoteRecord};
use crate::error::Result;
use crate::models::{
    audit_log::AuditLogEntry, blog_post::BlogPost, candidate::CandidateApplication,
    employer_request::EmployerRequest, job::JobPosting,
};
use crate::services::{
    audit_service::AuditService, auth_service::AuthService, feed::Feed,
    intake_service::IntakeService, upload_service::UploadService,
};
use crate::store::fixtures::sample_blog_posts;
use crate::store::preferences::{FileStorage, KeyValueStorage, MemoryStorage};
use crate::store::{DemoStore, Stored};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: DemoStore,
    pub preferences: Arc<dyn KeyValueStorage + Send + Sync>,
    pub jobs: Feed<JobPosting>,
    pub blog: Feed<BlogPost>,
    pub candidates: Feed<CandidateApplication>,
    pub employer_requests: Feed<EmployerRequest>,
    pub audit_log: Feed<AuditLogEntry>,
    pub auth: AuthService,
    pub audit: AuditService,
    pub intake: IntakeService,
    pub uploads: UploadService,
}

fn feed<T>(config: &Config, client: &reqwest::Client, store: &DemoStore, bundled: Vec<T>) -> Result<Feed<T>>
where
    T: RemoteRecord + Stored,
{
    let local = local_source(store, bundled);
    let primary = select_source(config, client, local.clone())?;
    Ok(Feed::new(primary, local))
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let mode = config.api_mode();
        tracing::info!(mode = ?mode, "Selecting data source");

        let http_client = build_client(&config)?;
        let store = DemoStore::open(config.demo_store_path.clone())?;
        let preferences: Arc<dyn KeyValueStorage + Send + Sync> = match &config.preferences_path {
            Some(path) => Arc::new(FileStorage::open(path)?),
            None => Arc::new(MemoryStorage::new()),
        };

        let uploads = UploadService::new(&config, http_client.clone());
        let intake = IntakeService::new(&config, http_client.clone(), store.clone(), uploads.clone());
        let auth = AuthService::new(&config, http_client.clone(), store.clone());
        let audit = AuditService::new(store.clone(), mode);

        Ok(Self {
            jobs: feed(&config, &http_client, &store, Vec::new())?,
            blog: feed(&config, &http_client, &store, sample_blog_posts())?,
            candidates: feed(&config, &http_client, &store, Vec::new())?,
            employer_requests: feed(&config, &http_client, &store, Vec::new())?,
            audit_log: feed(&config, &http_client, &store, Vec::new())?,
            config: Arc::new(config),
            store,
            preferences,
            auth,
            audit,
            intake,
            uploads,
        })
    }
}
