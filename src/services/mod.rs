pub mod audit_service;
pub mod auth_service;
pub mod export_service;
pub mod feed;
pub mod intake_service;
pub mod upload_service;
