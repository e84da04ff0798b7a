pub mod audit_log;
pub mod blog_post;
pub mod bracket;
pub mod candidate;
pub mod employer_request;
pub mod job;
pub mod record;
pub mod user;
