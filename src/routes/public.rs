//! Marketing site reads: open jobs, published articles and form options.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use serde::Serialize;
use serde_json::json;

use crate::{
    datasource::{ListQuery, Visibility},
    error::Result,
    models::{
        blog_post::{AuthorProfile, BlogPost},
        bracket::{ExperienceBracket, SalaryBracket, WorkType},
        job::JobPosting,
    },
    routes::{detail_response, list_response},
    utils::currency::{format_display_date, format_salary_range, job_currency},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct JobView {
    #[serde(flatten)]
    pub job: JobPosting,
    pub salary_display: Option<String>,
    pub posted: String,
}

impl From<JobPosting> for JobView {
    fn from(job: JobPosting) -> Self {
        let currency = job_currency(&job);
        Self {
            salary_display: job
                .salary_range
                .as_deref()
                .map(|range| format_salary_range(range, &currency)),
            posted: format_display_date(job.created_at),
            job,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: BlogPost,
    pub author_profile: &'static AuthorProfile,
    pub reading_minutes: usize,
    pub display_date: String,
}

impl From<BlogPost> for PostView {
    fn from(post: BlogPost) -> Self {
        Self {
            author_profile: post.author_profile(),
            reading_minutes: post.reading_minutes(),
            display_date: format_display_date(post.effective_date()),
            post,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/public/jobs",
    params(
        ("search" = Option<String>, Query, description = "Case-insensitive text search"),
        ("country" = Option<String>, Query, description = "Country filter"),
        ("location" = Option<String>, Query, description = "Location filter"),
        ("work_type" = Option<String>, Query, description = "Work type filter"),
        ("experience" = Option<String>, Query, description = "Experience bracket filter"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "5, 10, 25 or 50")
    ),
    responses(
        (status = 200, description = "Active jobs with pagination and filter options")
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let result = state.jobs.fetch(&query, None).await;
    list_response(result.map(JobView::from))
}

#[utoipa::path(
    get,
    path = "/api/public/jobs/{id}",
    params(
        ("id" = i64, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job found"),
        (status = 404, description = "Job not found or no longer open")
    )
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let result = state.jobs.detail(&id, Visibility::Public, None).await;
    detail_response(result.map(JobView::from))
}

#[utoipa::path(
    get,
    path = "/api/public/blog",
    params(
        ("search" = Option<String>, Query, description = "Case-insensitive text search"),
        ("category" = Option<String>, Query, description = "Category filter"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "5, 10, 25 or 50")
    ),
    responses(
        (status = 200, description = "Published posts, newest first")
    )
)]
#[axum::debug_handler]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let result = state.blog.fetch(&query, None).await;
    list_response(result.map(PostView::from))
}

#[utoipa::path(
    get,
    path = "/api/public/blog/{slug}",
    params(
        ("slug" = String, Path, description = "Post slug")
    ),
    responses(
        (status = 200, description = "Post with up to three related posts"),
        (status = 404, description = "No published post with this slug")
    )
)]
#[axum::debug_handler]
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let result = state.blog.detail(&slug, Visibility::Public, None).await;
    detail_response(result.map(PostView::from))
}

#[utoipa::path(
    get,
    path = "/api/public/options",
    responses(
        (status = 200, description = "Choices offered by the public forms and filters")
    )
)]
#[axum::debug_handler]
pub async fn form_options() -> impl IntoResponse {
    Json(json!({
        "salary_brackets": SalaryBracket::ALL.iter().map(|b| b.as_str()).collect::<Vec<_>>(),
        "experience": ExperienceBracket::ALL.iter().map(|b| b.as_str()).collect::<Vec<_>>(),
        "work_types": WorkType::ALL.iter().map(|w| w.as_str()).collect::<Vec<_>>(),
    }))
}
