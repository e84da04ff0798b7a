use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::{
    error::{Error, Result},
    services::intake_service::{CandidateInput, EmployerRequestInput},
    utils::validation::{check_upload, CheckedUpload, UploadKind},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/employer-requests",
    responses(
        (status = 201, description = "Request accepted"),
        (status = 400, description = "Invalid payload"),
        (status = 422, description = "Rejected by the API")
    )
)]
#[axum::debug_handler]
pub async fn submit_employer_request(
    State(state): State<AppState>,
    Json(payload): Json<EmployerRequestInput>,
) -> Result<impl IntoResponse> {
    let submission = state.intake.submit_employer_request(payload).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

#[utoipa::path(
    post,
    path = "/api/candidate-applications",
    responses(
        (status = 201, description = "Application accepted"),
        (status = 400, description = "Missing field, bad bracket or unacceptable file")
    )
)]
#[axum::debug_handler]
pub async fn submit_application(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut name = String::new();
    let mut email = String::new();
    let mut nationality = String::new();
    let mut country = String::new();
    let mut expected_salary = String::new();
    let mut experience = String::new();
    let mut job_id = None;
    let mut cv: Option<CheckedUpload> = None;
    let mut cover_letter: Option<CheckedUpload> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => name = field.text().await?,
            "email" => email = field.text().await?,
            "nationality" => nationality = field.text().await?,
            "country" => country = field.text().await?,
            "expected_salary" => expected_salary = field.text().await?,
            "experience" => experience = field.text().await?,
            "job_id" => {
                let raw = field.text().await?;
                if !raw.trim().is_empty() {
                    job_id = Some(
                        raw.trim()
                            .parse::<i64>()
                            .map_err(|_| Error::BadRequest("job_id must be a number".into()))?,
                    );
                }
            }
            "cv" | "cover_letter" => {
                let file_name = field.file_name().unwrap_or("upload.bin").to_string();
                let data = field.bytes().await?;
                if data.is_empty() {
                    continue;
                }
                let checked = check_upload(UploadKind::Document, &file_name, data)?;
                if field_name == "cv" {
                    cv = Some(checked);
                } else {
                    cover_letter = Some(checked);
                }
            }
            other => tracing::debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    let input = CandidateInput {
        name,
        email,
        nationality,
        country,
        expected_salary,
        experience,
        job_id,
    };
    let submission = state
        .intake
        .submit_application(input, cv, cover_letter)
        .await?;
    Ok((StatusCode::CREATED, Json(submission)))
}
