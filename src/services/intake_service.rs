//! Public form submissions: employer hiring requests and candidate applications.

use reqwest::{multipart, Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::{ApiMode, Config};
use crate::datasource::wire::WireError;
use crate::datasource::Origin;
use crate::error::{Error, Result};
use crate::models::bracket::{ExperienceBracket, SalaryBracket};
use crate::models::candidate::CandidateApplication;
use crate::models::employer_request::{EmployerRequest, ANY_NATIONALITY};
use crate::models::job::JobPosting;
use crate::services::upload_service::UploadService;
use crate::store::DemoStore;
use crate::utils::time::now;
use crate::utils::validation::{validate, CheckedUpload};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EmployerRequestInput {
    #[validate(length(min = 1, max = 200))]
    pub firm_name: String,
    #[validate(email)]
    pub contact_email: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    pub position_title: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub preferred_location: String,
    pub preferred_nationality: Option<String>,
    pub budget: String,
    pub experience: String,
    #[validate(length(max = 2000))]
    pub qualifications: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CandidateInput {
    #[validate(length(min = 2, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub nationality: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    pub expected_salary: String,
    pub experience: String,
    pub job_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

fn salary(raw: &str, field: &str) -> Result<SalaryBracket> {
    SalaryBracket::from_raw(raw).map_err(|e| Error::BadRequest(format!("{}: {}", field, e)))
}

fn experience(raw: &str) -> Result<ExperienceBracket> {
    raw.parse()
        .map_err(|e: crate::models::bracket::BracketError| {
            Error::BadRequest(format!("experience: {}", e))
        })
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl EmployerRequestInput {
    fn into_record(self) -> Result<EmployerRequest> {
        Ok(EmployerRequest {
            id: 0,
            budget: salary(&self.budget, "budget")?,
            experience: experience(&self.experience)?,
            firm_name: self.firm_name.trim().to_string(),
            contact_email: self.contact_email.trim().to_string(),
            country: self.country,
            position_title: optional(self.position_title),
            preferred_location: self.preferred_location,
            preferred_nationality: optional(self.preferred_nationality)
                .unwrap_or_else(|| ANY_NATIONALITY.to_string()),
            qualifications: optional(self.qualifications),
            created_at: now(),
            updated_at: None,
        })
    }
}

#[derive(Clone)]
pub struct IntakeService {
    mode: ApiMode,
    api_base_url: Option<String>,
    client: Client,
    store: DemoStore,
    uploads: UploadService,
}

impl IntakeService {
    pub fn new(config: &Config, client: Client, store: DemoStore, uploads: UploadService) -> Self {
        Self {
            mode: config.api_mode(),
            api_base_url: config
                .api_base_url
                .as_deref()
                .map(|u| u.trim_end_matches('/').to_string()),
            client,
            store,
            uploads,
        }
    }

    fn live_base(&self) -> Option<&str> {
        match self.mode {
            ApiMode::Live => self.api_base_url.as_deref(),
            ApiMode::Demo => None,
        }
    }

    pub async fn submit_employer_request(&self, input: EmployerRequestInput) -> Result<Submission> {
        validate(&input)?;
        let record = input.into_record()?;

        if let Some(base_url) = self.live_base() {
            let request = self
                .client
                .post(format!("{}/api/employer-requests", base_url))
                .json(&record);
            let id = forward(request).await?;
            tracing::info!(firm = %record.firm_name, "Employer request forwarded");
            return Ok(Submission {
                origin: Origin::Remote,
                id,
            });
        }

        let created = self.store.insert(record).await?;
        tracing::info!(id = created.id, firm = %created.firm_name, "Employer request stored");
        Ok(Submission {
            origin: Origin::Local,
            id: Some(created.id),
        })
    }

    /// The CV is required; the cover letter is optional. Both are validated upstream.
    pub async fn submit_application(
        &self,
        input: CandidateInput,
        cv: Option<CheckedUpload>,
        cover_letter: Option<CheckedUpload>,
    ) -> Result<Submission> {
        validate(&input)?;
        let cv = cv.ok_or_else(|| Error::BadRequest("cv is required".into()))?;
        let expected_salary = salary(&input.expected_salary, "expected_salary")?;
        let experience = experience(&input.experience)?;

        if let Some(base_url) = self.live_base() {
            let mut form = multipart::Form::new()
                .text("name", input.name.clone())
                .text("email", input.email.clone())
                .text("nationality", input.nationality.clone())
                .text("country", input.country.clone())
                .text("expected_salary", expected_salary.as_str())
                .text("experience", experience.as_str())
                .part("cv", file_part(&cv)?);
            if let Some(job_id) = input.job_id {
                form = form.text("job_id", job_id.to_string());
            }
            if let Some(letter) = &cover_letter {
                form = form.part("cover_letter", file_part(letter)?);
            }
            let request = self
                .client
                .post(format!("{}/api/candidate-applications", base_url))
                .multipart(form);
            let id = forward(request).await?;
            tracing::info!(email = %input.email, "Candidate application forwarded");
            return Ok(Submission {
                origin: Origin::Remote,
                id,
            });
        }

        let job_title = match input.job_id {
            Some(job_id) => Some(
                self.store
                    .find::<JobPosting>(&job_id)
                    .map(|job| job.title)
                    .ok_or_else(|| Error::BadRequest(format!("job {} does not exist", job_id)))?,
            ),
            None => None,
        };
        let cv_url = self.uploads.store_local("cv", &cv).await?;
        let cover_letter_url = match &cover_letter {
            Some(letter) => Some(self.uploads.store_local("cover-letters", letter).await?),
            None => None,
        };

        let created = self.store.insert(CandidateApplication {
            id: 0,
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            nationality: input.nationality,
            country: input.country,
            expected_salary,
            experience,
            job_id: input.job_id,
            job_title,
            cv_url: Some(cv_url),
            cover_letter_url,
            created_at: now(),
            updated_at: None,
        })
        .await?;
        tracing::info!(id = created.id, "Candidate application stored");
        Ok(Submission {
            origin: Origin::Local,
            id: Some(created.id),
        })
    }
}

fn file_part(upload: &CheckedUpload) -> Result<multipart::Part> {
    Ok(multipart::Part::bytes(upload.data.to_vec())
        .file_name(upload.file_name.clone())
        .mime_str(&upload.content_type)?)
}

/// Sends a public submission. Failures are surfaced as-is; nothing is stored locally instead.
async fn forward(request: RequestBuilder) -> Result<Option<i64>> {
    let response = request
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| Error::Upstream(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let id = body
            .pointer("/data/id")
            .or_else(|| body.get("id"))
            .and_then(serde_json::Value::as_i64);
        return Ok(id);
    }
    if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY) {
        let message = response
            .json::<WireError>()
            .await
            .ok()
            .and_then(WireError::into_message)
            .unwrap_or_else(|| "Submission rejected".to_string());
        return Err(Error::Rejected(message));
    }
    Err(Error::Upstream(format!("API responded with {}", status)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::{check_upload, UploadKind};
    use bytes::Bytes;

    fn service(store: &DemoStore, dir: &std::path::Path) -> IntakeService {
        let mut config = Config::demo("secret");
        config.uploads_dir = dir.to_path_buf();
        let client = Client::new();
        let uploads = UploadService::new(&config, client.clone());
        IntakeService::new(&config, client, store.clone(), uploads)
    }

    fn employer_input() -> EmployerRequestInput {
        EmployerRequestInput {
            firm_name: "Ledger & Co".into(),
            contact_email: "ops@ledger.test".into(),
            country: "Qatar".into(),
            position_title: Some("  ".into()),
            preferred_location: "Doha".into(),
            preferred_nationality: None,
            budget: "2001-3000".into(),
            experience: "3-7".into(),
            qualifications: None,
        }
    }

    #[tokio::test]
    async fn employer_request_is_normalized_and_stored() {
        let dir = tempfile::tempdir().unwrap();
        let store = DemoStore::seeded();
        let submission = service(&store, dir.path())
            .submit_employer_request(employer_input())
            .await
            .unwrap();

        assert_eq!(submission.origin, Origin::Local);
        let stored = store.find::<EmployerRequest>(&submission.id.unwrap()).unwrap();
        assert_eq!(stored.budget, SalaryBracket::From2501To3000);
        assert!(stored.accepts_any_nationality());
        assert!(stored.position_title.is_none());
    }

    #[tokio::test]
    async fn invalid_email_and_bracket_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = DemoStore::seeded();
        let intake = service(&store, dir.path());

        let mut bad_email = employer_input();
        bad_email.contact_email = "not-an-email".into();
        assert!(matches!(
            intake.submit_employer_request(bad_email).await,
            Err(Error::Validation(_))
        ));

        let mut bad_budget = employer_input();
        bad_budget.budget = "negotiable".into();
        assert!(matches!(
            intake.submit_employer_request(bad_budget).await,
            Err(Error::BadRequest(_))
        ));
        assert_eq!(store.count::<EmployerRequest>(), 3);
    }

    #[tokio::test]
    async fn application_stores_cv_and_links_job() {
        let dir = tempfile::tempdir().unwrap();
        let store = DemoStore::seeded();
        let cv = check_upload(
            UploadKind::Document,
            "cv.pdf",
            Bytes::from_static(b"%PDF-1.4 test"),
        )
        .unwrap();
        let input = CandidateInput {
            name: "Noor Aziz".into(),
            email: "noor@mail.test".into(),
            nationality: "Jordanian".into(),
            country: "Jordan".into(),
            expected_salary: "1001-2000".into(),
            experience: "0-3".into(),
            job_id: Some(2),
        };

        let submission = service(&store, dir.path())
            .submit_application(input.clone(), Some(cv), None)
            .await
            .unwrap();
        let stored = store
            .find::<CandidateApplication>(&submission.id.unwrap())
            .unwrap();
        assert_eq!(stored.job_title.as_deref(), Some("Payroll Specialist"));
        assert_eq!(stored.expected_salary, SalaryBracket::From1501To2000);
        assert!(stored.cv_url.unwrap().starts_with("/uploads/cv/"));

        let missing_cv = service(&store, dir.path())
            .submit_application(input, None, None)
            .await;
        assert!(matches!(missing_cv, Err(Error::BadRequest(_))));
    }
}
