use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::bracket::{ExperienceBracket, SalaryBracket};
use crate::models::record::{contains_ci, next_numeric_id, Facet, Record};
use crate::utils::permissions::Module;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateApplication {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub nationality: String,
    pub country: String,
    pub expected_salary: SalaryBracket,
    pub experience: ExperienceBracket,
    pub job_id: Option<i64>,
    pub job_title: Option<String>,
    pub cv_url: Option<String>,
    pub cover_letter_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for CandidateApplication {
    type Key = i64;

    const MODULE: Module = Module::Candidates;
    const FACETS: &'static [Facet] = &[Facet::Country, Facet::Experience];

    fn key(&self) -> i64 {
        self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn matches_search(&self, needle: &str) -> bool {
        contains_ci(&self.name, needle)
            || contains_ci(&self.email, needle)
            || contains_ci(&self.nationality, needle)
            || self
                .job_title
                .as_deref()
                .map(|t| contains_ci(t, needle))
                .unwrap_or(false)
    }

    fn facet(&self, facet: Facet) -> Option<String> {
        match facet {
            Facet::Country => Some(self.country.clone()),
            Facet::Experience => Some(self.experience.to_string()),
            _ => None,
        }
    }

    fn sort_date(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn assign_key(&mut self, existing: &[Self]) {
        self.id = next_numeric_id(existing, |c| c.id);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}
