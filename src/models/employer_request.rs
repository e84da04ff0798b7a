use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::bracket::{ExperienceBracket, SalaryBracket};
use crate::models::record::{contains_ci, next_numeric_id, Facet, Record};
use crate::utils::permissions::Module;

pub const ANY_NATIONALITY: &str = "Any";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployerRequest {
    pub id: i64,
    pub firm_name: String,
    pub contact_email: String,
    pub country: String,
    pub position_title: Option<String>,
    pub preferred_location: String,
    pub preferred_nationality: String,
    pub budget: SalaryBracket,
    pub experience: ExperienceBracket,
    pub qualifications: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl EmployerRequest {
    pub fn accepts_any_nationality(&self) -> bool {
        self.preferred_nationality.eq_ignore_ascii_case(ANY_NATIONALITY)
    }
}

impl Record for EmployerRequest {
    type Key = i64;

    const MODULE: Module = Module::EmployerRequests;
    const FACETS: &'static [Facet] = &[Facet::Country, Facet::Location, Facet::Experience];

    fn key(&self) -> i64 {
        self.id
    }

    fn label(&self) -> String {
        self.firm_name.clone()
    }

    fn matches_search(&self, needle: &str) -> bool {
        contains_ci(&self.firm_name, needle)
            || contains_ci(&self.contact_email, needle)
            || self
                .position_title
                .as_deref()
                .map(|t| contains_ci(t, needle))
                .unwrap_or(false)
    }

    fn facet(&self, facet: Facet) -> Option<String> {
        match facet {
            Facet::Country => Some(self.country.clone()),
            Facet::Location => Some(self.preferred_location.clone()),
            Facet::Experience => Some(self.experience.to_string()),
            _ => None,
        }
    }

    fn sort_date(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn assign_key(&mut self, existing: &[Self]) {
        self.id = next_numeric_id(existing, |r| r.id);
    }
}
