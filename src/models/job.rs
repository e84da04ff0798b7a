use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::bracket::{ExperienceBracket, WorkType};
use crate::models::record::{contains_ci, next_numeric_id, Facet, LifecycleAction, Record};
use crate::utils::permissions::Module;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub country: String,
    pub location: String,
    pub work_type: WorkType,
    pub experience: ExperienceBracket,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    pub salary_range: Option<String>,
    pub currency: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for JobPosting {
    type Key = i64;

    const MODULE: Module = Module::Jobs;
    const FACETS: &'static [Facet] = &[
        Facet::Country,
        Facet::Location,
        Facet::WorkType,
        Facet::Experience,
    ];

    fn key(&self) -> i64 {
        self.id
    }

    fn label(&self) -> String {
        self.title.clone()
    }

    fn matches_search(&self, needle: &str) -> bool {
        contains_ci(&self.title, needle)
            || contains_ci(&self.description, needle)
            || contains_ci(&self.location, needle)
            || contains_ci(&self.country, needle)
    }

    fn facet(&self, facet: Facet) -> Option<String> {
        match facet {
            Facet::Country => Some(self.country.clone()),
            Facet::Location => Some(self.location.clone()),
            Facet::WorkType => Some(self.work_type.to_string()),
            Facet::Experience => Some(self.experience.to_string()),
            Facet::Category => None,
        }
    }

    fn sort_date(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn is_public(&self) -> bool {
        self.is_active && !self.is_archived
    }

    fn apply(&mut self, action: LifecycleAction) -> Result<(), String> {
        match action {
            LifecycleAction::Activate => {
                if self.is_archived {
                    return Err("archived jobs cannot be activated".to_string());
                }
                self.is_active = true;
            }
            LifecycleAction::Deactivate => self.is_active = false,
            LifecycleAction::Archive => {
                self.is_archived = true;
                self.is_active = false;
            }
            other => return Err(format!("jobs do not support {}", other)),
        }
        Ok(())
    }

    fn assign_key(&mut self, existing: &[Self]) {
        self.id = next_numeric_id(existing, |j| j.id);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}
