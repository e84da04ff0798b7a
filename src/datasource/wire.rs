//! Response shapes of the remote API, converted to canonical records exactly once.

use serde::{Deserialize, Deserializer};

use crate::models::blog_post::BlogPost;
use crate::models::bracket::{ExperienceBracket, SalaryBracket, WorkType};
use crate::models::candidate::CandidateApplication;
use crate::models::employer_request::EmployerRequest;
use crate::models::job::JobPosting;
use crate::utils::salary::normalize_salary;
use crate::utils::time::{now, parse_api_timestamp};

fn deserialize_bool_flexible<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrInt {
        Bool(bool),
        Int(i64),
        String(String),
        Null,
    }

    match BoolOrInt::deserialize(deserializer)? {
        BoolOrInt::Bool(b) => Ok(b),
        BoolOrInt::Int(i) => Ok(i != 0),
        BoolOrInt::String(s) => match s.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(serde::de::Error::custom(format!("Invalid boolean string: {}", s))),
        },
        BoolOrInt::Null => Ok(false),
    }
}

pub(crate) fn default_true() -> bool {
    true
}

/// Relations such as `category` and `author` arrive either as a bare string or as
/// an object carrying a `name`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NameRef {
    Plain(String),
    Named { name: String },
}

impl NameRef {
    pub fn into_name(self) -> String {
        match self {
            NameRef::Plain(name) | NameRef::Named { name } => name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub total: usize,
    #[serde(default)]
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireFilters {
    pub categories: Vec<NameRef>,
    pub countries: Vec<String>,
    pub locations: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireListing<W> {
    Envelope {
        data: Vec<W>,
        #[serde(default)]
        meta: Option<WireMeta>,
        #[serde(default)]
        filters: Option<WireFilters>,
    },
    Bare(Vec<W>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged, bound(deserialize = "W: Deserialize<'de>"))]
pub enum WireDetail<W> {
    Post {
        post: W,
        #[serde(default)]
        related_posts: Vec<W>,
    },
    Data {
        data: W,
    },
    Bare(W),
}

impl<W> WireDetail<W> {
    pub fn into_parts(self) -> (W, Vec<W>) {
        match self {
            WireDetail::Post {
                post,
                related_posts,
            } => (post, related_posts),
            WireDetail::Data { data } => (data, Vec::new()),
            WireDetail::Bare(item) => (item, Vec::new()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireError {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl WireError {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}

/// `{ url }` or `{ image_url }` from the image upload endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireUpload {
    pub url: Option<String>,
    pub image_url: Option<String>,
}

impl WireUpload {
    pub fn into_url(self) -> Option<String> {
        self.url.or(self.image_url)
    }
}

fn timestamp(raw: Option<&str>) -> Option<chrono::DateTime<chrono::Utc>> {
    raw.and_then(parse_api_timestamp)
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireJob {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub work_type: Option<String>,
    #[serde(default, alias = "experience_level")]
    pub experience: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub benefits: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default = "default_true", deserialize_with = "deserialize_bool_flexible")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "deserialize_bool_flexible")]
    pub is_archived: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl TryFrom<WireJob> for JobPosting {
    type Error = String;

    fn try_from(wire: WireJob) -> Result<Self, Self::Error> {
        let work_type = wire
            .work_type
            .as_deref()
            .unwrap_or("on-site")
            .parse::<WorkType>()
            .map_err(|e| e.to_string())?;
        let experience = wire
            .experience
            .as_deref()
            .unwrap_or("0-3")
            .parse::<ExperienceBracket>()
            .map_err(|e| e.to_string())?;

        Ok(JobPosting {
            id: wire.id,
            title: wire.title,
            description: wire.description.unwrap_or_default(),
            country: wire.country.unwrap_or_default(),
            location: wire.location.unwrap_or_default(),
            work_type,
            experience,
            requirements: wire.requirements,
            benefits: wire.benefits,
            salary_range: wire.salary_range.map(|s| normalize_salary(&s)),
            currency: wire.currency,
            is_active: wire.is_active,
            is_archived: wire.is_archived,
            created_at: timestamp(wire.created_at.as_deref()).unwrap_or_else(now),
            updated_at: timestamp(wire.updated_at.as_deref()),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireBlogPost {
    #[serde(default)]
    pub id: Option<i64>,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<NameRef>,
    #[serde(default)]
    pub author: Option<NameRef>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_true", deserialize_with = "deserialize_bool_flexible")]
    pub is_published: bool,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl TryFrom<WireBlogPost> for BlogPost {
    type Error = String;

    fn try_from(wire: WireBlogPost) -> Result<Self, Self::Error> {
        let created_at = timestamp(wire.created_at.as_deref()).unwrap_or_else(now);
        Ok(BlogPost {
            id: wire.id,
            slug: wire.slug,
            title: wire.title,
            excerpt: wire.excerpt.unwrap_or_default(),
            content: wire.content.unwrap_or_default(),
            category: wire
                .category
                .map(NameRef::into_name)
                .unwrap_or_else(|| "General".to_string()),
            author: wire
                .author
                .map(NameRef::into_name)
                .unwrap_or_else(|| "Editorial Team".to_string()),
            image_url: wire.image_url.or(wire.image),
            is_published: wire.is_published,
            published_at: timestamp(wire.published_at.as_deref()),
            created_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireCandidate {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub expected_salary: String,
    #[serde(alias = "experience_level")]
    pub experience: String,
    #[serde(default)]
    pub job_id: Option<i64>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub cv_url: Option<String>,
    #[serde(default)]
    pub cover_letter_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl TryFrom<WireCandidate> for CandidateApplication {
    type Error = String;

    fn try_from(wire: WireCandidate) -> Result<Self, Self::Error> {
        Ok(CandidateApplication {
            id: wire.id,
            name: wire.name,
            email: wire.email,
            nationality: wire.nationality.unwrap_or_default(),
            country: wire.country.unwrap_or_default(),
            expected_salary: SalaryBracket::from_raw(&wire.expected_salary)
                .map_err(|e| e.to_string())?,
            experience: wire.experience.parse().map_err(|e: crate::models::bracket::BracketError| e.to_string())?,
            job_id: wire.job_id,
            job_title: wire.job_title,
            cv_url: wire.cv_url,
            cover_letter_url: wire.cover_letter_url,
            created_at: timestamp(wire.created_at.as_deref()).unwrap_or_else(now),
            updated_at: timestamp(wire.updated_at.as_deref()),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireEmployerRequest {
    pub id: i64,
    pub firm_name: String,
    #[serde(alias = "email")]
    pub contact_email: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub position_title: Option<String>,
    #[serde(default)]
    pub preferred_location: Option<String>,
    #[serde(default)]
    pub preferred_nationality: Option<String>,
    #[serde(alias = "salary_budget")]
    pub budget: String,
    #[serde(alias = "experience_level")]
    pub experience: String,
    #[serde(default)]
    pub qualifications: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl TryFrom<WireEmployerRequest> for EmployerRequest {
    type Error = String;

    fn try_from(wire: WireEmployerRequest) -> Result<Self, Self::Error> {
        Ok(EmployerRequest {
            id: wire.id,
            firm_name: wire.firm_name,
            contact_email: wire.contact_email,
            country: wire.country.unwrap_or_default(),
            position_title: wire.position_title,
            preferred_location: wire.preferred_location.unwrap_or_default(),
            preferred_nationality: wire
                .preferred_nationality
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| crate::models::employer_request::ANY_NATIONALITY.to_string()),
            budget: SalaryBracket::from_raw(&wire.budget).map_err(|e| e.to_string())?,
            experience: wire.experience.parse().map_err(|e: crate::models::bracket::BracketError| e.to_string())?,
            qualifications: wire.qualifications,
            created_at: timestamp(wire.created_at.as_deref()).unwrap_or_else(now),
            updated_at: timestamp(wire.updated_at.as_deref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_and_author_accept_both_shapes() {
        let plain: WireBlogPost = serde_json::from_value(json!({
            "slug": "a", "title": "A", "category": "Tax", "author": "Omar Haddad"
        }))
        .unwrap();
        let nested: WireBlogPost = serde_json::from_value(json!({
            "slug": "b", "title": "B",
            "category": {"id": 4, "name": "Tax"},
            "author": {"name": "Omar Haddad", "email": "o@x.test"}
        }))
        .unwrap();

        let plain = BlogPost::try_from(plain).unwrap();
        let nested = BlogPost::try_from(nested).unwrap();
        assert_eq!(plain.category, nested.category);
        assert_eq!(plain.author, nested.author);
        assert_eq!(nested.category, "Tax");
    }

    #[test]
    fn envelope_and_bare_listings() {
        let env: WireListing<WireJob> = serde_json::from_value(json!({
            "data": [{"id": 1, "title": "Auditor", "work_type": "remote", "experience": "3-7"}],
            "meta": {"current_page": 2, "last_page": 4, "total": 31},
            "filters": {"countries": ["UAE"], "locations": ["Dubai"]}
        }))
        .unwrap();
        match env {
            WireListing::Envelope { data, meta, filters } => {
                assert_eq!(data.len(), 1);
                assert_eq!(meta.unwrap().last_page, 4);
                assert_eq!(filters.unwrap().countries, vec!["UAE".to_string()]);
            }
            WireListing::Bare(_) => panic!("expected envelope"),
        }

        let bare: WireListing<WireJob> =
            serde_json::from_value(json!([{"id": 2, "title": "Clerk"}])).unwrap();
        assert!(matches!(bare, WireListing::Bare(items) if items.len() == 1));
    }

    #[test]
    fn job_flags_accept_integers() {
        let wire: WireJob = serde_json::from_value(json!({
            "id": 9, "title": "Clerk", "is_active": 0, "work_type": "Onsite",
            "salary_range": "2001-3000", "created_at": "2025-01-02 08:00:00"
        }))
        .unwrap();
        let job = JobPosting::try_from(wire).unwrap();
        assert!(!job.is_active);
        assert_eq!(job.work_type, WorkType::OnSite);
        assert_eq!(job.salary_range.as_deref(), Some("2501-3000"));
    }

    #[test]
    fn candidate_salary_is_normalized_or_rejected() {
        let ok: WireCandidate = serde_json::from_value(json!({
            "id": 1, "name": "A", "email": "a@x.test",
            "expected_salary": "1001-2000", "experience": "0-3"
        }))
        .unwrap();
        assert_eq!(
            CandidateApplication::try_from(ok).unwrap().expected_salary,
            SalaryBracket::From1501To2000
        );

        let bad: WireCandidate = serde_json::from_value(json!({
            "id": 2, "name": "B", "email": "b@x.test",
            "expected_salary": "a lot", "experience": "0-3"
        }))
        .unwrap();
        assert!(CandidateApplication::try_from(bad).is_err());
    }

    #[test]
    fn detail_wrappers() {
        let (post, related) = serde_json::from_value::<WireDetail<WireBlogPost>>(json!({
            "post": {"slug": "a", "title": "A"},
            "related_posts": [{"slug": "b", "title": "B"}]
        }))
        .unwrap()
        .into_parts();
        assert_eq!(post.slug, "a");
        assert_eq!(related.len(), 1);

        let (bare, none) = serde_json::from_value::<WireDetail<WireBlogPost>>(json!({
            "slug": "c", "title": "C"
        }))
        .unwrap()
        .into_parts();
        assert_eq!(bare.slug, "c");
        assert!(none.is_empty());
    }
}
