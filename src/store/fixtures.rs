//! Seed data for demo mode.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::blog_post::BlogPost;
use crate::models::bracket::{ExperienceBracket, SalaryBracket, WorkType};
use crate::models::candidate::CandidateApplication;
use crate::models::employer_request::EmployerRequest;
use crate::models::job::JobPosting;
use crate::models::user::{AdminUser, Role};
use crate::utils::crypto::hash_password;

/// Shared password of every seeded admin account.
pub const DEMO_PASSWORD: &str = "portal-demo";

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

fn demo_password_hash() -> Option<String> {
    static HASH: OnceLock<Option<String>> = OnceLock::new();
    HASH.get_or_init(|| match hash_password(DEMO_PASSWORD) {
        Ok(hash) => Some(hash),
        Err(e) => {
            tracing::error!(error = %e, "Failed to hash demo password; demo logins disabled");
            None
        }
    })
    .clone()
}

pub fn users() -> Vec<AdminUser> {
    let hash = demo_password_hash();
    [
        ("u-1", "Layla Farouk", "admin@demo.local", Role::SuperAdmin),
        ("u-2", "Daniel Okafor", "editor@demo.local", Role::Editor),
        ("u-3", "Mina Sato", "viewer@demo.local", Role::Viewer),
    ]
    .into_iter()
    .map(|(id, name, email, role)| AdminUser {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role,
        password_hash: hash.clone(),
    })
    .collect()
}

#[allow(clippy::too_many_arguments)]
fn job(
    id: i64,
    title: &str,
    country: &str,
    location: &str,
    work_type: WorkType,
    experience: ExperienceBracket,
    salary_range: Option<&str>,
    created_at: DateTime<Utc>,
) -> JobPosting {
    JobPosting {
        id,
        title: title.to_string(),
        description: format!(
            "Join our outsourced finance team as a {} supporting clients across the region.",
            title
        ),
        country: country.to_string(),
        location: location.to_string(),
        work_type,
        experience,
        requirements: Some("Degree in accounting or finance; IFRS knowledge.".to_string()),
        benefits: Some("Health cover, annual flight, training budget.".to_string()),
        salary_range: salary_range.map(str::to_string),
        currency: None,
        is_active: true,
        is_archived: false,
        created_at,
        updated_at: None,
    }
}

pub fn jobs() -> Vec<JobPosting> {
    use ExperienceBracket::*;
    use WorkType::*;

    let mut list = vec![
        job(1, "Senior Accountant", "United Arab Emirates", "Dubai", OnSite, Mid, Some("2501-3000"), at(2025, 1, 6)),
        job(2, "Payroll Specialist", "Saudi Arabia", "Riyadh", Hybrid, Junior, Some("1501-2000"), at(2025, 1, 20)),
        job(3, "Tax Consultant", "United Kingdom", "London", Remote, Senior, Some("4001-5000"), at(2025, 2, 3)),
        job(4, "Bookkeeper", "Philippines", "Manila", Remote, Junior, Some("0-1000"), at(2025, 2, 17)),
        job(5, "Finance Manager", "United Arab Emirates", "Abu Dhabi", Flexible, Expert, Some("5001+"), at(2025, 3, 2)),
        job(6, "Audit Associate", "India", "Bengaluru", OnSite, Junior, None, at(2024, 11, 12)),
    ];
    if let Some(last) = list.last_mut() {
        last.is_active = false;
        last.is_archived = true;
    }
    list
}

#[allow(clippy::too_many_arguments)]
fn post(
    id: Option<i64>,
    slug: &str,
    title: &str,
    category: &str,
    author: &str,
    is_published: bool,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
) -> BlogPost {
    BlogPost {
        id,
        slug: slug.to_string(),
        title: title.to_string(),
        excerpt: format!("{}: what finance leaders need to know.", title),
        content: format!("## {}\n\nPractical guidance from our advisory team.", title),
        category: category.to_string(),
        author: author.to_string(),
        image_url: Some(format!("/images/blog/{}.jpg", slug)),
        is_published,
        published_at,
        created_at,
    }
}

/// Posts authored through the admin dashboard in demo mode.
pub fn blog_posts() -> Vec<BlogPost> {
    vec![
        post(
            Some(1),
            "vat-registration-checklist",
            "VAT Registration Checklist (2025 Update)",
            "Tax",
            "Omar Haddad",
            true,
            Some(at(2025, 3, 1)),
            at(2025, 2, 26),
        ),
        post(
            Some(2),
            "hiring-remote-accountants",
            "Hiring Remote Accountants",
            "Careers",
            "Priya Raman",
            false,
            None,
            at(2025, 3, 4),
        ),
    ]
}

/// Sample articles bundled with the site, shown beneath admin-authored posts.
pub fn sample_blog_posts() -> Vec<BlogPost> {
    vec![
        post(
            None,
            "vat-registration-checklist",
            "VAT Registration Checklist",
            "Tax",
            "Editorial Team",
            true,
            Some(at(2024, 6, 10)),
            at(2024, 6, 10),
        ),
        post(
            None,
            "month-end-close-playbook",
            "A Month-End Close Playbook",
            "Accounting",
            "Sarah Mitchell",
            true,
            Some(at(2024, 9, 2)),
            at(2024, 9, 1),
        ),
        post(
            None,
            "outsourcing-vs-inhouse",
            "Outsourcing vs. In-House Finance Teams",
            "Outsourcing",
            "Sarah Mitchell",
            true,
            None,
            at(2024, 12, 5),
        ),
        post(
            None,
            "corporate-tax-basics",
            "Corporate Tax Basics for SMEs",
            "Tax",
            "Omar Haddad",
            true,
            Some(at(2025, 1, 15)),
            at(2025, 1, 14),
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn candidate(
    id: i64,
    name: &str,
    nationality: &str,
    country: &str,
    salary: SalaryBracket,
    experience: ExperienceBracket,
    job_id: Option<i64>,
    created_at: DateTime<Utc>,
) -> CandidateApplication {
    let handle = name.to_lowercase().replace(' ', ".");
    CandidateApplication {
        id,
        name: name.to_string(),
        email: format!("{}@mail.test", handle),
        nationality: nationality.to_string(),
        country: country.to_string(),
        expected_salary: salary,
        experience,
        job_id,
        job_title: job_id.and_then(|id| jobs().into_iter().find(|j| j.id == id).map(|j| j.title)),
        cv_url: Some(format!("/uploads/cv/{}.pdf", handle)),
        cover_letter_url: None,
        created_at,
        updated_at: None,
    }
}

pub fn candidates() -> Vec<CandidateApplication> {
    use ExperienceBracket::*;
    use SalaryBracket::*;

    vec![
        candidate(1, "Aisha Khan", "Pakistani", "United Arab Emirates", From2501To3000, Mid, Some(1), at(2025, 1, 9)),
        candidate(2, "Rafael Cruz", "Filipino", "Philippines", UpTo1000, Junior, Some(4), at(2025, 2, 19)),
        candidate(3, "Hannah Lee", "British", "United Kingdom", From4001To5000, Senior, Some(3), at(2025, 2, 21)),
        candidate(4, "Karthik Iyer", "Indian", "India", From1501To2000, Mid, None, at(2025, 3, 1)),
        candidate(5, "Youssef Amin", "Egyptian", "Saudi Arabia", Above5000, Expert, Some(5), at(2025, 3, 3)),
    ]
}

pub fn employer_requests() -> Vec<EmployerRequest> {
    use ExperienceBracket::*;
    use SalaryBracket::*;

    vec![
        EmployerRequest {
            id: 1,
            firm_name: "Gulf Ledger Partners".to_string(),
            contact_email: "hr@gulfledger.test".to_string(),
            country: "United Arab Emirates".to_string(),
            position_title: Some("Audit Senior".to_string()),
            preferred_location: "Dubai".to_string(),
            preferred_nationality: "Any".to_string(),
            budget: From3001To4000,
            experience: Senior,
            qualifications: Some("ACCA or CPA".to_string()),
            created_at: at(2025, 2, 11),
            updated_at: None,
        },
        EmployerRequest {
            id: 2,
            firm_name: "Northbridge Advisory".to_string(),
            contact_email: "talent@northbridge.test".to_string(),
            country: "United Kingdom".to_string(),
            position_title: None,
            preferred_location: "Remote".to_string(),
            preferred_nationality: "British".to_string(),
            budget: From4001To5000,
            experience: Mid,
            qualifications: None,
            created_at: at(2025, 2, 28),
            updated_at: None,
        },
        EmployerRequest {
            id: 3,
            firm_name: "Najd Holdings".to_string(),
            contact_email: "finance@najd.test".to_string(),
            country: "Saudi Arabia".to_string(),
            position_title: Some("Payroll Officer".to_string()),
            preferred_location: "Riyadh".to_string(),
            preferred_nationality: "Any".to_string(),
            budget: From1501To2000,
            experience: Junior,
            qualifications: Some("Arabic speaker preferred".to_string()),
            created_at: at(2025, 3, 5),
            updated_at: None,
        },
    ]
}
