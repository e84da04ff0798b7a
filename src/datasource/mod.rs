//! Dual-mode data access: the remote REST API or the local demo store behind one trait.

pub mod local;
pub mod remote;
pub mod wire;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{ApiMode, Config};
use crate::error::{Error, Result};
use crate::models::record::{Facet, LifecycleAction, Record};
use crate::store::{DemoStore, Stored};
use crate::utils::pagination::{PageSize, Paginator};

pub use local::LocalSource;
pub use remote::{RemoteRecord, RemoteSource};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Unsupported(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<Error> for SourceError {
    fn from(err: Error) -> Self {
        match err {
            Error::BadRequest(msg) | Error::Rejected(msg) => SourceError::Rejected(msg),
            Error::NotFound(_) => SourceError::NotFound,
            other => SourceError::Storage(other.to_string()),
        }
    }
}

/// Which side of the data layer produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Remote,
    Local,
    LocalFallback,
}

/// Public visitors only ever see published/active records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub location: Option<String>,
    pub work_type: Option<String>,
    pub experience: Option<String>,
    pub page: u32,
    pub per_page: PageSize,
    #[serde(skip)]
    pub visibility: Visibility,
}

impl ListQuery {
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Lowercased, trimmed search term; blank means no search.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Active facet filters. An empty value or `all` disables a filter.
    pub fn facet_filters(&self) -> Vec<(Facet, &str)> {
        [
            (Facet::Category, &self.category),
            (Facet::Country, &self.country),
            (Facet::Location, &self.location),
            (Facet::WorkType, &self.work_type),
            (Facet::Experience, &self.experience),
        ]
        .into_iter()
        .filter_map(|(facet, value)| {
            let value = value.as_deref()?.trim();
            (!value.is_empty() && !value.eq_ignore_ascii_case("all")).then_some((facet, value))
        })
        .collect()
    }

    /// Query parameters for the remote API, mirroring what the site sends.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page().to_string()),
            ("per_page", self.per_page.get().to_string()),
        ];
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        for (facet, value) in self.facet_filters() {
            let name = match facet {
                Facet::Category => "category",
                Facet::Country => "country",
                Facet::Location => "location",
                Facet::WorkType => "work_type",
                Facet::Experience => "experience",
            };
            params.push((name, value.to_string()));
        }
        params
    }

    /// Applies search and facet filters locally.
    pub fn matches<T: Record>(&self, item: &T) -> bool {
        if let Some(needle) = self.search_term() {
            if !item.matches_search(&needle) {
                return false;
            }
        }
        self.facet_filters().into_iter().all(|(facet, wanted)| {
            !T::FACETS.contains(&facet)
                || item
                    .facet(facet)
                    .is_some_and(|value| value.eq_ignore_ascii_case(wanted))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total: usize,
    pub per_page: u32,
}

impl Pagination {
    pub fn empty(per_page: PageSize) -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total: 0,
            per_page: per_page.get(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub countries: Vec<String>,
    pub locations: Vec<String>,
    pub categories: Vec<String>,
    pub work_types: Vec<String>,
    pub experience: Vec<String>,
}

impl Facets {
    /// Distinct, sorted, non-empty values of each facet the record type declares.
    pub fn collect<T: Record>(items: &[T]) -> Self {
        let mut facets = Facets::default();
        for facet in T::FACETS {
            let values: BTreeSet<String> = items
                .iter()
                .filter_map(|item| item.facet(*facet))
                .filter(|v| !v.trim().is_empty())
                .collect();
            *facets.slot_mut(*facet) = values.into_iter().collect();
        }
        facets
    }

    fn slot_mut(&mut self, facet: Facet) -> &mut Vec<String> {
        match facet {
            Facet::Country => &mut self.countries,
            Facet::Location => &mut self.locations,
            Facet::Category => &mut self.categories,
            Facet::WorkType => &mut self.work_types,
            Facet::Experience => &mut self.experience,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
            && self.locations.is_empty()
            && self.categories.is_empty()
            && self.work_types.is_empty()
            && self.experience.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
    pub facets: Facets,
}

impl<T: Record> Listing<T> {
    /// Paginates an already filtered and ordered collection client side.
    pub fn paginate(all: Vec<T>, query: &ListQuery, facets: Facets) -> Self {
        let paginator = Paginator::at(query.page(), query.per_page);
        let total = all.len();
        let current_page = paginator.effective_page(total);
        Self {
            items: paginator.slice(&all).to_vec(),
            pagination: Pagination {
                current_page,
                total_pages: paginator.total_pages(total),
                total,
                per_page: query.per_page.get(),
            },
            facets,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Detail<T> {
    pub item: T,
    pub related: Vec<T>,
}

/// Result of an edit or lifecycle transition. `before` is only known locally.
#[derive(Debug, Clone)]
pub struct Updated<T> {
    pub before: Option<T>,
    pub after: T,
}

/// Capability every feed depends on. `auth` is the upstream bearer token, if any.
#[async_trait]
pub trait DataSource<T: Record>: Send + Sync {
    fn origin(&self) -> Origin;

    async fn list(
        &self,
        query: &ListQuery,
        auth: Option<&str>,
    ) -> std::result::Result<Listing<T>, SourceError>;

    async fn get(
        &self,
        key: &T::Key,
        visibility: Visibility,
        auth: Option<&str>,
    ) -> std::result::Result<Option<Detail<T>>, SourceError>;

    async fn create(&self, item: T, auth: Option<&str>) -> std::result::Result<T, SourceError>;

    async fn update(
        &self,
        key: &T::Key,
        item: T,
        auth: Option<&str>,
    ) -> std::result::Result<Updated<T>, SourceError>;

    async fn delete(
        &self,
        key: &T::Key,
        auth: Option<&str>,
    ) -> std::result::Result<Option<T>, SourceError>;

    async fn transition(
        &self,
        key: &T::Key,
        action: LifecycleAction,
        auth: Option<&str>,
    ) -> std::result::Result<Updated<T>, SourceError>;
}

/// HTTP client shared by every remote source.
pub fn build_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.api_timeout_secs))
        .user_agent(concat!("accounting-portal/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Picks the primary source once, from configuration.
pub fn select_source<T>(
    config: &Config,
    client: &reqwest::Client,
    local: Arc<LocalSource<T>>,
) -> Result<Arc<dyn DataSource<T>>>
where
    T: RemoteRecord + Stored,
{
    match (config.api_mode(), config.api_base_url.as_deref()) {
        (ApiMode::Live, Some(base_url)) => {
            let remote = RemoteSource::<T>::new(client.clone(), base_url)?;
            Ok(Arc::new(remote))
        }
        _ => Ok(local as Arc<dyn DataSource<T>>),
    }
}

/// Convenience for building the local half of a feed over the shared store.
pub fn local_source<T: Stored>(store: &DemoStore, bundled: Vec<T>) -> Arc<LocalSource<T>> {
    Arc::new(LocalSource::new(store.clone(), bundled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobPosting;
    use crate::store::fixtures;

    #[test]
    fn blank_and_all_filters_are_ignored() {
        let query = ListQuery {
            search: Some("   ".into()),
            country: Some("all".into()),
            location: Some("".into()),
            work_type: Some("remote".into()),
            ..Default::default()
        };
        assert_eq!(query.search_term(), None);
        assert_eq!(query.facet_filters(), vec![(Facet::WorkType, "remote")]);
    }

    #[test]
    fn query_params_carry_filters() {
        let query = ListQuery {
            search: Some(" tax ".into()),
            country: Some("UAE".into()),
            page: 2,
            per_page: PageSize::TwentyFive,
            ..Default::default()
        };
        let params = query.to_params();
        assert!(params.contains(&("page", "2".to_string())));
        assert!(params.contains(&("per_page", "25".to_string())));
        assert!(params.contains(&("search", "tax".to_string())));
        assert!(params.contains(&("country", "UAE".to_string())));
    }

    #[test]
    fn facets_are_distinct_and_sorted() {
        let facets = Facets::collect(&fixtures::jobs());
        assert!(facets.countries.windows(2).all(|w| w[0] < w[1]));
        assert!(facets.countries.contains(&"United Arab Emirates".to_string()));
        assert!(facets.categories.is_empty());
    }

    #[test]
    fn filters_irrelevant_to_a_type_do_not_exclude() {
        let query = ListQuery {
            category: Some("Tax".into()),
            ..Default::default()
        };
        let job: JobPosting = fixtures::jobs().remove(0);
        assert!(query.matches(&job));
    }

    #[test]
    fn listing_clamps_stale_page() {
        let query = ListQuery {
            page: 9,
            per_page: PageSize::Five,
            ..Default::default()
        };
        let listing = Listing::paginate(fixtures::jobs(), &query, Facets::default());
        assert_eq!(listing.pagination.current_page, 1);
        assert_eq!(listing.pagination.total_pages, 2);
        assert_eq!(listing.items.len(), 5);
    }
}
