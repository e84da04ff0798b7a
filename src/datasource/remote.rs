use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::datasource::wire::{
    NameRef, WireBlogPost, WireCandidate, WireDetail, WireEmployerRequest, WireError, WireJob,
    WireListing,
};
use crate::datasource::{
    DataSource, Detail, Facets, ListQuery, Listing, Origin, Pagination, SourceError, Updated,
    Visibility,
};
use crate::error::{Error, Result};
use crate::models::audit_log::AuditLogEntry;
use crate::models::blog_post::BlogPost;
use crate::models::candidate::CandidateApplication;
use crate::models::employer_request::EmployerRequest;
use crate::models::job::JobPosting;
use crate::models::record::{Facet, LifecycleAction, Record};

/// Where a record type lives on the remote API and how its wire shape converts.
pub trait RemoteRecord: Record {
    type Wire: DeserializeOwned + Send;

    /// Unauthenticated listing and detail, if the API exposes one.
    const PUBLIC_PATH: Option<&'static str>;
    const ADMIN_PATH: &'static str;
    /// Dedicated full-text search endpoint taking `q` and `category`.
    const SEARCH_PATH: Option<&'static str> = None;

    fn from_wire(wire: Self::Wire) -> std::result::Result<Self, String>;
}

impl RemoteRecord for JobPosting {
    type Wire = WireJob;

    const PUBLIC_PATH: Option<&'static str> = Some("/api/public/jobs");
    const ADMIN_PATH: &'static str = "/api/admin/jobs";

    fn from_wire(wire: WireJob) -> std::result::Result<Self, String> {
        JobPosting::try_from(wire)
    }
}

impl RemoteRecord for BlogPost {
    type Wire = WireBlogPost;

    const PUBLIC_PATH: Option<&'static str> = Some("/api/public/blog");
    const ADMIN_PATH: &'static str = "/api/admin/blog";
    const SEARCH_PATH: Option<&'static str> = Some("/api/blog/search");

    fn from_wire(wire: WireBlogPost) -> std::result::Result<Self, String> {
        BlogPost::try_from(wire)
    }
}

impl RemoteRecord for CandidateApplication {
    type Wire = WireCandidate;

    const PUBLIC_PATH: Option<&'static str> = None;
    const ADMIN_PATH: &'static str = "/api/admin/candidate-applications";

    fn from_wire(wire: WireCandidate) -> std::result::Result<Self, String> {
        CandidateApplication::try_from(wire)
    }
}

impl RemoteRecord for EmployerRequest {
    type Wire = WireEmployerRequest;

    const PUBLIC_PATH: Option<&'static str> = None;
    const ADMIN_PATH: &'static str = "/api/admin/employer-requests";

    fn from_wire(wire: WireEmployerRequest) -> std::result::Result<Self, String> {
        EmployerRequest::try_from(wire)
    }
}

impl RemoteRecord for AuditLogEntry {
    type Wire = AuditLogEntry;

    const PUBLIC_PATH: Option<&'static str> = None;
    const ADMIN_PATH: &'static str = "/api/admin/audit-logs";

    fn from_wire(wire: AuditLogEntry) -> std::result::Result<Self, String> {
        Ok(wire)
    }
}

/// Live-mode source backed by the REST API.
pub struct RemoteSource<T> {
    client: Client,
    base_url: String,
    _record: PhantomData<fn() -> T>,
}

impl<T: RemoteRecord> RemoteSource<T> {
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid API_BASE_URL '{}': {}", base_url, e)))?;
        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            _record: PhantomData,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn collection_path(visibility: Visibility) -> &'static str {
        match (visibility, T::PUBLIC_PATH) {
            (Visibility::Public, Some(path)) => path,
            _ => T::ADMIN_PATH,
        }
    }

    async fn send(
        &self,
        request: RequestBuilder,
        auth: Option<&str>,
    ) -> std::result::Result<Response, SourceError> {
        let request = match auth {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status {
            StatusCode::UNAUTHORIZED => Err(SourceError::Unauthorized),
            StatusCode::NOT_FOUND => Err(SourceError::NotFound),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT => {
                let message = response
                    .json::<WireError>()
                    .await
                    .ok()
                    .and_then(WireError::into_message)
                    .unwrap_or_else(|| format!("API rejected the request ({})", status));
                Err(SourceError::Rejected(message))
            }
            other => Err(SourceError::Network(format!("API responded with {}", other))),
        }
    }

    async fn decode<W: DeserializeOwned>(
        response: Response,
    ) -> std::result::Result<W, SourceError> {
        response
            .json::<W>()
            .await
            .map_err(|e| SourceError::Network(format!("Unexpected API response: {}", e)))
    }

    /// Converts wire records, dropping (and logging) any that fail normalization.
    fn convert(items: Vec<T::Wire>) -> Vec<T> {
        items
            .into_iter()
            .filter_map(|wire| match T::from_wire(wire) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(module = %T::MODULE, error = %e, "Skipping malformed record from API");
                    None
                }
            })
            .collect()
    }

    async fn decode_record(
        response: Response,
    ) -> std::result::Result<Option<T>, SourceError> {
        let Ok(detail) = response.json::<WireDetail<T::Wire>>().await else {
            return Ok(None);
        };
        let (wire, _) = detail.into_parts();
        T::from_wire(wire).map(Some).map_err(SourceError::Rejected)
    }
}

fn listing_from_wire<T: RemoteRecord>(
    wire: WireListing<T::Wire>,
    query: &ListQuery,
) -> Listing<T> {
    match wire {
        WireListing::Envelope {
            data,
            meta,
            filters,
        } => {
            let items = RemoteSource::<T>::convert(data);
            let mut facets = match filters {
                Some(filters) => Facets {
                    countries: filters.countries,
                    locations: filters.locations,
                    categories: filters
                        .categories
                        .into_iter()
                        .map(NameRef::into_name)
                        .collect(),
                    ..Facets::default()
                },
                None => Facets::default(),
            };
            if facets.is_empty() {
                facets = Facets::collect(&items);
            }
            match meta {
                Some(meta) => Listing {
                    pagination: Pagination {
                        current_page: meta.current_page.max(1),
                        total_pages: meta.last_page.max(1),
                        total: meta.total,
                        per_page: meta.per_page.unwrap_or(query.per_page.get()),
                    },
                    items,
                    facets,
                },
                None => Listing::paginate(items, query, facets),
            }
        }
        WireListing::Bare(data) => {
            let items = RemoteSource::<T>::convert(data);
            let facets = Facets::collect(&items);
            Listing::paginate(items, query, facets)
        }
    }
}

#[async_trait]
impl<T: RemoteRecord> DataSource<T> for RemoteSource<T> {
    fn origin(&self) -> Origin {
        Origin::Remote
    }

    async fn list(
        &self,
        query: &ListQuery,
        auth: Option<&str>,
    ) -> std::result::Result<Listing<T>, SourceError> {
        let search_endpoint = T::SEARCH_PATH
            .filter(|_| query.visibility == Visibility::Public && query.search_term().is_some());

        let request = match search_endpoint {
            Some(path) => {
                let term = query.search.as_deref().unwrap_or_default().trim();
                let mut params = vec![("q", term.to_string())];
                if let Some(category) = query
                    .facet_filters()
                    .into_iter()
                    .find_map(|(facet, value)| (facet == Facet::Category).then_some(value))
                {
                    params.push(("category", category.to_string()));
                }
                self.client.get(self.url(path)).query(&params)
            }
            None => self
                .client
                .get(self.url(Self::collection_path(query.visibility)))
                .query(&query.to_params()),
        };

        let response = self.send(request, auth).await?;
        let wire = Self::decode::<WireListing<T::Wire>>(response).await?;
        Ok(listing_from_wire(wire, query))
    }

    async fn get(
        &self,
        key: &T::Key,
        visibility: Visibility,
        auth: Option<&str>,
    ) -> std::result::Result<Option<Detail<T>>, SourceError> {
        let url = self.url(&format!("{}/{}", Self::collection_path(visibility), key));
        let response = match self.send(self.client.get(url), auth).await {
            Ok(response) => response,
            Err(SourceError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };
        let (item, related) = Self::decode::<WireDetail<T::Wire>>(response)
            .await?
            .into_parts();
        let item = T::from_wire(item)
            .map_err(|e| SourceError::Network(format!("Malformed record from API: {}", e)))?;
        Ok(Some(Detail {
            item,
            related: Self::convert(related),
        }))
    }

    async fn create(&self, item: T, auth: Option<&str>) -> std::result::Result<T, SourceError> {
        let request = self.client.post(self.url(T::ADMIN_PATH)).json(&item);
        let response = self.send(request, auth).await?;
        match Self::decode_record(response).await? {
            Some(created) => Ok(created),
            None => {
                tracing::warn!(module = %T::MODULE, "API accepted create without echoing the record");
                Ok(item)
            }
        }
    }

    async fn update(
        &self,
        key: &T::Key,
        item: T,
        auth: Option<&str>,
    ) -> std::result::Result<Updated<T>, SourceError> {
        let url = self.url(&format!("{}/{}", T::ADMIN_PATH, key));
        let response = self.send(self.client.put(url).json(&item), auth).await?;
        let after = Self::decode_record(response).await?.unwrap_or(item);
        Ok(Updated {
            before: None,
            after,
        })
    }

    async fn delete(
        &self,
        key: &T::Key,
        auth: Option<&str>,
    ) -> std::result::Result<Option<T>, SourceError> {
        let url = self.url(&format!("{}/{}", T::ADMIN_PATH, key));
        self.send(self.client.delete(url), auth).await?;
        Ok(None)
    }

    async fn transition(
        &self,
        key: &T::Key,
        action: LifecycleAction,
        auth: Option<&str>,
    ) -> std::result::Result<Updated<T>, SourceError> {
        let url = self.url(&format!("{}/{}/{}", T::ADMIN_PATH, key, action));
        let response = self.send(self.client.post(url), auth).await?;
        let after = match Self::decode_record(response).await? {
            Some(after) => after,
            None => {
                self.get(key, Visibility::All, auth)
                    .await?
                    .ok_or(SourceError::NotFound)?
                    .item
            }
        };
        Ok(Updated {
            before: None,
            after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_invalid_base_url() {
        assert!(RemoteSource::<JobPosting>::new(Client::new(), "not a url").is_err());
        let source = RemoteSource::<JobPosting>::new(Client::new(), "https://api.test/").unwrap();
        assert_eq!(source.url("/api/public/jobs"), "https://api.test/api/public/jobs");
    }

    #[test]
    fn admin_lists_use_admin_paths() {
        assert_eq!(
            RemoteSource::<JobPosting>::collection_path(Visibility::Public),
            "/api/public/jobs"
        );
        assert_eq!(
            RemoteSource::<JobPosting>::collection_path(Visibility::All),
            "/api/admin/jobs"
        );
        assert_eq!(
            RemoteSource::<CandidateApplication>::collection_path(Visibility::Public),
            "/api/admin/candidate-applications"
        );
    }

    #[test]
    fn envelope_meta_drives_pagination_and_filters_drive_facets() {
        let wire: WireListing<WireBlogPost> = serde_json::from_value(json!({
            "data": [
                {"slug": "a", "title": "A", "category": {"name": "Tax"}},
                {"slug": "b", "title": "B", "category": "Audit"}
            ],
            "meta": {"current_page": 3, "last_page": 7, "total": 68, "per_page": 10},
            "filters": {"categories": ["Tax", {"name": "Audit"}, "Payroll"]}
        }))
        .unwrap();
        let listing = listing_from_wire::<BlogPost>(wire, &ListQuery::default());
        assert_eq!(listing.pagination.current_page, 3);
        assert_eq!(listing.pagination.total_pages, 7);
        assert_eq!(listing.pagination.total, 68);
        assert_eq!(listing.facets.categories, vec!["Tax", "Audit", "Payroll"]);
    }

    #[test]
    fn bare_array_is_paginated_locally_and_malformed_rows_dropped() {
        let wire: WireListing<WireCandidate> = serde_json::from_value(json!([
            {"id": 1, "name": "A", "email": "a@x.test", "expected_salary": "0-1000", "experience": "0-3"},
            {"id": 2, "name": "B", "email": "b@x.test", "expected_salary": "lots", "experience": "0-3"}
        ]))
        .unwrap();
        let listing = listing_from_wire::<CandidateApplication>(wire, &ListQuery::default());
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.pagination.total, 1);
        assert_eq!(listing.pagination.total_pages, 1);
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let source = RemoteSource::<JobPosting>::new(Client::new(), "http://127.0.0.1:9").unwrap();
        let err = source.list(&ListQuery::default(), None).await.unwrap_err();
        assert!(matches!(err, SourceError::Network(_)));
    }
}
