//! Per-entity data access with soft fallback, plus a stateful handle that mirrors how a
//! screen consumes a collection (loading flag, refetch, debounced search).
//!
//! The HTTP routes are stateless and call [`Feed`] directly. [`FeedHandle`] is library API
//! for embedders that keep a live view of one collection, such as an admin console built on
//! this crate:
//!
//! ```no_run
//! # async fn demo(state: accounting_portal::AppState) {
//! use accounting_portal::datasource::ListQuery;
//! use accounting_portal::services::feed::FeedHandle;
//!
//! let jobs = FeedHandle::new(state.jobs.clone(), None, ListQuery::default());
//! jobs.refetch().await;
//! let search = jobs.search_debouncer();
//! search.push("tax".to_string());
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::datasource::{
    DataSource, Facets, ListQuery, LocalSource, Origin, Pagination, SourceError, Updated,
    Visibility,
};
use crate::error::Result;
use crate::models::record::{LifecycleAction, Record};
use crate::store::Stored;
use crate::utils::debounce::{Debouncer, SEARCH_DEBOUNCE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedErrorKind {
    /// Remote unreachable; local data (if any) is shown instead.
    Network,
    Unauthorized,
    NotFound,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedError {
    pub kind: FeedErrorKind,
    pub message: String,
}

impl FeedError {
    fn from_source(err: &SourceError) -> Self {
        let kind = match err {
            SourceError::Unauthorized => FeedErrorKind::Unauthorized,
            SourceError::NotFound => FeedErrorKind::NotFound,
            SourceError::Rejected(_) | SourceError::Unsupported(_) => FeedErrorKind::Rejected,
            SourceError::Network(_) | SourceError::Storage(_) => FeedErrorKind::Network,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }

    fn not_found() -> Self {
        Self {
            kind: FeedErrorKind::NotFound,
            message: "not_found".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedResult<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
    pub facets: Facets,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FeedError>,
    pub origin: Origin,
}

impl<T> FeedResult<T> {
    fn failed(query: &ListQuery, error: FeedError, origin: Origin) -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination::empty(query.per_page),
            facets: Facets::default(),
            error: Some(error),
            origin,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(&self.error, Some(e) if e.kind == FeedErrorKind::Unauthorized)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> FeedResult<U> {
        FeedResult {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
            facets: self.facets,
            error: self.error,
            origin: self.origin,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailResult<T> {
    pub item: Option<T>,
    pub related: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FeedError>,
    pub not_found: bool,
    pub origin: Origin,
}

impl<T> DetailResult<T> {
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> DetailResult<U> {
        DetailResult {
            item: self.item.map(&mut f),
            related: self.related.into_iter().map(f).collect(),
            error: self.error,
            not_found: self.not_found,
            origin: self.origin,
        }
    }

    fn missing(origin: Origin, warning: Option<FeedError>) -> Self {
        Self {
            item: None,
            related: Vec::new(),
            error: warning.or_else(|| Some(FeedError::not_found())),
            not_found: true,
            origin,
        }
    }
}

/// One entity's data access. Reads degrade to local data; writes never do.
pub struct Feed<T: Record> {
    primary: Arc<dyn DataSource<T>>,
    local: Arc<LocalSource<T>>,
}

impl<T: Record> Clone for Feed<T> {
    fn clone(&self) -> Self {
        Self {
            primary: self.primary.clone(),
            local: self.local.clone(),
        }
    }
}

impl<T: Stored> Feed<T> {
    pub fn new(primary: Arc<dyn DataSource<T>>, local: Arc<LocalSource<T>>) -> Self {
        Self { primary, local }
    }

    pub fn is_live(&self) -> bool {
        self.primary.origin() == Origin::Remote
    }

    pub fn local(&self) -> &LocalSource<T> {
        &self.local
    }

    /// Never fails: a network problem yields local data with a warning, an auth
    /// problem yields an error and no data.
    pub async fn fetch(&self, query: &ListQuery, auth: Option<&str>) -> FeedResult<T> {
        let origin = self.primary.origin();
        let err = match self.primary.list(query, auth).await {
            Ok(listing) => {
                return FeedResult {
                    items: listing.items,
                    pagination: listing.pagination,
                    facets: listing.facets,
                    error: None,
                    origin,
                }
            }
            Err(err) => err,
        };

        if err == SourceError::Unauthorized || origin != Origin::Remote {
            return FeedResult::failed(query, FeedError::from_source(&err), origin);
        }

        tracing::warn!(module = %T::MODULE, error = %err, "API unavailable; serving local data");
        let warning = FeedError {
            kind: FeedErrorKind::Network,
            message: err.to_string(),
        };
        match self.local.list(query, None).await {
            Ok(listing) => FeedResult {
                items: listing.items,
                pagination: listing.pagination,
                facets: listing.facets,
                error: Some(warning),
                origin: Origin::LocalFallback,
            },
            Err(local_err) => {
                tracing::error!(module = %T::MODULE, error = %local_err, "Local fallback failed");
                FeedResult::failed(query, warning, Origin::LocalFallback)
            }
        }
    }

    /// Remote misses and failures consult local data before reporting `not_found`.
    pub async fn detail(
        &self,
        key: &T::Key,
        visibility: Visibility,
        auth: Option<&str>,
    ) -> DetailResult<T> {
        let origin = self.primary.origin();
        let warning = match self.primary.get(key, visibility, auth).await {
            Ok(Some(detail)) => {
                return DetailResult {
                    item: Some(detail.item),
                    related: detail.related,
                    error: None,
                    not_found: false,
                    origin,
                }
            }
            Ok(None) => None,
            Err(SourceError::Unauthorized) => {
                return DetailResult {
                    item: None,
                    related: Vec::new(),
                    error: Some(FeedError::from_source(&SourceError::Unauthorized)),
                    not_found: false,
                    origin,
                }
            }
            Err(err) => {
                tracing::warn!(module = %T::MODULE, key = %key, error = %err, "Detail lookup failed");
                Some(FeedError::from_source(&err))
            }
        };

        if origin != Origin::Remote {
            return DetailResult::missing(origin, warning);
        }

        match self.local.get(key, visibility, None).await {
            Ok(Some(detail)) => DetailResult {
                item: Some(detail.item),
                related: detail.related,
                error: warning,
                not_found: false,
                origin: Origin::LocalFallback,
            },
            Ok(None) => DetailResult::missing(Origin::LocalFallback, warning),
            Err(err) => {
                tracing::error!(module = %T::MODULE, error = %err, "Local detail lookup failed");
                DetailResult::missing(Origin::LocalFallback, warning)
            }
        }
    }

    pub async fn create(&self, item: T, auth: Option<&str>) -> Result<T> {
        let created = self.primary.create(item, auth).await?;
        tracing::info!(module = %T::MODULE, key = %created.key(), "Record created");
        Ok(created)
    }

    pub async fn update(&self, key: &T::Key, item: T, auth: Option<&str>) -> Result<Updated<T>> {
        let updated = self.primary.update(key, item, auth).await?;
        tracing::info!(module = %T::MODULE, key = %key, "Record updated");
        Ok(updated)
    }

    pub async fn delete(&self, key: &T::Key, auth: Option<&str>) -> Result<Option<T>> {
        let removed = self.primary.delete(key, auth).await?;
        tracing::info!(module = %T::MODULE, key = %key, "Record deleted");
        Ok(removed)
    }

    pub async fn transition(
        &self,
        key: &T::Key,
        action: LifecycleAction,
        auth: Option<&str>,
    ) -> Result<Updated<T>> {
        let updated = self.primary.transition(key, action, auth).await?;
        tracing::info!(module = %T::MODULE, key = %key, action = %action, "Record transitioned");
        Ok(updated)
    }
}

struct HandleState<T> {
    query: ListQuery,
    loading: bool,
    result: Option<FeedResult<T>>,
}

/// Stateful consumer of a feed: holds the current query, the loading flag and the
/// last applied result. Only the newest request may update the state.
pub struct FeedHandle<T: Record> {
    feed: Feed<T>,
    auth: Option<String>,
    state: Arc<Mutex<HandleState<T>>>,
    sequence: Arc<AtomicU64>,
}

impl<T: Record> Clone for FeedHandle<T> {
    fn clone(&self) -> Self {
        Self {
            feed: self.feed.clone(),
            auth: self.auth.clone(),
            state: self.state.clone(),
            sequence: self.sequence.clone(),
        }
    }
}

impl<T: Stored> FeedHandle<T> {
    pub fn new(feed: Feed<T>, auth: Option<String>, query: ListQuery) -> Self {
        Self {
            feed,
            auth,
            state: Arc::new(Mutex::new(HandleState {
                query,
                loading: false,
                result: None,
            })),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HandleState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn loading(&self) -> bool {
        self.lock().loading
    }

    pub fn query(&self) -> ListQuery {
        self.lock().query.clone()
    }

    pub fn snapshot(&self) -> Option<FeedResult<T>> {
        self.lock().result.clone()
    }

    /// Replaces the query and fetches. Returns `false` when a newer request superseded
    /// this one and its response was discarded.
    pub async fn apply(&self, query: ListQuery) -> bool {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.lock();
            state.query = query.clone();
            state.loading = true;
        }

        let result = self.feed.fetch(&query, self.auth.as_deref()).await;

        let mut state = self.lock();
        if self.sequence.load(Ordering::SeqCst) != seq {
            tracing::debug!(module = %T::MODULE, seq, "Discarding stale response");
            return false;
        }
        state.result = Some(result);
        state.loading = false;
        true
    }

    pub async fn refetch(&self) -> bool {
        let query = self.query();
        self.apply(query).await
    }

    /// Search input sink: applies the last term of a burst after the quiet period,
    /// resetting to the first page.
    pub fn search_debouncer(&self) -> Debouncer<String> {
        let handle = self.clone();
        Debouncer::spawn(SEARCH_DEBOUNCE, move |term: String| {
            let handle = handle.clone();
            async move {
                let mut query = handle.query();
                query.search = Some(term);
                query.page = 1;
                handle.apply(query).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{Detail, Listing};
    use crate::models::job::JobPosting;
    use crate::store::{fixtures, DemoStore};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Remote stand-in whose behaviour is scripted per search term.
    struct Scripted {
        calls: Mutex<Vec<Option<String>>>,
        outcome: fn(&ListQuery) -> std::result::Result<Vec<JobPosting>, SourceError>,
    }

    impl Scripted {
        fn new(outcome: fn(&ListQuery) -> std::result::Result<Vec<JobPosting>, SourceError>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                outcome,
            }
        }
    }

    #[async_trait]
    impl DataSource<JobPosting> for Scripted {
        fn origin(&self) -> Origin {
            Origin::Remote
        }

        async fn list(
            &self,
            query: &ListQuery,
            _auth: Option<&str>,
        ) -> std::result::Result<Listing<JobPosting>, SourceError> {
            self.calls.lock().unwrap().push(query.search.clone());
            let delay = match query.search.as_deref() {
                Some("slow") => 200,
                _ => 10,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            let items = (self.outcome)(query)?;
            Ok(Listing::paginate(items, query, Facets::default()))
        }

        async fn get(
            &self,
            key: &i64,
            _visibility: Visibility,
            _auth: Option<&str>,
        ) -> std::result::Result<Option<Detail<JobPosting>>, SourceError> {
            match *key {
                401 => Err(SourceError::Unauthorized),
                500 => Err(SourceError::Network("boom".into())),
                _ => Ok(None),
            }
        }

        async fn create(
            &self,
            _item: JobPosting,
            _auth: Option<&str>,
        ) -> std::result::Result<JobPosting, SourceError> {
            Err(SourceError::Network("offline".into()))
        }

        async fn update(
            &self,
            _key: &i64,
            _item: JobPosting,
            _auth: Option<&str>,
        ) -> std::result::Result<Updated<JobPosting>, SourceError> {
            Err(SourceError::Network("offline".into()))
        }

        async fn delete(
            &self,
            _key: &i64,
            _auth: Option<&str>,
        ) -> std::result::Result<Option<JobPosting>, SourceError> {
            Err(SourceError::Network("offline".into()))
        }

        async fn transition(
            &self,
            _key: &i64,
            _action: LifecycleAction,
            _auth: Option<&str>,
        ) -> std::result::Result<Updated<JobPosting>, SourceError> {
            Err(SourceError::Network("offline".into()))
        }
    }

    fn feed_with(remote: Scripted) -> (Feed<JobPosting>, DemoStore) {
        let store = DemoStore::seeded();
        let local = Arc::new(LocalSource::new(store.clone(), Vec::new()));
        (Feed::new(Arc::new(remote), local), store)
    }

    fn tagged(query: &ListQuery) -> std::result::Result<Vec<JobPosting>, SourceError> {
        let mut job = fixtures::jobs().remove(0);
        job.title = query.search.clone().unwrap_or_default();
        Ok(vec![job])
    }

    #[tokio::test]
    async fn network_failure_falls_back_to_local_with_warning() {
        let (feed, _) = feed_with(Scripted::new(|_| Err(SourceError::Network("down".into()))));
        let result = feed.fetch(&ListQuery::default(), None).await;

        assert_eq!(result.origin, Origin::LocalFallback);
        assert_eq!(result.error.as_ref().unwrap().kind, FeedErrorKind::Network);
        assert_eq!(result.pagination.total, 5);
        assert!(!result.items.is_empty());
    }

    #[tokio::test]
    async fn unauthorized_is_not_masked_by_fallback() {
        let (feed, _) = feed_with(Scripted::new(|_| Err(SourceError::Unauthorized)));
        let result = feed.fetch(&ListQuery::default(), Some("expired")).await;

        assert!(result.is_unauthorized());
        assert!(result.items.is_empty());
        assert_eq!(result.origin, Origin::Remote);
    }

    #[tokio::test]
    async fn detail_consults_local_then_reports_not_found() {
        let (feed, _) = feed_with(Scripted::new(tagged));

        let found = feed.detail(&1, Visibility::Public, None).await;
        assert_eq!(found.item.unwrap().id, 1);
        assert_eq!(found.origin, Origin::LocalFallback);

        let missing = feed.detail(&999, Visibility::Public, None).await;
        assert!(missing.not_found);
        assert!(missing.item.is_none());

        let failed_and_missing = feed.detail(&500, Visibility::Public, None).await;
        assert!(failed_and_missing.not_found);
        assert_eq!(failed_and_missing.error.unwrap().kind, FeedErrorKind::Network);

        let unauthorized = feed.detail(&401, Visibility::All, None).await;
        assert!(!unauthorized.not_found);
        assert_eq!(unauthorized.error.unwrap().kind, FeedErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn failed_live_writes_are_not_replayed_locally() {
        let (feed, store) = feed_with(Scripted::new(tagged));
        let mut job = fixtures::jobs().remove(0);
        job.id = 0;

        tokio_test::assert_err!(feed.create(job, None).await);
        tokio_test::assert_err!(feed.delete(&1, None).await);
        tokio_test::assert_err!(feed.transition(&2, LifecycleAction::Archive, None).await);

        assert_eq!(store.count::<JobPosting>(), 6);
        assert!(store.find::<JobPosting>(&1).is_some());
        assert!(!store.find::<JobPosting>(&2).unwrap().is_archived);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_never_overwrites_newer_one() {
        let (feed, _) = feed_with(Scripted::new(tagged));
        let handle = FeedHandle::new(feed, None, ListQuery::default());

        let slow = ListQuery {
            search: Some("slow".into()),
            ..Default::default()
        };
        let fast = ListQuery {
            search: Some("fast".into()),
            ..Default::default()
        };

        let (slow_applied, fast_applied) = tokio::join!(handle.apply(slow), handle.apply(fast));

        assert!(!slow_applied);
        assert!(fast_applied);
        assert!(!handle.loading());
        assert_eq!(handle.snapshot().unwrap().items[0].title, "fast");
    }

    #[tokio::test(start_paused = true)]
    async fn loading_flag_tracks_the_newest_request() {
        let (feed, _) = feed_with(Scripted::new(tagged));
        let handle = FeedHandle::new(feed, None, ListQuery::default());
        assert!(!handle.loading());

        let background = handle.clone();
        let task = tokio::spawn(async move {
            background
                .apply(ListQuery {
                    search: Some("slow".into()),
                    ..Default::default()
                })
                .await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.loading());

        assert!(task.await.unwrap());
        assert!(!handle.loading());
        assert!(handle.refetch().await);
        assert_eq!(handle.snapshot().unwrap().items[0].title, "slow");
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_search_issues_one_request_for_a_burst() {
        let remote = Arc::new(Scripted::new(tagged));
        let store = DemoStore::seeded();
        let local = Arc::new(LocalSource::new(store, Vec::new()));
        let feed = Feed::new(remote.clone() as Arc<dyn DataSource<JobPosting>>, local);
        let handle = FeedHandle::new(
            feed,
            None,
            ListQuery {
                page: 3,
                ..Default::default()
            },
        );

        let search = handle.search_debouncer();
        search.push("tax".to_string());
        search.push("tax c".to_string());

        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(*remote.calls.lock().unwrap(), vec![Some("tax c".to_string())]);
        assert_eq!(handle.query().page, 1);
        assert_eq!(handle.snapshot().unwrap().items[0].title, "tax c");
    }
}
