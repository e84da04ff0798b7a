use std::collections::HashSet;

use async_trait::async_trait;

use crate::datasource::{
    DataSource, Detail, Facets, ListQuery, Listing, Origin, SourceError, Updated, Visibility,
};
use crate::models::record::{LifecycleAction, Record};
use crate::store::{DemoStore, Stored};

const RELATED_LIMIT: usize = 3;

/// Demo-mode source over the shared store, with optional bundled records shown beneath it.
pub struct LocalSource<T> {
    store: DemoStore,
    bundled: Vec<T>,
}

impl<T: Stored> LocalSource<T> {
    pub fn new(store: DemoStore, bundled: Vec<T>) -> Self {
        Self { store, bundled }
    }

    /// Store records visible at `visibility`, plus public bundled records whose key is
    /// not already taken by a visible store record.
    pub fn visible(&self, visibility: Visibility) -> Vec<T> {
        let mut items: Vec<T> = self
            .store
            .all::<T>()
            .into_iter()
            .filter(|item| visibility == Visibility::All || item.is_public())
            .collect();

        if visibility == Visibility::Public {
            let taken: HashSet<T::Key> = items.iter().map(Record::key).collect();
            items.extend(
                self.bundled
                    .iter()
                    .filter(|item| item.is_public() && !taken.contains(&item.key()))
                    .cloned(),
            );
        }

        sort_newest_first(&mut items);
        items
    }

    fn find_visible(&self, key: &T::Key, visibility: Visibility) -> Option<T> {
        self.store
            .find::<T>(key)
            .filter(|item| visibility == Visibility::All || item.is_public())
            .or_else(|| {
                (visibility == Visibility::Public)
                    .then(|| {
                        self.bundled
                            .iter()
                            .find(|item| item.key() == *key && item.is_public())
                            .cloned()
                    })
                    .flatten()
            })
    }
}

pub fn sort_newest_first<T: Record>(items: &mut [T]) {
    items.sort_by_key(|item| std::cmp::Reverse(item.sort_date()));
}

#[async_trait]
impl<T: Stored> DataSource<T> for LocalSource<T> {
    fn origin(&self) -> Origin {
        Origin::Local
    }

    async fn list(
        &self,
        query: &ListQuery,
        _auth: Option<&str>,
    ) -> Result<Listing<T>, SourceError> {
        let visible = self.visible(query.visibility);
        let facets = Facets::collect(&visible);
        let filtered: Vec<T> = visible.into_iter().filter(|item| query.matches(item)).collect();
        Ok(Listing::paginate(filtered, query, facets))
    }

    async fn get(
        &self,
        key: &T::Key,
        visibility: Visibility,
        _auth: Option<&str>,
    ) -> Result<Option<Detail<T>>, SourceError> {
        let Some(item) = self.find_visible(key, visibility) else {
            return Ok(None);
        };
        let related = self
            .visible(Visibility::Public)
            .into_iter()
            .filter(|other| item.is_related(other))
            .take(RELATED_LIMIT)
            .collect();
        Ok(Some(Detail { item, related }))
    }

    async fn create(&self, item: T, _auth: Option<&str>) -> Result<T, SourceError> {
        Ok(self.store.insert(item).await?)
    }

    async fn update(
        &self,
        key: &T::Key,
        item: T,
        _auth: Option<&str>,
    ) -> Result<Updated<T>, SourceError> {
        let change = self.store.replace(key, item).await?.ok_or(SourceError::NotFound)?;
        Ok(Updated {
            before: Some(change.before),
            after: change.after,
        })
    }

    async fn delete(&self, key: &T::Key, _auth: Option<&str>) -> Result<Option<T>, SourceError> {
        match self.store.remove::<T>(key).await? {
            Some(removed) => Ok(Some(removed)),
            None => Err(SourceError::NotFound),
        }
    }

    async fn transition(
        &self,
        key: &T::Key,
        action: LifecycleAction,
        _auth: Option<&str>,
    ) -> Result<Updated<T>, SourceError> {
        let change = self
            .store
            .update_with::<T, _>(key, |item| item.apply(action))
            .await?
            .ok_or(SourceError::NotFound)?;
        Ok(Updated {
            before: Some(change.before),
            after: change.after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::blog_post::BlogPost;
    use crate::models::job::JobPosting;
    use crate::store::fixtures;
    use crate::utils::pagination::PageSize;

    fn blog_source() -> LocalSource<BlogPost> {
        LocalSource::new(DemoStore::seeded(), fixtures::sample_blog_posts())
    }

    #[tokio::test]
    async fn admin_post_shadows_sample_with_same_slug() {
        let source = blog_source();
        let listing = source
            .list(&ListQuery::default(), None)
            .await
            .unwrap();

        let matching: Vec<&BlogPost> = listing
            .items
            .iter()
            .filter(|p| p.slug == "vat-registration-checklist")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, Some(1));
    }

    #[tokio::test]
    async fn drafts_stay_out_of_public_listing() {
        let source = blog_source();
        let public = source.list(&ListQuery::default(), None).await.unwrap();
        assert!(public.items.iter().all(|p| p.is_published));

        let admin = source
            .list(&ListQuery::default().with_visibility(Visibility::All), None)
            .await
            .unwrap();
        assert!(admin.items.iter().any(|p| p.slug == "hiring-remote-accountants"));
        assert!(admin.items.iter().all(|p| p.id.is_some()));
    }

    #[tokio::test]
    async fn listing_is_newest_first_by_effective_date() {
        let listing = blog_source()
            .list(&ListQuery::default(), None)
            .await
            .unwrap();
        let dates: Vec<_> = listing.items.iter().map(|p| p.effective_date()).collect();
        assert!(dates.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn detail_falls_back_to_bundled_and_has_related() {
        let source = blog_source();
        let detail = source
            .get(&"corporate-tax-basics".to_string(), Visibility::Public, None)
            .await
            .unwrap()
            .unwrap();
        assert!(detail.related.iter().all(|p| p.category == "Tax"));
        assert!(detail.related.iter().all(|p| p.slug != "corporate-tax-basics"));
        assert!(!detail.related.is_empty());

        let draft = source
            .get(&"hiring-remote-accountants".to_string(), Visibility::Public, None)
            .await
            .unwrap();
        assert!(draft.is_none());
    }

    #[tokio::test]
    async fn archived_jobs_are_hidden_publicly() {
        let source: LocalSource<JobPosting> = LocalSource::new(DemoStore::seeded(), Vec::new());
        let public = source.list(&ListQuery::default(), None).await.unwrap();
        assert_eq!(public.pagination.total, 5);
        assert!(source.get(&6, Visibility::Public, None).await.unwrap().is_none());
        assert!(source.get(&6, Visibility::All, None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn filters_and_pagination() {
        let source: LocalSource<JobPosting> = LocalSource::new(DemoStore::seeded(), Vec::new());
        let query = ListQuery {
            work_type: Some("remote".into()),
            per_page: PageSize::Five,
            ..Default::default()
        };
        let listing = source.list(&query, None).await.unwrap();
        assert_eq!(listing.pagination.total, 2);
        assert!(listing.facets.work_types.len() > 1);

        let search = ListQuery {
            search: Some("TAX".into()),
            ..Default::default()
        };
        let listing = source.list(&search, None).await.unwrap();
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].id, 3);
    }

    #[tokio::test]
    async fn writes_go_through_the_store() {
        let store = DemoStore::seeded();
        let source: LocalSource<JobPosting> = LocalSource::new(store.clone(), Vec::new());

        let updated = source
            .transition(&1, LifecycleAction::Deactivate, None)
            .await
            .unwrap();
        assert!(updated.before.unwrap().is_active);
        assert!(!updated.after.is_active);
        assert!(!store.find::<JobPosting>(&1).unwrap().is_active);

        assert_eq!(
            source.delete(&404, None).await.unwrap_err(),
            SourceError::NotFound
        );
        let rejected = source
            .transition(&6, LifecycleAction::Activate, None)
            .await
            .unwrap_err();
        assert!(matches!(rejected, SourceError::Rejected(_)));
    }
}
