use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::audit_log::AuditLogEntry;
use crate::models::blog_post::BlogPost;
use crate::models::candidate::CandidateApplication;
use crate::models::employer_request::EmployerRequest;
use crate::models::job::JobPosting;
use crate::models::record::Record;
use crate::models::user::AdminUser;
use crate::store::fixtures;
use crate::utils::time::now;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    pub users: Vec<AdminUser>,
    pub jobs: Vec<JobPosting>,
    pub blog_posts: Vec<BlogPost>,
    pub candidates: Vec<CandidateApplication>,
    pub employer_requests: Vec<EmployerRequest>,
    pub audit_log: Vec<AuditLogEntry>,
}

impl StoreState {
    pub fn seeded() -> Self {
        Self {
            users: fixtures::users(),
            jobs: fixtures::jobs(),
            blog_posts: fixtures::blog_posts(),
            candidates: fixtures::candidates(),
            employer_requests: fixtures::employer_requests(),
            audit_log: Vec::new(),
        }
    }
}

/// Binds a record type to its collection inside the store.
pub trait Stored: Record {
    const APPEND_ONLY: bool = false;

    fn slot(state: &StoreState) -> &Vec<Self>;
    fn slot_mut(state: &mut StoreState) -> &mut Vec<Self>;
}

impl Stored for JobPosting {
    fn slot(state: &StoreState) -> &Vec<Self> {
        &state.jobs
    }
    fn slot_mut(state: &mut StoreState) -> &mut Vec<Self> {
        &mut state.jobs
    }
}

impl Stored for BlogPost {
    fn slot(state: &StoreState) -> &Vec<Self> {
        &state.blog_posts
    }
    fn slot_mut(state: &mut StoreState) -> &mut Vec<Self> {
        &mut state.blog_posts
    }
}

impl Stored for CandidateApplication {
    fn slot(state: &StoreState) -> &Vec<Self> {
        &state.candidates
    }
    fn slot_mut(state: &mut StoreState) -> &mut Vec<Self> {
        &mut state.candidates
    }
}

impl Stored for EmployerRequest {
    fn slot(state: &StoreState) -> &Vec<Self> {
        &state.employer_requests
    }
    fn slot_mut(state: &mut StoreState) -> &mut Vec<Self> {
        &mut state.employer_requests
    }
}

impl Stored for AuditLogEntry {
    const APPEND_ONLY: bool = true;

    fn slot(state: &StoreState) -> &Vec<Self> {
        &state.audit_log
    }
    fn slot_mut(state: &mut StoreState) -> &mut Vec<Self> {
        &mut state.audit_log
    }
}

/// A record before and after a mutation.
#[derive(Debug, Clone)]
pub struct Change<T> {
    pub before: T,
    pub after: T,
}

/// Process-wide demo data. Only the named actions below mutate it.
#[derive(Clone)]
pub struct DemoStore {
    state: Arc<RwLock<StoreState>>,
    writer: Arc<tokio::sync::Mutex<()>>,
    path: Option<PathBuf>,
}

impl DemoStore {
    pub fn seeded() -> Self {
        Self::with_state(StoreState::seeded(), None)
    }

    pub fn with_state(state: StoreState, path: Option<PathBuf>) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            writer: Arc::new(tokio::sync::Mutex::new(())),
            path,
        }
    }

    /// Restores the snapshot at `path` if there is a readable one, otherwise seeds fixtures.
    pub fn open(path: Option<PathBuf>) -> Result<Self> {
        let Some(path) = path else {
            tracing::info!("Demo store is memory-only");
            return Ok(Self::seeded());
        };

        let state = match std::fs::read(&path) {
            Ok(raw) => match serde_json::from_slice::<StoreState>(&raw) {
                Ok(state) => {
                    tracing::info!(path = %path.display(), "Restored demo store snapshot");
                    state
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Demo store snapshot unreadable; reseeding");
                    StoreState::seeded()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Seeding demo store");
                StoreState::seeded()
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_vec(&state)?)?;
        Ok(Self::with_state(state, Some(path)))
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    async fn persist(&self, state: &StoreState) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, serde_json::to_vec(state)?).await?;
        }
        Ok(())
    }

    pub fn snapshot(&self) -> StoreState {
        self.read().clone()
    }

    pub fn all<T: Stored>(&self) -> Vec<T> {
        T::slot(&self.read()).clone()
    }

    pub fn find<T: Stored>(&self, key: &T::Key) -> Option<T> {
        T::slot(&self.read())
            .iter()
            .find(|item| item.key() == *key)
            .cloned()
    }

    pub fn count<T: Stored>(&self) -> usize {
        T::slot(&self.read()).len()
    }

    pub fn user_by_email(&self, email: &str) -> Option<AdminUser> {
        self.read()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
            .cloned()
    }

    pub fn users(&self) -> Vec<AdminUser> {
        self.read().users.clone()
    }

    pub async fn insert<T: Stored>(&self, mut item: T) -> Result<T> {
        self.commit(move |state| {
            let items = T::slot_mut(state);
            item.assign_key(items);
            if items.iter().any(|existing| existing.key() == item.key()) {
                return Err(Error::BadRequest(format!(
                    "{} '{}' already exists",
                    T::MODULE,
                    item.key()
                )));
            }
            items.push(item.clone());
            Ok(item)
        })
        .await
    }

    /// Replaces the record under `key`; the stored key is kept even if `item` carries another.
    pub async fn replace<T: Stored>(&self, key: &T::Key, item: T) -> Result<Option<Change<T>>> {
        self.update_with(key, move |current| {
            *current = item;
            Ok(())
        })
        .await
    }

    pub async fn update_with<T, F>(&self, key: &T::Key, apply: F) -> Result<Option<Change<T>>>
    where
        T: Stored,
        F: FnOnce(&mut T) -> std::result::Result<(), String>,
    {
        if T::APPEND_ONLY {
            return Err(Error::BadRequest(format!("{} is append-only", T::MODULE)));
        }
        self.commit(|state| {
            let Some(slot) = T::slot_mut(state)
                .iter_mut()
                .find(|item| item.key() == *key)
            else {
                return Ok(None);
            };

            let before = slot.clone();
            let mut after = before.clone();
            apply(&mut after).map_err(Error::BadRequest)?;
            if after.key() != *key {
                after = restore_key(after, &before);
            }
            after.touch(now());
            *slot = after.clone();
            Ok(Some(Change { before, after }))
        })
        .await
    }

    pub async fn remove<T: Stored>(&self, key: &T::Key) -> Result<Option<T>> {
        if T::APPEND_ONLY {
            return Err(Error::BadRequest(format!("{} is append-only", T::MODULE)));
        }
        self.commit(|state| {
            let items = T::slot_mut(state);
            Ok(items
                .iter()
                .position(|item| item.key() == *key)
                .map(|index| items.remove(index)))
        })
        .await
    }

    pub async fn append_audit(&self, entry: AuditLogEntry) -> Result<()> {
        self.commit(move |state| {
            state.audit_log.push(entry);
            Ok(())
        })
        .await
    }

    /// Runs `change` against a copy of the state and publishes the copy only once its
    /// snapshot is on disk. Mutations are serialized; readers see the old state meanwhile.
    async fn commit<R, F>(&self, change: F) -> Result<R>
    where
        F: FnOnce(&mut StoreState) -> Result<R>,
    {
        let _writer = self.writer.lock().await;
        let mut next = self.snapshot();
        let out = change(&mut next)?;
        self.persist(&next).await?;
        *self.write() = next;
        Ok(out)
    }
}

/// Keys are identity: an edit that tries to change one keeps the original.
fn restore_key<T: Record>(after: T, before: &T) -> T {
    let mut value = match serde_json::to_value(&after) {
        Ok(v) => v,
        Err(_) => return before.clone(),
    };
    let original = match serde_json::to_value(before) {
        Ok(v) => v,
        Err(_) => return before.clone(),
    };
    if let (Some(obj), Some(orig)) = (value.as_object_mut(), original.as_object()) {
        for field in ["id", "slug"] {
            if let Some(v) = orig.get(field) {
                obj.insert(field.to_string(), v.clone());
            }
        }
    }
    serde_json::from_value(value).unwrap_or_else(|_| before.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::LifecycleAction;

    #[tokio::test]
    async fn insert_assigns_next_id() {
        let store = DemoStore::seeded();
        let mut job = fixtures::jobs().remove(0);
        job.id = 0;
        let created = store.insert(job).await.unwrap();
        assert_eq!(created.id, 7);
        assert_eq!(store.count::<JobPosting>(), 7);
    }

    #[tokio::test]
    async fn update_keeps_identity_and_touches() {
        let store = DemoStore::seeded();
        let mut edited = store.find::<JobPosting>(&1).unwrap();
        edited.id = 42;
        edited.title = "Lead Accountant".into();

        let change = store.replace(&1, edited).await.unwrap().unwrap();
        assert_eq!(change.after.id, 1);
        assert_eq!(change.after.title, "Lead Accountant");
        assert!(change.after.updated_at.is_some());
        assert!(store.find::<JobPosting>(&42).is_none());
    }

    #[tokio::test]
    async fn lifecycle_through_update_with() {
        let store = DemoStore::seeded();
        let change = store
            .update_with::<JobPosting, _>(&2, |job| job.apply(LifecycleAction::Archive))
            .await
            .unwrap()
            .unwrap();
        assert!(change.after.is_archived);
        assert!(!change.after.is_active);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = DemoStore::seeded();
        assert!(store.remove::<JobPosting>(&999).await.unwrap().is_none());
        assert!(store
            .replace(&999, fixtures::jobs().remove(0))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn audit_log_is_append_only() {
        let store = DemoStore::seeded();
        let key = uuid::Uuid::new_v4();
        assert!(store.remove::<AuditLogEntry>(&key).await.is_err());
    }

    #[tokio::test]
    async fn snapshot_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = DemoStore::open(Some(path.clone())).unwrap();
        store.remove::<CandidateApplication>(&1).await.unwrap();

        let reopened = DemoStore::open(Some(path)).unwrap();
        assert!(reopened.find::<CandidateApplication>(&1).is_none());
        assert_eq!(reopened.count::<CandidateApplication>(), 4);
    }

    #[tokio::test]
    async fn failed_snapshot_write_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = DemoStore::open(Some(path.clone())).unwrap();

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.remove::<CandidateApplication>(&1).await.is_err());
        assert!(store.find::<CandidateApplication>(&1).is_some());
        assert_eq!(store.count::<CandidateApplication>(), 5);

        let mut job = fixtures::jobs().remove(0);
        job.id = 0;
        assert!(store.insert(job).await.is_err());
        assert_eq!(store.count::<JobPosting>(), 6);

        let entry_count = store.count::<AuditLogEntry>();
        let failed = store
            .update_with::<JobPosting, _>(&2, |job| job.apply(LifecycleAction::Archive))
            .await;
        assert!(failed.is_err());
        assert!(!store.find::<JobPosting>(&2).unwrap().is_archived);
        assert_eq!(store.count::<AuditLogEntry>(), entry_count);
    }
}
