use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::pagination::Paginator;

/// Small string key/value persistence for per-user preferences.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON file backed storage; the whole map is rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
    writer: Mutex<()>,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable preferences file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            entries: RwLock::new(entries),
            writer: Mutex::new(()),
        })
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// The new map becomes visible only after it is written; readers never wait on the file.
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        next.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(&next)?)?;
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = next;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeVariant {
    #[default]
    System,
    Light,
    Dark,
}

impl ThemeVariant {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "system" => Some(ThemeVariant::System),
            "light" => Some(ThemeVariant::Light),
            "dark" => Some(ThemeVariant::Dark),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ThemeVariant::System => "system",
            ThemeVariant::Light => "light",
            ThemeVariant::Dark => "dark",
        }
    }
}

pub fn page_size_key(user_id: &str, list: &str) -> String {
    format!("{}:per_page:{}", user_id, list)
}

fn theme_key(user_id: &str) -> String {
    format!("{}:theme", user_id)
}

/// Lists whose page size is remembered per admin user.
pub const PAGINATED_LISTS: &[&str] = &[
    "candidates",
    "jobs",
    "employer_requests",
    "blog",
    "audit_log",
];

pub fn theme(storage: &dyn KeyValueStorage, user_id: &str) -> ThemeVariant {
    storage
        .get(&theme_key(user_id))
        .as_deref()
        .and_then(ThemeVariant::parse)
        .unwrap_or_default()
}

pub fn set_theme(storage: &dyn KeyValueStorage, user_id: &str, theme: ThemeVariant) -> Result<()> {
    storage.set(&theme_key(user_id), theme.as_str())
}

pub fn page_sizes(storage: &dyn KeyValueStorage, user_id: &str) -> BTreeMap<String, u32> {
    PAGINATED_LISTS
        .iter()
        .map(|list| {
            let size = Paginator::restore(storage, &page_size_key(user_id, list)).page_size();
            (list.to_string(), size.get())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let storage = FileStorage::open(&path).unwrap();
        set_theme(&storage, "u1", ThemeVariant::Dark).unwrap();
        storage.set(&page_size_key("u1", "jobs"), "25").unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(theme(&reopened, "u1"), ThemeVariant::Dark);
        assert_eq!(page_sizes(&reopened, "u1")["jobs"], 25);
        assert_eq!(page_sizes(&reopened, "u1")["blog"], 10);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, b"{not json").unwrap();
        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(theme(&storage, "u1"), ThemeVariant::System);
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let storage = FileStorage::open(&path).unwrap();
        storage.set(&page_size_key("u1", "jobs"), "25").unwrap();

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(storage.set(&page_size_key("u1", "jobs"), "50").is_err());
        assert_eq!(page_sizes(&storage, "u1")["jobs"], 25);
    }

    #[test]
    fn unknown_theme_falls_back_to_default() {
        let storage = MemoryStorage::new();
        storage.set("u2:theme", "neon").unwrap();
        assert_eq!(theme(&storage, "u2"), ThemeVariant::System);
    }
}
