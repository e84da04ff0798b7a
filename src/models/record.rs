use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::utils::permissions::Module;

/// Filterable attributes shared across collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Country,
    Location,
    Category,
    WorkType,
    Experience,
}

/// Lifecycle transitions that are not plain edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Activate,
    Deactivate,
    Archive,
    Publish,
    Unpublish,
}

impl LifecycleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleAction::Activate => "activate",
            LifecycleAction::Deactivate => "deactivate",
            LifecycleAction::Archive => "archive",
            LifecycleAction::Publish => "publish",
            LifecycleAction::Unpublish => "unpublish",
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical entity as stored locally and handed to the presentation layer.
pub trait Record: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Key: Clone
        + Eq
        + Hash
        + fmt::Display
        + fmt::Debug
        + FromStr
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    const MODULE: Module;
    const FACETS: &'static [Facet] = &[];

    fn key(&self) -> Self::Key;

    /// Human readable name used in audit entries.
    fn label(&self) -> String;

    /// `needle` is already lowercased and trimmed.
    fn matches_search(&self, needle: &str) -> bool;

    fn facet(&self, _facet: Facet) -> Option<String> {
        None
    }

    fn sort_date(&self) -> DateTime<Utc>;

    fn is_public(&self) -> bool {
        true
    }

    fn is_related(&self, _other: &Self) -> bool {
        false
    }

    fn apply(&mut self, action: LifecycleAction) -> Result<(), String> {
        Err(format!("{} does not support {}", Self::MODULE, action))
    }

    /// Gives a freshly created record a key that is unique among `existing`.
    fn assign_key(&mut self, _existing: &[Self]) {}

    fn touch(&mut self, _now: DateTime<Utc>) {}
}

pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

pub(crate) fn next_numeric_id<T>(existing: &[T], id: impl Fn(&T) -> i64) -> i64 {
    existing.iter().map(id).max().unwrap_or(0) + 1
}
