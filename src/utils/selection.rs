use std::collections::HashSet;
use std::hash::Hash;

use crate::models::record::Record;

/// Ids picked from a list for a bulk action.
///
/// The selection is never pruned automatically: ids that vanish from the backing list
/// still count in `selected_count` but are skipped by `selected_items`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSelection<K: Eq + Hash> {
    selected: HashSet<K>,
}

impl<K: Eq + Hash> Default for BulkSelection<K> {
    fn default() -> Self {
        Self {
            selected: HashSet::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> BulkSelection<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: impl IntoIterator<Item = K>) -> Self {
        Self {
            selected: ids.into_iter().collect(),
        }
    }

    pub fn toggle(&mut self, id: K) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    pub fn select_all<T>(&mut self, items: &[T], checked: bool)
    where
        T: Record<Key = K>,
    {
        self.selected = if checked {
            items.iter().map(Record::key).collect()
        } else {
            HashSet::new()
        };
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: &K) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = &K> {
        self.selected.iter()
    }

    pub fn all_selected<T>(&self, items: &[T]) -> bool
    where
        T: Record<Key = K>,
    {
        !items.is_empty() && self.selected.len() == items.len()
    }

    /// The header checkbox's indeterminate state.
    pub fn some_selected<T>(&self, items: &[T]) -> bool
    where
        T: Record<Key = K>,
    {
        !self.selected.is_empty() && self.selected.len() < items.len()
    }

    pub fn selected_items<'a, T>(&self, items: &'a [T]) -> Vec<&'a T>
    where
        T: Record<Key = K>,
    {
        items
            .iter()
            .filter(|item| self.selected.contains(&item.key()))
            .collect()
    }

    /// Selected ids that are absent from `items`.
    pub fn missing_ids<T>(&self, items: &[T]) -> Vec<K>
    where
        T: Record<Key = K>,
    {
        let present: HashSet<K> = items.iter().map(Record::key).collect();
        self.selected
            .iter()
            .filter(|id| !present.contains(*id))
            .cloned()
            .collect()
    }
}
