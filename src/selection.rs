//! Row selection for bulk operations. Kept in memory only.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Selected ids in the order they were first selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: &str) {
        match self.ids.iter().position(|s| s == id) {
            Some(index) => {
                self.ids.remove(index);
            }
            None => self.ids.push(id.to_string()),
        }
    }

    /// Clears when the selection is as large as `all_ids`, selects all of
    /// `all_ids` otherwise.
    ///
    /// Only sizes are compared, so a selection of the right size that holds
    /// other ids is cleared as well.
    pub fn toggle_all<S: AsRef<str>>(&mut self, all_ids: &[S]) {
        if self.ids.len() == all_ids.len() {
            self.ids.clear();
            return;
        }
        self.ids.clear();
        for id in all_ids {
            let id = id.as_ref();
            if !self.contains(id) {
                self.ids.push(id.to_string());
            }
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    pub fn selected(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Shared, cloneable selection.
#[derive(Debug, Clone, Default)]
pub struct SelectionHandle(Arc<Mutex<Selection>>);

impl SelectionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Selection> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn toggle(&self, id: &str) {
        self.lock().toggle(id);
    }

    pub fn toggle_all<S: AsRef<str>>(&self, all_ids: &[S]) {
        self.lock().toggle_all(all_ids);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    /// Copy of the selected ids.
    pub fn selected(&self) -> Vec<String> {
        self.lock().selected().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
