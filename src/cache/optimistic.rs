//! Snapshot, speculative apply, commit-or-revert.
//!
//! These are plain functions over the cache entry so each phase can be
//! exercised without an actor, a runtime or a remote.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use super::Entity;

/// The local change a mutation wants to make.
#[derive(Debug)]
pub enum Change<'a, T: Entity> {
    Patch(&'a T::Patch),
    Remove,
}

/// What the speculative write actually did to the entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Speculation<T> {
    Patched { index: usize, prior: T },
    Removed { index: usize, prior: T },
    /// Entry absent or id not cached; nothing was rewritten.
    Untouched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revert {
    /// Entry restored to the snapshot, byte for byte.
    Exact,
    /// Other writes happened since; only this mutation's own change was undone.
    Targeted,
    Noop,
}

#[derive(Debug)]
pub struct OptimisticMutation<T: Entity> {
    id: T::Id,
    snapshot: Option<Vec<T>>,
    speculation: Speculation<T>,
    applied_version: u64,
}

impl<T: Entity> OptimisticMutation<T> {
    /// Snapshot the entry, then apply `change` for `id`.
    ///
    /// `version` is the entry version the caller assigns to this write.
    pub fn begin(entry: &mut Option<Vec<T>>, id: &T::Id, change: Change<'_, T>, version: u64) -> Self {
        let snapshot = entry.clone();
        let speculation = match entry.as_mut() {
            None => Speculation::Untouched,
            Some(items) => match items.iter().position(|item| item.id() == id) {
                None => Speculation::Untouched,
                Some(index) => match change {
                    Change::Patch(patch) => {
                        let prior = items[index].clone();
                        items[index].apply_patch(patch);
                        Speculation::Patched { index, prior }
                    }
                    Change::Remove => {
                        let prior = items.remove(index);
                        Speculation::Removed { index, prior }
                    }
                },
            },
        };
        Self {
            id: id.clone(),
            snapshot,
            speculation,
            applied_version: version,
        }
    }

    pub fn id(&self) -> &T::Id {
        &self.id
    }

    pub fn speculation(&self) -> &Speculation<T> {
        &self.speculation
    }

    pub fn snapshot(&self) -> Option<&Vec<T>> {
        self.snapshot.as_ref()
    }

    /// Undo the speculative write after a remote failure.
    ///
    /// A removed record that cannot be restored exactly goes back to its
    /// place in `order`, so several failed removals keep server order.
    pub fn revert(self, entry: &mut Option<Vec<T>>, current_version: u64, order: &RowOrder<T::Id>) -> Revert {
        if current_version == self.applied_version {
            *entry = self.snapshot;
            return Revert::Exact;
        }

        let Some(items) = entry.as_mut() else {
            return Revert::Noop;
        };
        match self.speculation {
            Speculation::Untouched => Revert::Noop,
            Speculation::Patched { prior, .. } => {
                match items.iter().position(|item| item.id() == &self.id) {
                    Some(index) => {
                        items[index] = prior;
                        Revert::Targeted
                    }
                    None => Revert::Noop,
                }
            }
            Speculation::Removed { index, prior } => {
                if items.iter().any(|item| item.id() == &self.id) {
                    return Revert::Noop;
                }
                let index = order
                    .insert_position(items, &self.id)
                    .unwrap_or_else(|| index.min(items.len()));
                items.insert(index, prior);
                Revert::Targeted
            }
        }
    }
}

/// Server order of every id the entry has held since the last fetch.
///
/// Ids keep their rank while a removal is in flight, which is what lets a
/// reverted removal find its slot among rows that were themselves removed
/// and restored.
#[derive(Debug)]
pub struct RowOrder<Id> {
    ranks: HashMap<Id, u64>,
    next: u64,
}

impl<Id: Eq + Hash + Clone> Default for RowOrder<Id> {
    fn default() -> Self {
        Self {
            ranks: HashMap::new(),
            next: 0,
        }
    }
}

impl<Id: Eq + Hash + Clone> RowOrder<Id> {
    /// Rank a freshly fetched collection in its server order.
    pub fn reset<'a>(&mut self, ids: impl IntoIterator<Item = &'a Id>)
    where
        Id: 'a,
    {
        self.ranks.clear();
        self.next = 0;
        for id in ids {
            self.append(id);
        }
    }

    /// Rank `id` after everything known. No-op for a known id.
    pub fn append(&mut self, id: &Id) {
        if !self.ranks.contains_key(id) {
            self.ranks.insert(id.clone(), self.next);
            self.next += 1;
        }
    }

    pub fn forget(&mut self, id: &Id) {
        self.ranks.remove(id);
    }

    pub fn rank(&self, id: &Id) -> Option<u64> {
        self.ranks.get(id).copied()
    }

    /// Index in `items` where `id` belongs: before the first row ranked after it.
    pub fn insert_position<T: Entity<Id = Id>>(&self, items: &[T], id: &Id) -> Option<usize> {
        let rank = self.rank(id)?;
        let index = items
            .iter()
            .position(|item| self.rank(item.id()).is_some_and(|r| r > rank))
            .unwrap_or(items.len());
        Some(index)
    }
}

/// Upsert a server-confirmed record. Never creates an absent entry.
pub fn commit_record<T: Entity>(entry: &mut Option<Vec<T>>, record: T) -> bool {
    let Some(items) = entry.as_mut() else {
        return false;
    };
    match items.iter().position(|item| item.id() == record.id()) {
        Some(index) => items[index] = record,
        None => items.push(record),
    }
    true
}

/// Drop repeated ids, keeping the first occurrence. Returns how many were dropped.
pub fn dedupe<T: Entity>(items: Vec<T>) -> (Vec<T>, usize) {
    let mut seen = HashSet::with_capacity(items.len());
    let before = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter(|item| seen.insert(item.id().clone()))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}
