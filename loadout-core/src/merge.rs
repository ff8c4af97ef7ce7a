//! Change-set aggregation.
//!
//! Generators run independently (one per agent, target, or artifact kind) and
//! may touch the same path. [`merge`] folds their output into one change-set
//! with one entry per distinct path. Later inputs win.

use std::collections::HashMap;

use crate::types::{ChangeSet, DeleteEntry, FileWrite};

/// Merge change-sets in precedence order (last wins).
///
/// - `create_or_update`: one entry per path; a later write replaces the
///   earlier one wholesale, `sections` and `is_base64` included.
/// - `delete`: union of paths; a later `kind` for the same path wins.
///
/// The two lists are merged independently: a path may appear in both.
/// Output keeps the position of each path's first appearance.
pub fn merge<I>(change_sets: I) -> ChangeSet
where
    I: IntoIterator<Item = ChangeSet>,
{
    let mut writes = PathTable::<FileWrite>::default();
    let mut deletes = PathTable::<DeleteEntry>::default();
    let mut inputs = 0usize;

    for change_set in change_sets {
        inputs += 1;
        for write in change_set.create_or_update {
            writes.upsert(write.path.clone(), write);
        }
        for entry in change_set.delete {
            deletes.upsert(entry.path.clone(), entry);
        }
    }

    let merged = ChangeSet {
        create_or_update: writes.into_values(),
        delete: deletes.into_values(),
    };
    tracing::debug!(
        inputs,
        writes = merged.create_or_update.len(),
        deletes = merged.delete.len(),
        "merged change-sets"
    );
    merged
}

impl ChangeSet {
    /// Fold `other` on top of `self` with the [`merge`] rules.
    pub fn absorb(&mut self, other: ChangeSet) {
        let current = std::mem::take(self);
        *self = merge([current, other]);
    }
}

/// Insertion-ordered, path-keyed table with last-write-wins values.
struct PathTable<T> {
    index: HashMap<String, usize>,
    values: Vec<T>,
}

impl<T> Default for PathTable<T> {
    fn default() -> Self {
        Self { index: HashMap::new(), values: Vec::new() }
    }
}

impl<T> PathTable<T> {
    fn upsert(&mut self, path: String, value: T) {
        match self.index.get(&path) {
            Some(&slot) => self.values[slot] = value,
            None => {
                self.index.insert(path, self.values.len());
                self.values.push(value);
            }
        }
    }

    fn into_values(self) -> Vec<T> {
        self.values
    }
}
