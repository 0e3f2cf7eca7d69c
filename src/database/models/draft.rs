use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::entry::Entry;

/// Unsaved changes layered over a persisted month. A `None` value is a
/// tombstone: the date disappears from the effective view until the delete is
/// committed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PendingChanges {
    changes: BTreeMap<NaiveDate, Option<Entry>>,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn put(&mut self, entry: Entry) {
        self.changes.insert(entry.date, Some(entry));
    }

    pub fn tombstone(&mut self, date: NaiveDate) {
        self.changes.insert(date, None);
    }

    pub fn get(&self, date: NaiveDate) -> Option<Option<&Entry>> {
        self.changes.get(&date).map(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Option<&Entry>)> {
        self.changes.iter().map(|(date, change)| (*date, change.as_ref()))
    }

    pub fn saves(&self) -> impl Iterator<Item = &Entry> {
        self.changes.values().flatten()
    }

    pub fn deletions(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.changes
            .iter()
            .filter(|(_, change)| change.is_none())
            .map(|(date, _)| *date)
    }

    pub fn changed_dates(&self) -> Vec<NaiveDate> {
        self.changes.keys().copied().collect()
    }

    /// Merges the overlay on top of `persisted` without touching it.
    pub fn apply_to(&self, persisted: &BTreeMap<NaiveDate, Entry>) -> BTreeMap<NaiveDate, Entry> {
        let mut merged = persisted.clone();
        for (date, change) in &self.changes {
            match change {
                Some(entry) => {
                    merged.insert(*date, entry.clone());
                }
                None => {
                    merged.remove(date);
                }
            }
        }
        merged
    }
}
