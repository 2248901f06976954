//! Ordered pending change log
//!
//! Insertion order is submission order. Length is tracked by the backing
//! `Vec`, so dirty count and emptiness are O(1).

use crate::change::{ChangeId, ChangeKind, DayChange, PendingChangeRecord};
use dayplan_model::PoiId;
use serde::Serialize;

/// Ordered list of pending change records
///
/// The log itself enforces no merge policy; [`crate::ChangeReconciler`]
/// decides what goes in and what comes out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PendingChangeLog {
    records: Vec<PendingChangeRecord>,
}

impl PendingChangeLog {
    /// Create empty log
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is pending
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in submission order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[PendingChangeRecord] {
        &self.records
    }

    /// Iterate changes in submission order
    pub fn changes(&self) -> impl Iterator<Item = &DayChange> {
        self.records.iter().map(PendingChangeRecord::change)
    }

    /// Append a change at the end
    pub fn push(&mut self, change: DayChange) -> ChangeId {
        let record = PendingChangeRecord::new(change);
        let id = record.id();
        self.records.push(record);
        id
    }

    /// Number of records of a kind
    #[must_use]
    pub fn count_kind(&self, kind: ChangeKind) -> usize {
        self.records.iter().filter(|r| r.kind() == kind).count()
    }

    /// First record of a kind
    #[must_use]
    pub fn find_kind(&self, kind: ChangeKind) -> Option<&PendingChangeRecord> {
        self.records.iter().find(|r| r.kind() == kind)
    }

    /// Remove every record of a kind, returning the first one removed
    pub fn remove_kind(&mut self, kind: ChangeKind) -> Option<PendingChangeRecord> {
        let mut removed = self.retain(|r| r.kind() != kind);
        if removed.is_empty() {
            None
        } else {
            Some(removed.swap_remove(0))
        }
    }

    /// Rewrite the record of `change`'s kind in place
    ///
    /// Keeps the record's id and position. Returns `false` if no record of
    /// the kind exists.
    pub fn rewrite_kind(&mut self, change: DayChange) -> bool {
        let kind = change.kind();
        match self.records.iter_mut().find(|r| r.kind() == kind) {
            Some(record) => {
                record.rewrite(change);
                true
            }
            None => false,
        }
    }

    /// Whether a keyed record for this stop exists
    #[must_use]
    pub fn contains_keyed(&self, kind: ChangeKind, poi: &PoiId) -> bool {
        self.records
            .iter()
            .any(|r| r.kind() == kind && r.change().item_key() == Some(poi))
    }

    /// Remove the keyed record for this stop
    pub fn remove_keyed(&mut self, kind: ChangeKind, poi: &PoiId) -> Option<PendingChangeRecord> {
        let position = self
            .records
            .iter()
            .position(|r| r.kind() == kind && r.change().item_key() == Some(poi))?;
        Some(self.records.remove(position))
    }

    /// Keep records matching `keep`, returning the removed ones in order
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<PendingChangeRecord>
    where
        F: FnMut(&PendingChangeRecord) -> bool,
    {
        let (kept, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|r| keep(r));
        self.records = kept;
        removed
    }

    /// Drop everything
    #[inline]
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
