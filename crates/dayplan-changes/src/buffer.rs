//! Local edit buffer
//!
//! Mutable mirror of the editable subset of a [`RemoteDayState`], plus the
//! wish scratch input and the set of stops marked for replacement.

use dayplan_model::{
    BudgetTier, DaySettings, PoiId, RemoteDayState, Tempo, ThematicPreset, TimeWindow,
};
use serde::Serialize;
use std::collections::BTreeSet;

/// Draft values the user is editing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalEditBuffer {
    tempo: Tempo,
    time_window: TimeWindow,
    budget: BudgetTier,
    preset: Option<ThematicPreset>,
    wish_input: String,
    marked_for_replacement: BTreeSet<PoiId>,
}

impl LocalEditBuffer {
    /// Copy the editable fields of a baseline
    #[must_use]
    pub fn from_remote(remote: &RemoteDayState) -> Self {
        Self {
            tempo: remote.tempo,
            time_window: remote.time_window,
            budget: remote.budget_tier,
            preset: remote.thematic_preset,
            wish_input: String::new(),
            marked_for_replacement: BTreeSet::new(),
        }
    }

    /// Draft tempo
    #[inline]
    #[must_use]
    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Draft time window
    #[inline]
    #[must_use]
    pub fn time_window(&self) -> TimeWindow {
        self.time_window
    }

    /// Draft budget
    #[inline]
    #[must_use]
    pub fn budget(&self) -> BudgetTier {
        self.budget
    }

    /// Draft preset
    #[inline]
    #[must_use]
    pub fn preset(&self) -> Option<ThematicPreset> {
        self.preset
    }

    /// Wish scratch input
    #[inline]
    #[must_use]
    pub fn wish_input(&self) -> &str {
        &self.wish_input
    }

    /// Stops marked for replacement
    #[inline]
    #[must_use]
    pub fn marked_for_replacement(&self) -> &BTreeSet<PoiId> {
        &self.marked_for_replacement
    }

    /// Whether a stop is marked for replacement
    #[inline]
    #[must_use]
    pub fn is_marked(&self, poi: &PoiId) -> bool {
        self.marked_for_replacement.contains(poi)
    }

    /// Draft settings triple
    #[inline]
    #[must_use]
    pub fn settings(&self) -> DaySettings {
        DaySettings {
            tempo: self.tempo,
            time_window: self.time_window,
            budget: self.budget,
        }
    }

    /// Whether the buffer is exactly what [`Self::from_remote`] would build
    #[must_use]
    pub fn mirrors(&self, remote: &RemoteDayState) -> bool {
        *self == Self::from_remote(remote)
    }

    pub(crate) fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
    }

    pub(crate) fn set_time_window(&mut self, window: TimeWindow) {
        self.time_window = window;
    }

    pub(crate) fn set_budget(&mut self, budget: BudgetTier) {
        self.budget = budget;
    }

    pub(crate) fn set_preset(&mut self, preset: Option<ThematicPreset>) {
        self.preset = preset;
    }

    pub(crate) fn set_wish_input(&mut self, text: String) {
        self.wish_input = text;
    }

    /// Toggle the mark, returning whether the stop is now marked
    pub(crate) fn toggle_marked(&mut self, poi: &PoiId) -> bool {
        if self.marked_for_replacement.remove(poi) {
            false
        } else {
            self.marked_for_replacement.insert(poi.clone());
            true
        }
    }

    pub(crate) fn mark(&mut self, poi: PoiId) {
        self.marked_for_replacement.insert(poi);
    }

    pub(crate) fn retain_marked<F: FnMut(&PoiId) -> bool>(&mut self, keep: F) {
        self.marked_for_replacement.retain(keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dayplan_model::{DayMetrics, Revision};

    fn remote() -> RemoteDayState {
        RemoteDayState {
            points_of_interest: Vec::new(),
            tempo: Tempo::Low,
            time_window: TimeWindow::parse("10:00", "20:00").unwrap(),
            budget_tier: BudgetTier::High,
            thematic_preset: Some(ThematicPreset::Cozy),
            narrative_summary: String::new(),
            metrics: DayMetrics::default(),
            wish_thread: Vec::new(),
            revision: Revision(1),
        }
    }

    #[test]
    fn buffer_copies_editable_fields() {
        let remote = remote();
        let buffer = LocalEditBuffer::from_remote(&remote);
        assert_eq!(buffer.tempo(), Tempo::Low);
        assert_eq!(buffer.budget(), BudgetTier::High);
        assert_eq!(buffer.preset(), Some(ThematicPreset::Cozy));
        assert_eq!(buffer.settings(), remote.settings());
        assert!(buffer.mirrors(&remote));
    }

    #[test]
    fn buffer_toggle_marked() {
        let mut buffer = LocalEditBuffer::from_remote(&remote());
        let poi = PoiId::new("poi_1").unwrap();

        assert!(buffer.toggle_marked(&poi));
        assert!(buffer.is_marked(&poi));
        assert!(!buffer.toggle_marked(&poi));
        assert!(buffer.marked_for_replacement().is_empty());
    }

    #[test]
    fn buffer_scratch_breaks_mirror() {
        let remote = remote();
        let mut buffer = LocalEditBuffer::from_remote(&remote);
        buffer.set_wish_input("half typed".to_string());
        assert!(!buffer.mirrors(&remote));
    }
}
