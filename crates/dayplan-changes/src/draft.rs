//! Edit draft
//!
//! Synchronous core of an editing session: the baseline, the local buffer
//! and the pending log, kept consistent by the [`ChangeReconciler`].
//! Every operation runs to completion; a precondition failure returns
//! before anything is mutated.

use crate::buffer::LocalEditBuffer;
use crate::change::{DayChange, PendingChangeRecord, Placement};
use crate::error::{violated, PreconditionError};
use crate::log::PendingChangeLog;
use crate::reconciler::{ChangeReconciler, ReconcileOutcome};
use crate::transaction::TransactionRequest;
use dayplan_model::{
    BudgetTier, PlaceId, PlaceResult, PoiId, RemoteDayState, Revision, Tempo, ThematicPreset,
    TimeOfDay, TimeWindow,
};

/// Records dropped while moving a draft onto a newer baseline
#[derive(Debug, Clone, PartialEq)]
pub struct RebaseReport {
    /// Baseline revision before the rebase
    pub from: Revision,
    /// Baseline revision after the rebase
    pub to: Revision,
    /// Records that no longer apply, in their original order
    pub dropped: Vec<PendingChangeRecord>,
}

impl RebaseReport {
    /// Whether every pending record survived
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// Baseline + buffer + pending log
#[derive(Debug, Clone)]
pub struct EditDraft {
    baseline: RemoteDayState,
    buffer: LocalEditBuffer,
    log: PendingChangeLog,
    reconciler: ChangeReconciler,
}

impl EditDraft {
    /// Start editing a freshly loaded baseline
    #[must_use]
    pub fn new(baseline: RemoteDayState) -> Self {
        let buffer = LocalEditBuffer::from_remote(&baseline);
        Self {
            baseline,
            buffer,
            log: PendingChangeLog::new(),
            reconciler: ChangeReconciler::new(),
        }
    }

    /// Current baseline
    #[inline]
    #[must_use]
    pub fn baseline(&self) -> &RemoteDayState {
        &self.baseline
    }

    /// Draft values
    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &LocalEditBuffer {
        &self.buffer
    }

    /// Pending changes
    #[inline]
    #[must_use]
    pub fn log(&self) -> &PendingChangeLog {
        &self.log
    }

    /// Number of pending records
    #[inline]
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.log.len()
    }

    /// Whether anything is pending
    #[inline]
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.log.is_empty()
    }

    /// Revision the pending log is based on
    #[inline]
    #[must_use]
    pub fn base_revision(&self) -> Revision {
        self.baseline.revision
    }

    /// Snapshot the pending log as a transaction
    #[must_use]
    pub fn transaction(&self) -> TransactionRequest {
        TransactionRequest::from_log(self.baseline.revision, &self.log)
    }

    /// Set the tempo
    pub fn update_tempo(&mut self, tempo: Tempo) -> ReconcileOutcome {
        self.buffer.set_tempo(tempo);
        self.reconcile_settings()
    }

    /// Set the day's time window
    ///
    /// # Errors
    /// Returns [`PreconditionError::InvalidTimeWindow`] if `start >= end`
    pub fn update_time_window(
        &mut self,
        start: TimeOfDay,
        end: TimeOfDay,
    ) -> Result<ReconcileOutcome, PreconditionError> {
        let window = TimeWindow::new(start, end).map_err(|e| violated(e.into()))?;
        self.buffer.set_time_window(window);
        Ok(self.reconcile_settings())
    }

    /// Set the budget tier
    pub fn update_budget(&mut self, budget: BudgetTier) -> ReconcileOutcome {
        self.buffer.set_budget(budget);
        self.reconcile_settings()
    }

    /// Select a preset; selecting the active preset again clears it
    pub fn select_preset(&mut self, preset: Option<ThematicPreset>) -> ReconcileOutcome {
        let next = match preset {
            Some(p) if self.buffer.preset() == Some(p) => None,
            other => other,
        };
        self.buffer.set_preset(next);
        self.reconciler
            .reconcile(&mut self.log, DayChange::preset(next), &self.baseline)
    }

    /// Replace the wish scratch input
    pub fn set_wish_input(&mut self, text: impl Into<String>) {
        self.buffer.set_wish_input(text.into());
    }

    /// Queue a wish and clear the scratch input
    ///
    /// # Errors
    /// Returns error if the trimmed text is empty or longer than `max_len`
    /// characters
    pub fn add_wish(
        &mut self,
        text: &str,
        max_len: usize,
    ) -> Result<ReconcileOutcome, PreconditionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(violated(PreconditionError::EmptyWish));
        }
        if text.chars().count() > max_len {
            return Err(violated(PreconditionError::WishTooLong { max: max_len }));
        }

        self.buffer.set_wish_input(String::new());
        Ok(self
            .reconciler
            .reconcile(&mut self.log, DayChange::wish(text), &self.baseline))
    }

    /// Queue a new stop
    ///
    /// # Errors
    /// Returns [`PreconditionError::UnknownPoi`] if the placement names a
    /// slot that is not in the baseline
    pub fn add_place(
        &mut self,
        place: PlaceResult,
        placement: Placement,
    ) -> Result<ReconcileOutcome, PreconditionError> {
        if let Some(slot) = placement.slot() {
            self.require_poi(slot)?;
        }
        Ok(self.reconciler.reconcile(
            &mut self.log,
            DayChange::add_place(place, placement),
            &self.baseline,
        ))
    }

    /// Toggle a stop's mark for automatic replacement
    ///
    /// # Errors
    /// Returns [`PreconditionError::UnknownPoi`] for unknown stop ids
    pub fn mark_for_replacement(
        &mut self,
        poi: &PoiId,
    ) -> Result<ReconcileOutcome, PreconditionError> {
        self.require_poi(poi)?;
        self.buffer.toggle_marked(poi);
        Ok(self.reconciler.reconcile(
            &mut self.log,
            DayChange::replace_place(poi.clone(), None),
            &self.baseline,
        ))
    }

    /// Mark a stop for replacement by a specific place
    ///
    /// Supersedes any earlier mark for the same stop.
    ///
    /// # Errors
    /// Returns [`PreconditionError::UnknownPoi`] for unknown stop ids
    pub fn replace_place_with(
        &mut self,
        poi: &PoiId,
        target: PlaceId,
    ) -> Result<ReconcileOutcome, PreconditionError> {
        self.require_poi(poi)?;
        self.buffer.mark(poi.clone());
        Ok(self.reconciler.supersede(
            &mut self.log,
            DayChange::replace_place(poi.clone(), Some(target)),
        ))
    }

    /// Toggle a stop's removal
    ///
    /// # Errors
    /// Returns [`PreconditionError::UnknownPoi`] for unknown stop ids
    pub fn remove_place(&mut self, poi: &PoiId) -> Result<ReconcileOutcome, PreconditionError> {
        self.require_poi(poi)?;
        Ok(self.reconciler.reconcile(
            &mut self.log,
            DayChange::remove_place(poi.clone()),
            &self.baseline,
        ))
    }

    /// Abandon all edits
    pub fn reset(&mut self) {
        self.buffer = LocalEditBuffer::from_remote(&self.baseline);
        self.log.clear();
    }

    /// Replace the baseline after a committed transaction
    pub fn install_baseline(&mut self, baseline: RemoteDayState) {
        self.baseline = baseline;
        self.reset();
    }

    /// Move pending edits onto a newer baseline
    ///
    /// Fields the user left at the old baseline follow the new one; edited
    /// fields keep the user's value. Records whose stops vanished are
    /// dropped. Current-value records are re-evaluated against the new
    /// baseline: rewritten in place if still needed, dropped if they now
    /// restate it. Survivors keep their order.
    pub fn rebase(&mut self, baseline: RemoteDayState) -> RebaseReport {
        let old = std::mem::replace(&mut self.baseline, baseline);
        let new = &self.baseline;

        if self.buffer.tempo() == old.tempo {
            self.buffer.set_tempo(new.tempo);
        }
        if self.buffer.time_window() == old.time_window {
            self.buffer.set_time_window(new.time_window);
        }
        if self.buffer.budget() == old.budget_tier {
            self.buffer.set_budget(new.budget_tier);
        }
        if self.buffer.preset() == old.thematic_preset {
            self.buffer.set_preset(new.thematic_preset);
        }

        let mut dropped = self.log.retain(|record| {
            record
                .change()
                .referenced_pois()
                .into_iter()
                .all(|poi| new.contains_poi(poi))
        });
        self.buffer.retain_marked(|poi| new.contains_poi(poi));

        // Surviving current-value records keep their place in the log.
        let current = [
            DayChange::settings(self.buffer.settings()),
            DayChange::preset(self.buffer.preset()),
        ];
        for change in current {
            if change.matches_baseline(&self.baseline) {
                dropped.extend(self.log.remove_kind(change.kind()));
            } else if !self.log.rewrite_kind(change.clone()) {
                self.log.push(change);
            }
        }

        let report = RebaseReport {
            from: old.revision,
            to: self.baseline.revision,
            dropped,
        };
        tracing::debug!(
            from = %report.from,
            to = %report.to,
            dropped = report.dropped.len(),
            pending = self.log.len(),
            "rebased draft"
        );
        report
    }

    fn reconcile_settings(&mut self) -> ReconcileOutcome {
        self.reconciler.reconcile(
            &mut self.log,
            DayChange::settings(self.buffer.settings()),
            &self.baseline,
        )
    }

    fn require_poi(&self, poi: &PoiId) -> Result<(), PreconditionError> {
        if self.baseline.contains_poi(poi) {
            Ok(())
        } else {
            Err(violated(PreconditionError::UnknownPoi(poi.clone())))
        }
    }
}
