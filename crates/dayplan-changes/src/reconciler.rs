//! Change reconciler
//!
//! Keeps the pending log equal to "what the user actually changed relative
//! to the baseline", applying the [`MergePolicy`] of each change kind.

use crate::change::DayChange;
use crate::log::PendingChangeLog;
use crate::policy::MergePolicy;
use dayplan_model::RemoteDayState;

/// What a reconciliation did to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// New record appended, nothing removed
    Added,
    /// Existing record of the same kind or key replaced by a fresh one at
    /// the end of the log
    Replaced,
    /// Existing record dropped because the value is back at baseline
    RoundTripped,
    /// Keyed record toggled off
    Removed,
    /// Value equals baseline and no record existed
    Unchanged,
}

/// Applies merge policies to the pending log
///
/// Stateless; cannot fail. Preconditions (known stop ids, valid windows)
/// are checked before a change reaches the reconciler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeReconciler;

impl ChangeReconciler {
    /// Create new reconciler
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Record a change under its kind's policy
    ///
    /// - current-value: drop any record of the kind, then append `change`
    ///   unless it restates the baseline
    /// - item-keyed: toggle the record for the stop
    /// - append-only: append
    pub fn reconcile(
        &self,
        log: &mut PendingChangeLog,
        change: DayChange,
        baseline: &RemoteDayState,
    ) -> ReconcileOutcome {
        let kind = change.kind();
        let outcome = match change.policy() {
            MergePolicy::CurrentValue => {
                let had = log.remove_kind(kind).is_some();
                if change.matches_baseline(baseline) {
                    if had {
                        ReconcileOutcome::RoundTripped
                    } else {
                        ReconcileOutcome::Unchanged
                    }
                } else {
                    log.push(change);
                    if had {
                        ReconcileOutcome::Replaced
                    } else {
                        ReconcileOutcome::Added
                    }
                }
            }
            MergePolicy::ItemKeyed => {
                let removed = change
                    .item_key()
                    .and_then(|poi| log.remove_keyed(kind, poi));
                if removed.is_some() {
                    ReconcileOutcome::Removed
                } else {
                    log.push(change);
                    ReconcileOutcome::Added
                }
            }
            MergePolicy::AppendOnly => {
                log.push(change);
                ReconcileOutcome::Added
            }
        };

        tracing::debug!(kind = %kind, ?outcome, dirty = log.len(), "reconciled change");
        outcome
    }

    /// Record an item-keyed change, replacing instead of toggling
    ///
    /// Used when the user picks a different explicit target for a stop that
    /// is already marked.
    pub fn supersede(&self, log: &mut PendingChangeLog, change: DayChange) -> ReconcileOutcome {
        let kind = change.kind();
        debug_assert_eq!(change.policy(), MergePolicy::ItemKeyed);

        let had = change
            .item_key()
            .and_then(|poi| log.remove_keyed(kind, poi))
            .is_some();
        log.push(change);

        let outcome = if had {
            ReconcileOutcome::Replaced
        } else {
            ReconcileOutcome::Added
        };
        tracing::debug!(kind = %kind, ?outcome, dirty = log.len(), "superseded change");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeKind;
    use dayplan_model::{
        BudgetTier, DayMetrics, PoiId, Revision, Tempo, ThematicPreset, TimeWindow,
    };
    use pretty_assertions::assert_eq;

    fn baseline() -> RemoteDayState {
        RemoteDayState {
            points_of_interest: Vec::new(),
            tempo: Tempo::Medium,
            time_window: TimeWindow::parse("09:00", "18:00").unwrap(),
            budget_tier: BudgetTier::Medium,
            thematic_preset: None,
            narrative_summary: String::new(),
            metrics: DayMetrics::default(),
            wish_thread: Vec::new(),
            revision: Revision(5),
        }
    }

    fn with_tempo(base: &RemoteDayState, tempo: Tempo) -> DayChange {
        let mut settings = base.settings();
        settings.tempo = tempo;
        DayChange::settings(settings)
    }

    #[test]
    fn current_value_adds_then_replaces() {
        let base = baseline();
        let reconciler = ChangeReconciler::new();
        let mut log = PendingChangeLog::new();

        assert_eq!(
            reconciler.reconcile(&mut log, with_tempo(&base, Tempo::High), &base),
            ReconcileOutcome::Added
        );
        assert_eq!(
            reconciler.reconcile(&mut log, with_tempo(&base, Tempo::Low), &base),
            ReconcileOutcome::Replaced
        );
        assert_eq!(log.count_kind(ChangeKind::UpdateSettings), 1);
        assert_eq!(log.records()[0].change(), &with_tempo(&base, Tempo::Low));
    }

    #[test]
    fn current_value_round_trip_drops_record() {
        let base = baseline();
        let reconciler = ChangeReconciler::new();
        let mut log = PendingChangeLog::new();

        reconciler.reconcile(&mut log, with_tempo(&base, Tempo::High), &base);
        let outcome = reconciler.reconcile(&mut log, with_tempo(&base, Tempo::Medium), &base);

        assert_eq!(outcome, ReconcileOutcome::RoundTripped);
        assert!(log.is_empty());
    }

    #[test]
    fn current_value_at_baseline_is_noop() {
        let base = baseline();
        let mut log = PendingChangeLog::new();
        let outcome = ChangeReconciler::new().reconcile(&mut log, DayChange::preset(None), &base);
        assert_eq!(outcome, ReconcileOutcome::Unchanged);
        assert!(log.is_empty());
    }

    #[test]
    fn replaced_record_moves_to_end() {
        let base = baseline();
        let reconciler = ChangeReconciler::new();
        let mut log = PendingChangeLog::new();

        reconciler.reconcile(&mut log, DayChange::preset(Some(ThematicPreset::Food)), &base);
        reconciler.reconcile(&mut log, DayChange::wish("quiet lunch"), &base);
        reconciler.reconcile(&mut log, DayChange::preset(Some(ThematicPreset::Art)), &base);

        assert_eq!(log.records()[0].kind(), ChangeKind::AddWish);
        assert_eq!(
            log.records()[1].change(),
            &DayChange::preset(Some(ThematicPreset::Art))
        );
    }

    #[test]
    fn item_keyed_toggles() {
        let base = baseline();
        let reconciler = ChangeReconciler::new();
        let mut log = PendingChangeLog::new();
        let poi = PoiId::new("poi_1").unwrap();

        let mark = DayChange::replace_place(poi.clone(), None);
        assert_eq!(
            reconciler.reconcile(&mut log, mark.clone(), &base),
            ReconcileOutcome::Added
        );
        assert_eq!(reconciler.reconcile(&mut log, mark, &base), ReconcileOutcome::Removed);
        assert!(log.is_empty());
    }

    #[test]
    fn item_keyed_distinct_kinds_coexist() {
        let base = baseline();
        let reconciler = ChangeReconciler::new();
        let mut log = PendingChangeLog::new();
        let poi = PoiId::new("poi_1").unwrap();

        reconciler.reconcile(&mut log, DayChange::replace_place(poi.clone(), None), &base);
        reconciler.reconcile(&mut log, DayChange::remove_place(poi), &base);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn append_only_never_collapses() {
        let base = baseline();
        let reconciler = ChangeReconciler::new();
        let mut log = PendingChangeLog::new();

        reconciler.reconcile(&mut log, DayChange::wish("same"), &base);
        reconciler.reconcile(&mut log, DayChange::wish("same"), &base);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn supersede_replaces_keyed_record() {
        let base = baseline();
        let reconciler = ChangeReconciler::new();
        let mut log = PendingChangeLog::new();
        let poi = PoiId::new("poi_1").unwrap();
        let target = dayplan_model::PlaceId::new("place_2").unwrap();

        reconciler.reconcile(&mut log, DayChange::replace_place(poi.clone(), None), &base);
        let outcome =
            reconciler.supersede(&mut log, DayChange::replace_place(poi.clone(), Some(target.clone())));

        assert_eq!(outcome, ReconcileOutcome::Replaced);
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.records()[0].change(),
            &DayChange::replace_place(poi, Some(target))
        );
    }
}
