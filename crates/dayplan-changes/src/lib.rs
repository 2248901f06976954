//! Day Plan Changes
//!
//! Pending edits for one trip day, kept minimal relative to a baseline.
//!
//! # Core Concepts
//!
//! - [`DayChange`]: One user intent, in wire form
//! - [`MergePolicy`]: How repeated intents of one kind collapse
//! - [`PendingChangeLog`]: Ordered intents not yet applied
//! - [`ChangeReconciler`]: Applies merge policies to the log
//! - [`LocalEditBuffer`]: Draft values shown to the user
//! - [`EditDraft`]: Baseline, buffer and log edited as one unit
//! - [`TransactionRequest`]: The log submitted against a revision
//!
//! # Example
//!
//! ```rust,ignore
//! use dayplan_changes::EditDraft;
//! use dayplan_model::Tempo;
//!
//! let mut draft = EditDraft::new(baseline);
//! draft.update_tempo(Tempo::High);
//! draft.update_tempo(Tempo::Medium);
//! assert!(!draft.has_changes());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod buffer;
mod change;
mod draft;
mod error;
mod log;
mod policy;
mod reconciler;
mod transaction;

// Re-exports
pub use buffer::LocalEditBuffer;
pub use change::{
    AddPlaceChange, ChangeId, ChangeKind, DayChange, PendingChangeRecord, Placement,
    PresetChange, RemovePlaceChange, ReplacePlaceChange, SettingsChange, WishChange,
};
pub use draft::{EditDraft, RebaseReport};
pub use error::PreconditionError;
pub use log::PendingChangeLog;
pub use policy::MergePolicy;
pub use reconciler::{ChangeReconciler, ReconcileOutcome};
pub use transaction::TransactionRequest;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use dayplan_model::{
        BudgetTier, Coordinates, DayMetrics, PlaceId, PlaceResult, PoiId, PointOfInterest,
        RemoteDayState, Revision, Tempo, ThematicPreset, TimeOfDay, TimeWindow,
    };
    use proptest::prelude::*;

    const STOPS: [&str; 3] = ["poi_1", "poi_2", "poi_3"];

    fn baseline() -> RemoteDayState {
        RemoteDayState {
            points_of_interest: STOPS
                .iter()
                .map(|id| PointOfInterest {
                    id: PoiId::new(*id).unwrap(),
                    name: (*id).to_string(),
                    coordinates: Coordinates::new(41.39, 2.17),
                    time_window: None,
                    category: "sight".to_string(),
                    rating: None,
                    price_tier: None,
                    photo_ref: None,
                    address: None,
                })
                .collect(),
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

    /// Edit operations a user can perform
    #[derive(Debug, Clone)]
    enum Edit {
        Tempo(Tempo),
        Budget(BudgetTier),
        Window(u32, u32),
        Preset(Option<ThematicPreset>),
        Wish(String),
        AddPlace(usize),
        Mark(usize),
        Remove(usize),
    }

    fn tempo() -> impl Strategy<Value = Tempo> {
        prop_oneof![Just(Tempo::Low), Just(Tempo::Medium), Just(Tempo::High)]
    }

    fn budget() -> impl Strategy<Value = BudgetTier> {
        prop_oneof![
            Just(BudgetTier::Low),
            Just(BudgetTier::Medium),
            Just(BudgetTier::High)
        ]
    }

    fn preset() -> impl Strategy<Value = Option<ThematicPreset>> {
        prop::option::of(prop::sample::select(ThematicPreset::ALL.to_vec()))
    }

    fn edit() -> impl Strategy<Value = Edit> {
        prop_oneof![
            tempo().prop_map(Edit::Tempo),
            budget().prop_map(Edit::Budget),
            (6u32..12, 13u32..23).prop_map(|(s, e)| Edit::Window(s, e)),
            preset().prop_map(Edit::Preset),
            "[a-z]{1,12}".prop_map(Edit::Wish),
            (0..STOPS.len()).prop_map(Edit::AddPlace),
            (0..STOPS.len()).prop_map(Edit::Mark),
            (0..STOPS.len()).prop_map(Edit::Remove),
        ]
    }

    fn apply(draft: &mut EditDraft, edit: &Edit) {
        let poi = |i: usize| PoiId::new(STOPS[i]).unwrap();
        match edit {
            Edit::Tempo(t) => {
                draft.update_tempo(*t);
            }
            Edit::Budget(b) => {
                draft.update_budget(*b);
            }
            Edit::Window(s, e) => {
                draft
                    .update_time_window(
                        TimeOfDay::from_hm(*s, 0).unwrap(),
                        TimeOfDay::from_hm(*e, 0).unwrap(),
                    )
                    .unwrap();
            }
            Edit::Preset(p) => {
                draft.select_preset(*p);
            }
            Edit::Wish(text) => {
                draft.add_wish(text, 500).unwrap();
            }
            Edit::AddPlace(i) => {
                let place = PlaceResult {
                    id: PlaceId::new(format!("place_{i}")).unwrap(),
                    name: "Cafe".to_string(),
                    coordinates: Coordinates::new(41.39, 2.17),
                    category: "cafe".to_string(),
                    rating: None,
                    price_tier: None,
                    address: None,
                    photo_ref: None,
                    city: None,
                };
                draft
                    .add_place(place, Placement::IntoSlot { poi_id: poi(*i) })
                    .unwrap();
            }
            Edit::Mark(i) => {
                draft.mark_for_replacement(&poi(*i)).unwrap();
            }
            Edit::Remove(i) => {
                draft.remove_place(&poi(*i)).unwrap();
            }
        }
    }

    proptest! {
        #[test]
        fn at_most_one_record_per_current_value_kind(edits in prop::collection::vec(edit(), 0..40)) {
            let mut draft = EditDraft::new(baseline());
            for e in &edits {
                apply(&mut draft, e);
            }
            prop_assert!(draft.log().count_kind(ChangeKind::UpdateSettings) <= 1);
            prop_assert!(draft.log().count_kind(ChangeKind::SetPreset) <= 1);
        }

        #[test]
        fn current_value_records_never_restate_baseline(edits in prop::collection::vec(edit(), 0..40)) {
            let base = baseline();
            let mut draft = EditDraft::new(base.clone());
            for e in &edits {
                apply(&mut draft, e);
            }
            for record in draft.log().records() {
                if record.change().policy() == MergePolicy::CurrentValue {
                    prop_assert!(!record.change().matches_baseline(&base));
                }
            }
        }

        #[test]
        fn keyed_records_unique_per_stop(edits in prop::collection::vec(edit(), 0..40)) {
            let mut draft = EditDraft::new(baseline());
            for e in &edits {
                apply(&mut draft, e);
            }
            for kind in [ChangeKind::MarkReplacePoi, ChangeKind::RemovePoi] {
                for id in STOPS {
                    let poi = PoiId::new(id).unwrap();
                    let n = draft
                        .log()
                        .records()
                        .iter()
                        .filter(|r| r.kind() == kind && r.change().item_key() == Some(&poi))
                        .count();
                    prop_assert!(n <= 1);
                }
            }
        }

        #[test]
        fn marked_set_matches_replace_records(edits in prop::collection::vec(edit(), 0..40)) {
            let mut draft = EditDraft::new(baseline());
            for e in &edits {
                apply(&mut draft, e);
            }
            for id in STOPS {
                let poi = PoiId::new(id).unwrap();
                prop_assert_eq!(
                    draft.buffer().is_marked(&poi),
                    draft.log().contains_keyed(ChangeKind::MarkReplacePoi, &poi)
                );
            }
        }

        #[test]
        fn settings_round_trip_is_idempotent(t in tempo(), b in budget()) {
            let base = baseline();
            let mut draft = EditDraft::new(base.clone());
            draft.update_tempo(t);
            draft.update_budget(b);
            draft.update_tempo(base.tempo);
            draft.update_budget(base.budget_tier);
            prop_assert!(!draft.has_changes());
        }

        #[test]
        fn preset_double_select_is_clean(p in prop::sample::select(ThematicPreset::ALL.to_vec())) {
            let mut draft = EditDraft::new(baseline());
            draft.select_preset(Some(p));
            draft.select_preset(Some(p));
            prop_assert!(!draft.has_changes());
        }

        #[test]
        fn append_only_edits_never_collapse(texts in prop::collection::vec("[a-z]{1,8}", 1..10)) {
            let mut draft = EditDraft::new(baseline());
            for text in &texts {
                draft.add_wish(text, 500).unwrap();
            }
            prop_assert_eq!(draft.dirty_count(), texts.len());
        }

        #[test]
        fn reset_restores_baseline(edits in prop::collection::vec(edit(), 0..40)) {
            let mut draft = EditDraft::new(baseline());
            for e in &edits {
                apply(&mut draft, e);
            }
            draft.reset();
            prop_assert!(draft.buffer().mirrors(draft.baseline()));
            prop_assert_eq!(draft.dirty_count(), 0);
        }
    }
}
