//! Pending change records
//!
//! [`DayChange`] is the closed set of edit intents. Its serde shape is the
//! transaction wire format: `{"type": "<kind>", "data": {...}}`.

use crate::policy::MergePolicy;
use dayplan_model::{
    BudgetTier, DaySettings, PlaceId, PlaceResult, PoiId, RemoteDayState, Tempo,
    ThematicPreset, TimeOfDay, TimeWindow,
};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use ulid::Ulid;

/// Opaque record identity
///
/// Sortable and unique per session. Never part of record equality and
/// never sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChangeId(pub Ulid);

impl ChangeId {
    /// Generate new change ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ChangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ChangeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Change kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Tempo, time window and budget together
    UpdateSettings,
    /// Thematic preset (or none)
    SetPreset,
    /// New stop
    AddPoi,
    /// Stop to be swapped for another place
    MarkReplacePoi,
    /// Stop to be dropped
    RemovePoi,
    /// Free-text wish
    AddWish,
}

impl ChangeKind {
    /// Wire tag
    #[must_use]
    pub fn wire_tag(&self) -> &'static str {
        match self {
            Self::UpdateSettings => "update_settings",
            Self::SetPreset => "set_preset",
            Self::AddPoi => "add_place",
            Self::MarkReplacePoi => "replace_place",
            Self::RemovePoi => "remove_place",
            Self::AddWish => "add_wish",
        }
    }
}

impl Display for ChangeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_tag())
    }
}

/// Payload of `update_settings`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsChange {
    /// Pace
    pub tempo: Tempo,
    /// Day start
    pub start_time: TimeOfDay,
    /// Day end
    pub end_time: TimeOfDay,
    /// Spending level
    pub budget: BudgetTier,
}

impl SettingsChange {
    /// Settings triple carried by this change
    #[inline]
    #[must_use]
    pub fn settings(&self) -> DaySettings {
        DaySettings {
            tempo: self.tempo,
            time_window: TimeWindow {
                start: self.start_time,
                end: self.end_time,
            },
            budget: self.budget,
        }
    }
}

impl From<DaySettings> for SettingsChange {
    fn from(settings: DaySettings) -> Self {
        Self {
            tempo: settings.tempo,
            start_time: settings.time_window.start,
            end_time: settings.time_window.end,
            budget: settings.budget,
        }
    }
}

/// Payload of `set_preset`; `None` clears the preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetChange {
    /// Preset to apply
    pub preset: Option<ThematicPreset>,
}

/// Where a newly added stop goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Placement {
    /// Server picks the position
    Auto,
    /// Into the time slot of an existing stop
    IntoSlot {
        /// Stop whose slot is taken over
        #[serde(rename = "poiId")]
        poi_id: PoiId,
    },
    /// At an explicit clock time
    AtTime {
        /// Visit start
        time: TimeOfDay,
    },
}

impl Placement {
    /// Existing stop this placement depends on
    #[inline]
    #[must_use]
    pub fn slot(&self) -> Option<&PoiId> {
        match self {
            Self::IntoSlot { poi_id } => Some(poi_id),
            Self::Auto | Self::AtTime { .. } => None,
        }
    }
}

/// Payload of `add_place`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPlaceChange {
    /// Place picked from search
    pub place: PlaceResult,
    /// Position directive
    pub placement: Placement,
}

/// Payload of `replace_place`; a null `to` lets the server choose
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacePlaceChange {
    /// Stop being replaced
    pub from: PoiId,
    /// Explicit replacement
    pub to: Option<PlaceId>,
}

/// Payload of `remove_place`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovePlaceChange {
    /// Stop being removed
    pub poi_id: PoiId,
}

/// Payload of `add_wish`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishChange {
    /// Wish text, trimmed
    pub text: String,
}

/// One edit intent, in wire shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DayChange {
    /// Tempo / time window / budget
    UpdateSettings(SettingsChange),
    /// Thematic preset
    SetPreset(PresetChange),
    /// New stop
    AddPlace(AddPlaceChange),
    /// Swap a stop
    ReplacePlace(ReplacePlaceChange),
    /// Drop a stop
    RemovePlace(RemovePlaceChange),
    /// Free-text wish
    AddWish(WishChange),
}

impl DayChange {
    /// Settings change from the current triple
    #[inline]
    #[must_use]
    pub fn settings(settings: DaySettings) -> Self {
        Self::UpdateSettings(settings.into())
    }

    /// Preset change
    #[inline]
    #[must_use]
    pub fn preset(preset: Option<ThematicPreset>) -> Self {
        Self::SetPreset(PresetChange { preset })
    }

    /// Add-place change
    #[inline]
    #[must_use]
    pub fn add_place(place: PlaceResult, placement: Placement) -> Self {
        Self::AddPlace(AddPlaceChange { place, placement })
    }

    /// Replace-place change
    #[inline]
    #[must_use]
    pub fn replace_place(from: PoiId, to: Option<PlaceId>) -> Self {
        Self::ReplacePlace(ReplacePlaceChange { from, to })
    }

    /// Remove-place change
    #[inline]
    #[must_use]
    pub fn remove_place(poi_id: PoiId) -> Self {
        Self::RemovePlace(RemovePlaceChange { poi_id })
    }

    /// Wish change
    #[inline]
    #[must_use]
    pub fn wish(text: impl Into<String>) -> Self {
        Self::AddWish(WishChange { text: text.into() })
    }

    /// Kind tag
    #[must_use]
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::UpdateSettings(_) => ChangeKind::UpdateSettings,
            Self::SetPreset(_) => ChangeKind::SetPreset,
            Self::AddPlace(_) => ChangeKind::AddPoi,
            Self::ReplacePlace(_) => ChangeKind::MarkReplacePoi,
            Self::RemovePlace(_) => ChangeKind::RemovePoi,
            Self::AddWish(_) => ChangeKind::AddWish,
        }
    }

    /// Merge policy for this change
    #[inline]
    #[must_use]
    pub fn policy(&self) -> MergePolicy {
        MergePolicy::for_kind(self.kind())
    }

    /// Stop id for item-keyed kinds
    #[must_use]
    pub fn item_key(&self) -> Option<&PoiId> {
        match self {
            Self::ReplacePlace(c) => Some(&c.from),
            Self::RemovePlace(c) => Some(&c.poi_id),
            Self::UpdateSettings(_) | Self::SetPreset(_) | Self::AddPlace(_) | Self::AddWish(_) => {
                None
            }
        }
    }

    /// Every existing stop this change refers to
    #[must_use]
    pub fn referenced_pois(&self) -> Vec<&PoiId> {
        match self {
            Self::ReplacePlace(c) => vec![&c.from],
            Self::RemovePlace(c) => vec![&c.poi_id],
            Self::AddPlace(c) => c.placement.slot().into_iter().collect(),
            Self::UpdateSettings(_) | Self::SetPreset(_) | Self::AddWish(_) => Vec::new(),
        }
    }

    /// Whether a current-value change restates the baseline
    ///
    /// Always false for item-keyed and append-only kinds.
    #[must_use]
    pub fn matches_baseline(&self, baseline: &RemoteDayState) -> bool {
        match self {
            Self::UpdateSettings(c) => c.settings() == baseline.settings(),
            Self::SetPreset(c) => c.preset == baseline.thematic_preset,
            Self::AddPlace(_) | Self::ReplacePlace(_) | Self::RemovePlace(_) | Self::AddWish(_) => {
                false
            }
        }
    }
}

/// Entry of the pending change log
///
/// Equality compares the change only; the id is identity for UI lists.
#[derive(Debug, Clone)]
pub struct PendingChangeRecord {
    id: ChangeId,
    change: DayChange,
}

impl PendingChangeRecord {
    /// Wrap a change with a fresh id
    #[inline]
    #[must_use]
    pub fn new(change: DayChange) -> Self {
        Self {
            id: ChangeId::new(),
            change,
        }
    }

    /// Record id
    #[inline]
    #[must_use]
    pub fn id(&self) -> ChangeId {
        self.id
    }

    /// The change
    #[inline]
    #[must_use]
    pub fn change(&self) -> &DayChange {
        &self.change
    }

    /// Kind tag
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ChangeKind {
        self.change.kind()
    }

    /// Swap the payload, keeping the id and log position
    #[inline]
    pub(crate) fn rewrite(&mut self, change: DayChange) {
        debug_assert_eq!(self.change.kind(), change.kind());
        self.change = change;
    }
}

impl PartialEq for PendingChangeRecord {
    fn eq(&self, other: &Self) -> bool {
        self.change == other.change
    }
}

impl Serialize for PendingChangeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.change.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dayplan_model::Coordinates;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn poi(id: &str) -> PoiId {
        PoiId::new(id).unwrap()
    }

    fn place() -> PlaceResult {
        PlaceResult {
            id: PlaceId::new("place_9").unwrap(),
            name: "Corner Cafe".to_string(),
            coordinates: Coordinates::new(38.71, -9.14),
            category: "cafe".to_string(),
            rating: None,
            price_tier: None,
            address: None,
            photo_ref: None,
            city: None,
        }
    }

    #[test]
    fn update_settings_wire_shape() {
        let change = DayChange::UpdateSettings(SettingsChange {
            tempo: Tempo::High,
            start_time: "08:00".parse().unwrap(),
            end_time: "18:00".parse().unwrap(),
            budget: BudgetTier::Medium,
        });

        assert_eq!(
            serde_json::to_value(&change).unwrap(),
            json!({
                "type": "update_settings",
                "data": {"tempo": "high", "startTime": "08:00", "endTime": "18:00", "budget": "medium"}
            })
        );
    }

    #[test]
    fn replace_place_with_auto_target_serializes_null() {
        let change = DayChange::replace_place(poi("poi_123"), None);
        assert_eq!(
            serde_json::to_value(&change).unwrap(),
            json!({"type": "replace_place", "data": {"from": "poi_123", "to": null}})
        );
    }

    #[test]
    fn preset_none_serializes_null() {
        let change = DayChange::preset(None);
        assert_eq!(
            serde_json::to_value(&change).unwrap(),
            json!({"type": "set_preset", "data": {"preset": null}})
        );
    }

    #[test]
    fn add_place_placement_shapes() {
        let slot = DayChange::add_place(place(), Placement::IntoSlot { poi_id: poi("poi_2") });
        let value = serde_json::to_value(&slot).unwrap();
        assert_eq!(value["type"], "add_place");
        assert_eq!(value["data"]["placement"], json!({"mode": "into_slot", "poiId": "poi_2"}));

        let timed = Placement::AtTime {
            time: "14:30".parse().unwrap(),
        };
        assert_eq!(
            serde_json::to_value(&timed).unwrap(),
            json!({"mode": "at_time", "time": "14:30"})
        );
        assert_eq!(serde_json::to_value(Placement::Auto).unwrap(), json!({"mode": "auto"}));
    }

    #[test]
    fn wire_tags_match_serde_tags() {
        let changes = vec![
            DayChange::preset(Some(ThematicPreset::Art)),
            DayChange::add_place(place(), Placement::Auto),
            DayChange::replace_place(poi("a"), None),
            DayChange::remove_place(poi("a")),
            DayChange::wish("more cafes"),
        ];
        for change in changes {
            let value = serde_json::to_value(&change).unwrap();
            assert_eq!(value["type"], change.kind().wire_tag());
        }
    }

    #[test]
    fn record_equality_ignores_id() {
        let a = PendingChangeRecord::new(DayChange::wish("x"));
        let b = PendingChangeRecord::new(DayChange::wish("x"));
        assert_ne!(a.id(), b.id());
        assert_eq!(a, b);
    }

    #[test]
    fn record_serializes_as_bare_change() {
        let record = PendingChangeRecord::new(DayChange::remove_place(poi("poi_1")));
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"type": "remove_place", "data": {"poiId": "poi_1"}})
        );
    }

    #[test]
    fn item_keys_and_references() {
        assert_eq!(DayChange::remove_place(poi("p")).item_key(), Some(&poi("p")));
        assert_eq!(DayChange::wish("w").item_key(), None);

        let slot = DayChange::add_place(place(), Placement::IntoSlot { poi_id: poi("s") });
        assert_eq!(slot.item_key(), None);
        assert_eq!(slot.referenced_pois(), vec![&poi("s")]);
    }
}
