//! Server snapshot of one day's plan
//!
//! [`RemoteDayState`] is the baseline every editing session diffs against.
//! It is produced by a fetch and replaced wholesale by every successful
//! transaction; the client never patches it in place.

use crate::ids::PoiId;
use crate::place::PointOfInterest;
use crate::settings::{BudgetTier, DaySettings, Tempo, ThematicPreset};
use crate::time::TimeWindow;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Optimistic-concurrency token for a day resource
///
/// # Invariants
/// Only the server advances a revision. The client compares and echoes
/// revisions but never computes one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Revision(pub u64);

impl Revision {
    /// Raw counter value
    #[inline]
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Revision following this one
    ///
    /// Server-side only: backends call this when committing a transaction.
    #[inline]
    #[must_use]
    pub fn successor(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for Revision {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Derived read-only statistics for a day
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayMetrics {
    /// Walking distance between consecutive stops
    pub distance_meters: f64,
    /// Estimated steps
    pub step_estimate: u32,
    /// Number of stops
    pub poi_count: u32,
    /// Estimated walking time
    pub walking_minutes: u32,
}

/// Author of a wish thread message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WishRole {
    /// Written by the traveller
    User,
    /// Written by the planner
    Assistant,
}

/// One chat-style message of the wish thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishMessage {
    /// Author
    pub role: WishRole,
    /// Message body
    pub text: String,
}

impl WishMessage {
    /// User message
    #[inline]
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: WishRole::User,
            text: text.into(),
        }
    }

    /// Assistant message
    #[inline]
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: WishRole::Assistant,
            text: text.into(),
        }
    }
}

/// What the server currently believes about one day's plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDayState {
    /// Stops in itinerary order
    pub points_of_interest: Vec<PointOfInterest>,
    /// Pace
    pub tempo: Tempo,
    /// Planned start/end of the day
    pub time_window: TimeWindow,
    /// Spending level
    pub budget_tier: BudgetTier,
    /// Thematic bias, if any
    #[serde(default)]
    pub thematic_preset: Option<ThematicPreset>,
    /// Server-generated description of the day
    #[serde(default)]
    pub narrative_summary: String,
    /// Derived stats
    #[serde(default)]
    pub metrics: DayMetrics,
    /// Wish conversation
    #[serde(default)]
    pub wish_thread: Vec<WishMessage>,
    /// Concurrency token
    pub revision: Revision,
}

impl RemoteDayState {
    /// Settings triple covered by `update_settings`
    #[inline]
    #[must_use]
    pub fn settings(&self) -> DaySettings {
        DaySettings {
            tempo: self.tempo,
            time_window: self.time_window,
            budget: self.budget_tier,
        }
    }

    /// Look up a stop by id
    #[must_use]
    pub fn poi(&self, id: &PoiId) -> Option<&PointOfInterest> {
        self.points_of_interest.iter().find(|p| &p.id == id)
    }

    /// Whether a stop with this id exists
    #[inline]
    #[must_use]
    pub fn contains_poi(&self, id: &PoiId) -> bool {
        self.poi(id).is_some()
    }

    /// Itinerary position of a stop
    #[must_use]
    pub fn poi_position(&self, id: &PoiId) -> Option<usize> {
        self.points_of_interest.iter().position(|p| &p.id == id)
    }
}
