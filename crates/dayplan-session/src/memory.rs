//! In-memory day backend
//!
//! Behaves like the server: enforces the revision check, applies every
//! change kind atomically, re-derives metrics and the narrative, and
//! advances the revision. Backs the offline CLI and the tests.

use crate::backend::{DayBackend, PlaceQuery};
use crate::error::{BackendError, TransactionError};
use async_trait::async_trait;
use dashmap::DashMap;
use dayplan_changes::{DayChange, Placement, TransactionRequest};
use dayplan_model::{
    DayId, DayKey, DayMetrics, PlaceResult, PoiId, PointOfInterest, RemoteDayState, TimeOfDay,
    TimeWindow, TripId, WishMessage,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Average stride length
const STRIDE_M: f64 = 0.75;
/// Walking speed, 4.8 km/h
const WALK_M_PER_MIN: f64 = 80.0;
/// Visit length for stops placed at an explicit time
const VISIT_MINUTES: u32 = 60;

/// Day store with server semantics
#[derive(Debug, Default)]
pub struct InMemoryDayBackend {
    days: DashMap<(TripId, DayId), RemoteDayState>,
    catalog: RwLock<Vec<PlaceResult>>,
    next_poi: AtomicU64,
}

impl InMemoryDayBackend {
    /// Create empty backend
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With place catalog for search and automatic replacement
    #[must_use]
    pub fn with_catalog(self, catalog: Vec<PlaceResult>) -> Self {
        *self.catalog.write() = catalog;
        self
    }

    /// Store a day as-is
    pub fn insert_day(&self, key: &DayKey, day: RemoteDayState) {
        self.days.insert(storage_key(key), day);
    }

    /// Current state of a day
    #[must_use]
    pub fn day(&self, key: &DayKey) -> Option<RemoteDayState> {
        self.days.get(&storage_key(key)).map(|day| day.clone())
    }

    /// Modify a day as another writer would, advancing its revision
    ///
    /// Returns false if the day does not exist.
    pub fn update_day(&self, key: &DayKey, edit: impl FnOnce(&mut RemoteDayState)) -> bool {
        let Some(mut day) = self.days.get_mut(&storage_key(key)) else {
            return false;
        };
        edit(&mut day);
        refresh_derived(&mut day);
        day.revision = day.revision.successor();
        true
    }

    fn commit(
        &self,
        mut day: RemoteDayState,
        changes: &[DayChange],
    ) -> Result<RemoteDayState, BackendError> {
        let catalog = self.catalog.read();
        for change in changes {
            match change {
                DayChange::UpdateSettings(settings) => {
                    let settings = settings.settings();
                    TimeWindow::new(settings.time_window.start, settings.time_window.end)
                        .map_err(|e| BackendError::Rejected(e.to_string()))?;
                    day.tempo = settings.tempo;
                    day.time_window = settings.time_window;
                    day.budget_tier = settings.budget;
                }
                DayChange::SetPreset(preset) => day.thematic_preset = preset.preset,
                DayChange::AddPlace(add) => {
                    let mut stop = self.stop_from(&add.place)?;
                    let position = match &add.placement {
                        Placement::Auto => day.points_of_interest.len(),
                        Placement::IntoSlot { poi_id } => {
                            let position = position_of(&day, poi_id)?;
                            stop.time_window = day.points_of_interest[position].time_window;
                            position
                        }
                        Placement::AtTime { time } => {
                            stop.time_window = visit_window(*time);
                            day.points_of_interest
                                .iter()
                                .position(|p| p.time_window.is_some_and(|w| w.start > *time))
                                .unwrap_or(day.points_of_interest.len())
                        }
                    };
                    day.points_of_interest.insert(position, stop);
                }
                DayChange::ReplacePlace(replace) => {
                    let position = position_of(&day, &replace.from)?;
                    let current = &day.points_of_interest[position];
                    let target = match &replace.to {
                        Some(id) => catalog.iter().find(|p| &p.id == id).ok_or_else(|| {
                            BackendError::Rejected(format!("unknown place {id}"))
                        })?,
                        None => pick_replacement(&catalog, &day, current).ok_or_else(|| {
                            BackendError::Rejected(format!("no replacement for {}", current.id))
                        })?,
                    };
                    let mut stop = self.stop_from(target)?;
                    stop.time_window = current.time_window;
                    day.points_of_interest[position] = stop;
                }
                DayChange::RemovePlace(remove) => {
                    let position = position_of(&day, &remove.poi_id)?;
                    day.points_of_interest.remove(position);
                }
                DayChange::AddWish(wish) => {
                    day.wish_thread.push(WishMessage::user(wish.text.clone()));
                    day.wish_thread
                        .push(WishMessage::assistant(format!("Noted: {}", wish.text)));
                }
            }
        }

        refresh_derived(&mut day);
        day.revision = day.revision.successor();
        Ok(day)
    }

    fn stop_from(&self, place: &PlaceResult) -> Result<PointOfInterest, BackendError> {
        let n = self.next_poi.fetch_add(1, Ordering::Relaxed) + 1;
        let id = PoiId::new(format!("{}-{n}", place.id))
            .map_err(|e| BackendError::Rejected(e.to_string()))?;
        Ok(PointOfInterest {
            id,
            name: place.name.clone(),
            coordinates: place.coordinates,
            time_window: None,
            category: place.category.clone(),
            rating: place.rating,
            price_tier: place.price_tier,
            photo_ref: place.photo_ref.clone(),
            address: place.address.clone(),
        })
    }
}

fn storage_key(key: &DayKey) -> (TripId, DayId) {
    (key.trip_id.clone(), key.day_id.clone())
}

fn position_of(day: &RemoteDayState, poi: &PoiId) -> Result<usize, BackendError> {
    day.poi_position(poi)
        .ok_or_else(|| BackendError::Rejected(format!("unknown point of interest {poi}")))
}

fn visit_window(start: TimeOfDay) -> Option<TimeWindow> {
    let end_minutes = (start.minutes_since_midnight() + VISIT_MINUTES).min(23 * 60 + 59);
    let end = TimeOfDay::from_hm(end_minutes / 60, end_minutes % 60).ok()?;
    TimeWindow::new(start, end).ok()
}

/// Same category first, then anything not already on the day
fn pick_replacement<'a>(
    catalog: &'a [PlaceResult],
    day: &RemoteDayState,
    current: &PointOfInterest,
) -> Option<&'a PlaceResult> {
    let unused = |p: &&PlaceResult| {
        p.name != current.name && !day.points_of_interest.iter().any(|s| s.name == p.name)
    };
    catalog
        .iter()
        .filter(unused)
        .find(|p| p.category == current.category)
        .or_else(|| catalog.iter().find(unused))
}

fn refresh_derived(day: &mut RemoteDayState) {
    day.metrics = derive_metrics(&day.points_of_interest);
    day.narrative_summary = narrative(day);
}

/// Walking stats along the stops in order
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn derive_metrics(stops: &[PointOfInterest]) -> DayMetrics {
    let distance: f64 = stops
        .windows(2)
        .map(|pair| pair[0].coordinates.distance_meters(&pair[1].coordinates))
        .sum();

    DayMetrics {
        distance_meters: distance.round(),
        step_estimate: (distance / STRIDE_M).round() as u32,
        poi_count: u32::try_from(stops.len()).unwrap_or(u32::MAX),
        walking_minutes: (distance / WALK_M_PER_MIN).ceil() as u32,
    }
}

fn narrative(day: &RemoteDayState) -> String {
    let names: Vec<&str> = day.points_of_interest.iter().map(|p| p.name.as_str()).collect();
    let theme = day
        .thematic_preset
        .map(|p| format!(" with a {p} focus"))
        .unwrap_or_default();
    if names.is_empty() {
        return format!("A {} day{theme} with nothing planned yet.", day.tempo);
    }
    format!(
        "A {} day{theme}, {} to {}: {}.",
        day.tempo,
        day.time_window.start,
        day.time_window.end,
        names.join(", ")
    )
}

#[async_trait]
impl DayBackend for InMemoryDayBackend {
    async fn fetch_day(&self, key: &DayKey) -> Result<RemoteDayState, BackendError> {
        self.day(key)
            .ok_or_else(|| BackendError::NotFound(key.to_string()))
    }

    async fn apply_transaction(
        &self,
        key: &DayKey,
        request: &TransactionRequest,
    ) -> Result<RemoteDayState, TransactionError> {
        let mut entry = self
            .days
            .get_mut(&storage_key(key))
            .ok_or_else(|| BackendError::NotFound(key.to_string()))?;

        if entry.revision != request.base_revision {
            tracing::warn!(
                day = %key,
                base = %request.base_revision,
                current = %entry.revision,
                "rejecting stale transaction"
            );
            return Err(TransactionError::Conflict {
                current_revision: Some(entry.revision),
            });
        }

        let committed = self.commit(entry.clone(), &request.changes)?;
        *entry = committed.clone();
        tracing::debug!(day = %key, revision = %committed.revision, "transaction committed");
        Ok(committed)
    }

    async fn search_places(&self, query: &PlaceQuery) -> Result<Vec<PlaceResult>, BackendError> {
        let needle = query.text.to_lowercase();
        let catalog = self.catalog.read();
        Ok(catalog
            .iter()
            .filter(|p| {
                query.city_scope.as_deref().map_or(true, |city| {
                    p.city.as_deref().map_or(true, |c| c.eq_ignore_ascii_case(city))
                })
            })
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.category.to_lowercase().contains(&needle)
            })
            .take(query.limit)
            .cloned()
            .collect())
    }
}
