//! Testing utilities for the day plan workspace
//!
//! Shared fixtures and a scriptable backend.

#![allow(missing_docs)]

use async_trait::async_trait;
use dayplan_changes::TransactionRequest;
use dayplan_model::{
    BudgetTier, Coordinates, DayId, DayKey, PlaceId, PlaceResult, PoiId, PointOfInterest,
    RemoteDayState, Revision, Tempo, TimeWindow, TripId,
};
use dayplan_session::{
    derive_metrics, BackendError, DayBackend, DayEditingSession, InMemoryDayBackend, PlaceQuery,
    SessionBuilder, SessionConfig, TransactionError,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub const CITY: &str = "Barcelona";

pub fn day_key() -> DayKey {
    day_key_at(0)
}

pub fn day_key_at(index: u32) -> DayKey {
    DayKey::new(
        TripId::new("trip_1").unwrap(),
        DayId::new(format!("day_{}", index + 1)).unwrap(),
        index,
    )
}

pub fn poi_id(raw: &str) -> PoiId {
    PoiId::new(raw).unwrap()
}

pub fn stop(id: &str, name: &str, category: &str, lat: f64, lng: f64, window: (&str, &str)) -> PointOfInterest {
    PointOfInterest {
        id: poi_id(id),
        name: name.to_string(),
        coordinates: Coordinates::new(lat, lng),
        time_window: Some(TimeWindow::parse(window.0, window.1).unwrap()),
        category: category.to_string(),
        rating: Some(4.5),
        price_tier: Some(2),
        photo_ref: None,
        address: None,
    }
}

/// Baseline day: medium tempo and budget, 09:00-18:00, three stops, revision 5
pub fn baseline_day() -> RemoteDayState {
    let points_of_interest = vec![
        stop("poi_1", "Sagrada Familia", "architecture", 41.4036, 2.1744, ("09:00", "11:00")),
        stop("poi_2", "Museu Picasso", "museum", 41.3853, 2.1809, ("11:30", "13:00")),
        stop("poi_3", "Cafe de l'Opera", "cafe", 41.3816, 2.1732, ("13:15", "14:00")),
    ];
    let metrics = derive_metrics(&points_of_interest);
    RemoteDayState {
        points_of_interest,
        tempo: Tempo::Medium,
        time_window: TimeWindow::parse("09:00", "18:00").unwrap(),
        budget_tier: BudgetTier::Medium,
        thematic_preset: None,
        narrative_summary: "A medium day in Barcelona.".to_string(),
        metrics,
        wish_thread: Vec::new(),
        revision: Revision(5),
    }
}

pub fn place(id: &str, name: &str, category: &str, lat: f64, lng: f64) -> PlaceResult {
    PlaceResult {
        id: PlaceId::new(id).unwrap(),
        name: name.to_string(),
        coordinates: Coordinates::new(lat, lng),
        category: category.to_string(),
        rating: Some(4.2),
        price_tier: Some(2),
        address: None,
        photo_ref: None,
        city: Some(CITY.to_string()),
    }
}

pub fn place_catalog() -> Vec<PlaceResult> {
    vec![
        place("place_satan", "Satan's Coffee Corner", "cafe", 41.3822, 2.1770),
        place("place_nomad", "Nomad Coffee Lab", "cafe", 41.3880, 2.1780),
        place("place_mnac", "MNAC", "museum", 41.3685, 2.1534),
        place("place_macba", "MACBA", "museum", 41.3833, 2.1667),
        place("place_pedrera", "Casa Mila", "architecture", 41.3953, 2.1619),
        place("place_boqueria", "La Boqueria", "market", 41.3817, 2.1716),
    ]
}

/// In-memory backend holding [`baseline_day`] under [`day_key`]
pub fn memory_backend() -> Arc<InMemoryDayBackend> {
    let backend = InMemoryDayBackend::new().with_catalog(place_catalog());
    backend.insert_day(&day_key(), baseline_day());
    Arc::new(backend)
}

pub fn open_session(backend: Arc<dyn DayBackend>) -> DayEditingSession {
    SessionBuilder::new(day_key(), backend)
        .with_config(SessionConfig::new().with_city_scope(CITY))
        .open()
        .unwrap()
}

/// Session that has already loaded [`baseline_day`]
pub async fn loaded_session(backend: Arc<dyn DayBackend>) -> DayEditingSession {
    let session = open_session(backend);
    session.load().await.unwrap();
    session
}

/// Backend wrapper that injects failures and holds requests in flight
///
/// Queued failures are consumed one per call. Holds block the next call
/// until released.
#[derive(Default)]
pub struct ScriptedBackend {
    inner: Arc<InMemoryDayBackend>,
    fetch_failures: Mutex<VecDeque<BackendError>>,
    fetch_overrides: Mutex<VecDeque<RemoteDayState>>,
    apply_failures: Mutex<VecDeque<TransactionError>>,
    apply_responses: Mutex<VecDeque<RemoteDayState>>,
    search_failures: Mutex<VecDeque<BackendError>>,
    fetch_hold: Mutex<Option<Arc<Notify>>>,
    apply_hold: Mutex<Option<Arc<Notify>>>,
    search_holds: Mutex<HashMap<String, Arc<Notify>>>,
    apply_started: Notify,
    fetch_calls: AtomicUsize,
    apply_calls: AtomicUsize,
    search_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(inner: Arc<InMemoryDayBackend>) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn inner(&self) -> &InMemoryDayBackend {
        &self.inner
    }

    pub fn fail_next_fetch(&self, err: BackendError) {
        self.fetch_failures.lock().push_back(err);
    }

    /// Answer the next fetch with `day` instead of the stored one
    pub fn respond_next_fetch(&self, day: RemoteDayState) {
        self.fetch_overrides.lock().push_back(day);
    }

    pub fn fail_next_apply(&self, err: TransactionError) {
        self.apply_failures.lock().push_back(err);
    }

    /// Answer the next apply with `day` without committing anything
    pub fn respond_next_apply(&self, day: RemoteDayState) {
        self.apply_responses.lock().push_back(day);
    }

    pub fn fail_next_search(&self, err: BackendError) {
        self.search_failures.lock().push_back(err);
    }

    /// Block the next fetch until the returned handle is notified
    pub fn hold_next_fetch(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.fetch_hold.lock() = Some(Arc::clone(&notify));
        notify
    }

    /// Block the next apply until the returned handle is notified
    pub fn hold_next_apply(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.apply_hold.lock() = Some(Arc::clone(&notify));
        notify
    }

    /// Block searches for `query` until the returned handle is notified
    pub fn hold_search(&self, query: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.search_holds
            .lock()
            .insert(query.to_string(), Arc::clone(&notify));
        notify
    }

    /// Resolves once an apply call has reached the backend
    pub async fn apply_started(&self) {
        self.apply_started.notified().await;
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn apply_calls(&self) -> usize {
        self.apply_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DayBackend for ScriptedBackend {
    async fn fetch_day(&self, key: &DayKey) -> Result<RemoteDayState, BackendError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let hold = self.fetch_hold.lock().take();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        if let Some(err) = self.fetch_failures.lock().pop_front() {
            return Err(err);
        }
        if let Some(day) = self.fetch_overrides.lock().pop_front() {
            return Ok(day);
        }
        self.inner.fetch_day(key).await
    }

    async fn apply_transaction(
        &self,
        key: &DayKey,
        request: &TransactionRequest,
    ) -> Result<RemoteDayState, TransactionError> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        self.apply_started.notify_one();
        let hold = self.apply_hold.lock().take();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        if let Some(err) = self.apply_failures.lock().pop_front() {
            return Err(err);
        }
        if let Some(day) = self.apply_responses.lock().pop_front() {
            return Ok(day);
        }
        self.inner.apply_transaction(key, request).await
    }

    async fn search_places(&self, query: &PlaceQuery) -> Result<Vec<PlaceResult>, BackendError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let hold = self.search_holds.lock().remove(&query.text);
        if let Some(hold) = hold {
            hold.notified().await;
        }
        if let Some(err) = self.search_failures.lock().pop_front() {
            return Err(err);
        }
        self.inner.search_places(query).await
    }
}
