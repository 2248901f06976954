//! Day editing session
//!
//! One session edits one day. All draft mutations run to completion under
//! a short lock and never suspend; the only suspension points are the
//! three network calls (load, apply, search), and no lock is held across
//! them.
//!
//! # Apply
//!
//! Apply is single-flight. While it runs the draft is frozen: edits, reset
//! and load are refused with [`SessionError::ApplyInFlight`], so the
//! baseline installed on success never discards an edit that was not
//! submitted, and a failure leaves baseline, buffer and log exactly as
//! they were.
//!
//! # Close
//!
//! [`DayEditingSession::close`] cancels searches only. An apply started
//! with [`DayEditingSession::spawn_apply`] keeps running and installs its
//! result into the shared state even if nobody is watching any more.

use crate::backend::{AuthGate, AllowAll, DayBackend, PlaceQuery};
use crate::config::SessionConfig;
use crate::error::{
    ApplyError, FailureKind, LoadError, SessionError, SessionFailure, TransactionError,
};
use crate::phase::{validate_transition, PhaseError, SessionPhase};
use crate::search::SearchState;
use crate::status::SessionStatus;
use dayplan_changes::{
    EditDraft, LocalEditBuffer, PendingChangeRecord, Placement, PreconditionError, RebaseReport,
    ReconcileOutcome, TransactionRequest,
};
use dayplan_model::{
    BudgetTier, DayKey, PlaceResult, PoiId, RemoteDayState, Revision, Tempo, ThematicPreset,
    TimeOfDay,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Result of [`DayEditingSession::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// Transaction committed and the returned day installed
    Applied {
        /// New baseline revision
        revision: Revision,
        /// Number of changes submitted
        changes: usize,
    },
    /// Log was empty; nothing was sent
    NothingToApply,
}

/// Result of [`DayEditingSession::load`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    /// Installed baseline revision
    pub revision: Revision,
    /// Present when an existing draft was moved onto the fetched day
    pub rebase: Option<RebaseReport>,
}

/// Result of [`DayEditingSession::search_places`]
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Results installed (empty on failure)
    Completed(Vec<PlaceResult>),
    /// Query too short; results cleared without a request
    Skipped,
    /// A newer query or a close overtook this one
    Discarded,
}

/// Builds a session after consulting the auth gate
pub struct SessionBuilder {
    key: DayKey,
    backend: Arc<dyn DayBackend>,
    auth_gate: Arc<dyn AuthGate>,
    config: SessionConfig,
}

impl SessionBuilder {
    /// Start building a session for `key`
    #[must_use]
    pub fn new(key: DayKey, backend: Arc<dyn DayBackend>) -> Self {
        Self {
            key,
            backend,
            auth_gate: Arc::new(AllowAll),
            config: SessionConfig::default(),
        }
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// With auth gate
    #[inline]
    #[must_use]
    pub fn with_auth_gate(mut self, gate: Arc<dyn AuthGate>) -> Self {
        self.auth_gate = gate;
        self
    }

    /// Create the session
    ///
    /// # Errors
    /// Returns [`SessionError::NotPermitted`] if the gate refuses the day,
    /// or [`SessionError::Config`] for an invalid configuration
    pub fn open(self) -> Result<DayEditingSession, SessionError> {
        self.config.validate()?;
        if !self.auth_gate.can_edit(&self.key) {
            tracing::warn!(day = %self.key, index = self.key.day_index, "editing not permitted");
            return Err(SessionError::NotPermitted(self.key));
        }

        let (status, _) = watch::channel(SessionStatus::idle());
        tracing::debug!(day = %self.key, "session opened");
        Ok(DayEditingSession {
            shared: Arc::new(Shared {
                key: self.key,
                config: self.config,
                backend: self.backend,
                state: Mutex::new(SessionState::default()),
                status,
            }),
        })
    }
}

#[derive(Debug, Default)]
struct SessionState {
    phase: SessionPhase,
    draft: Option<EditDraft>,
    search: SearchState,
    last_error: Option<SessionFailure>,
    load_generation: u64,
    closed: bool,
}

impl SessionState {
    fn transition(&mut self, to: SessionPhase) -> Result<(), PhaseError> {
        validate_transition(self.phase, to)?;
        self.phase = to;
        Ok(())
    }

    fn draft_mut(&mut self) -> Result<&mut EditDraft, SessionError> {
        if self.phase == SessionPhase::Applying {
            return Err(SessionError::ApplyInFlight);
        }
        self.draft.as_mut().ok_or(SessionError::NotReady)
    }

    fn status(&self) -> SessionStatus {
        SessionStatus {
            phase: self.phase,
            revision: self.draft.as_ref().map(EditDraft::base_revision),
            dirty_count: self.draft.as_ref().map_or(0, EditDraft::dirty_count),
            has_changes: self.draft.as_ref().is_some_and(EditDraft::has_changes),
            is_loading: self.phase == SessionPhase::Loading,
            is_applying: self.phase == SessionPhase::Applying,
            is_searching: self.search.in_flight(),
            last_error: self.last_error.clone(),
        }
    }
}

struct Shared {
    key: DayKey,
    config: SessionConfig,
    backend: Arc<dyn DayBackend>,
    state: Mutex<SessionState>,
    status: watch::Sender<SessionStatus>,
}

impl Shared {
    fn publish(&self, state: &SessionState) {
        self.status.send_replace(state.status());
    }
}

/// Returns the phase to `Ready` if an apply future is dropped mid-flight
struct ApplyGuard<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl Drop for ApplyGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.shared.state.lock();
        if state.phase == SessionPhase::Applying {
            state.phase = SessionPhase::Ready;
        }
        self.shared.publish(&state);
        tracing::warn!(day = %self.shared.key, "apply dropped before the backend answered");
    }
}

/// Editing session for one day
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct DayEditingSession {
    shared: Arc<Shared>,
}

impl fmt::Debug for DayEditingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DayEditingSession")
            .field("key", &self.shared.key)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl DayEditingSession {
    /// Day being edited
    #[inline]
    #[must_use]
    pub fn key(&self) -> &DayKey {
        &self.shared.key
    }

    /// Session configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Fetch the day and install it as the baseline
    ///
    /// On a session that already holds a draft this is a refresh: pending
    /// edits are rebased onto the fetched day. Only the most recent load
    /// may install its response.
    ///
    /// # Errors
    /// Returns [`SessionError::Load`] on fetch failure, for a response
    /// older than the installed baseline, or when superseded by a newer
    /// load; [`SessionError::ApplyInFlight`] while applying
    pub async fn load(&self) -> Result<LoadOutcome, SessionError> {
        let shared = &*self.shared;
        let generation = {
            let mut state = shared.state.lock();
            if state.phase == SessionPhase::Applying {
                return Err(SessionError::ApplyInFlight);
            }
            if state.phase != SessionPhase::Loading {
                state.transition(SessionPhase::Loading)?;
            }
            state.load_generation += 1;
            shared.publish(&state);
            state.load_generation
        };

        tracing::debug!(day = %shared.key, generation, "loading day");
        let result = shared.backend.fetch_day(&shared.key).await;

        let mut guard = shared.state.lock();
        let state = &mut *guard;
        if state.load_generation != generation {
            tracing::warn!(day = %shared.key, generation, "discarding superseded load");
            return Err(LoadError::Superseded.into());
        }

        let fetched = match result {
            Ok(day) => day,
            Err(err) => return Err(self.fail_load(state, err.into())),
        };
        if let Some(draft) = state.draft.as_ref() {
            if fetched.revision < draft.base_revision() {
                let err = LoadError::StaleRevision {
                    installed: draft.base_revision(),
                    fetched: fetched.revision,
                };
                return Err(self.fail_load(state, err));
            }
        }

        let revision = fetched.revision;
        let rebase = if let Some(draft) = state.draft.as_mut() {
            Some(draft.rebase(fetched))
        } else {
            state.draft = Some(EditDraft::new(fetched));
            None
        };
        state.transition(SessionPhase::Ready)?;
        state.last_error = None;
        shared.publish(state);

        tracing::info!(
            day = %shared.key,
            revision = %revision,
            pending = state.draft.as_ref().map_or(0, EditDraft::dirty_count),
            dropped = rebase.as_ref().map_or(0, |r| r.dropped.len()),
            "day loaded"
        );
        Ok(LoadOutcome { revision, rebase })
    }

    fn fail_load(&self, state: &mut SessionState, err: LoadError) -> SessionError {
        tracing::warn!(day = %self.shared.key, error = %err, "load failed");
        state.last_error = Some(SessionFailure::load(&err));
        let to = if state.draft.is_some() {
            SessionPhase::Ready
        } else {
            SessionPhase::LoadFailed
        };
        if let Err(phase) = state.transition(to) {
            return phase.into();
        }
        self.shared.publish(state);
        err.into()
    }

    fn edit<T>(
        &self,
        op: impl FnOnce(&mut EditDraft, &SessionConfig) -> Result<T, PreconditionError>,
    ) -> Result<T, SessionError> {
        let mut state = self.shared.state.lock();
        let draft = state.draft_mut()?;
        let out = op(draft, &self.shared.config)?;
        self.shared.publish(&state);
        Ok(out)
    }

    /// Set the tempo
    ///
    /// # Errors
    /// Returns error if no day is loaded or an apply is in flight
    pub fn update_tempo(&self, tempo: Tempo) -> Result<ReconcileOutcome, SessionError> {
        self.edit(|draft, _| Ok(draft.update_tempo(tempo)))
    }

    /// Set the day's time window
    ///
    /// # Errors
    /// Returns [`SessionError::Precondition`] if `start >= end`
    pub fn update_time_window(
        &self,
        start: TimeOfDay,
        end: TimeOfDay,
    ) -> Result<ReconcileOutcome, SessionError> {
        self.edit(|draft, _| draft.update_time_window(start, end))
    }

    /// Set the budget tier
    ///
    /// # Errors
    /// Returns error if no day is loaded or an apply is in flight
    pub fn update_budget(&self, budget: BudgetTier) -> Result<ReconcileOutcome, SessionError> {
        self.edit(|draft, _| Ok(draft.update_budget(budget)))
    }

    /// Select a preset; selecting the active one again clears it
    ///
    /// # Errors
    /// Returns error if no day is loaded or an apply is in flight
    pub fn select_preset(
        &self,
        preset: Option<ThematicPreset>,
    ) -> Result<ReconcileOutcome, SessionError> {
        self.edit(|draft, _| Ok(draft.select_preset(preset)))
    }

    /// Replace the wish scratch input
    ///
    /// # Errors
    /// Returns error if no day is loaded or an apply is in flight
    pub fn set_wish_input(&self, text: impl Into<String>) -> Result<(), SessionError> {
        let text = text.into();
        self.edit(|draft, _| {
            draft.set_wish_input(text);
            Ok(())
        })
    }

    /// Queue a wish
    ///
    /// # Errors
    /// Returns [`SessionError::Precondition`] for empty or over-long text
    pub fn add_wish(&self, text: &str) -> Result<ReconcileOutcome, SessionError> {
        self.edit(|draft, config| draft.add_wish(text, config.max_wish_len))
    }

    /// Queue a new stop
    ///
    /// # Errors
    /// Returns [`SessionError::Precondition`] if the placement names an
    /// unknown slot
    pub fn add_place(
        &self,
        place: PlaceResult,
        placement: Placement,
    ) -> Result<ReconcileOutcome, SessionError> {
        self.edit(|draft, _| draft.add_place(place, placement))
    }

    /// Toggle a stop's mark for automatic replacement
    ///
    /// # Errors
    /// Returns [`SessionError::Precondition`] for unknown stop ids
    pub fn mark_for_replacement(&self, poi: &PoiId) -> Result<ReconcileOutcome, SessionError> {
        self.edit(|draft, _| draft.mark_for_replacement(poi))
    }

    /// Replace a stop with a specific place
    ///
    /// # Errors
    /// Returns [`SessionError::Precondition`] for unknown stop ids
    pub fn replace_place_with(
        &self,
        poi: &PoiId,
        place: &PlaceResult,
    ) -> Result<ReconcileOutcome, SessionError> {
        self.edit(|draft, _| draft.replace_place_with(poi, place.id.clone()))
    }

    /// Toggle a stop's removal
    ///
    /// # Errors
    /// Returns [`SessionError::Precondition`] for unknown stop ids
    pub fn remove_place(&self, poi: &PoiId) -> Result<ReconcileOutcome, SessionError> {
        self.edit(|draft, _| draft.remove_place(poi))
    }

    /// Abandon all edits and search state
    ///
    /// # Errors
    /// Returns [`SessionError::ApplyInFlight`] while applying
    pub fn reset(&self) -> Result<(), SessionError> {
        let mut state = self.shared.state.lock();
        if state.phase == SessionPhase::Applying {
            return Err(SessionError::ApplyInFlight);
        }
        let dropped = state.draft.as_ref().map_or(0, EditDraft::dirty_count);
        if let Some(draft) = state.draft.as_mut() {
            draft.reset();
        }
        state.search.cancel();
        self.shared.publish(&state);
        tracing::info!(day = %self.shared.key, dropped, "edits reset");
        Ok(())
    }

    /// Submit the pending log as one transaction
    ///
    /// # Errors
    /// Returns [`SessionError::Apply`] on conflict or failure, leaving the
    /// draft untouched; [`SessionError::ApplyInFlight`] if another apply
    /// is running; [`SessionError::NotReady`] before a successful load
    pub async fn apply(&self) -> Result<ApplyOutcome, SessionError> {
        let shared = &*self.shared;
        let request = {
            let mut state = shared.state.lock();
            match state.phase {
                SessionPhase::Ready => {}
                SessionPhase::Applying => return Err(SessionError::ApplyInFlight),
                SessionPhase::Idle | SessionPhase::Loading | SessionPhase::LoadFailed => {
                    return Err(SessionError::NotReady)
                }
            }
            let Some(draft) = state.draft.as_ref() else {
                return Err(SessionError::NotReady);
            };
            if !draft.has_changes() {
                tracing::debug!(day = %shared.key, "nothing to apply");
                return Ok(ApplyOutcome::NothingToApply);
            }
            let request = draft.transaction();
            state.transition(SessionPhase::Applying)?;
            shared.publish(&state);
            request
        };

        tracing::info!(
            day = %shared.key,
            base_revision = %request.base_revision,
            changes = request.len(),
            "applying transaction"
        );
        let mut guard = ApplyGuard {
            shared,
            armed: true,
        };
        let result = shared.backend.apply_transaction(&shared.key, &request).await;
        guard.armed = false;

        let mut state = shared.state.lock();
        state.transition(SessionPhase::Ready)?;
        let outcome = Self::finish_apply(&shared.key, &mut state, &request, result);
        shared.publish(&state);
        outcome
    }

    fn finish_apply(
        key: &DayKey,
        state: &mut SessionState,
        request: &TransactionRequest,
        result: Result<RemoteDayState, TransactionError>,
    ) -> Result<ApplyOutcome, SessionError> {
        let base_revision = request.base_revision;
        let err = match result {
            Ok(day) if day.revision > base_revision => {
                let revision = day.revision;
                match state.draft.as_mut() {
                    Some(draft) => draft.install_baseline(day),
                    None => state.draft = Some(EditDraft::new(day)),
                }
                state.last_error = None;
                tracing::info!(
                    day = %key,
                    revision = %revision,
                    changes = request.len(),
                    "transaction applied"
                );
                return Ok(ApplyOutcome::Applied {
                    revision,
                    changes: request.len(),
                });
            }
            Ok(day) => ApplyError::InvalidResponse {
                base_revision,
                returned: day.revision,
            },
            Err(TransactionError::Conflict { current_revision }) => ApplyError::Conflict {
                base_revision,
                server_revision: current_revision,
            },
            Err(TransactionError::Backend(err)) => ApplyError::Failed {
                message: err.to_string(),
                retryable: err.is_retryable(),
            },
        };

        tracing::warn!(day = %key, error = %err, conflict = err.is_conflict(), "apply failed");
        state.last_error = Some(SessionFailure::apply(&err));
        Err(err.into())
    }

    /// Run [`Self::apply`] on the runtime, detached from the caller
    ///
    /// The apply completes even if the returned handle is dropped.
    pub fn spawn_apply(&self) -> JoinHandle<Result<ApplyOutcome, SessionError>> {
        let session = self.clone();
        tokio::spawn(async move { session.apply().await })
    }

    /// Search candidate places
    ///
    /// Failures degrade to an empty result list and are recorded as the
    /// last error. Responses overtaken by a newer query are dropped.
    pub async fn search_places(&self, query: &str) -> SearchOutcome {
        let shared = &*self.shared;
        let query = query.trim();
        let (generation, request) = {
            let mut state = shared.state.lock();
            if state.closed {
                return SearchOutcome::Discarded;
            }
            if query.chars().count() < shared.config.min_search_query_len {
                state.search.skip(query);
                shared.publish(&state);
                return SearchOutcome::Skipped;
            }
            let generation = state.search.begin(query);
            shared.publish(&state);
            let request = PlaceQuery {
                text: query.to_string(),
                city_scope: shared.config.city_scope.clone(),
                limit: shared.config.search_limit,
            };
            (generation, request)
        };

        let result = shared.backend.search_places(&request).await;

        let mut state = shared.state.lock();
        let outcome = match result {
            Ok(mut places) => {
                places.truncate(request.limit);
                if state.search.complete(generation, places.clone()) {
                    if state
                        .last_error
                        .as_ref()
                        .is_some_and(|e| e.kind == FailureKind::Search)
                    {
                        state.last_error = None;
                    }
                    tracing::debug!(query, results = places.len(), "search completed");
                    SearchOutcome::Completed(places)
                } else {
                    SearchOutcome::Discarded
                }
            }
            Err(err) => {
                if state.search.fail(generation) {
                    tracing::warn!(query, error = %err, "search failed");
                    state.last_error = Some(SessionFailure::search(&err));
                    SearchOutcome::Completed(Vec::new())
                } else {
                    SearchOutcome::Discarded
                }
            }
        };
        if outcome == SearchOutcome::Discarded {
            tracing::debug!(query, generation, "discarding stale search response");
        } else {
            shared.publish(&state);
        }
        outcome
    }

    /// Leave the session
    ///
    /// Cancels searches; an apply in flight is left to complete.
    pub fn close(&self) {
        let mut state = self.shared.state.lock();
        state.closed = true;
        state.search.cancel();
        self.shared.publish(&state);
        tracing::debug!(
            day = %self.shared.key,
            applying = state.phase == SessionPhase::Applying,
            "session closed"
        );
    }

    /// Receive a status update after every change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.shared.status.subscribe()
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.shared.state.lock().status()
    }

    /// Lifecycle phase
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.shared.state.lock().phase
    }

    /// Pending record count
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.with_draft(EditDraft::dirty_count).unwrap_or(0)
    }

    /// Whether anything is pending
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.with_draft(EditDraft::has_changes).unwrap_or(false)
    }

    /// Whether a load is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase() == SessionPhase::Loading
    }

    /// Whether an apply is in flight
    #[must_use]
    pub fn is_applying(&self) -> bool {
        self.phase() == SessionPhase::Applying
    }

    /// Whether [`Self::close`] was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Most recent failure
    #[must_use]
    pub fn last_error(&self) -> Option<SessionFailure> {
        self.shared.state.lock().last_error.clone()
    }

    /// Read the draft without cloning it
    pub fn with_draft<R>(&self, read: impl FnOnce(&EditDraft) -> R) -> Option<R> {
        self.shared.state.lock().draft.as_ref().map(read)
    }

    /// Installed baseline
    #[must_use]
    pub fn baseline(&self) -> Option<RemoteDayState> {
        self.with_draft(|draft| draft.baseline().clone())
    }

    /// Draft values
    #[must_use]
    pub fn buffer(&self) -> Option<LocalEditBuffer> {
        self.with_draft(|draft| draft.buffer().clone())
    }

    /// Pending records in submission order
    #[must_use]
    pub fn pending_changes(&self) -> Vec<PendingChangeRecord> {
        self.with_draft(|draft| draft.log().records().to_vec())
            .unwrap_or_default()
    }

    /// Transaction that [`Self::apply`] would submit now
    #[must_use]
    pub fn transaction_preview(&self) -> Option<TransactionRequest> {
        self.with_draft(EditDraft::transaction)
    }

    /// Current search results
    #[must_use]
    pub fn search_results(&self) -> Vec<PlaceResult> {
        self.shared.state.lock().search.results().to_vec()
    }

    /// Last search query
    #[must_use]
    pub fn search_query(&self) -> String {
        self.shared.state.lock().search.query().to_string()
    }
}
