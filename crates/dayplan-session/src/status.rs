//! Observable session status

use crate::error::SessionFailure;
use crate::phase::SessionPhase;
use dayplan_model::Revision;
use serde::Serialize;

/// Snapshot of everything the UI binds to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// Lifecycle phase
    pub phase: SessionPhase,
    /// Installed baseline revision
    pub revision: Option<Revision>,
    /// Pending record count
    pub dirty_count: usize,
    /// Whether anything is pending
    pub has_changes: bool,
    /// Load in flight
    pub is_loading: bool,
    /// Apply in flight
    pub is_applying: bool,
    /// Search in flight
    pub is_searching: bool,
    /// Most recent failure
    ///
    /// A successful load or apply clears it; a successful search clears
    /// only a search failure.
    pub last_error: Option<SessionFailure>,
}

impl SessionStatus {
    /// Status of a session that has not loaded anything
    #[must_use]
    pub fn idle() -> Self {
        Self {
            phase: SessionPhase::Idle,
            revision: None,
            dirty_count: 0,
            has_changes: false,
            is_loading: false,
            is_applying: false,
            is_searching: false,
            last_error: None,
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::idle()
    }
}
