//! Collaborators consumed by the session
//!
//! The day backend owns the revisioned resource; the auth gate decides
//! whether a day may be edited at all. Both are injected at construction.

use crate::error::{BackendError, TransactionError};
use async_trait::async_trait;
use dayplan_changes::TransactionRequest;
use dayplan_model::{DayKey, PlaceResult, RemoteDayState};
use serde::{Deserialize, Serialize};

/// Place search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceQuery {
    /// Free text
    pub text: String,
    /// City to restrict results to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_scope: Option<String>,
    /// Maximum results
    pub limit: usize,
}

/// Revisioned day resource
///
/// `apply_transaction` must be all-or-nothing and must report a stale
/// `base_revision` as [`TransactionError::Conflict`].
#[async_trait]
pub trait DayBackend: Send + Sync {
    /// Fetch the current state of a day
    async fn fetch_day(&self, key: &DayKey) -> Result<RemoteDayState, BackendError>;

    /// Apply every change in `request` atomically, returning the new state
    async fn apply_transaction(
        &self,
        key: &DayKey,
        request: &TransactionRequest,
    ) -> Result<RemoteDayState, TransactionError>;

    /// Look up candidate places
    async fn search_places(&self, query: &PlaceQuery) -> Result<Vec<PlaceResult>, BackendError>;
}

/// Decides whether a day may be edited
pub trait AuthGate: Send + Sync {
    /// Whether the current user may edit `key`
    fn can_edit(&self, key: &DayKey) -> bool;
}

/// Gate that permits every day
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthGate for AllowAll {
    fn can_edit(&self, _key: &DayKey) -> bool {
        true
    }
}

/// Gate that permits days up to a zero-based index
///
/// Models the free tier that can only edit the first few days of a trip.
#[derive(Debug, Clone, Copy)]
pub struct DayIndexLimit {
    max_index: u32,
}

impl DayIndexLimit {
    /// Permit days `0..=max_index`
    #[inline]
    #[must_use]
    pub fn new(max_index: u32) -> Self {
        Self { max_index }
    }
}

impl AuthGate for DayIndexLimit {
    fn can_edit(&self, key: &DayKey) -> bool {
        key.day_index <= self.max_index
    }
}
