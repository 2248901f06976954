//! Error types for the editing session
//!
//! Provides error handling for:
//! - Auth gate refusals and lifecycle misuse
//! - Load failures (network, missing day, stale or superseded responses)
//! - Apply failures, split into revision conflicts and generic failures
//! - Backend collaborator errors

use crate::config::ConfigError;
use crate::phase::PhaseError;
use dayplan_changes::PreconditionError;
use dayplan_model::{DayKey, Revision};
use serde::Serialize;

/// Main session error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Auth gate refused the day
    #[error("editing {0} is not permitted")]
    NotPermitted(DayKey),

    /// No baseline loaded yet
    #[error("no day loaded")]
    NotReady,

    /// An apply is running; the draft is frozen until it resolves
    #[error("an apply is already in flight")]
    ApplyInFlight,

    /// Edit rejected before touching the log
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// Load failed
    #[error("load failed: {0}")]
    Load(#[from] LoadError),

    /// Apply failed
    #[error("apply failed: {0}")]
    Apply(#[from] ApplyError),

    /// Illegal lifecycle transition
    #[error(transparent)]
    Phase(#[from] PhaseError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SessionError {
    /// Apply error, if this is one
    #[inline]
    #[must_use]
    pub fn as_apply(&self) -> Option<&ApplyError> {
        match self {
            Self::Apply(err) => Some(err),
            _ => None,
        }
    }
}

/// Load failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// Transport or server failure
    #[error("network error: {0}")]
    Network(String),

    /// Day does not exist
    #[error("day not found: {0}")]
    NotFound(String),

    /// Server returned an older revision than the installed baseline
    #[error("stale revision {fetched}, baseline is already at {installed}")]
    StaleRevision {
        /// Installed baseline revision
        installed: Revision,
        /// Revision in the response
        fetched: Revision,
    },

    /// A newer load was started before this one resolved
    #[error("superseded by a newer load")]
    Superseded,
}

impl From<BackendError> for LoadError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(what) => Self::NotFound(what),
            other => Self::Network(other.to_string()),
        }
    }
}

/// Apply failures
///
/// The recovery differs per variant: a conflict needs a refetch (which
/// rebases the pending log) before retrying, a failure permits a bare
/// retry of the same transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// Another writer moved the day past our base revision
    #[error("revision conflict: based on {base_revision}, server is at {}", display_revision(.server_revision))]
    Conflict {
        /// Revision the transaction was based on
        base_revision: Revision,
        /// Server's current revision, when reported
        server_revision: Option<Revision>,
    },

    /// Network or server failure
    #[error("{message}")]
    Failed {
        /// Failure description
        message: String,
        /// Whether a bare retry may succeed
        retryable: bool,
    },

    /// Server answered with a revision that does not advance the base
    #[error("server returned revision {returned}, expected more than {base_revision}")]
    InvalidResponse {
        /// Revision the transaction was based on
        base_revision: Revision,
        /// Revision in the response
        returned: Revision,
    },
}

impl ApplyError {
    /// Whether recovery needs a refetch before retrying
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Whether the same transaction may be resubmitted as-is
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Failed { retryable: true, .. })
    }
}

fn display_revision(revision: &Option<Revision>) -> String {
    revision.map_or_else(|| "unknown".to_string(), |r| r.to_string())
}

/// Errors from the day backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Request never got a response
    #[error("network error: {0}")]
    Network(String),

    /// Resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Server refused the request as invalid
    #[error("rejected: {0}")]
    Rejected(String),

    /// Server-side failure
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP-like status code
        status: u16,
        /// Body or reason
        message: String,
    },

    /// Response body could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Whether repeating the request may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::Rejected(_) | Self::Decode(_) => false,
        }
    }
}

/// Errors from submitting a transaction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    /// Base revision is stale
    #[error("revision conflict")]
    Conflict {
        /// Server's current revision, when reported
        current_revision: Option<Revision>,
    },

    /// Any other failure
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Which async operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Fetching the day
    Load,
    /// Apply rejected for a stale base revision
    Conflict,
    /// Apply failed otherwise
    Apply,
    /// Place search
    Search,
}

/// Last failure recorded on a session, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionFailure {
    /// Failed operation
    pub kind: FailureKind,
    /// Human-readable message
    pub message: String,
    /// Whether retrying as-is may succeed
    pub retryable: bool,
}

impl SessionFailure {
    pub(crate) fn load(err: &LoadError) -> Self {
        Self {
            kind: FailureKind::Load,
            message: err.to_string(),
            retryable: matches!(err, LoadError::Network(_)),
        }
    }

    pub(crate) fn apply(err: &ApplyError) -> Self {
        Self {
            kind: if err.is_conflict() {
                FailureKind::Conflict
            } else {
                FailureKind::Apply
            },
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }

    pub(crate) fn search(err: &BackendError) -> Self {
        Self {
            kind: FailureKind::Search,
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}
