//! Precondition errors
//!
//! Violations are programmer errors: the caller handed the editor something
//! the UI should never have offered. They are reported without touching
//! the log. With the `strict-debug` feature they panic instead.

use dayplan_model::{ModelError, PoiId};

/// Rejected edit
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    /// Stop id not present in the loaded baseline
    #[error("unknown point of interest: {0}")]
    UnknownPoi(PoiId),

    /// Time window malformed or inverted
    #[error("invalid time window: {0}")]
    InvalidTimeWindow(#[from] ModelError),

    /// Wish text empty after trimming
    #[error("wish text is empty")]
    EmptyWish,

    /// Wish text longer than allowed
    #[error("wish text exceeds {max} characters")]
    WishTooLong {
        /// Configured limit
        max: usize,
    },
}

/// Report a precondition violation
///
/// Panics under `strict-debug`; otherwise hands the error back for the
/// caller to return.
pub(crate) fn violated(err: PreconditionError) -> PreconditionError {
    #[cfg(feature = "strict-debug")]
    panic!("edit precondition violated: {err}");

    #[cfg(not(feature = "strict-debug"))]
    {
        tracing::warn!(error = %err, "edit precondition violated");
        err
    }
}
