//! Session lifecycle
//!
//! `Idle -> Loading -> {Ready, LoadFailed}`; from `Ready` a refresh goes
//! back through `Loading`, and an apply goes `Ready -> Applying -> Ready`
//! whether it succeeds or fails.

use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nothing loaded yet
    #[default]
    Idle,
    /// Fetch in flight
    Loading,
    /// Baseline installed, editable
    Ready,
    /// First load failed; retry with another load
    LoadFailed,
    /// Transaction in flight; the draft is frozen
    Applying,
}

impl Display for SessionPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::LoadFailed => "load_failed",
            Self::Applying => "applying",
        };
        f.write_str(label)
    }
}

/// Illegal lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal session transition: {from} -> {to}")]
pub struct PhaseError {
    /// Current phase
    pub from: SessionPhase,
    /// Requested phase
    pub to: SessionPhase,
}

/// Validates a phase transition
///
/// Illegal transitions panic under the `strict-debug` feature.
///
/// # Errors
/// Returns [`PhaseError`] if `to` is not reachable from `from`
pub fn validate_transition(from: SessionPhase, to: SessionPhase) -> Result<(), PhaseError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        #[cfg(feature = "strict-debug")]
        panic!("illegal session transition attempted: {from} -> {to}");

        #[cfg(not(feature = "strict-debug"))]
        Err(PhaseError { from, to })
    }
}

/// Phases reachable from `from`
#[must_use]
pub fn allowed_transitions(from: SessionPhase) -> &'static [SessionPhase] {
    use SessionPhase::{Applying, Idle, LoadFailed, Loading, Ready};
    match from {
        Idle | LoadFailed => &[Loading],
        Loading => &[Ready, LoadFailed],
        Ready => &[Loading, Applying],
        Applying => &[Ready],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionPhase::*;

    #[test]
    fn happy_path() {
        for (from, to) in [
            (Idle, Loading),
            (Loading, Ready),
            (Ready, Applying),
            (Applying, Ready),
            (Ready, Loading),
            (Loading, LoadFailed),
            (LoadFailed, Loading),
        ] {
            assert!(validate_transition(from, to).is_ok(), "{from} -> {to}");
        }
    }

    #[cfg(not(feature = "strict-debug"))]
    #[test]
    fn illegal_transitions() {
        assert_eq!(
            validate_transition(Idle, Applying),
            Err(PhaseError {
                from: Idle,
                to: Applying
            })
        );
        assert!(validate_transition(Applying, Loading).is_err());
        assert!(validate_transition(LoadFailed, Applying).is_err());
    }

    #[test]
    fn applying_only_returns_to_ready() {
        assert_eq!(allowed_transitions(Applying), &[Ready]);
    }
}
