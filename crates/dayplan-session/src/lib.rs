//! Day Plan Session
//!
//! Editing session for one trip day against a revisioned backend.
//!
//! # Core Concepts
//!
//! - [`DayEditingSession`]: Load, edit, apply, reset, search, close
//! - [`SessionBuilder`]: Consults the [`AuthGate`] before a session exists
//! - [`DayBackend`]: The revisioned day resource and place search
//! - [`SessionPhase`]: Lifecycle state machine
//! - [`SessionStatus`]: Observable snapshot, also pushed on [`DayEditingSession::subscribe`]
//! - [`InMemoryDayBackend`]: Backend with server semantics, for offline use and tests
//!
//! # Example
//!
//! ```rust,ignore
//! use dayplan_session::{SessionBuilder, InMemoryDayBackend};
//! use dayplan_model::Tempo;
//!
//! let session = SessionBuilder::new(key, backend).open()?;
//! session.load().await?;
//! session.update_tempo(Tempo::High)?;
//! session.add_wish("more cafes")?;
//! let outcome = session.apply().await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod backend;
mod config;
mod error;
mod memory;
mod phase;
mod search;
mod session;
mod status;

// Re-exports
pub use backend::{AllowAll, AuthGate, DayBackend, DayIndexLimit, PlaceQuery};
pub use config::{ConfigError, SessionConfig};
pub use error::{
    ApplyError, BackendError, FailureKind, LoadError, SessionError, SessionFailure,
    TransactionError,
};
pub use memory::{derive_metrics, InMemoryDayBackend};
pub use phase::{allowed_transitions, validate_transition, PhaseError, SessionPhase};
pub use search::SearchState;
pub use session::{ApplyOutcome, DayEditingSession, LoadOutcome, SearchOutcome, SessionBuilder};
pub use status::SessionStatus;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
