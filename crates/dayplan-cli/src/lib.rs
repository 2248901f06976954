//! Day Plan CLI
//!
//! Replays edit scripts through a [`DayEditingSession`](dayplan_session::DayEditingSession),
//! either offline against the in-memory backend or against the REST API.
//!
//! # Core Concepts
//!
//! - [`EditScript`]: TOML list of `[[step]]` user actions
//! - [`ScriptRunner`]: Executes a script and collects a [`RunReport`]
//! - [`CliConfig`]: `[session]` and `[http]` settings

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod runner;
mod script;

// Re-exports
pub use config::CliConfig;
pub use runner::{RunReport, ScriptRunner, StepRecord};
pub use script::{EditScript, ScriptStep};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
