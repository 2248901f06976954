//! Day Plan HTTP Backend
//!
//! [`DayBackend`](dayplan_session::DayBackend) over the trip planner REST API.
//!
//! # Core Concepts
//!
//! - [`HttpDayBackend`]: reqwest client for fetch, transaction and place search
//! - [`HttpBackendConfig`]: Base URL, timeout and bearer token
//!
//! A stale base revision comes back as `409 Conflict` and surfaces as
//! [`TransactionError::Conflict`](dayplan_session::TransactionError::Conflict);
//! every other failure maps onto [`BackendError`](dayplan_session::BackendError).
//!
//! # Example
//!
//! ```rust,ignore
//! use dayplan_http::{HttpBackendConfig, HttpDayBackend};
//! use dayplan_session::SessionBuilder;
//! use std::sync::Arc;
//!
//! let backend = HttpDayBackend::connect(&HttpBackendConfig::new("https://api.example.com/v1"))?;
//! let session = SessionBuilder::new(key, Arc::new(backend)).open()?;
//! session.load().await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod client;
mod config;

// Re-exports
pub use client::{HttpBackendError, HttpDayBackend};
pub use config::HttpBackendConfig;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
