//! Day Plan Model
//!
//! The server-owned snapshot of one trip day and the value types it is
//! made of.
//!
//! # Core Concepts
//!
//! - [`RemoteDayState`]: Immutable baseline, replaced wholesale after every
//!   successful transaction
//! - [`Revision`]: Server-assigned optimistic-concurrency counter
//! - [`DaySettings`]: Tempo, time window and budget, edited together
//! - [`PointOfInterest`] / [`PlaceResult`]: Itinerary stops and search hits
//!
//! # Example
//!
//! ```rust,ignore
//! use dayplan_model::{RemoteDayState, Tempo};
//!
//! let day: RemoteDayState = serde_json::from_str(body)?;
//! assert_eq!(day.settings().tempo, Tempo::Medium);
//! ```

#![warn(unreachable_pub)]

mod day;
mod error;
mod ids;
mod place;
mod settings;
mod time;

pub use day::{DayMetrics, RemoteDayState, Revision, WishMessage, WishRole};
pub use error::ModelError;
pub use ids::{DayId, DayKey, PlaceId, PoiId, TripId};
pub use place::{Coordinates, PlaceResult, PointOfInterest};
pub use settings::{BudgetTier, DaySettings, Tempo, ThematicPreset};
pub use time::{TimeOfDay, TimeWindow};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
