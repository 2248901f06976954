//! Error types for the day plan model

/// Errors constructing model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Identifier was empty
    #[error("empty {0} id")]
    EmptyId(&'static str),

    /// Time of day could not be parsed
    #[error("invalid time of day '{0}': expected HH:MM")]
    InvalidTimeOfDay(String),

    /// Time window end is not after its start
    #[error("invalid time window: {start} is not before {end}")]
    InvertedTimeWindow {
        /// Window start
        start: String,
        /// Window end
        end: String,
    },

    /// Unknown enum label
    #[error("unknown {kind} '{value}'")]
    UnknownLabel {
        /// Which enum was being parsed
        kind: &'static str,
        /// Offending label
        value: String,
    },
}
