//! Edit scripts
//!
//! A script is a TOML file of `[[step]]` tables, each tagged with `op`:
//!
//! ```toml
//! [[step]]
//! op = "tempo"
//! value = "high"
//!
//! [[step]]
//! op = "search"
//! query = "coffee"
//!
//! [[step]]
//! op = "add_place"
//! result = 0
//! placement = { mode = "into_slot", poiId = "poi_2" }
//!
//! [[step]]
//! op = "apply"
//! ```

use anyhow::Context;
use dayplan_changes::Placement;
use dayplan_model::{BudgetTier, Tempo, ThematicPreset, TimeOfDay};
use serde::Deserialize;
use std::path::Path;

/// Ordered list of edit steps
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EditScript {
    /// Steps in execution order
    #[serde(default, rename = "step")]
    pub steps: Vec<ScriptStep>,
}

impl EditScript {
    /// Parse a script from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not a valid script
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid edit script")
    }

    /// Load a script file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not a valid script
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }
}

/// One user action
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Set the tempo
    Tempo {
        /// New tempo
        value: Tempo,
    },
    /// Set the day window
    TimeWindow {
        /// `HH:MM`
        start: TimeOfDay,
        /// `HH:MM`
        end: TimeOfDay,
    },
    /// Set the budget tier
    Budget {
        /// New tier
        value: BudgetTier,
    },
    /// Select a preset; omitting `value` clears it
    Preset {
        /// Preset to toggle
        #[serde(default)]
        value: Option<ThematicPreset>,
    },
    /// Queue a wish
    Wish {
        /// Wish text
        text: String,
    },
    /// Run a place search
    Search {
        /// Query text
        query: String,
    },
    /// Add a result of the last search
    AddPlace {
        /// Index into the current search results
        result: usize,
        /// Where the stop goes
        #[serde(default = "auto_placement")]
        placement: Placement,
    },
    /// Toggle a stop's automatic replacement mark
    MarkReplace {
        /// Stop id
        poi: String,
    },
    /// Replace a stop with a result of the last search
    ReplaceWith {
        /// Stop id
        poi: String,
        /// Index into the current search results
        result: usize,
    },
    /// Toggle a stop's removal
    Remove {
        /// Stop id
        poi: String,
    },
    /// Refetch the day, rebasing pending edits
    Refresh,
    /// Abandon all edits
    Reset,
    /// Submit pending edits
    Apply,
}

fn auto_placement() -> Placement {
    Placement::Auto
}

impl ScriptStep {
    /// The step's `op` tag
    #[must_use]
    pub fn op(&self) -> &'static str {
        match self {
            Self::Tempo { .. } => "tempo",
            Self::TimeWindow { .. } => "time_window",
            Self::Budget { .. } => "budget",
            Self::Preset { .. } => "preset",
            Self::Wish { .. } => "wish",
            Self::Search { .. } => "search",
            Self::AddPlace { .. } => "add_place",
            Self::MarkReplace { .. } => "mark_replace",
            Self::ReplaceWith { .. } => "replace_with",
            Self::Remove { .. } => "remove",
            Self::Refresh => "refresh",
            Self::Reset => "reset",
            Self::Apply => "apply",
        }
    }
}
