//! Editable day settings
//!
//! Tempo, budget tier and thematic preset are closed sets; their wire
//! labels are lowercase snake case.

use crate::error::ModelError;
use crate::time::TimeWindow;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Pace of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tempo {
    /// Few stops, long breaks
    Low,
    /// Balanced
    #[default]
    Medium,
    /// Packed schedule
    High,
}

/// Spending level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    /// Budget friendly
    Low,
    /// Mid range
    #[default]
    Medium,
    /// No limits
    High,
}

/// Named thematic bias applied to a day plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThematicPreset {
    /// Highlights of the city
    Overview,
    /// Food and drink
    Food,
    /// Long walks
    Walks,
    /// Quieter places and hours
    AvoidCrowds,
    /// Galleries and museums
    Art,
    /// Buildings and streets
    Architecture,
    /// Small cosy spots
    Cozy,
    /// Evening and night out
    Nightlife,
}

impl ThematicPreset {
    /// Every preset, in display order
    pub const ALL: [Self; 8] = [
        Self::Overview,
        Self::Food,
        Self::Walks,
        Self::AvoidCrowds,
        Self::Art,
        Self::Architecture,
        Self::Cozy,
        Self::Nightlife,
    ];
}

macro_rules! label_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            /// Wire label
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($label => Ok(Self::$variant),)+
                    other => Err(ModelError::UnknownLabel {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

label_enum!(Tempo, "tempo", { Low => "low", Medium => "medium", High => "high" });
label_enum!(BudgetTier, "budget", { Low => "low", Medium => "medium", High => "high" });
label_enum!(ThematicPreset, "preset", {
    Overview => "overview",
    Food => "food",
    Walks => "walks",
    AvoidCrowds => "avoid_crowds",
    Art => "art",
    Architecture => "architecture",
    Cozy => "cozy",
    Nightlife => "nightlife",
});

/// The fields covered jointly by one `update_settings` change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySettings {
    /// Pace
    pub tempo: Tempo,
    /// Planned day start/end
    pub time_window: TimeWindow,
    /// Spending level
    pub budget: BudgetTier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_wire_format() {
        assert_eq!(serde_json::to_string(&Tempo::High).unwrap(), "\"high\"");
        assert_eq!(
            serde_json::to_string(&ThematicPreset::AvoidCrowds).unwrap(),
            "\"avoid_crowds\""
        );
        for preset in ThematicPreset::ALL {
            let json = serde_json::to_string(&preset).unwrap();
            assert_eq!(json, format!("\"{}\"", preset.as_str()));
        }
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("HIGH".parse::<Tempo>().unwrap(), Tempo::High);
        assert_eq!(" low ".parse::<BudgetTier>().unwrap(), BudgetTier::Low);
        assert_eq!(
            "nightlife".parse::<ThematicPreset>().unwrap(),
            ThematicPreset::Nightlife
        );
        assert!("brisk".parse::<Tempo>().is_err());
    }
}
