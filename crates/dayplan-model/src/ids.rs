//! Opaque identifiers
//!
//! Server-assigned string ids for trips, days, points of interest and
//! place search results. The client never interprets them.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create id from raw string
            ///
            /// # Errors
            /// Returns error if the id is empty or only whitespace
            pub fn new(raw: impl Into<String>) -> Result<Self, ModelError> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    return Err(ModelError::EmptyId($label));
                }
                Ok(Self(raw))
            }

            /// Raw id string
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Trip identifier
    TripId,
    "trip"
);

string_id!(
    /// Day identifier within a trip
    DayId,
    "day"
);

string_id!(
    /// Point of interest identifier within a day plan
    PoiId,
    "poi"
);

string_id!(
    /// Place identifier from the search catalog
    PlaceId,
    "place"
);

/// Addresses one editable day of one trip
///
/// `day_index` is the zero-based position of the day within the trip and
/// is what the auth gate decides on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayKey {
    /// Owning trip
    pub trip_id: TripId,
    /// Day within the trip
    pub day_id: DayId,
    /// Zero-based day position
    pub day_index: u32,
}

impl DayKey {
    /// Create new day key
    #[inline]
    #[must_use]
    pub fn new(trip_id: TripId, day_id: DayId, day_index: u32) -> Self {
        Self {
            trip_id,
            day_id,
            day_index,
        }
    }
}

impl Display for DayKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.trip_id, self.day_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_rejects_blank() {
        assert!(matches!(PoiId::new("  "), Err(ModelError::EmptyId("poi"))));
        assert!(TripId::new("").is_err());
    }

    #[test]
    fn id_serializes_transparently() {
        let id = PoiId::new("poi_123").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"poi_123\"");

        let back: PoiId = serde_json::from_str("\"poi_123\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn day_key_display() {
        let key = DayKey::new(
            TripId::new("trip_1").unwrap(),
            DayId::new("day_2").unwrap(),
            1,
        );
        assert_eq!(key.to_string(), "trip_1/day_2");
    }
}
