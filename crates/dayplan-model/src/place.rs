//! Points of interest and place search results

use crate::ids::{PlaceId, PoiId};
use crate::time::TimeWindow;
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// WGS84 coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
}

impl Coordinates {
    /// Create coordinates
    #[inline]
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in meters (haversine)
    #[must_use]
    pub fn distance_meters(&self, other: &Self) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

/// One stop of the itinerary
///
/// Position in [`crate::RemoteDayState::points_of_interest`] is itinerary
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointOfInterest {
    /// Stop id, unique within the day
    pub id: PoiId,
    /// Display name
    pub name: String,
    /// Location
    pub coordinates: Coordinates,
    /// Planned visit window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    /// Category label (museum, cafe, ...)
    pub category: String,
    /// Average rating, 0-5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    /// Price tier, 1-4
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_tier: Option<u8>,
    /// Photo reference for the image loader
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<String>,
    /// Street address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Candidate place returned by place search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceResult {
    /// Catalog id
    pub id: PlaceId,
    /// Display name
    pub name: String,
    /// Location
    pub coordinates: Coordinates,
    /// Category label
    pub category: String,
    /// Average rating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    /// Price tier, 1-4
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_tier: Option<u8>,
    /// Street address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Photo reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<String>,
    /// City the place belongs to, used for scoping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}
