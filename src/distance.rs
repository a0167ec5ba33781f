//! Great-circle distance between two [`Position`]s, and its display format.

use serde::{Deserialize, Serialize};

use crate::gis::Position;

/// Mean radius of the Earth (in kilometers) used by [`haversine_km()`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers using the Haversine formula on a spherical Earth.
///
/// Identical positions give exactly `0.0`.
pub fn haversine_km(from: &Position, to: &Position) -> f64 {
    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1.0 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Format a distance for display:
///
/// + below 1 km: whole meters, e.g. `500 m`
/// + below 10 km: two decimals, e.g. `1.00 km`
/// + otherwise: one decimal, e.g. `123.5 km`
pub fn format_distance(kilometers: f64) -> String {
    if kilometers < 1.0 {
        format!("{} m", (kilometers * 1000.0).round())
    } else if kilometers < 10.0 {
        format!("{:.2} km", kilometers)
    } else {
        format!("{:.1} km", kilometers)
    }
}

/// Distance between your position and the tracked device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceResult {
    /// Unrounded distance.
    pub kilometers: f64,
    /// [`format_distance()`] of `kilometers`.
    pub display: String,
}

impl DistanceResult {
    /// Compute the distance between two positions.
    pub fn between(from: &Position, to: &Position) -> Self {
        let kilometers = haversine_km(from, to);
        Self {
            kilometers,
            display: format_distance(kilometers),
        }
    }
}
