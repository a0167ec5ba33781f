//! Types and functions relating to geography computation.

use std::{fmt::Display, marker::PhantomData};

use serde::{Deserialize, Deserializer, Serialize};

/// Valid latitude range, in degrees.
pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
/// Valid longitude range, in degrees.
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// Position. Deserializing checks the ranges, see [`Position::try_new()`].
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Position<CRS = WGS84> {
    /// Latitude of the position (in degrees).
    pub latitude: f64,
    /// Longitude of the position (in degrees).
    pub longitude: f64,
    #[serde(skip)]
    coordinate_reference_system: PhantomData<CRS>,
}

/// Error produced by [`Position::try_new()`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum PositionError {
    /// Latitude is not a finite number in [`LATITUDE_RANGE`].
    #[error("Invalid latitude {0}. It needs to be in the range [-90.0, 90.0]")]
    Latitude(f64),
    /// Longitude is not a finite number in [`LONGITUDE_RANGE`].
    #[error("Invalid longitude {0}. It needs to be in the range [-180.0, 180.0]")]
    Longitude(f64),
}

impl<CRS> Position<CRS> {
    /// Construct a new [`Position`] without checking the ranges.
    pub fn new(latitude: f64, longitude: f64) -> Position<CRS> {
        Self {
            latitude,
            longitude,
            coordinate_reference_system: PhantomData,
        }
    }

    /// Construct a new [`Position`], rejecting `NaN`, infinite and out of range values.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Position<CRS>, PositionError> {
        if !LATITUDE_RANGE.contains(&latitude) {
            return Err(PositionError::Latitude(latitude));
        }
        if !LONGITUDE_RANGE.contains(&longitude) {
            return Err(PositionError::Longitude(longitude));
        }
        Ok(Self::new(latitude, longitude))
    }

    /// `(latitude, longitude)` converted to radians.
    pub fn to_radians(&self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl<'de, CRS> Deserialize<'de> for Position<CRS> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            latitude: f64,
            longitude: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::try_new(raw.latitude, raw.longitude).map_err(serde::de::Error::custom)
    }
}

impl<CRS> Display for Position<CRS> {
    /// Formats as `latitude, longitude` with six decimal places.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// WGS84 Coordinate system.
#[derive(PartialEq, Debug, Copy, Clone, Serialize, Deserialize)]
pub struct WGS84;
