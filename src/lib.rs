//! phone-tracker library crate
//!
//! Plots your position and a missing device's position on a map, connects them with a line and
//! reports the great-circle distance between them. See [`tracker::GeoTrackerController`].

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod distance;
pub mod fs;
pub mod gis;
pub mod input;
pub mod location;
pub mod options;
pub mod plan;
pub mod reporting;
pub mod storage;
pub mod surface;
pub mod tracker;
