//! Position samples and accuracy qualification

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// WGS84 coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Accuracy thresholds deciding when organic data can be trusted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyPolicy {
    /// Largest horizontal accuracy (meters) for a qualified sample
    pub qualified_max_m: f64,
    /// Largest horizontal accuracy (meters) for starting a route
    pub route_start_max_m: f64,
}

impl Default for AccuracyPolicy {
    fn default() -> Self {
        Self {
            qualified_max_m: 100.0,
            route_start_max_m: 20.0,
        }
    }
}

/// A single positioning fix, immutable once produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub timestamp: SystemTime,
    pub coordinate: Coordinate,
    /// Course over ground in degrees, negative when unknown
    pub course: f64,
    /// Speed in m/s, negative when unknown
    pub speed: f64,
    /// Horizontal accuracy radius in meters, non-positive when invalid
    pub horizontal_accuracy: f64,
    /// Vertical accuracy in meters, non-positive when invalid
    pub vertical_accuracy: f64,
    /// Accuracy within the qualified threshold
    pub qualified: bool,
    /// Accuracy within the stricter route-start threshold
    pub qualified_for_route_start: bool,
}

impl PositionSample {
    /// Build a sample, deriving the qualification flags from `policy`.
    pub fn new(
        coordinate: Coordinate,
        course: f64,
        speed: f64,
        horizontal_accuracy: f64,
        vertical_accuracy: f64,
        policy: &AccuracyPolicy,
    ) -> Self {
        Self::at(
            SystemTime::now(),
            coordinate,
            course,
            speed,
            horizontal_accuracy,
            vertical_accuracy,
            policy,
        )
    }

    pub fn at(
        timestamp: SystemTime,
        coordinate: Coordinate,
        course: f64,
        speed: f64,
        horizontal_accuracy: f64,
        vertical_accuracy: f64,
        policy: &AccuracyPolicy,
    ) -> Self {
        let valid = horizontal_accuracy > 0.0;
        Self {
            timestamp,
            coordinate,
            course,
            speed,
            horizontal_accuracy,
            vertical_accuracy,
            qualified: valid && horizontal_accuracy <= policy.qualified_max_m,
            qualified_for_route_start: valid && horizontal_accuracy <= policy.route_start_max_m,
        }
    }
}
