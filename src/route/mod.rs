//! Route data shared with the route tracker
//!
//! Routes are produced by the routing backend and owned by the route
//! tracker. The session core only reads them: to seed a simulated source,
//! to resolve the speech locale and to hand leg context to the synthesizer.

mod progress;
mod tracker;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::location::Coordinate;

pub use progress::{LegProgress, RouteProgress};
pub use tracker::{RouteTracker, TrackerDelegate, TrackerEvent, TrackerQuery};

/// Request options the route was computed with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteOptions {
    /// Locale requested for instructions, e.g. "en-US"
    #[serde(default)]
    pub locale: Option<String>,
}

/// A stop along the route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    #[serde(default)]
    pub name: Option<String>,
    pub coordinate: Coordinate,
}

impl std::fmt::Display for Waypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}"),
            None => write!(
                f,
                "({:.5}, {:.5})",
                self.coordinate.latitude, self.coordinate.longitude
            ),
        }
    }
}

/// Text to be spoken when the user reaches a point along a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpokenInstruction {
    /// Distance before the end of the step at which to speak
    pub distance_along_step: f64,
    pub text: String,
    /// Marked-up variant carrying phonetic hints
    #[serde(default)]
    pub ssml_text: Option<String>,
}

/// Banner instruction shown when the user reaches a point along a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualInstruction {
    pub distance_along_step: f64,
    pub primary_text: String,
    #[serde(default)]
    pub secondary_text: Option<String>,
}

/// A single maneuver and the road leading to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    /// Road names along the step
    #[serde(default)]
    pub name: String,
    /// Length in meters
    pub distance: f64,
    #[serde(default)]
    pub spoken_instructions: Vec<SpokenInstruction>,
    #[serde(default)]
    pub visual_instructions: Vec<VisualInstruction>,
}

/// Portion of a route between two waypoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    #[serde(default)]
    pub name: String,
    pub steps: Vec<RouteStep>,
    pub destination: Waypoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Full route geometry
    pub geometry: Vec<Coordinate>,
    pub legs: Vec<RouteLeg>,
    /// Length in meters
    pub distance: f64,
    /// Seconds
    pub expected_travel_time: f64,
    /// Locale the backend generated spoken instructions for
    #[serde(default)]
    pub speech_locale: Option<String>,
    #[serde(default)]
    pub options: RouteOptions,
}

/// Active alternative within a multi-route response
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRoute {
    pub route: Arc<Route>,
    pub index: usize,
}

impl IndexedRoute {
    pub fn new(route: Route, index: usize) -> Self {
        Self {
            route: Arc::new(route),
            index,
        }
    }
}
