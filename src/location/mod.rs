//! Positioning: samples, sources and the arbiter choosing between them
//!
//! The arbiter owns exactly one active source at a time:
//! - Organic: the live platform stream
//! - Simulated: a synthetic walk along the route, used in `Always` mode or
//!   after organic positioning stays poor for the patience interval

mod arbiter;
pub mod geometry;
mod mode;
mod sample;
mod simulated;
mod source;

pub use arbiter::LocationArbiter;
pub use mode::{SampleOrigin, SimulationIntent, SimulationMode};
pub use sample::{AccuracyPolicy, Coordinate, PositionSample};
pub use simulated::{SimulatedSource, SimulationProfile};
pub use source::{PassiveSource, PositionSink, PositionSource, PositionUpdate};
