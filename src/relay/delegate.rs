//! Application delegate and the default answers used when it stays silent

use crate::route::TrackerQuery;

/// Default answers applied when no delegate is registered or it declines
pub mod defaults {
    /// Let the tracker reroute when the user leaves the route
    pub const SHOULD_REROUTE: bool = true;
    /// Keep every location sample
    pub const SHOULD_DISCARD_LOCATION: bool = false;
    /// Advance to the next leg on arrival
    pub const ADVANCE_ON_ARRIVAL: bool = true;
    pub const PREVENT_REROUTES_ON_ARRIVAL: bool = false;
    pub const DISABLE_BATTERY_MONITORING: bool = true;
}

/// Answers routing questions on behalf of the application.
///
/// Returning `None` declines the question; the relay then applies the
/// matching constant from [`defaults`].
pub trait NavigationDelegate: Send + Sync {
    fn answer(&self, query: &TrackerQuery<'_>) -> Option<bool>;
}

/// Answer used when the delegate is absent or declines
pub fn default_answer(query: &TrackerQuery<'_>) -> bool {
    match query {
        TrackerQuery::ShouldReroute { .. } => defaults::SHOULD_REROUTE,
        TrackerQuery::ShouldDiscard { .. } => defaults::SHOULD_DISCARD_LOCATION,
        TrackerQuery::DidArrive { .. } => defaults::ADVANCE_ON_ARRIVAL,
        TrackerQuery::ShouldPreventReroutesWhenArriving { .. } => {
            defaults::PREVENT_REROUTES_ON_ARRIVAL
        }
        TrackerQuery::ShouldDisableBatteryMonitoring => defaults::DISABLE_BATTERY_MONITORING,
    }
}
