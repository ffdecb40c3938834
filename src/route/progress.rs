//! Read-only progress snapshots produced by the route tracker

use super::{IndexedRoute, RouteLeg, RouteStep, SpokenInstruction};

/// Snapshot of how far the user has travelled along the active route
#[derive(Debug, Clone, PartialEq)]
pub struct RouteProgress {
    pub route: IndexedRoute,
    pub leg_index: usize,
    pub step_index: usize,
    /// Index of the next spoken instruction within the current step
    pub spoken_instruction_index: usize,
    /// Meters travelled along the route geometry
    pub distance_traveled: f64,
}

impl RouteProgress {
    /// Progress at the very start of `route`
    pub fn new(route: IndexedRoute) -> Self {
        Self {
            route,
            leg_index: 0,
            step_index: 0,
            spoken_instruction_index: 0,
            distance_traveled: 0.0,
        }
    }

    pub fn current_leg_progress(&self) -> Option<LegProgress<'_>> {
        let leg = self.route.route.legs.get(self.leg_index)?;
        Some(LegProgress {
            leg,
            leg_index: self.leg_index,
            step_index: self.step_index,
            spoken_instruction_index: self.spoken_instruction_index,
        })
    }

    /// Spoken instructions of the current step not yet passed, current one included
    pub fn remaining_spoken_instructions(&self) -> &[SpokenInstruction] {
        self.current_leg_progress()
            .and_then(|leg| leg.current_step())
            .and_then(|step| step.spoken_instructions.get(self.spoken_instruction_index..))
            .unwrap_or(&[])
    }

    pub fn current_spoken_instruction(&self) -> Option<&SpokenInstruction> {
        self.remaining_spoken_instructions().first()
    }

    pub fn distance_remaining(&self) -> f64 {
        (self.route.route.distance - self.distance_traveled).max(0.0)
    }

    /// Locale for speech: route options first, then the route's own speech locale
    pub fn speech_locale(&self) -> Option<&str> {
        let route = &self.route.route;
        route
            .options
            .locale
            .as_deref()
            .or(route.speech_locale.as_deref())
    }
}

/// Borrowed view of the current leg, handed to the speech synthesizer so it
/// can resolve pronunciation for the step and road names it references
#[derive(Debug, Clone, Copy)]
pub struct LegProgress<'a> {
    pub leg: &'a RouteLeg,
    pub leg_index: usize,
    pub step_index: usize,
    pub spoken_instruction_index: usize,
}

impl<'a> LegProgress<'a> {
    pub fn current_step(&self) -> Option<&'a RouteStep> {
        self.leg.steps.get(self.step_index)
    }
}
