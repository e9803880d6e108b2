//! Timer and activation-edge tracking.
//!
//! A Timer owns the playhead of one timeline instance: current time in
//! seconds, a time-scale multiplier, and an active flag. Time advances by
//! `dt * effective_scale` only while active; deactivating freezes the
//! playhead exactly at its last value.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Timer {
    /// Playhead in seconds.
    pub time: f32,
    /// Drivable multiplier; composed with the parent chain for nested timers.
    pub time_scale: f32,
    pub active: bool,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        Self {
            time: 0.0,
            time_scale: 1.0,
            active: false,
        }
    }

    /// Advance by `dt` scaled by `effective_scale` iff active.
    #[inline]
    pub fn advance(&mut self, dt: f32, effective_scale: f32) {
        if self.active {
            self.time += dt * effective_scale;
        }
    }
}

/// How a timer's activation changed this step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Edge {
    Enter,
    SteadyActive,
    Exit,
    SteadyInactive,
}

/// One step of activation history, enough to classify enter/exit edges.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct ActivationState {
    active_this_step: bool,
    active_last_step: bool,
}

impl ActivationState {
    /// Shift in this step's activation and classify the transition.
    pub fn observe(&mut self, active: bool) -> Edge {
        self.active_last_step = self.active_this_step;
        self.active_this_step = active;
        self.edge()
    }

    #[inline]
    pub fn edge(&self) -> Edge {
        match (self.active_last_step, self.active_this_step) {
            (false, true) => Edge::Enter,
            (true, true) => Edge::SteadyActive,
            (true, false) => Edge::Exit,
            (false, false) => Edge::SteadyInactive,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active_this_step
    }

    /// Overwrite the history with a steady state, so the next `observe` of
    /// the same flag classifies as steady rather than an edge. Used when
    /// restoring saved timers: a resumed-active timer must not re-enter.
    #[inline]
    pub fn reset_to(&mut self, active: bool) {
        self.active_this_step = active;
        self.active_last_step = active;
    }
}
