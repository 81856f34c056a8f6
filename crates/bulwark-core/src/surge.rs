//! Transient power surges caused by absorbed damage.
//!
//! A hit adds `points * watt_per_point` watts and restarts a fixed decay
//! window. The surge then falls linearly to zero over the window; when the
//! window closes the surge is forced to exactly zero.

use serde::{Deserialize, Serialize};

/// Observable surge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurgeState {
    Idle,
    Surging,
}

/// Surge bookkeeping for one shield.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurgeTracker {
    /// Extra watts currently drawn. Never negative.
    current_power: f64,
    /// Seconds until the surge has fully decayed. Never negative.
    time_remaining: f64,
}

impl SurgeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_power(&self) -> f64 {
        self.current_power
    }

    pub fn time_remaining(&self) -> f64 {
        self.time_remaining
    }

    pub fn state(&self) -> SurgeState {
        if self.current_power > 0.0 {
            SurgeState::Surging
        } else {
            SurgeState::Idle
        }
    }

    pub fn is_surging(&self) -> bool {
        self.state() == SurgeState::Surging
    }

    /// Register a hit. Adds to the current surge and restarts the decay
    /// window at `duration` (timers do not stack). Non-positive or
    /// non-finite points are ignored. Returns the watts added.
    pub fn on_damage(&mut self, points: f64, watt_per_point: f64, duration: f64) -> f64 {
        if !points.is_finite() || points <= 0.0 {
            return 0.0;
        }
        let added = points * watt_per_point;
        if !added.is_finite() || added <= 0.0 {
            return 0.0;
        }
        self.current_power += added;
        self.time_remaining = duration.max(0.0);
        added
    }

    /// Advance the decay by `dt` seconds. Returns `true` when this call
    /// ended the surge.
    pub fn decay(&mut self, dt: f64) -> bool {
        if self.current_power <= 0.0 || self.time_remaining <= 0.0 {
            self.reset();
            return false;
        }
        if !dt.is_finite() || dt <= 0.0 {
            return false;
        }

        let next_remaining = self.time_remaining - dt;
        if next_remaining <= 0.0 {
            self.reset();
            return true;
        }

        self.current_power = (self.current_power * next_remaining / self.time_remaining).max(0.0);
        self.time_remaining = next_remaining;
        false
    }

    /// Drop any surge immediately.
    pub fn reset(&mut self) {
        self.current_power = 0.0;
        self.time_remaining = 0.0;
    }
}
