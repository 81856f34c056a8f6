//! Simulation clock and state hashing.

use serde::{Deserialize, Serialize};

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Clock tracked by the world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimState {
    /// Incremented by 1 for each step.
    pub tick: Ticks,
    /// Simulated seconds elapsed across all steps.
    pub elapsed_secs: f64,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        if dt.is_finite() && dt > 0.0 {
            self.elapsed_secs += dt;
        }
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// Deterministic FNV-1a (64-bit) hash of simulation state, used to detect
/// divergence between authority and replicas. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write(&[v as u8]);
    }

    /// Hash the exact bit pattern of a float.
    pub fn write_f64(&mut self, v: f64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_state_starts_at_zero() {
        let state = SimState::new();
        assert_eq!(state.tick, 0);
        assert_eq!(state.elapsed_secs, 0.0);
    }

    #[test]
    fn advance_ignores_bad_dt() {
        let mut state = SimState::new();
        state.advance(0.5);
        state.advance(f64::NAN);
        state.advance(-1.0);
        assert_eq!(state.tick, 3);
        assert_eq!(state.elapsed_secs, 0.5);
    }

    #[test]
    fn state_hash_deterministic() {
        let mut h1 = StateHash::new();
        h1.write_u64(42);
        h1.write_f64(1.5);

        let mut h2 = StateHash::new();
        h2.write_u64(42);
        h2.write_f64(1.5);

        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn state_hash_order_matters() {
        let mut h1 = StateHash::new();
        h1.write_u32(1);
        h1.write_bool(true);

        let mut h2 = StateHash::new();
        h2.write_bool(true);
        h2.write_u32(1);

        assert_ne!(h1.finish(), h2.finish());
    }
}
