//! Bulwark Core -- simulation of directional energy shields.
//!
//! A shield projects an angular sector out to a radius. Its power demand
//! follows the covered area plus a decaying surge from absorbed damage,
//! and it trips into overload above a draw limit until demand falls back
//! under a lower reset level. Behaviour is extended through ordered effect
//! hooks, and operators steer it from a bound console over a rate-limited
//! message protocol.
//!
//! # Tick Pipeline
//!
//! Each call to [`world::ShieldWorld::step`] runs:
//!
//! 1. **Inputs** -- queued console messages, damage, power and anchoring.
//! 2. **Surge** -- decay every shield's damage surge.
//! 3. **Power** -- recompute draw and the overload flag.
//! 4. **Effects** -- target entries, then periodic updates.
//! 5. **Export** -- push changed snapshots to bound consoles.
//! 6. **Bookkeeping** -- advance the clock and hash the state.
//!
//! # Key Types
//!
//! - [`shield::ShieldState`] -- geometry, power and overload state of one
//!   shield.
//! - [`surge::SurgeTracker`] -- damage-induced surge with linear decay.
//! - [`effect::EffectRegistry`] -- ordered [`effect::Effect`] hooks with
//!   per-effect failure isolation.
//! - [`console::ConsoleClient`] -- client-side rate limiting and snapshot
//!   cache.
//! - [`visibility`] -- radar visibility and blips.
//! - [`wire`] -- versioned `bitcode` encoding of console traffic.

pub mod angle;
pub mod binding;
pub mod command_queue;
pub mod config;
pub mod console;
pub mod effect;
pub mod event;
pub mod id;
pub mod sector;
pub mod shield;
pub mod sim;
pub mod surge;
pub mod visibility;
pub mod wire;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
