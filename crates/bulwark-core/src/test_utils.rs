//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use std::collections::BTreeMap;

use glam::DVec2;

use crate::config::ShieldConfig;
use crate::console::ConsoleMessage;
use crate::effect::{EffectRegistry, TargetWorld};
use crate::id::{ConsoleId, GridId, ShieldId, TargetId};
use crate::shield::{GeometryUpdate, ShieldState};
use crate::command_queue::ShieldCommand;
use crate::world::ShieldWorld;

// ===========================================================================
// Mock target world
// ===========================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MockTarget {
    pub position: DVec2,
    pub velocity: DVec2,
    pub grid: Option<GridId>,
    pub shooter_grid: Option<GridId>,
    pub projectile: bool,
}

impl MockTarget {
    /// A projectile fired from `shooter_grid`.
    pub fn projectile(position: DVec2, velocity: DVec2, shooter_grid: GridId) -> Self {
        Self {
            position,
            velocity,
            grid: None,
            shooter_grid: Some(shooter_grid),
            projectile: true,
        }
    }
}

/// In-memory [`TargetWorld`]. Deletions are recorded and the target is
/// removed immediately.
#[derive(Debug, Clone, Default)]
pub struct MockTargets {
    pub targets: BTreeMap<TargetId, MockTarget>,
    pub deleted: Vec<TargetId>,
    next_id: u64,
}

impl MockTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, target: MockTarget) -> TargetId {
        self.next_id += 1;
        let id = TargetId(self.next_id);
        self.targets.insert(id, target);
        id
    }

    pub fn get(&self, id: TargetId) -> Option<&MockTarget> {
        self.targets.get(&id)
    }

    pub fn get_mut(&mut self, id: TargetId) -> Option<&mut MockTarget> {
        self.targets.get_mut(&id)
    }

    pub fn despawn(&mut self, id: TargetId) -> Option<MockTarget> {
        self.targets.remove(&id)
    }
}

impl TargetWorld for MockTargets {
    fn exists(&self, target: TargetId) -> bool {
        self.targets.contains_key(&target)
    }

    fn is_projectile(&self, target: TargetId) -> bool {
        self.targets.get(&target).is_some_and(|t| t.projectile)
    }

    fn grid(&self, target: TargetId) -> Option<GridId> {
        self.targets.get(&target).and_then(|t| t.grid)
    }

    fn shooter_grid(&self, target: TargetId) -> Option<GridId> {
        self.targets.get(&target).and_then(|t| t.shooter_grid)
    }

    fn position(&self, target: TargetId) -> Option<DVec2> {
        self.targets.get(&target).map(|t| t.position)
    }

    fn velocity(&self, target: TargetId) -> Option<DVec2> {
        self.targets.get(&target).map(|t| t.velocity)
    }

    fn set_velocity(&mut self, target: TargetId, velocity: DVec2) {
        if let Some(t) = self.targets.get_mut(&target) {
            t.velocity = velocity;
        }
    }

    fn queue_delete(&mut self, target: TargetId) {
        if self.targets.remove(&target).is_some() {
            self.deleted.push(target);
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// ===========================================================================
// Shield helpers
// ===========================================================================

/// Config used across tests: 100 W per unit area, radius up to 50, 25 W
/// per damage point over 10 s, trip at 10 kW, recover at 6 kW.
pub fn test_config() -> ShieldConfig {
    ShieldConfig {
        consumption_per_unit_area: 100.0,
        max_radius: 50,
        watt_per_point: 25.0,
        damage_surge_duration: 10.0,
        power_draw_limit: 10_000.0,
        reset_power: 6_000.0,
        ..ShieldConfig::default()
    }
}

/// `test_config()` with a limit high enough that no full-size test shield
/// overloads: trip at 1 MW, recover at 500 kW.
pub fn high_limit_config() -> ShieldConfig {
    ShieldConfig {
        power_draw_limit: 1_000_000.0,
        reset_power: 500_000.0,
        ..test_config()
    }
}

pub fn geometry(angle: f64, width: f64, radius: i64) -> GeometryUpdate {
    GeometryUpdate {
        angle: Some(crate::angle::Angle::from_degrees(angle)),
        width: Some(crate::angle::Angle::from_degrees(width)),
        radius: Some(radius),
    }
}

/// Spawn a shield with `effects`, bind a fresh console to it, then switch
/// it on and power it. Runs one zero-length step so the inputs apply.
pub fn spawn_working_shield(
    world: &mut ShieldWorld,
    config: ShieldConfig,
    update: GeometryUpdate,
    effects: EffectRegistry,
) -> (ShieldId, ConsoleId) {
    let mut state = ShieldState::new(config);
    state.set_geometry(update);
    let shield = world
        .spawn_shield(state, effects)
        .expect("test config is valid");
    let console = world.add_console();
    world.bind(console, shield).expect("ids just created");
    world.submit_console(console, ConsoleMessage::ToggleShield);
    world.submit(ShieldCommand::SetPowered {
        shield,
        powered: true,
    });
    world.step(0.0);
    (shield, console)
}
