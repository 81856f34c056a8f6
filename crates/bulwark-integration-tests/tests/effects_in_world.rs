//! Integration test: effects attached to shields in a running world.
//!
//! Covers the speed-change effect against a mock target world, failure
//! isolation between effects, lifecycle ordering across spawn/despawn, and
//! shields spawned from data presets.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use bulwark_core::command_queue::ShieldCommand;
use bulwark_core::console::ConsoleMessage;
use bulwark_core::effect::{Effect, EffectContext, EffectError, EffectRegistry, Hook};
use bulwark_core::id::{ConsoleId, GridId, ShieldId, TargetId};
use bulwark_core::test_utils::*;
use bulwark_core::world::ShieldWorld;
use bulwark_data::schema::ShieldPresetData;
use bulwark_data::PresetLibrary;
use bulwark_effects::{SpeedChangeConfig, SpeedChangeEffect};
use glam::DVec2;

const OWN_GRID: GridId = GridId(1);
const ENEMY_GRID: GridId = GridId(2);

fn slowing(modifier: f64) -> SpeedChangeConfig {
    SpeedChangeConfig {
        destroy_projectiles: false,
        ..SpeedChangeConfig::new(modifier)
    }
}

/// A working full-circle shield of radius 20 at the origin on `OWN_GRID`.
fn world_with_shield(effects: EffectRegistry) -> (ShieldWorld, ShieldId) {
    let (world, shield, _) = world_with_console(effects);
    (world, shield)
}

fn world_with_console(effects: EffectRegistry) -> (ShieldWorld, ShieldId, ConsoleId) {
    let mut world = ShieldWorld::with_targets(Box::new(MockTargets::new()));
    let (shield, console) = spawn_working_shield(
        &mut world,
        high_limit_config(),
        geometry(0.0, 360.0, 20),
        effects,
    );
    world.shield_mut(shield).unwrap().grid = Some(OWN_GRID);
    assert!(world.shield(shield).unwrap().can_work());
    (world, shield, console)
}

fn spawn_target(world: &mut ShieldWorld, position: DVec2, shooter: GridId) -> TargetId {
    world
        .targets_as_mut::<MockTargets>()
        .unwrap()
        .spawn(MockTarget::projectile(position, DVec2::new(100.0, 0.0), shooter))
}

fn target(world: &ShieldWorld, id: TargetId) -> Option<&MockTarget> {
    world.targets_as::<MockTargets>().unwrap().get(id)
}

fn enter(world: &mut ShieldWorld, shield: ShieldId, target: TargetId) {
    world.submit(ShieldCommand::TargetEnter { shield, target });
    world.step(1.0 / 60.0);
}

// ===========================================================================
// Speed change
// ===========================================================================

#[test]
fn enemy_projectile_slowed_then_restored_on_exit() {
    let effects = EffectRegistry::from_effects(vec![Box::new(SpeedChangeEffect::new(slowing(0.5)))]);
    let (mut world, shield) = world_with_shield(effects);
    let bolt = spawn_target(&mut world, DVec2::new(5.0, 0.0), ENEMY_GRID);

    enter(&mut world, shield, bolt);
    assert_eq!(target(&world, bolt).unwrap().velocity, DVec2::new(50.0, 0.0));
    let effect = world.effects(shield).unwrap().find::<SpeedChangeEffect>().unwrap();
    assert!(effect.is_phasing(bolt));

    // Still inside: nothing changes.
    world.step(1.0 / 60.0);
    assert_eq!(target(&world, bolt).unwrap().velocity, DVec2::new(50.0, 0.0));

    // Leaves the sector: speed restored and tracking dropped.
    world
        .targets_as_mut::<MockTargets>()
        .unwrap()
        .get_mut(bolt)
        .unwrap()
        .position = DVec2::new(30.0, 0.0);
    world.step(1.0 / 60.0);
    assert_eq!(target(&world, bolt).unwrap().velocity, DVec2::new(100.0, 0.0));
    let effect = world.effects(shield).unwrap().find::<SpeedChangeEffect>().unwrap();
    assert!(!effect.is_phasing(bolt));
}

#[test]
fn own_grid_projectile_untouched() {
    let effects = EffectRegistry::from_effects(vec![Box::new(SpeedChangeEffect::new(slowing(0.5)))]);
    let (mut world, shield) = world_with_shield(effects);
    let friendly = spawn_target(&mut world, DVec2::new(5.0, 0.0), OWN_GRID);

    enter(&mut world, shield, friendly);
    assert_eq!(target(&world, friendly).unwrap().velocity, DVec2::new(100.0, 0.0));
}

#[test]
fn destroying_shield_deletes_projectiles() {
    let effects = EffectRegistry::from_effects(vec![Box::new(SpeedChangeEffect::new(
        SpeedChangeConfig::new(0.5),
    ))]);
    let (mut world, shield) = world_with_shield(effects);
    let bolt = spawn_target(&mut world, DVec2::new(5.0, 0.0), ENEMY_GRID);

    enter(&mut world, shield, bolt);
    assert!(target(&world, bolt).is_none());
    assert_eq!(world.targets_as::<MockTargets>().unwrap().deleted, vec![bolt]);
}

#[test]
fn entries_ignored_while_shield_is_down() {
    let effects = EffectRegistry::from_effects(vec![Box::new(SpeedChangeEffect::new(slowing(0.5)))]);
    let (mut world, shield) = world_with_shield(effects);
    world.submit(ShieldCommand::SetPowered {
        shield,
        powered: false,
    });
    world.step(0.0);

    let bolt = spawn_target(&mut world, DVec2::new(5.0, 0.0), ENEMY_GRID);
    enter(&mut world, shield, bolt);
    assert_eq!(target(&world, bolt).unwrap().velocity, DVec2::new(100.0, 0.0));
}

#[test]
fn despawn_restores_phasing_targets() {
    let effects = EffectRegistry::from_effects(vec![Box::new(SpeedChangeEffect::new(slowing(0.25)))]);
    let (mut world, shield) = world_with_shield(effects);
    let bolt = spawn_target(&mut world, DVec2::new(5.0, 0.0), ENEMY_GRID);

    enter(&mut world, shield, bolt);
    assert_eq!(target(&world, bolt).unwrap().velocity, DVec2::new(25.0, 0.0));

    world.despawn_shield(shield).unwrap();
    assert_eq!(target(&world, bolt).unwrap().velocity, DVec2::new(100.0, 0.0));
}

fn slowed_bolt(modifier: f64) -> (ShieldWorld, ShieldId, ConsoleId, TargetId) {
    let effects = EffectRegistry::from_effects(vec![Box::new(SpeedChangeEffect::new(slowing(modifier)))]);
    let (mut world, shield, console) = world_with_console(effects);
    let bolt = spawn_target(&mut world, DVec2::new(5.0, 0.0), ENEMY_GRID);
    enter(&mut world, shield, bolt);
    assert_eq!(target(&world, bolt).unwrap().velocity, DVec2::new(100.0 * modifier, 0.0));
    (world, shield, console, bolt)
}

fn assert_released(world: &ShieldWorld, shield: ShieldId, bolt: TargetId) {
    assert_eq!(target(world, bolt).unwrap().velocity, DVec2::new(100.0, 0.0));
    let effect = world.effects(shield).unwrap().find::<SpeedChangeEffect>().unwrap();
    assert!(!effect.is_phasing(bolt));
}

#[test]
fn toggle_off_restores_phasing_targets() {
    let (mut world, shield, console, bolt) = slowed_bolt(0.5);

    world.submit_console(console, ConsoleMessage::ToggleShield);
    world.step(1.0 / 60.0);
    assert!(!world.shield(shield).unwrap().enabled());
    assert_released(&world, shield, bolt);

    // The target leaves while the shield is off; nothing divides twice.
    world
        .targets_as_mut::<MockTargets>()
        .unwrap()
        .get_mut(bolt)
        .unwrap()
        .position = DVec2::new(500.0, 0.0);
    for _ in 0..10 {
        world.step(1.0 / 60.0);
    }
    assert_released(&world, shield, bolt);
}

#[test]
fn power_loss_restores_phasing_targets() {
    let (mut world, shield, _, bolt) = slowed_bolt(0.5);
    world.submit(ShieldCommand::SetPowered {
        shield,
        powered: false,
    });
    world.step(1.0 / 60.0);
    assert_released(&world, shield, bolt);
}

#[test]
fn unanchoring_restores_phasing_targets() {
    let (mut world, shield, _, bolt) = slowed_bolt(0.25);
    world.submit(ShieldCommand::SetAnchored {
        shield,
        anchored: false,
    });
    world.step(1.0 / 60.0);
    assert_released(&world, shield, bolt);
}

// ===========================================================================
// Failure isolation and ordering
// ===========================================================================

/// Fails every enter and records each hook it sees.
#[derive(Debug)]
struct Faulty {
    name: &'static str,
    log: Rc<RefCell<Vec<String>>>,
}

impl Effect for Faulty {
    fn name(&self) -> &str {
        self.name
    }

    fn on_init(&mut self, _ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        self.log.borrow_mut().push(format!("init:{}", self.name));
        Ok(())
    }

    fn on_shutdown(&mut self, _ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        self.log.borrow_mut().push(format!("shutdown:{}", self.name));
        Ok(())
    }

    fn on_enter(
        &mut self,
        _ctx: &mut EffectContext<'_>,
        _target: TargetId,
    ) -> Result<(), EffectError> {
        Err(EffectError::Failed("jammed".to_string()))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[test]
fn failing_effect_does_not_block_the_next() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let effects = EffectRegistry::from_effects(vec![
        Box::new(Faulty {
            name: "faulty",
            log: Rc::clone(&log),
        }),
        Box::new(SpeedChangeEffect::new(slowing(0.5))),
    ]);
    let (mut world, shield) = world_with_shield(effects);
    let bolt = spawn_target(&mut world, DVec2::new(5.0, 0.0), ENEMY_GRID);

    world.submit(ShieldCommand::TargetEnter { shield, target: bolt });
    let report = world.step(1.0 / 60.0);

    assert_eq!(report.effect_failures.len(), 1);
    let failure = &report.effect_failures[0];
    assert_eq!(failure.shield, shield);
    assert_eq!(failure.effect, "faulty");
    assert_eq!(failure.hook, Hook::Enter);

    assert_eq!(target(&world, bolt).unwrap().velocity, DVec2::new(50.0, 0.0));
    assert!(world.shield(shield).unwrap().can_work());

    // Reported once; the diagnostic log keeps it.
    let report = world.step(1.0 / 60.0);
    assert!(report.effect_failures.is_empty());
    assert_eq!(world.effects(shield).unwrap().failures().len(), 1);
}

#[test]
fn init_forward_shutdown_reverse() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let effects = EffectRegistry::from_effects(
        ["a", "b", "c"]
            .into_iter()
            .map(|name| {
                Box::new(Faulty {
                    name,
                    log: Rc::clone(&log),
                }) as Box<dyn Effect>
            })
            .collect(),
    );
    let (mut world, shield) = world_with_shield(effects);
    world.despawn_shield(shield).unwrap();

    assert_eq!(
        *log.borrow(),
        vec!["init:a", "init:b", "init:c", "shutdown:c", "shutdown:b", "shutdown:a"]
    );
}

#[test]
fn init_failure_reported_on_next_tick() {
    let effects = EffectRegistry::from_effects(vec![Box::new(SpeedChangeEffect::new(
        SpeedChangeConfig::new(0.0),
    ))]);
    let mut world = ShieldWorld::with_targets(Box::new(MockTargets::new()));
    let shield = world
        .spawn_shield(bulwark_core::shield::ShieldState::new(test_config()), effects)
        .unwrap();

    let report = world.step(0.0);
    assert_eq!(report.effect_failures.len(), 1);
    assert_eq!(report.effect_failures[0].hook, Hook::Init);
    assert!(world.shield(shield).is_some());
}

// ===========================================================================
// Presets and visibility
// ===========================================================================

const PRESETS: &str = r#"[
    (
        name: "picket",
        config: (max_radius: 30, consumption_per_unit_area: 1.0),
        radius: Some(25),
        effects: [SpeedChange((speed_modifier: 0.5))],
    ),
    (
        name: "beacon",
        radius: Some(10),
        visible_from_other_grids: true,
    ),
]"#;

fn library() -> PresetLibrary {
    let presets: Vec<ShieldPresetData> = ron::from_str(PRESETS).unwrap();
    PresetLibrary::from_presets(presets, Path::new("inline.ron")).unwrap()
}

fn switch_on(world: &mut ShieldWorld, shield: ShieldId) {
    let console = world.add_console();
    world.bind(console, shield).unwrap();
    world.submit_console(console, ConsoleMessage::ToggleShield);
    world.submit(ShieldCommand::SetPowered {
        shield,
        powered: true,
    });
    world.step(0.0);
}

#[test]
fn preset_shield_destroys_enemy_fire() {
    let library = library();
    let mut world = ShieldWorld::with_targets(Box::new(MockTargets::new()));
    let shield = library.spawn(&mut world, "picket").unwrap();
    world.shield_mut(shield).unwrap().grid = Some(OWN_GRID);
    switch_on(&mut world, shield);

    let bolt = spawn_target(&mut world, DVec2::new(0.0, 10.0), ENEMY_GRID);
    enter(&mut world, shield, bolt);
    assert_eq!(world.targets_as::<MockTargets>().unwrap().deleted, vec![bolt]);
}

#[test]
fn radar_sees_own_grid_and_beacons() {
    let library = library();
    let mut world = ShieldWorld::new();

    let picket = library.spawn(&mut world, "picket").unwrap();
    let beacon = library.spawn(&mut world, "beacon").unwrap();
    world.shield_mut(picket).unwrap().grid = Some(OWN_GRID);
    world.shield_mut(beacon).unwrap().grid = Some(ENEMY_GRID);
    world.shield_mut(beacon).unwrap().position = DVec2::new(100.0, 0.0);
    switch_on(&mut world, picket);

    // The beacon is not projecting yet, so only the picket shows.
    let blips = world.blips(Some(OWN_GRID), DVec2::ZERO, 1000.0);
    assert_eq!(blips.len(), 1);
    assert_eq!(blips[0].scale, 25.0);

    switch_on(&mut world, beacon);
    assert_eq!(world.blips(Some(OWN_GRID), DVec2::ZERO, 1000.0).len(), 2);
    // Enemy radar sees only the beacon.
    assert_eq!(world.blips(Some(ENEMY_GRID), DVec2::ZERO, 1000.0).len(), 1);
    // Out of range.
    assert!(world.blips(Some(OWN_GRID), DVec2::new(5000.0, 0.0), 1000.0).is_empty());

    assert!(world.is_visible_from(beacon, None));
    assert!(!world.is_visible_from(picket, None));
}
