//! The shield world: owns every shield and console and runs the tick.
//!
//! All inputs go through the [`CommandQueue`] and are applied at the start
//! of the next [`ShieldWorld::step`], which then runs the remaining phases
//! in a fixed order:
//!
//! 1. **Inputs** -- console messages, damage, power, anchoring, entries.
//!    Shields that were switched off, lost power or lost their anchor have
//!    their effects shut down.
//! 2. **Surge** -- decay every shield's surge.
//! 3. **Power** -- recompute draw and the overload flag.
//! 4. **Effects** -- deliver entries, then periodic updates for enabled
//!    shields. Geometry changed by effects re-runs the overload check.
//! 5. **Export** -- push a snapshot to every console whose view changed.
//! 6. **Bookkeeping** -- advance the clock and compute the state hash.

use glam::DVec2;
use slotmap::SlotMap;

use crate::binding::{BindingTable, Rebind};
use crate::command_queue::{CommandQueue, ShieldCommand};
use crate::config::ConfigError;
use crate::console::{ConsoleClient, ConsoleMessage, ShieldStateSnapshot};
use crate::effect::{EffectContext, EffectFailure, EffectRegistry, NullTargets, TargetWorld};
use crate::event::{IgnoreReason, ShieldEvent};
use crate::id::{ConsoleId, GridId, ShieldId, TargetId};
use crate::shield::{GeometryUpdate, OverloadTransition, ShieldState};
use crate::sim::{SimState, StateHash, Ticks};
use crate::visibility::{self, RadarBlip};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    #[error("invalid shield config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("shield {0:?} not found")]
    UnknownShield(ShieldId),

    #[error("console {0:?} not found")]
    UnknownConsole(ConsoleId),
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ShieldEntity {
    state: ShieldState,
    effects: EffectRegistry,
}

impl ShieldEntity {
    /// Split into an effect context and the registry that runs against it.
    fn dispatch<'a, R>(
        &'a mut self,
        id: ShieldId,
        targets: &'a mut dyn TargetWorld,
        tick: Ticks,
        f: impl FnOnce(&mut EffectRegistry, &mut EffectContext<'_>) -> R,
    ) -> R {
        let mut ctx = EffectContext {
            shield_id: id,
            shield: &mut self.state,
            targets,
            tick,
        };
        f(&mut self.effects, &mut ctx)
    }
}

#[derive(Debug, Default)]
struct ConsoleEntry {
    /// Last snapshot pushed. `None` means the console was told it is
    /// unbound (or nothing was pushed yet).
    last_push: Option<ShieldStateSnapshot>,
}

/// A snapshot delivered to one console. `snapshot` is `None` when the
/// console has just become unbound.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolePush {
    pub console: ConsoleId,
    pub snapshot: Option<ShieldStateSnapshot>,
}

/// Everything one call to [`ShieldWorld::step`] produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// The tick that was processed.
    pub tick: Ticks,
    pub events: Vec<ShieldEvent>,
    pub snapshots: Vec<ConsolePush>,
    /// Effect failures since the previous report, including any from
    /// spawning or despawning between ticks.
    pub effect_failures: Vec<EffectFailure>,
}

// ---------------------------------------------------------------------------
// ShieldWorld
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ShieldWorld {
    shields: SlotMap<ShieldId, ShieldEntity>,
    consoles: SlotMap<ConsoleId, ConsoleEntry>,
    bindings: BindingTable,
    queue: CommandQueue,
    targets: Box<dyn TargetWorld>,
    pub sim_state: SimState,
    /// Target entries collected during the input phase.
    entries: Vec<(ShieldId, TargetId)>,
    /// Failures raised outside `step` (spawn, despawn).
    pending_failures: Vec<EffectFailure>,
    last_state_hash: u64,
}

impl Default for ShieldWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ShieldWorld {
    /// World with no external targets.
    pub fn new() -> Self {
        Self::with_targets(Box::new(NullTargets))
    }

    pub fn with_targets(targets: Box<dyn TargetWorld>) -> Self {
        Self {
            shields: SlotMap::with_key(),
            consoles: SlotMap::with_key(),
            bindings: BindingTable::new(),
            queue: CommandQueue::new(),
            targets,
            sim_state: SimState::new(),
            entries: Vec::new(),
            pending_failures: Vec::new(),
            last_state_hash: 0,
        }
    }

    /// Retain up to `max_history` executed commands for replay/debugging.
    pub fn with_command_history(mut self, max_history: usize) -> Self {
        self.queue = CommandQueue::with_max_history(max_history);
        self
    }

    // -----------------------------------------------------------------------
    // Shields
    // -----------------------------------------------------------------------

    /// Add a shield and run its effects' `on_init` in registration order.
    pub fn spawn_shield(
        &mut self,
        state: ShieldState,
        effects: EffectRegistry,
    ) -> Result<ShieldId, WorldError> {
        state.config().validate()?;

        let id = self.shields.insert(ShieldEntity { state, effects });
        let tick = self.sim_state.tick;
        if let Some(entity) = self.shields.get_mut(id) {
            entity.dispatch(id, self.targets.as_mut(), tick, |effects, ctx| {
                effects.dispatch_init(ctx)
            });
            self.pending_failures
                .extend(entity.effects.take_unreported());
        }

        tracing::debug!(shield = ?id, tick, "shield spawned");
        Ok(id)
    }

    /// Run `on_shutdown` in reverse registration order, release the
    /// binding, and remove the shield.
    pub fn despawn_shield(&mut self, id: ShieldId) -> Result<ShieldState, WorldError> {
        let tick = self.sim_state.tick;
        let entity = self
            .shields
            .get_mut(id)
            .ok_or(WorldError::UnknownShield(id))?;
        entity.dispatch(id, self.targets.as_mut(), tick, |effects, ctx| {
            effects.dispatch_shutdown(ctx)
        });
        self.pending_failures
            .extend(entity.effects.take_unreported());

        self.bindings.unbind_shield(id);
        let entity = self
            .shields
            .remove(id)
            .ok_or(WorldError::UnknownShield(id))?;

        tracing::debug!(shield = ?id, tick, "shield despawned");
        Ok(entity.state)
    }

    pub fn shield(&self, id: ShieldId) -> Option<&ShieldState> {
        self.shields.get(id).map(|e| &e.state)
    }

    /// Direct access for host-owned fields (position, rotation, grid).
    pub fn shield_mut(&mut self, id: ShieldId) -> Option<&mut ShieldState> {
        self.shields.get_mut(id).map(|e| &mut e.state)
    }

    pub fn effects(&self, id: ShieldId) -> Option<&EffectRegistry> {
        self.shields.get(id).map(|e| &e.effects)
    }

    pub fn effects_mut(&mut self, id: ShieldId) -> Option<&mut EffectRegistry> {
        self.shields.get_mut(id).map(|e| &mut e.effects)
    }

    pub fn shield_ids(&self) -> impl Iterator<Item = ShieldId> + '_ {
        self.shields.keys()
    }

    pub fn shield_count(&self) -> usize {
        self.shields.len()
    }

    // -----------------------------------------------------------------------
    // Consoles and binding
    // -----------------------------------------------------------------------

    pub fn add_console(&mut self) -> ConsoleId {
        self.consoles.insert(ConsoleEntry::default())
    }

    pub fn remove_console(&mut self, console: ConsoleId) -> Result<(), WorldError> {
        self.consoles
            .remove(console)
            .ok_or(WorldError::UnknownConsole(console))?;
        self.bindings.unbind_console(console);
        Ok(())
    }

    pub fn console_count(&self) -> usize {
        self.consoles.len()
    }

    /// Bind `console` to `shield`, releasing either side's previous partner.
    pub fn bind(&mut self, console: ConsoleId, shield: ShieldId) -> Result<Rebind, WorldError> {
        if !self.consoles.contains_key(console) {
            return Err(WorldError::UnknownConsole(console));
        }
        if !self.shields.contains_key(shield) {
            return Err(WorldError::UnknownShield(shield));
        }
        let rebind = self.bindings.bind(console, shield);
        tracing::debug!(?console, ?shield, "console bound");
        Ok(rebind)
    }

    pub fn unbind_console(&mut self, console: ConsoleId) -> Result<Option<ShieldId>, WorldError> {
        if !self.consoles.contains_key(console) {
            return Err(WorldError::UnknownConsole(console));
        }
        Ok(self.bindings.unbind_console(console))
    }

    pub fn bound_shield(&self, console: ConsoleId) -> Option<ShieldId> {
        self.bindings.shield_of(console)
    }

    pub fn bound_console(&self, shield: ShieldId) -> Option<ConsoleId> {
        self.bindings.console_of(shield)
    }

    /// Current view for `console`, `None` if it is unbound.
    pub fn snapshot(&self, console: ConsoleId) -> Option<ShieldStateSnapshot> {
        let shield_id = self.bindings.shield_of(console)?;
        let entity = self.shields.get(shield_id)?;
        Some(ShieldStateSnapshot::project(
            shield_id,
            &entity.state,
            Some(console),
        ))
    }

    /// A client for `console`, rate-limited by its bound shield's
    /// configured cooldown. `None` if the console is unbound.
    pub fn console_client(&self, console: ConsoleId) -> Option<ConsoleClient> {
        let shield = self.bindings.shield_of(console)?;
        let entity = self.shields.get(shield)?;
        Some(ConsoleClient::for_shield(console, entity.state.config()))
    }

    // -----------------------------------------------------------------------
    // Inputs
    // -----------------------------------------------------------------------

    /// Queue an input for the next tick.
    pub fn submit(&mut self, command: ShieldCommand) {
        self.queue.push(command);
    }

    pub fn submit_batch(&mut self, commands: impl IntoIterator<Item = ShieldCommand>) {
        self.queue.push_batch(commands);
    }

    /// Queue a message received from `console`.
    pub fn submit_console(&mut self, console: ConsoleId, message: ConsoleMessage) {
        self.queue.push(ShieldCommand::Console { console, message });
    }

    pub fn pending_commands(&self) -> usize {
        self.queue.pending_count()
    }

    pub fn command_history(&self) -> &[(Ticks, ShieldCommand)] {
        self.queue.history()
    }

    // -----------------------------------------------------------------------
    // Targets
    // -----------------------------------------------------------------------

    pub fn targets(&self) -> &dyn TargetWorld {
        self.targets.as_ref()
    }

    pub fn targets_mut(&mut self) -> &mut dyn TargetWorld {
        self.targets.as_mut()
    }

    /// Downcast the target world to its concrete type.
    pub fn targets_as<T: 'static>(&self) -> Option<&T> {
        self.targets.as_any().downcast_ref::<T>()
    }

    pub fn targets_as_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.targets.as_any_mut().downcast_mut::<T>()
    }

    // -----------------------------------------------------------------------
    // Visibility export
    // -----------------------------------------------------------------------

    /// `false` for unknown shields.
    pub fn is_visible_from(&self, shield: ShieldId, observer_grid: Option<GridId>) -> bool {
        self.shield(shield)
            .is_some_and(|s| visibility::is_visible_from(s, observer_grid))
    }

    /// Blips a radar on `observer_grid` at `observer_position` should draw.
    pub fn blips(
        &self,
        observer_grid: Option<GridId>,
        observer_position: DVec2,
        max_range: f64,
    ) -> Vec<RadarBlip> {
        self.shields
            .values()
            .map(|e| &e.state)
            .filter(|s| visibility::is_visible_from(s, observer_grid))
            .filter(|s| s.position.distance(observer_position) <= max_range)
            .filter_map(visibility::blip)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Clock and hashing
    // -----------------------------------------------------------------------

    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    /// State hash computed at the end of the last step.
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    // -----------------------------------------------------------------------
    // Step
    // -----------------------------------------------------------------------

    /// Advance the world by `dt` seconds. Non-finite or negative `dt`
    /// counts as zero.
    pub fn step(&mut self, dt: f64) -> TickReport {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        let mut report = TickReport {
            tick: self.sim_state.tick,
            effect_failures: std::mem::take(&mut self.pending_failures),
            ..TickReport::default()
        };

        self.phase_inputs(&mut report);
        self.phase_surge(dt, &mut report);
        self.phase_power(&mut report);
        self.phase_effects(dt, &mut report);
        self.phase_export(&mut report);
        self.phase_bookkeeping(dt);

        report
    }

    // -----------------------------------------------------------------------
    // Phase 1: Inputs
    // -----------------------------------------------------------------------

    fn phase_inputs(&mut self, report: &mut TickReport) {
        let tick = self.sim_state.tick;
        for command in self.queue.drain(tick) {
            match command {
                ShieldCommand::Console { console, message } => {
                    self.apply_console(console, message, report);
                }
                ShieldCommand::Damage { shield, points } => {
                    let Some(state) = self.shield_state_mut(shield) else {
                        continue;
                    };
                    let was_surging = state.surge().is_surging();
                    if state.on_damage(points) > 0.0 && !was_surging {
                        let power = state.surge().current_power();
                        tracing::debug!(?shield, power, "surge started");
                        report.events.push(ShieldEvent::SurgeStarted {
                            shield,
                            power,
                            tick,
                        });
                    }
                }
                ShieldCommand::SetPowered { shield, powered } => {
                    let Some(state) = self.shield_state_mut(shield) else {
                        continue;
                    };
                    if state.set_powered(powered) {
                        report.events.push(ShieldEvent::PowerChanged {
                            shield,
                            powered,
                            tick,
                        });
                    }
                }
                ShieldCommand::SetAnchored { shield, anchored } => {
                    let Some(state) = self.shield_state_mut(shield) else {
                        continue;
                    };
                    let (was_enabled, was_powered) = (state.enabled(), state.powered());
                    if !state.set_anchored(anchored) {
                        continue;
                    }
                    report.events.push(ShieldEvent::AnchorChanged {
                        shield,
                        anchored,
                        tick,
                    });
                    if was_enabled && !state.enabled() {
                        report.events.push(ShieldEvent::Toggled {
                            shield,
                            enabled: false,
                            tick,
                        });
                    }
                    if was_powered && !state.powered() {
                        report.events.push(ShieldEvent::PowerChanged {
                            shield,
                            powered: false,
                            tick,
                        });
                    }
                }
                ShieldCommand::TargetEnter { shield, target } => {
                    if self.shields.contains_key(shield) {
                        self.entries.push((shield, target));
                    } else {
                        tracing::debug!(?shield, ?target, "entry for unknown shield dropped");
                    }
                }
            }
        }

        // Switching off, losing power or losing the anchor shuts the
        // shield's effects down, once per shield per tick.
        let mut deactivated: Vec<ShieldId> = Vec::new();
        for event in &report.events {
            let shield = match *event {
                ShieldEvent::Toggled {
                    shield,
                    enabled: false,
                    ..
                }
                | ShieldEvent::PowerChanged {
                    shield,
                    powered: false,
                    ..
                }
                | ShieldEvent::AnchorChanged {
                    shield,
                    anchored: false,
                    ..
                } => shield,
                _ => continue,
            };
            if !deactivated.contains(&shield) {
                deactivated.push(shield);
            }
        }
        for shield in deactivated {
            self.shut_down_effects(shield, report);
        }
    }

    /// Run `on_shutdown` in reverse registration order and report failures.
    fn shut_down_effects(&mut self, shield: ShieldId, report: &mut TickReport) {
        let tick = self.sim_state.tick;
        let Some(entity) = self.shields.get_mut(shield) else {
            return;
        };
        entity.dispatch(shield, self.targets.as_mut(), tick, |effects, ctx| {
            effects.dispatch_shutdown(ctx)
        });
        report
            .effect_failures
            .extend(entity.effects.take_unreported());
        tracing::debug!(?shield, tick, "shield effects shut down");
    }

    fn shield_state_mut(&mut self, shield: ShieldId) -> Option<&mut ShieldState> {
        let state = self.shields.get_mut(shield).map(|e| &mut e.state);
        if state.is_none() {
            tracing::debug!(?shield, "command for unknown shield dropped");
        }
        state
    }

    fn apply_console(
        &mut self,
        console: ConsoleId,
        message: ConsoleMessage,
        report: &mut TickReport,
    ) {
        let tick = self.sim_state.tick;
        let mut ignore = |reason: IgnoreReason| {
            tracing::debug!(?console, ?reason, ?message, "console command ignored");
            report.events.push(ShieldEvent::CommandIgnored {
                console,
                reason,
                tick,
            });
        };

        if !self.consoles.contains_key(console) {
            ignore(IgnoreReason::UnknownConsole);
            return;
        }
        let Some(shield) = self.bindings.shield_of(console) else {
            ignore(IgnoreReason::Unbound);
            return;
        };
        let Some(entity) = self.shields.get_mut(shield) else {
            ignore(IgnoreReason::Unbound);
            return;
        };
        let state = &mut entity.state;

        match message {
            ConsoleMessage::ToggleShield => {
                if !state.enabled() && !state.anchored() {
                    ignore(IgnoreReason::Unanchored);
                    return;
                }
                let enabled = state.toggle();
                report.events.push(ShieldEvent::Toggled {
                    shield,
                    enabled,
                    tick,
                });
            }
            ConsoleMessage::ChangeParameters {
                angle,
                width,
                radius,
            } => {
                let update = GeometryUpdate {
                    angle,
                    width,
                    radius,
                };
                if state.set_geometry(update) {
                    report
                        .events
                        .push(ShieldEvent::GeometryChanged { shield, tick });
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase 2: Surge
    // -----------------------------------------------------------------------

    fn phase_surge(&mut self, dt: f64, report: &mut TickReport) {
        let tick = self.sim_state.tick;
        for (shield, entity) in &mut self.shields {
            if entity.state.decay_surge(dt) {
                tracing::debug!(?shield, "surge ended");
                report.events.push(ShieldEvent::SurgeEnded { shield, tick });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase 3: Power
    // -----------------------------------------------------------------------

    fn phase_power(&mut self, report: &mut TickReport) {
        let tick = self.sim_state.tick;
        for (shield, entity) in &mut self.shields {
            if let Some(event) = reevaluate_overload(shield, &mut entity.state, tick) {
                report.events.push(event);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase 4: Effects
    // -----------------------------------------------------------------------

    fn phase_effects(&mut self, dt: f64, report: &mut TickReport) {
        let tick = self.sim_state.tick;
        let entries = std::mem::take(&mut self.entries);

        for (shield, entity) in &mut self.shields {
            let geometry = (entity.state.angle(), entity.state.width(), entity.state.radius());

            for &(_, target) in entries.iter().filter(|(s, _)| *s == shield) {
                if !entity.state.can_work() {
                    tracing::trace!(?shield, ?target, "entry ignored, shield not projecting");
                    continue;
                }
                entity.dispatch(shield, self.targets.as_mut(), tick, |effects, ctx| {
                    effects.dispatch_enter(ctx, target)
                });
            }

            if entity.state.enabled() {
                entity.dispatch(shield, self.targets.as_mut(), tick, |effects, ctx| {
                    effects.dispatch_update(ctx, dt)
                });
            }

            if geometry != (entity.state.angle(), entity.state.width(), entity.state.radius()) {
                report
                    .events
                    .push(ShieldEvent::GeometryChanged { shield, tick });
                // Effects may have moved the draw.
                if let Some(event) = reevaluate_overload(shield, &mut entity.state, tick) {
                    report.events.push(event);
                }
            }
            report
                .effect_failures
                .extend(entity.effects.take_unreported());
        }
    }

    // -----------------------------------------------------------------------
    // Phase 5: Export
    // -----------------------------------------------------------------------

    fn phase_export(&mut self, report: &mut TickReport) {
        for (console, entry) in &mut self.consoles {
            let current = self.bindings.shield_of(console).and_then(|shield| {
                self.shields.get(shield).map(|e| {
                    ShieldStateSnapshot::project(shield, &e.state, Some(console))
                })
            });
            if current != entry.last_push {
                entry.last_push = current.clone();
                report.snapshots.push(ConsolePush {
                    console,
                    snapshot: current,
                });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase 6: Bookkeeping
    // -----------------------------------------------------------------------

    fn phase_bookkeeping(&mut self, dt: f64) {
        self.sim_state.advance(dt);
        self.last_state_hash = self.compute_state_hash();
    }

    fn compute_state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();
        hasher.write_u64(self.sim_state.tick);

        // SlotMap iteration order is deterministic for identical histories.
        for entity in self.shields.values() {
            let s = &entity.state;
            hasher.write_bool(s.enabled());
            hasher.write_bool(s.powered());
            hasher.write_bool(s.overloaded());
            hasher.write_bool(s.anchored());
            hasher.write_f64(s.angle().degrees());
            hasher.write_f64(s.width().degrees());
            hasher.write_u32(s.radius());
            hasher.write_f64(s.surge().current_power());
            hasher.write_f64(s.surge().time_remaining());
        }

        hasher.finish()
    }
}

/// Run the overload hysteresis check and describe any transition.
fn reevaluate_overload(shield: ShieldId, state: &mut ShieldState, tick: Ticks) -> Option<ShieldEvent> {
    let transition = state.update_overload()?;
    let draw = state.desired_draw();
    Some(match transition {
        OverloadTransition::Tripped => {
            tracing::debug!(?shield, draw, "shield overloaded");
            ShieldEvent::Overloaded { shield, draw, tick }
        }
        OverloadTransition::Cleared => {
            tracing::debug!(?shield, draw, "shield overload cleared");
            ShieldEvent::OverloadCleared { shield, draw, tick }
        }
    })
}

// ===========================================================================
// Tests
// ===========================================================================
