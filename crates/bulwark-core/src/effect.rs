//! Effect hooks: pluggable behaviour attached to a shield.
//!
//! Effects implement the [`Effect`] trait and are stored in an
//! [`EffectRegistry`] in registration order. The registry fans each lifecycle
//! call out to every effect, records failures, and keeps going: one broken
//! effect never stops the others or the tick.
//!
//! Effects act on the world only through the [`EffectContext`] they are
//! handed: the shield's own state and the host's [`TargetWorld`].

use glam::DVec2;

use crate::id::{GridId, ShieldId, TargetId};
use crate::shield::ShieldState;
use crate::sim::Ticks;

// ---------------------------------------------------------------------------
// TargetWorld -- the host's entities, as seen by effects
// ---------------------------------------------------------------------------

/// Access to external entities (projectiles, ships) owned by the host game.
///
/// Queries about unknown targets return `None`/`false`; mutations of unknown
/// targets are ignored.
pub trait TargetWorld: std::fmt::Debug {
    fn exists(&self, target: TargetId) -> bool;

    /// Whether the target is a weapon projectile.
    fn is_projectile(&self, target: TargetId) -> bool;

    /// Grid the target is currently parented to.
    fn grid(&self, target: TargetId) -> Option<GridId>;

    /// Grid of whoever fired the target, if it is a projectile with a
    /// known shooter.
    fn shooter_grid(&self, target: TargetId) -> Option<GridId>;

    fn position(&self, target: TargetId) -> Option<DVec2>;

    fn velocity(&self, target: TargetId) -> Option<DVec2>;

    fn set_velocity(&mut self, target: TargetId, velocity: DVec2);

    /// Schedule the target for deletion by the host.
    fn queue_delete(&mut self, target: TargetId);

    fn as_any(&self) -> &dyn std::any::Any;

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

/// A target world with no entities in it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTargets;

impl TargetWorld for NullTargets {
    fn exists(&self, _target: TargetId) -> bool {
        false
    }

    fn is_projectile(&self, _target: TargetId) -> bool {
        false
    }

    fn grid(&self, _target: TargetId) -> Option<GridId> {
        None
    }

    fn shooter_grid(&self, _target: TargetId) -> Option<GridId> {
        None
    }

    fn position(&self, _target: TargetId) -> Option<DVec2> {
        None
    }

    fn velocity(&self, _target: TargetId) -> Option<DVec2> {
        None
    }

    fn set_velocity(&mut self, _target: TargetId, _velocity: DVec2) {}

    fn queue_delete(&mut self, _target: TargetId) {}

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Effect trait
// ---------------------------------------------------------------------------

/// Context handed to every effect callback.
pub struct EffectContext<'a> {
    pub shield_id: ShieldId,
    /// The shield the effect is attached to. Writes are visible to effects
    /// invoked later in the same dispatch.
    pub shield: &'a mut ShieldState,
    pub targets: &'a mut dyn TargetWorld,
    pub tick: Ticks,
}

/// A behaviour unit attached to a shield.
///
/// All four lifecycle callbacks default to no-ops, so effects only override
/// what they need.
pub trait Effect: std::fmt::Debug {
    /// Human-readable name, used in diagnostics.
    fn name(&self) -> &str;

    /// Called once when the owning shield is created.
    fn on_init(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        let _ = ctx;
        Ok(())
    }

    /// Called once before the owning shield is destroyed.
    fn on_shutdown(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        let _ = ctx;
        Ok(())
    }

    /// Called every tick while the shield is enabled.
    fn on_update(&mut self, ctx: &mut EffectContext<'_>, dt: f64) -> Result<(), EffectError> {
        let _ = (ctx, dt);
        Ok(())
    }

    /// Called when a target enters the covered sector.
    fn on_enter(
        &mut self,
        ctx: &mut EffectContext<'_>,
        target: TargetId,
    ) -> Result<(), EffectError> {
        let _ = (ctx, target);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any;

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

// ---------------------------------------------------------------------------
// Errors and diagnostics
// ---------------------------------------------------------------------------

/// Errors an effect callback may report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EffectError {
    #[error("invalid parameter {name}: {detail}")]
    InvalidParameter { name: &'static str, detail: String },

    #[error("target {0:?} not found")]
    MissingTarget(TargetId),

    #[error("{0}")]
    Failed(String),
}

/// Lifecycle point at which an effect was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    Init,
    Shutdown,
    Update,
    Enter,
}

/// A recorded effect failure.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectFailure {
    pub shield: ShieldId,
    pub effect: String,
    pub hook: Hook,
    pub tick: Ticks,
    pub error: EffectError,
}

/// Outcome of one fan-out call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub invoked: usize,
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// EffectRegistry
// ---------------------------------------------------------------------------

const DEFAULT_MAX_FAILURES: usize = 64;

/// Ordered effects of one shield plus a bounded log of their failures.
#[derive(Debug)]
pub struct EffectRegistry {
    effects: Vec<Box<dyn Effect>>,
    failures: Vec<EffectFailure>,
    /// Failures not yet collected by [`take_unreported`](Self::take_unreported).
    unreported: Vec<EffectFailure>,
    max_failures: usize,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self {
            effects: Vec::new(),
            failures: Vec::new(),
            unreported: Vec::new(),
            max_failures: DEFAULT_MAX_FAILURES,
        }
    }

    /// Registry retaining at most `max_failures` failure records (oldest
    /// dropped first).
    pub fn with_max_failures(max_failures: usize) -> Self {
        Self {
            max_failures,
            ..Self::new()
        }
    }

    pub fn from_effects(effects: Vec<Box<dyn Effect>>) -> Self {
        Self {
            effects,
            ..Self::new()
        }
    }

    pub fn register(&mut self, effect: Box<dyn Effect>) {
        self.effects.push(effect);
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Effect names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.effects.iter().map(|e| e.name()).collect()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Effect> {
        self.effects.get(index).map(|e| e.as_ref())
    }

    /// First effect of concrete type `T`.
    pub fn find<T: 'static>(&self) -> Option<&T> {
        self.effects.iter().find_map(|e| e.as_any().downcast_ref::<T>())
    }

    pub fn find_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.effects
            .iter_mut()
            .find_map(|e| e.as_any_mut().downcast_mut::<T>())
    }

    pub fn failures(&self) -> &[EffectFailure] {
        &self.failures
    }

    pub fn clear_failures(&mut self) {
        self.failures.clear();
    }

    /// Failures recorded since the last call, oldest first.
    pub fn take_unreported(&mut self) -> Vec<EffectFailure> {
        std::mem::take(&mut self.unreported)
    }

    // -----------------------------------------------------------------------
    // Fan-out
    // -----------------------------------------------------------------------

    /// Run `on_init` on every effect, in registration order.
    pub fn dispatch_init(&mut self, ctx: &mut EffectContext<'_>) -> DispatchReport {
        self.dispatch(ctx, Hook::Init, false, |effect, ctx| effect.on_init(ctx))
    }

    /// Run `on_shutdown` on every effect, in reverse registration order.
    pub fn dispatch_shutdown(&mut self, ctx: &mut EffectContext<'_>) -> DispatchReport {
        self.dispatch(ctx, Hook::Shutdown, true, |effect, ctx| effect.on_shutdown(ctx))
    }

    pub fn dispatch_update(&mut self, ctx: &mut EffectContext<'_>, dt: f64) -> DispatchReport {
        self.dispatch(ctx, Hook::Update, false, |effect, ctx| effect.on_update(ctx, dt))
    }

    pub fn dispatch_enter(
        &mut self,
        ctx: &mut EffectContext<'_>,
        target: TargetId,
    ) -> DispatchReport {
        self.dispatch(ctx, Hook::Enter, false, |effect, ctx| effect.on_enter(ctx, target))
    }

    fn dispatch<F>(
        &mut self,
        ctx: &mut EffectContext<'_>,
        hook: Hook,
        reverse: bool,
        mut call: F,
    ) -> DispatchReport
    where
        F: FnMut(&mut dyn Effect, &mut EffectContext<'_>) -> Result<(), EffectError>,
    {
        let mut report = DispatchReport::default();
        let count = self.effects.len();

        for step in 0..count {
            let index = if reverse { count - 1 - step } else { step };
            let effect = self.effects[index].as_mut();
            report.invoked += 1;

            if let Err(error) = call(&mut *effect, &mut *ctx) {
                report.failed += 1;
                tracing::warn!(
                    shield = ?ctx.shield_id,
                    effect = effect.name(),
                    ?hook,
                    %error,
                    "shield effect failed"
                );
                let failure = EffectFailure {
                    shield: ctx.shield_id,
                    effect: effect.name().to_string(),
                    hook,
                    tick: ctx.tick,
                    error,
                };
                self.record_failure(failure);
            }
        }

        report
    }

    fn record_failure(&mut self, failure: EffectFailure) {
        if self.max_failures == 0 {
            return;
        }
        for log in [&mut self.failures, &mut self.unreported] {
            log.push(failure.clone());
            let excess = log.len().saturating_sub(self.max_failures);
            if excess > 0 {
                log.drain(..excess);
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
