//! Stock shield effects for the Bulwark shield simulation.
//!
//! Provides the projectile speed-change effect and [`EffectSpec`], the
//! data-driven description used to build effects from preset files.
//!
//! # Speed change
//!
//! When a projectile fired from another grid enters the shield, it is
//! either destroyed outright or slowed by `speed_modifier`. Slowed
//! projectiles can be tracked as "phasing": once they leave the covered
//! sector their original speed is restored. Shutting the shield down
//! restores every tracked projectile.

use std::collections::BTreeSet;

use bulwark_core::effect::{Effect, EffectContext, EffectError, EffectRegistry};
use bulwark_core::id::TargetId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Speed change configuration
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

/// Tunables for [`SpeedChangeEffect`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedChangeConfig {
    /// Multiplier applied to an entering target's velocity. Must be finite
    /// and non-zero so it can be undone.
    pub speed_modifier: f64,
    /// Only affect weapon projectiles.
    #[serde(default = "default_true")]
    pub projectiles_only: bool,
    /// Track slowed targets and restore them on exit.
    #[serde(default = "default_true")]
    pub projectile_phasing: bool,
    /// Delete affected targets instead of slowing them.
    #[serde(default = "default_true")]
    pub destroy_projectiles: bool,
}

impl SpeedChangeConfig {
    pub fn new(speed_modifier: f64) -> Self {
        Self {
            speed_modifier,
            projectiles_only: true,
            projectile_phasing: true,
            destroy_projectiles: true,
        }
    }

    pub fn validate(&self) -> Result<(), EffectError> {
        if !self.speed_modifier.is_finite() || self.speed_modifier == 0.0 {
            return Err(EffectError::InvalidParameter {
                name: "speed_modifier",
                detail: format!("must be finite and non-zero, got {}", self.speed_modifier),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Speed change effect
// ---------------------------------------------------------------------------

/// Slows or destroys hostile projectiles entering the shield.
#[derive(Debug, Clone)]
pub struct SpeedChangeEffect {
    config: SpeedChangeConfig,
    /// Targets currently slowed and waiting to be restored.
    tracked: BTreeSet<TargetId>,
}

impl SpeedChangeEffect {
    pub fn new(config: SpeedChangeConfig) -> Self {
        Self {
            config,
            tracked: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &SpeedChangeConfig {
        &self.config
    }

    /// Targets currently phasing through the shield.
    pub fn tracked(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.tracked.iter().copied()
    }

    pub fn is_phasing(&self, target: TargetId) -> bool {
        self.tracked.contains(&target)
    }

    /// Whether `target` should be affected at all: the right kind, and not
    /// fired from or flying within the shield's own grid.
    fn should_affect(&self, ctx: &EffectContext<'_>, target: TargetId) -> bool {
        if self.config.projectiles_only && !ctx.targets.is_projectile(target) {
            return false;
        }
        let Some(own_grid) = ctx.shield.grid else {
            return true;
        };
        let same_grid = ctx.targets.grid(target) == Some(own_grid)
            || ctx.targets.shooter_grid(target) == Some(own_grid);
        !same_grid
    }

    fn restore(&self, ctx: &mut EffectContext<'_>, target: TargetId) {
        if let Some(velocity) = ctx.targets.velocity(target) {
            ctx.targets
                .set_velocity(target, velocity / self.config.speed_modifier);
        }
    }
}

impl Effect for SpeedChangeEffect {
    fn name(&self) -> &str {
        "speed_change"
    }

    fn on_init(&mut self, _ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        self.config.validate()
    }

    fn on_shutdown(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        for target in std::mem::take(&mut self.tracked) {
            self.restore(ctx, target);
        }
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut EffectContext<'_>, _dt: f64) -> Result<(), EffectError> {
        if self.tracked.is_empty() {
            return Ok(());
        }

        let tracked: Vec<TargetId> = self.tracked.iter().copied().collect();
        for target in tracked {
            if !ctx.targets.exists(target) {
                self.tracked.remove(&target);
                continue;
            }
            let inside = ctx
                .targets
                .position(target)
                .is_some_and(|p| ctx.shield.covers(p));
            if !inside {
                self.restore(ctx, target);
                self.tracked.remove(&target);
                tracing::trace!(?target, "phasing target left shield, speed restored");
            }
        }
        Ok(())
    }

    fn on_enter(
        &mut self,
        ctx: &mut EffectContext<'_>,
        target: TargetId,
    ) -> Result<(), EffectError> {
        if !ctx.targets.exists(target) {
            return Ok(());
        }
        self.config.validate()?;
        if !self.should_affect(ctx, target) {
            return Ok(());
        }

        if self.config.destroy_projectiles {
            ctx.targets.queue_delete(target);
            tracing::trace!(?target, shield = ?ctx.shield_id, "projectile destroyed by shield");
            return Ok(());
        }

        // A target already phasing keeps its modified speed.
        if self.tracked.contains(&target) {
            return Ok(());
        }
        if self.config.projectile_phasing {
            self.tracked.insert(target);
        }
        let velocity = ctx
            .targets
            .velocity(target)
            .ok_or(EffectError::MissingTarget(target))?;
        ctx.targets
            .set_velocity(target, velocity * self.config.speed_modifier);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Data-driven construction
// ---------------------------------------------------------------------------

/// Serializable description of an effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectSpec {
    SpeedChange(SpeedChangeConfig),
}

impl EffectSpec {
    /// Validate and construct the effect.
    pub fn build(&self) -> Result<Box<dyn Effect>, EffectError> {
        match self {
            EffectSpec::SpeedChange(config) => {
                config.validate()?;
                Ok(Box::new(SpeedChangeEffect::new(config.clone())))
            }
        }
    }
}

/// Build a registry from specs, preserving their order.
pub fn build_registry(specs: &[EffectSpec]) -> Result<EffectRegistry, EffectError> {
    let effects = specs
        .iter()
        .map(EffectSpec::build)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(EffectRegistry::from_effects(effects))
}

// ===========================================================================
// Tests
// ===========================================================================
