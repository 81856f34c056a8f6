//! Shield geometry and power model.
//!
//! A shield projects a sector of `width` degrees centred on `angle`, out to
//! `radius` units. Its power demand is the sector area times the configured
//! consumption coefficient, plus any damage surge. Drawing more than
//! `power_draw_limit` trips the shield into overload until the draw falls to
//! `reset_power` or below.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::angle::Angle;
use crate::config::ShieldConfig;
use crate::id::GridId;
use crate::surge::SurgeTracker;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// Display colour. Carries no simulation meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0x4f, 0xc3, 0xf7)
    }
}

// ---------------------------------------------------------------------------
// Geometry input
// ---------------------------------------------------------------------------

/// A partial geometry update. Absent fields are left unchanged.
///
/// Radius is signed so that out-of-range requests (including negative ones)
/// can be represented and clamped rather than rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryUpdate {
    pub angle: Option<Angle>,
    pub width: Option<Angle>,
    pub radius: Option<i64>,
}

impl GeometryUpdate {
    pub fn is_empty(&self) -> bool {
        self.angle.is_none() && self.width.is_none() && self.radius.is_none()
    }
}

/// Overload transitions reported by [`ShieldState::update_overload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverloadTransition {
    Tripped,
    Cleared,
}

// ---------------------------------------------------------------------------
// ShieldState
// ---------------------------------------------------------------------------

/// Authoritative state of one shield.
///
/// The console binding is not stored here; it lives in the world's
/// [`BindingTable`](crate::binding::BindingTable) so both sides stay in sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShieldState {
    pub(crate) config: ShieldConfig,
    pub(crate) enabled: bool,
    pub(crate) powered: bool,
    pub(crate) overloaded: bool,
    pub(crate) anchored: bool,
    pub(crate) angle: Angle,
    pub(crate) width: Angle,
    pub(crate) radius: u32,
    pub color: Color,
    pub(crate) surge: SurgeTracker,
    /// Grid container the shield is mounted on, if any.
    pub grid: Option<GridId>,
    /// World position of the shield's projection centre.
    pub position: DVec2,
    /// World rotation of the mounting grid, in radians.
    pub rotation: f64,
    /// Show on radars regardless of grid membership.
    pub visible_from_other_grids: bool,
}

impl ShieldState {
    /// Create a disabled, unpowered, anchored full-width shield of radius 0.
    pub fn new(config: ShieldConfig) -> Self {
        let width = config.max_width;
        Self {
            config,
            enabled: false,
            powered: false,
            overloaded: false,
            anchored: true,
            angle: Angle::ZERO,
            width,
            radius: 0,
            color: Color::default(),
            surge: SurgeTracker::new(),
            grid: None,
            position: DVec2::ZERO,
            rotation: 0.0,
            visible_from_other_grids: false,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &ShieldConfig {
        &self.config
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn powered(&self) -> bool {
        self.powered
    }

    pub fn overloaded(&self) -> bool {
        self.overloaded
    }

    pub fn anchored(&self) -> bool {
        self.anchored
    }

    pub fn angle(&self) -> Angle {
        self.angle
    }

    pub fn width(&self) -> Angle {
        self.width
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn surge(&self) -> &SurgeTracker {
        &self.surge
    }

    /// Whether the shield is actually projecting.
    pub fn can_work(&self) -> bool {
        self.enabled && self.powered && !self.overloaded
    }

    // -----------------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------------

    /// Apply a partial geometry update, clamping every present field into
    /// range. Returns `true` if anything changed.
    pub fn set_geometry(&mut self, update: GeometryUpdate) -> bool {
        let before = (self.angle, self.width, self.radius);

        if let Some(angle) = update.angle {
            self.angle = angle.normalized();
        }
        if let Some(width) = update.width {
            self.width = width.clamped(self.config.max_width);
        }
        if let Some(radius) = update.radius {
            self.radius = radius.clamp(0, i64::from(self.config.max_radius)) as u32;
        }

        before != (self.angle, self.width, self.radius)
    }

    /// Whether a world-space point lies inside the projected sector. A
    /// full-circle shield only checks the distance.
    pub fn covers(&self, point: DVec2) -> bool {
        if self.config.is_full_circle(self.width) {
            return crate::sector::within_radius(self.position, self.radius, point);
        }
        crate::sector::contains(
            self.position,
            self.rotation,
            self.angle,
            self.width,
            self.radius,
            point,
        )
    }

    /// Flip operator intent. An unanchored shield cannot be switched on.
    /// Returns the new `enabled` value.
    pub fn toggle(&mut self) -> bool {
        if !self.enabled && !self.anchored {
            return false;
        }
        self.enabled = !self.enabled;
        self.enabled
    }

    pub(crate) fn set_powered(&mut self, powered: bool) -> bool {
        let changed = self.powered != powered;
        self.powered = powered;
        changed
    }

    /// Unanchoring forces the shield off and unpowered.
    pub(crate) fn set_anchored(&mut self, anchored: bool) -> bool {
        let changed = self.anchored != anchored;
        self.anchored = anchored;
        if !anchored {
            self.enabled = false;
            self.powered = false;
        }
        changed
    }

    // -----------------------------------------------------------------------
    // Power
    // -----------------------------------------------------------------------

    /// Area of the covered sector.
    pub fn sector_area(&self) -> f64 {
        let r = f64::from(self.radius);
        r * r * (self.width.degrees() / 360.0) * std::f64::consts::PI
    }

    /// Instantaneous power demand in whole watts. Zero when disabled.
    pub fn desired_draw(&self) -> u64 {
        if !self.enabled {
            return 0;
        }
        let base = self.sector_area() * self.config.consumption_per_unit_area;
        let total = base + self.surge.current_power();
        if total.is_finite() && total > 0.0 {
            total.round() as u64
        } else {
            0
        }
    }

    /// Re-evaluate the overload flag against the hysteresis band.
    pub fn update_overload(&mut self) -> Option<OverloadTransition> {
        let draw = self.desired_draw() as f64;
        if !self.overloaded && draw > self.config.power_draw_limit {
            self.overloaded = true;
            Some(OverloadTransition::Tripped)
        } else if self.overloaded && draw <= self.config.reset_power {
            self.overloaded = false;
            Some(OverloadTransition::Cleared)
        } else {
            None
        }
    }

    /// Advance the surge decay. Returns `true` when the surge just ended.
    pub fn decay_surge(&mut self, dt: f64) -> bool {
        self.surge.decay(dt)
    }

    /// Apply absorbed damage to the surge tracker. Returns the watts added.
    pub fn on_damage(&mut self, points: f64) -> f64 {
        let (watt_per_point, duration) =
            (self.config.watt_per_point, self.config.damage_surge_duration);
        self.surge.on_damage(points, watt_per_point, duration)
    }
}
