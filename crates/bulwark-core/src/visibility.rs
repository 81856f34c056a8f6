//! Read-only export for radar aggregation.
//!
//! Nothing here mutates shield state. Callers must query between ticks so
//! they never observe a shield mid-update.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::id::GridId;
use crate::shield::{Color, ShieldState};

/// What a radar draws for one shield.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadarBlip {
    pub position: DVec2,
    /// Drawn size; the shield radius.
    pub scale: f64,
    pub color: Color,
}

/// Whether a radar on `observer_grid` may see the shield.
///
/// Shields are visible within their own grid only, unless they opt in to
/// `visible_from_other_grids`. Ungridded shields need the opt-in.
pub fn is_visible_from(shield: &ShieldState, observer_grid: Option<GridId>) -> bool {
    if shield.visible_from_other_grids {
        return true;
    }
    match (shield.grid, observer_grid) {
        (Some(own), Some(observer)) => own == observer,
        _ => false,
    }
}

/// Blip for a projecting shield, `None` while it cannot work.
pub fn blip(shield: &ShieldState) -> Option<RadarBlip> {
    shield.can_work().then(|| RadarBlip {
        position: shield.position,
        scale: f64::from(shield.radius()),
        color: shield.color,
    })
}
