//! Point-in-sector tests for shield coverage.

use glam::DVec2;

use crate::angle::{Angle, FULL_TURN};

/// Slack added to the radius so targets grazing the edge still count.
pub const RADIUS_TOLERANCE: f64 = 0.1;

/// Whether `point` is closer to `center` than `radius` plus the tolerance.
pub fn within_radius(center: DVec2, radius: u32, point: DVec2) -> bool {
    center.distance(point) < f64::from(radius) + RADIUS_TOLERANCE
}

/// Whether `point` lies in the sector projected from `center`.
///
/// The sector is centred on `angle`, measured relative to `rotation`
/// (radians, the mounting's world rotation), and spans `width / 2` to
/// each side. A width of a full turn or more skips the bearing test.
pub fn contains(
    center: DVec2,
    rotation: f64,
    angle: Angle,
    width: Angle,
    radius: u32,
    point: DVec2,
) -> bool {
    if !within_radius(center, radius, point) {
        return false;
    }
    if width.degrees() >= FULL_TURN {
        return true;
    }
    let offset = point - center;
    if offset == DVec2::ZERO {
        return true;
    }

    let bearing = Angle::from_radians(offset.y.atan2(offset.x) - rotation);
    let start = Angle::from_degrees(angle.degrees() - width.degrees() / 2.0);
    bearing.in_sector(start, width)
}
