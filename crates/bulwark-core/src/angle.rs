//! Angular values in degrees.
//!
//! Shield geometry is authored and displayed in degrees, so [`Angle`] stores
//! degrees directly and converts to radians only at the edges (sector math,
//! rendering).

use serde::{Deserialize, Serialize};

/// Degrees in a full turn.
pub const FULL_TURN: f64 = 360.0;

/// An angular value in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);
    pub const FULL: Angle = Angle(FULL_TURN);

    pub fn from_degrees(degrees: f64) -> Self {
        Self(degrees)
    }

    pub fn from_radians(radians: f64) -> Self {
        Self(radians.to_degrees())
    }

    pub fn degrees(self) -> f64 {
        self.0
    }

    pub fn radians(self) -> f64 {
        self.0.to_radians()
    }

    /// Wrap into `[0, 360)`. Non-finite input maps to zero.
    pub fn normalized(self) -> Self {
        if !self.0.is_finite() {
            return Self::ZERO;
        }
        let wrapped = self.0.rem_euclid(FULL_TURN);
        // rem_euclid can round up to exactly 360 for tiny negative inputs.
        if wrapped >= FULL_TURN {
            Self::ZERO
        } else {
            Self(wrapped)
        }
    }

    /// Clamp into `[0, max]`. NaN clamps to zero.
    pub fn clamped(self, max: Angle) -> Self {
        if self.0.is_nan() {
            return Self::ZERO;
        }
        Self(self.0.clamp(0.0, max.0.max(0.0)))
    }

    /// Whether `self` lies in the sector starting at `start` and sweeping
    /// `width` degrees counter-clockwise. Both `self` and `start` are
    /// normalised first.
    pub fn in_sector(self, start: Angle, width: Angle) -> bool {
        if width.0 >= FULL_TURN {
            return true;
        }
        let offset = (self.normalized().0 - start.normalized().0).rem_euclid(FULL_TURN);
        offset <= width.0
    }
}

impl std::ops::Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Angle) -> Angle {
        Angle(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Angle) -> Angle {
        Angle(self.0 - rhs.0)
    }
}

impl std::fmt::Display for Angle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}°", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_wraps_negative() {
        assert_eq!(Angle::from_degrees(-90.0).normalized().degrees(), 270.0);
    }

    #[test]
    fn normalize_wraps_over_full_turn() {
        assert_eq!(Angle::from_degrees(725.0).normalized().degrees(), 5.0);
    }

    #[test]
    fn normalize_non_finite_is_zero() {
        assert_eq!(Angle::from_degrees(f64::NAN).normalized(), Angle::ZERO);
        assert_eq!(Angle::from_degrees(f64::INFINITY).normalized(), Angle::ZERO);
    }

    #[test]
    fn clamp_bounds() {
        let max = Angle::from_degrees(180.0);
        assert_eq!(Angle::from_degrees(270.0).clamped(max).degrees(), 180.0);
        assert_eq!(Angle::from_degrees(-10.0).clamped(max).degrees(), 0.0);
        assert_eq!(Angle::from_degrees(f64::NAN).clamped(max), Angle::ZERO);
    }

    #[test]
    fn sector_membership_across_zero() {
        let start = Angle::from_degrees(350.0);
        let width = Angle::from_degrees(20.0);
        assert!(Angle::from_degrees(355.0).in_sector(start, width));
        assert!(Angle::from_degrees(5.0).in_sector(start, width));
        assert!(!Angle::from_degrees(20.0).in_sector(start, width));
    }

    #[test]
    fn full_circle_contains_everything() {
        assert!(Angle::from_degrees(123.0).in_sector(Angle::ZERO, Angle::FULL));
    }

    #[test]
    fn radians_round_trip() {
        let a = Angle::from_radians(std::f64::consts::FRAC_PI_2);
        assert!((a.degrees() - 90.0).abs() < 1e-9);
    }
}
