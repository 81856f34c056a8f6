//! Per-shield tunables, attached at construction time.
//!
//! Defaults mirror the stock shield generator: full-circle capable, 105 W of
//! surge per point of absorbed damage, a 25 s surge window and a 1 ms console
//! cooldown.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::angle::{Angle, FULL_TURN};

/// Errors reported by [`ShieldConfig::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be finite and non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("max_width must be in (0, 360] degrees, got {0}")]
    MaxWidthOutOfRange(f64),

    #[error("damage_surge_duration must be positive, got {0}")]
    SurgeDuration(f64),

    #[error("reset_power ({reset}) must be below power_draw_limit ({limit})")]
    HysteresisBand { reset: f64, limit: f64 },
}

/// Tunables for one shield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldConfig {
    /// Watts drawn per square unit of covered sector area.
    pub consumption_per_unit_area: f64,
    /// Widest sector the generator can project. 360 is a full circle.
    pub max_width: Angle,
    /// Largest radius the generator can project.
    pub max_radius: u32,
    /// Surge watts added per point of absorbed damage.
    pub watt_per_point: f64,
    /// Seconds for a surge to decay to zero.
    pub damage_surge_duration: f64,
    /// Draw above which the shield trips into overload.
    pub power_draw_limit: f64,
    /// Draw at or below which an overloaded shield recovers.
    pub reset_power: f64,
    /// Minimum interval between parameter-change requests from a console.
    #[serde(with = "duration_millis")]
    pub cooldown: Duration,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            consumption_per_unit_area: 1.0,
            max_width: Angle::FULL,
            max_radius: 100,
            watt_per_point: 105.0,
            damage_surge_duration: 25.0,
            power_draw_limit: 5_000_000.0,
            reset_power: 4_000_000.0,
            cooldown: Duration::from_millis(1),
        }
    }
}

impl ShieldConfig {
    /// Check every tunable and the ordering of the hysteresis band.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("consumption_per_unit_area", self.consumption_per_unit_area),
            ("watt_per_point", self.watt_per_point),
            ("power_draw_limit", self.power_draw_limit),
            ("reset_power", self.reset_power),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        let max_width = self.max_width.degrees();
        if !(max_width > 0.0 && max_width <= FULL_TURN) {
            return Err(ConfigError::MaxWidthOutOfRange(max_width));
        }

        if !(self.damage_surge_duration.is_finite() && self.damage_surge_duration > 0.0) {
            return Err(ConfigError::SurgeDuration(self.damage_surge_duration));
        }

        if self.reset_power >= self.power_draw_limit {
            return Err(ConfigError::HysteresisBand {
                reset: self.reset_power,
                limit: self.power_draw_limit,
            });
        }

        Ok(())
    }

    /// Whether `width` covers the full circle this generator supports.
    pub fn is_full_circle(&self, width: Angle) -> bool {
        width.degrees() >= self.max_width.degrees() && self.max_width.degrees() >= FULL_TURN
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ShieldConfig::default().validate(), Ok(()));
    }

    #[test]
    fn reset_must_sit_below_limit() {
        let config = ShieldConfig {
            power_draw_limit: 100.0,
            reset_power: 100.0,
            ..ShieldConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::HysteresisBand { .. })
        ));
    }

    #[test]
    fn negative_consumption_rejected() {
        let config = ShieldConfig {
            consumption_per_unit_area: -1.0,
            ..ShieldConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("consumption_per_unit_area"));
    }

    #[test]
    fn max_width_above_full_turn_rejected() {
        let config = ShieldConfig {
            max_width: Angle::from_degrees(400.0),
            ..ShieldConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MaxWidthOutOfRange(400.0)));
    }

    #[test]
    fn zero_surge_duration_rejected() {
        let config = ShieldConfig {
            damage_surge_duration: 0.0,
            ..ShieldConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::SurgeDuration(0.0)));
    }

    #[test]
    fn full_circle_requires_full_turn_capability() {
        let narrow = ShieldConfig {
            max_width: Angle::from_degrees(120.0),
            ..ShieldConfig::default()
        };
        assert!(!narrow.is_full_circle(Angle::from_degrees(120.0)));
        assert!(ShieldConfig::default().is_full_circle(Angle::FULL));
    }
}
