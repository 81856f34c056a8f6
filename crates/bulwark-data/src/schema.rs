//! Serde data file structs for shield presets.
//!
//! A preset names a generator model: its tunables, the geometry it starts
//! with, its colour and the effects it carries. Presets are deserialized
//! from RON, JSON, or TOML data files and then validated by the loader.

use bulwark_core::angle::Angle;
use bulwark_core::config::ShieldConfig;
use bulwark_core::shield::{Color, GeometryUpdate};
use bulwark_effects::EffectSpec;
use serde::Deserialize;

/// Top-level key holding the preset array in TOML files.
pub const PRESETS_TOML_KEY: &str = "presets";

/// A shield preset definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ShieldPresetData {
    pub name: String,
    #[serde(default)]
    pub config: ShieldConfig,
    /// Initial facing, in degrees.
    #[serde(default)]
    pub angle: Option<Angle>,
    /// Initial width, in degrees. Defaults to the config's `max_width`.
    #[serde(default)]
    pub width: Option<Angle>,
    #[serde(default)]
    pub radius: Option<i64>,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub visible_from_other_grids: bool,
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
}

impl ShieldPresetData {
    /// The starting geometry as an update. Out-of-range values are clamped
    /// when applied, as any other geometry request is.
    pub fn initial_geometry(&self) -> GeometryUpdate {
        GeometryUpdate {
            angle: self.angle,
            width: self.width,
            radius: self.radius,
        }
    }
}
