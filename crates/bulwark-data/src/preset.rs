//! Validated preset collections and spawning shields from them.

use std::collections::BTreeMap;
use std::path::Path;

use bulwark_core::effect::EffectRegistry;
use bulwark_core::id::ShieldId;
use bulwark_core::shield::ShieldState;
use bulwark_core::world::ShieldWorld;
use bulwark_effects::build_registry;

use crate::loader::{deserialize_list, require_data_file, DataLoadError};
use crate::schema::{ShieldPresetData, PRESETS_TOML_KEY};

/// Base name of the preset file looked up by [`load_preset_dir`].
pub const PRESET_FILE: &str = "shields";

/// A set of validated, uniquely named shield presets.
#[derive(Debug, Clone, Default)]
pub struct PresetLibrary {
    presets: BTreeMap<String, ShieldPresetData>,
}

impl PresetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and index `presets`. `source` is only used for error
    /// reporting.
    ///
    /// Each preset's config must validate and its effect list must build;
    /// names must be unique.
    pub fn from_presets(
        presets: Vec<ShieldPresetData>,
        source: &Path,
    ) -> Result<Self, DataLoadError> {
        let mut library = Self::new();
        for preset in presets {
            preset
                .config
                .validate()
                .map_err(|source| DataLoadError::InvalidConfig {
                    name: preset.name.clone(),
                    source,
                })?;
            build_registry(&preset.effects).map_err(|source| DataLoadError::InvalidEffect {
                name: preset.name.clone(),
                source,
            })?;

            if library.presets.contains_key(&preset.name) {
                return Err(DataLoadError::DuplicateName {
                    file: source.to_path_buf(),
                    name: preset.name,
                });
            }
            library.presets.insert(preset.name.clone(), preset);
        }
        Ok(library)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Preset names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&ShieldPresetData> {
        self.presets.get(name)
    }

    /// Build a fresh shield state and effect registry from a preset.
    ///
    /// The shield starts disabled and unpowered, like any new shield.
    pub fn instantiate(&self, name: &str) -> Result<(ShieldState, EffectRegistry), DataLoadError> {
        let preset = self
            .get(name)
            .ok_or_else(|| DataLoadError::UnknownPreset(name.to_string()))?;

        let mut state = ShieldState::new(preset.config.clone());
        state.set_geometry(preset.initial_geometry());
        if let Some(color) = preset.color {
            state.color = color;
        }
        state.visible_from_other_grids = preset.visible_from_other_grids;

        let effects =
            build_registry(&preset.effects).map_err(|source| DataLoadError::InvalidEffect {
                name: preset.name.clone(),
                source,
            })?;
        Ok((state, effects))
    }

    /// Instantiate a preset and spawn it into `world`.
    pub fn spawn(&self, world: &mut ShieldWorld, name: &str) -> Result<ShieldId, DataLoadError> {
        let (state, effects) = self.instantiate(name)?;
        let id = world.spawn_shield(state, effects)?;
        tracing::debug!(preset = name, ?id, "spawned shield from preset");
        Ok(id)
    }
}

/// Load presets from a single `.ron`, `.toml` or `.json` file.
///
/// RON and JSON files hold a list of presets; TOML files hold it under the
/// `presets` key.
pub fn load_presets(path: &Path) -> Result<PresetLibrary, DataLoadError> {
    let presets: Vec<ShieldPresetData> = deserialize_list(path, PRESETS_TOML_KEY)?;
    let library = PresetLibrary::from_presets(presets, path)?;
    tracing::debug!(file = %path.display(), count = library.len(), "loaded shield presets");
    Ok(library)
}

/// Load the `shields.{ron,toml,json}` file from `dir`.
pub fn load_preset_dir(dir: &Path) -> Result<PresetLibrary, DataLoadError> {
    let path = require_data_file(dir, PRESET_FILE)?;
    load_presets(&path)
}

// ===========================================================================
// Tests
// ===========================================================================
