pub mod loader;
pub mod preset;
pub mod schema;

pub use loader::DataLoadError;
pub use preset::{load_preset_dir, load_presets, PresetLibrary};
