//! Format detection (RON/JSON/TOML), file discovery and deserialization
//! helpers used by the preset loading pipeline.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use bulwark_core::config::ConfigError;
use bulwark_core::effect::EffectError;
use bulwark_core::world::WorldError;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading or instantiating presets.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// Two presets share a name.
    #[error("duplicate preset '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// A preset's tunables failed validation.
    #[error("preset '{name}' has an invalid config: {source}")]
    InvalidConfig { name: String, source: ConfigError },

    /// A preset's effect list could not be built.
    #[error("preset '{name}' has an invalid effect: {source}")]
    InvalidEffect { name: String, source: EffectError },

    /// No preset with this name was loaded.
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    /// The world refused the spawned shield.
    #[error(transparent)]
    World(#[from] WorldError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan `dir` for `{base_name}.ron`, `.toml` or `.json`.
///
/// Returns `Ok(None)` if none exists and `ConflictingFormats` if more than
/// one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Deserialize `content` in the given format. `path` is only used for
/// error reporting.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    path: &Path,
) -> Result<T, DataLoadError> {
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(path, e)),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

/// Deserialize a list. TOML cannot hold a bare top-level array, so for TOML
/// the array is read from `toml_key` in the top-level table; RON and JSON
/// hold the `Vec<T>` directly.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_list_str(&content, format, path, toml_key)
}

pub fn deserialize_list_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    match format {
        Format::Ron | Format::Json => deserialize_str(content, format, path),
        Format::Toml => {
            let table: toml::Table = toml::from_str(content).map_err(|e| parse_error(path, e))?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "bulwark_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Entry {
        name: String,
        value: f64,
    }

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_known_formats() {
        assert_eq!(detect_format(Path::new("a.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("a.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("a.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_unknown_format() {
        assert!(matches!(
            detect_format(Path::new("a.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(detect_format(Path::new("noext")).is_err());
    }

    // -----------------------------------------------------------------------
    // find_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn find_none_and_one() {
        let dir = make_test_dir("find_one");
        assert!(find_data_file(&dir, "shields").unwrap().is_none());

        fs::write(dir.join("shields.ron"), "[]").unwrap();
        assert_eq!(
            find_data_file(&dir, "shields").unwrap(),
            Some(dir.join("shields.ron"))
        );
        cleanup(&dir);
    }

    #[test]
    fn find_conflicting_formats() {
        let dir = make_test_dir("find_conflict");
        fs::write(dir.join("shields.ron"), "[]").unwrap();
        fs::write(dir.join("shields.json"), "[]").unwrap();
        assert!(matches!(
            find_data_file(&dir, "shields"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn require_missing_file() {
        let dir = make_test_dir("require_missing");
        let err = require_data_file(&dir, "shields").unwrap_err();
        assert!(err.to_string().contains("shields"), "got: {err}");
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Lists
    // -----------------------------------------------------------------------

    #[test]
    fn list_from_each_format() {
        let path = Path::new("inline");
        let expected = vec![Entry {
            name: "a".to_string(),
            value: 1.5,
        }];

        let ron: Vec<Entry> =
            deserialize_list_str(r#"[(name: "a", value: 1.5)]"#, Format::Ron, path, "entries")
                .unwrap();
        let json: Vec<Entry> = deserialize_list_str(
            r#"[{"name": "a", "value": 1.5}]"#,
            Format::Json,
            path,
            "entries",
        )
        .unwrap();
        let toml: Vec<Entry> = deserialize_list_str(
            "[[entries]]\nname = \"a\"\nvalue = 1.5\n",
            Format::Toml,
            path,
            "entries",
        )
        .unwrap();

        assert_eq!(ron, expected);
        assert_eq!(json, expected);
        assert_eq!(toml, expected);
    }

    #[test]
    fn toml_missing_key() {
        let err = deserialize_list_str::<Entry>("x = 1\n", Format::Toml, Path::new("f.toml"), "entries")
            .unwrap_err();
        assert!(err.to_string().contains("missing key 'entries'"), "got: {err}");
    }

    #[test]
    fn parse_error_names_file() {
        let err = deserialize_str::<Entry>("{", Format::Json, Path::new("bad.json"))
            .unwrap_err();
        assert!(err.to_string().contains("bad.json"), "got: {err}");
    }
}
