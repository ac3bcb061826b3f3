use cellmask::{CellMaskError, SessionCommand, SessionConfig};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod fs_providers;

pub use fs_providers::{CsvReferenceCounts, DirectoryNavigator, FsPersistence, load_image};

#[derive(Error, Debug)]
pub enum AnnotatorError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Engine(#[from] CellMaskError),
    #[error(transparent)]
    CsvError(#[from] csv::Error),
    #[error("Reference file has no '{0}' column")]
    MissingColumn(&'static str),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Batch annotation settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AnnotatorConfig {
    /// Directory of tiles to annotate
    pub source_dir: PathBuf,
    /// Primary output directory; review and origin folders live inside it
    pub destination_dir: PathBuf,
    /// CSV with image stems in column `x` and expected counts in column `y`
    #[serde(default)]
    pub reference_file: Option<PathBuf>,
    #[serde(default)]
    pub session: SessionConfig,
    /// Commands applied to every image by `process`
    #[serde(default)]
    pub commands: Vec<SessionCommand>,
}

/// A standalone list of commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CommandScript {
    #[serde(default)]
    pub commands: Vec<SessionCommand>,
}

/// Reads `path` with the parser its extension names.
fn read_by_extension<T, P>(path: P) -> Result<T, AnnotatorError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Ok(toml::from_str(&fs::read_to_string(path)?)?),
        Some("json") => Ok(serde_json::from_str(&fs::read_to_string(path)?)?),
        _ => Err(AnnotatorError::UnsupportedFileFormat),
    }
}

impl AnnotatorConfig {
    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, AnnotatorError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self, AnnotatorError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AnnotatorError> {
        read_by_extension(path)
    }

    /// Convert configuration to JSON string
    pub fn to_json(&self) -> Result<String, AnnotatorError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnnotatorConfig)
    }
}

impl CommandScript {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AnnotatorError> {
        read_by_extension(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellmask::{Coordinate, Polarity};

    #[test]
    fn test_config_from_toml() {
        let config = AnnotatorConfig::from_toml(
            r#"
            source_dir = "tiles"
            destination_dir = "out"
            reference_file = "counts.csv"

            [session.engine]
            polarity = "bright"

            [session.autosave]
            enabled = true
            format = ".png"

            [[commands]]
            type = "threshold_image"
            params = { threshold = "2", neighbourhood = "11" }

            [[commands]]
            type = "find_centers"
            "#,
        )
        .expect("Valid TOML");

        assert_eq!(config.source_dir, PathBuf::from("tiles"));
        assert_eq!(config.session.engine.polarity, Polarity::Bright);
        assert!(config.session.autosave.enabled);
        assert!(!config.session.autosave.save_original);
        assert_eq!(config.commands.len(), 2);
        assert_eq!(config.commands[1], SessionCommand::FindCenters);
    }

    #[test]
    fn test_config_from_json_round_trip() {
        let config = AnnotatorConfig::from_json(
            r#"{
                "source_dir": "tiles",
                "destination_dir": "out",
                "commands": [
                    {"type": "merge_regions", "params": {"points": [{"x": 1, "y": 2}, {"x": 5, "y": 2}]}}
                ]
            }"#,
        )
        .expect("Valid JSON");

        assert_eq!(config.reference_file, None);
        assert_eq!(
            config.commands[0],
            SessionCommand::MergeRegions { points: vec![Coordinate::new(1, 2), Coordinate::new(5, 2)] }
        );

        let again = AnnotatorConfig::from_json(&config.to_json().expect("Serialize")).expect("Parse");
        assert_eq!(again, config);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let result = AnnotatorConfig::from_file("annotator.yaml");
        assert!(matches!(result, Err(AnnotatorError::UnsupportedFileFormat)));
    }
}
