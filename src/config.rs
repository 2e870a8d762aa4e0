use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::{PreprocessingParameters, HIGH_CONFIDENCE_THRESHOLD};
use crate::processing::DEFAULT_LANGUAGE;
use crate::utils::ScanError;

/// Settings for a scanning session, loadable from JSON. Missing keys keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub language: String,
    pub tessdata_dir: Option<PathBuf>,
    pub high_confidence_threshold: f32,
    pub defaults: PreprocessingParameters,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            language: DEFAULT_LANGUAGE.to_string(),
            tessdata_dir: None,
            high_confidence_threshold: HIGH_CONFIDENCE_THRESHOLD,
            defaults: PreprocessingParameters::default(),
        }
    }
}

impl ScanConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&raw)?;
        debug!("Loaded config from {:?}: {:?}", path.as_ref(), config);
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, ScanError> {
        let config: ScanConfig = serde_json::from_str(raw)
            .map_err(|e| ScanError::Config(format!("Invalid config: {}", e)))?;
        if !(0.0..=100.0).contains(&config.high_confidence_threshold) {
            return Err(ScanError::Config(format!(
                "high_confidence_threshold must be within 0-100, got {}",
                config.high_confidence_threshold
            )));
        }
        Ok(config)
    }

    /// Configured tessdata directory, or `TESSDATA_PREFIX` when unset.
    pub fn resolved_tessdata_dir(&self) -> Option<PathBuf> {
        self.tessdata_dir
            .clone()
            .or_else(|| std::env::var_os("TESSDATA_PREFIX").map(PathBuf::from))
    }
}
