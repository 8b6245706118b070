//! Run configuration loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid configuration.
//!
//! ```toml
//! study_id = "STUDY01"
//!
//! [derivation]
//! subject_key_separator = "-"
//! normalize_terminology = true
//!
//! [pipeline]
//! workers = 4
//!
//! [conformance]
//! ready_threshold = 95.0
//! parallel_layers = true
//!
//! [conformance.weights]
//! structural = 0.35
//! vocabulary = 0.25
//! cross_table = 0.25
//! temporal = 0.15
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sdtm_core::DEFAULT_WORKERS;
use sdtm_model::{ConformanceOptions, DerivationOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Study identifier used when source tables carry no STUDYID.
    pub study_id: Option<String>,
    pub derivation: DerivationOptions,
    pub pipeline: PipelineConfig,
    pub conformance: ConformanceOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Upper bound on domains derived at the same time.
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config =
            Self::from_toml(&text).with_context(|| format!("parse config {}", path.display()))?;
        config
            .conformance
            .weights
            .check()
            .with_context(|| format!("check config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Derivation options with the top-level study id applied.
    pub fn derivation_options(&self) -> DerivationOptions {
        let mut options = self.derivation.clone();
        if let Some(study_id) = &self.study_id {
            options = options.with_study_id(study_id);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.pipeline.workers, DEFAULT_WORKERS);
        assert_eq!(config.conformance.ready_threshold, 95.0);
    }

    #[test]
    fn negative_weight_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, "[conformance.weights]\nvocabulary = -1.0\n").unwrap();

        let error = RunConfig::load(&path).unwrap_err();
        assert!(format!("{error:#}").contains("vocabulary weight -1 is not a finite non-negative number"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(RunConfig::from_toml("[pipeline]\nthreads = 2\n").is_err());
    }
}
