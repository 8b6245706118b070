//! Options controlling derivation and conformance.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::rules::Layer;

/// How exact timestamp ties between baseline candidates are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// First record in original input order wins.
    #[default]
    InputOrder,
    /// Lowest value of the named variable wins, then input order.
    Variable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationOptions {
    /// Used for STUDYID when the source table does not carry it.
    pub study_id: Option<String>,

    /// Separator between USUBJID components.
    ///
    /// SDTMIG 4.1.2: USUBJID is a concatenation of STUDYID and a subject
    /// identifier unique within that study.
    pub subject_key_separator: String,

    /// Source columns concatenated into USUBJID, in order.
    pub subject_key_fields: Vec<String>,

    /// Rewrite codelist synonyms to their submission values.
    pub normalize_terminology: bool,

    pub baseline_tie_break: TieBreak,
}

impl Default for DerivationOptions {
    fn default() -> Self {
        Self {
            study_id: None,
            subject_key_separator: "-".to_string(),
            subject_key_fields: vec![
                "STUDYID".to_string(),
                "SITEID".to_string(),
                "SUBJID".to_string(),
            ],
            normalize_terminology: true,
            baseline_tie_break: TieBreak::InputOrder,
        }
    }
}

impl DerivationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_study_id(mut self, study_id: &str) -> Self {
        self.study_id = Some(study_id.to_string());
        self
    }

    pub fn with_separator(mut self, separator: &str) -> Self {
        self.subject_key_separator = separator.to_string();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerWeights {
    pub structural: f64,
    pub vocabulary: f64,
    pub cross_table: f64,
    pub temporal: f64,
}

impl Default for LayerWeights {
    fn default() -> Self {
        Self {
            structural: 0.35,
            vocabulary: 0.25,
            cross_table: 0.25,
            temporal: 0.15,
        }
    }
}

impl LayerWeights {
    pub fn weight(&self, layer: Layer) -> f64 {
        match layer {
            Layer::Structural => self.structural,
            Layer::Vocabulary => self.vocabulary,
            Layer::CrossTable => self.cross_table,
            Layer::Temporal => self.temporal,
        }
    }

    pub fn total(&self) -> f64 {
        Layer::ALL.iter().map(|layer| self.weight(*layer)).sum()
    }

    /// Every weight must be finite and non-negative, and at least one positive,
    /// so the weighted score stays within 0 to 100.
    pub fn check(&self) -> Result<()> {
        for layer in Layer::ALL {
            let weight = self.weight(layer);
            if !weight.is_finite() || weight < 0.0 {
                return Err(ModelError::InvalidWeights(format!(
                    "{layer} weight {weight} is not a finite non-negative number"
                )));
            }
        }
        if self.total() <= 0.0 {
            return Err(ModelError::InvalidWeights("all weights are zero".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConformanceOptions {
    pub weights: LayerWeights,
    /// Minimum overall score for a ready verdict.
    pub ready_threshold: f64,
    /// Evaluate the four layers on separate threads.
    pub parallel_layers: bool,
}

impl Default for ConformanceOptions {
    fn default() -> Self {
        Self {
            weights: LayerWeights::default(),
            ready_threshold: 95.0,
            parallel_layers: true,
        }
    }
}

impl ConformanceOptions {
    pub fn sequential(mut self) -> Self {
        self.parallel_layers = false;
        self
    }
}
