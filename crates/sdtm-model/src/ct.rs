//! Controlled Terminology (CT) model.
//!
//! A codelist is identified by its NCI code (e.g. `C66731` for Sex) and holds
//! the permissible submission values. Term synonyms are only used to
//! normalize collected values during derivation; conformance checks compare
//! against the exact submission value.
//!
//! ## Validation Rules
//!
//! - **Extensible=No**: Value not in allowed set = **Blocking**
//! - **Extensible=Yes**: Value not in allowed set = **Advisory** (sponsors may extend)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single term within a codelist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// NCI concept code for this term (e.g., "C20197" for Male).
    pub code: String,

    /// The permissible value in datasets (e.g., "M" for Male).
    pub submission_value: String,

    /// Alternative spellings/aliases that normalize to `submission_value`.
    pub synonyms: Vec<String>,

    /// NCI preferred term.
    pub preferred_term: Option<String>,
}

impl Term {
    pub fn new(code: &str, submission_value: &str) -> Self {
        Self {
            code: code.to_string(),
            submission_value: submission_value.to_string(),
            synonyms: Vec::new(),
            preferred_term: None,
        }
    }

    pub fn with_synonyms(mut self, synonyms: &[&str]) -> Self {
        self.synonyms = synonyms.iter().map(|s| (*s).to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codelist {
    /// NCI code for this codelist (e.g., "C66731" for Sex).
    pub code: String,

    /// Human-readable name (e.g., "Sex", "No Yes Response").
    pub name: String,

    /// Whether sponsors can add values not in this codelist.
    pub extensible: bool,

    /// Terms keyed by uppercase submission value.
    pub terms: BTreeMap<String, Term>,

    /// Uppercase alias -> uppercase submission value.
    synonyms: BTreeMap<String, String>,
}

impl Codelist {
    pub fn new(code: &str, name: &str, extensible: bool) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            extensible,
            terms: BTreeMap::new(),
            synonyms: BTreeMap::new(),
        }
    }

    /// Add a term to this codelist.
    pub fn add_term(&mut self, term: Term) {
        let key = term.submission_value.to_uppercase();
        for synonym in &term.synonyms {
            let syn_key = synonym.to_uppercase();
            if syn_key != key {
                self.synonyms.insert(syn_key, key.clone());
            }
        }
        self.terms.insert(key, term);
    }

    pub fn with_term(mut self, term: Term) -> Self {
        self.add_term(term);
        self
    }

    pub fn submission_values(&self) -> Vec<&str> {
        self.terms
            .values()
            .map(|t| t.submission_value.as_str())
            .collect()
    }

    /// Exact membership test used by conformance.
    pub fn contains(&self, value: &str) -> bool {
        self.terms
            .get(&value.to_uppercase())
            .is_some_and(|term| term.submission_value == value)
    }

    /// Canonical submission value for a collected value, if it is known.
    pub fn normalize(&self, value: &str) -> Option<&str> {
        let key = value.trim().to_uppercase();
        if let Some(term) = self.terms.get(&key) {
            return Some(term.submission_value.as_str());
        }
        if let Some(canonical_key) = self.synonyms.get(&key)
            && let Some(term) = self.terms.get(canonical_key)
        {
            return Some(term.submission_value.as_str());
        }
        None
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
