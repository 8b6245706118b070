//! Conformance report types.

use serde::{Deserialize, Serialize};
use sdtm_model::{Defect, DefectCounts, Layer, Severity, sort_defects};

/// Score of one conformance layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerScore {
    pub layer: Layer,
    pub weight: f64,
    pub checked: usize,
    pub passed: usize,
    /// `passed / checked * 100`, or 100 when nothing was checked.
    pub score: f64,
}

/// Defect totals for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSummary {
    pub domain: String,
    pub records: usize,
    pub blocking: usize,
    pub advisory: usize,
    pub informational: usize,
}

impl DomainSummary {
    pub fn new(domain: &str, records: usize) -> Self {
        Self {
            domain: domain.to_string(),
            records,
            blocking: 0,
            advisory: 0,
            informational: 0,
        }
    }

    pub fn count(&mut self, severity: Severity) {
        match severity {
            Severity::Blocking => self.blocking += 1,
            Severity::Advisory => self.advisory += 1,
            Severity::Informational => self.informational += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConformanceReport {
    /// Weighted mean of the layer scores, 0 to 100.
    pub score: f64,
    pub ready: bool,
    pub threshold: f64,
    pub layers: Vec<LayerScore>,
    pub counts: DefectCounts,
    pub domains: Vec<DomainSummary>,
    /// Every defect in canonical order.
    pub defects: Vec<Defect>,
}

impl ConformanceReport {
    pub fn layer(&self, layer: Layer) -> Option<&LayerScore> {
        self.layers.iter().find(|score| score.layer == layer)
    }

    pub fn domain(&self, code: &str) -> Option<&DomainSummary> {
        self.domains
            .iter()
            .find(|summary| summary.domain.eq_ignore_ascii_case(code))
    }

    pub fn blocking(&self) -> impl Iterator<Item = &Defect> {
        self.defects.iter().filter(|defect| defect.is_blocking())
    }

    /// Adds defects raised outside the conformance layers, such as derivation
    /// defects. A blocking addition clears the ready verdict; scores are unchanged.
    pub fn absorb(&mut self, defects: Vec<Defect>) {
        for defect in &defects {
            let summary = match self
                .domains
                .iter_mut()
                .position(|summary| summary.domain == defect.domain)
            {
                Some(idx) => &mut self.domains[idx],
                None => {
                    self.domains.push(DomainSummary::new(&defect.domain, 0));
                    let last = self.domains.len() - 1;
                    &mut self.domains[last]
                }
            };
            summary.count(defect.severity);
        }
        self.domains.sort_by(|a, b| a.domain.cmp(&b.domain));
        self.defects.extend(defects);
        sort_defects(&mut self.defects);
        self.counts = DefectCounts::from_defects(&self.defects);
        self.ready = self.ready && self.counts.blocking == 0;
    }
}
