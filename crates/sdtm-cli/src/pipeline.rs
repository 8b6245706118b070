//! Study run: read sources, derive, validate.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use sdtm_core::StudyPipeline;
use sdtm_ingest::{discover_domain_files, list_csv_files, read_csv_frame, read_domain_frame};
use sdtm_standards::{DomainRegistry, load_ct_csv};
use sdtm_transform::ProducedTables;
use sdtm_validate::{ConformanceInput, ConformanceReport, validate};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::config::RunConfig;

/// What `sdtm study` writes as its JSON report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyReport {
    pub study_id: Option<String>,
    /// Domains in derivation order.
    pub order: Vec<String>,
    /// Domains whose derivation failed.
    pub failed: Vec<String>,
    /// Conformance results, including derivation defects.
    pub conformance: ConformanceReport,
}

impl StudyReport {
    pub fn ready(&self) -> bool {
        self.conformance.ready
    }
}

#[derive(Debug, Clone)]
pub struct StudyOutcome {
    pub tables: ProducedTables,
    pub report: StudyReport,
}

/// Built-in registry, optionally extended with a CT release export.
pub fn load_registry(ct: Option<&Path>) -> Result<DomainRegistry> {
    let mut registry = DomainRegistry::builtin();
    if let Some(path) = ct {
        let codelists = load_ct_csv(path).with_context(|| format!("load CT {}", path.display()))?;
        let merged = registry.merge_codelists(codelists);
        info!(codelists = merged, path = %path.display(), "merged controlled terminology");
    }
    Ok(registry)
}

/// Reads every CSV in `dir` that names a registry domain, keyed by domain code.
pub fn read_study_sources(dir: &Path, registry: &DomainRegistry) -> Result<BTreeMap<String, DataFrame>> {
    let files = list_csv_files(dir).with_context(|| format!("list {}", dir.display()))?;
    let known = registry.domain_codes();
    let mut raw = BTreeMap::new();
    for (domain, paths) in discover_domain_files(&files, &known) {
        let frame = read_domain_frame(&paths).with_context(|| format!("read {domain} sources"))?;
        info!(domain = %domain, files = paths.len(), rows = frame.height(), "read source");
        raw.insert(domain, frame);
    }
    Ok(raw)
}

pub fn read_visit_schedule(path: &Path) -> Result<DataFrame> {
    read_csv_frame(path).with_context(|| format!("read visit schedule {}", path.display()))
}

/// Derives and validates one study.
pub fn run_study(
    dir: &Path,
    config: &RunConfig,
    registry: &DomainRegistry,
    visit_schedule: Option<&DataFrame>,
) -> Result<StudyOutcome> {
    let span = info_span!("study", dir = %dir.display());
    let _guard = span.enter();

    let raw = read_study_sources(dir, registry)?;
    let options = config.derivation_options();
    let run = StudyPipeline::new(registry, &options)
        .with_workers(config.pipeline.workers)
        .run(&raw)
        .context("derive study")?;

    let mut input = ConformanceInput::new(&run.tables, registry);
    if let Some(schedule) = visit_schedule {
        input = input.with_visit_schedule(schedule);
    }
    let mut conformance = validate(&input, &config.conformance).context("validate study")?;
    conformance.absorb(run.defects);

    let report = StudyReport {
        study_id: options.study_id.clone(),
        order: run.schedule.order,
        failed: run.failed,
        conformance,
    };
    Ok(StudyOutcome {
        tables: run.tables,
        report,
    })
}

pub fn write_report(path: &Path, report: &StudyReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serialize report")?;
    fs::write(path, json).with_context(|| format!("write report {}", path.display()))
}
