//! Runs the four conformance layers and scores the result.

use std::collections::BTreeMap;

use polars::prelude::{DataFrame, PolarsResult};
use sdtm_model::{ConformanceOptions, Defect, DefectCounts, Layer, sort_defects};
use sdtm_standards::DomainRegistry;
use sdtm_transform::ProducedTables;
use tracing::{debug, info, info_span};

use crate::checks::{LayerOutcome, TableView, cross_table, structural, temporal, vocabulary};
use crate::error::ConformanceError;
use crate::report::{ConformanceReport, DomainSummary, LayerScore};

/// Everything the conformance layers read.
#[derive(Debug, Clone, Copy)]
pub struct ConformanceInput<'a> {
    pub tables: &'a ProducedTables,
    /// Planned visits. When absent, a produced TV table is used if there is one.
    pub visit_schedule: Option<&'a DataFrame>,
    pub registry: &'a DomainRegistry,
}

impl<'a> ConformanceInput<'a> {
    pub fn new(tables: &'a ProducedTables, registry: &'a DomainRegistry) -> Self {
        Self {
            tables,
            visit_schedule: None,
            registry,
        }
    }

    pub fn with_visit_schedule(mut self, schedule: &'a DataFrame) -> Self {
        self.visit_schedule = Some(schedule);
        self
    }
}

/// Validates a set of produced tables.
///
/// Fails only on malformed input: layer weights that could push the score
/// outside 0 to 100, or a subject-bearing table without a USUBJID column.
/// Data problems become defects. Repeated runs over the same input
/// produce identical reports.
pub fn validate(
    input: &ConformanceInput<'_>,
    options: &ConformanceOptions,
) -> Result<ConformanceReport, ConformanceError> {
    options.weights.check()?;
    let span = info_span!("conformance", tables = input.tables.len());
    let _guard = span.enter();

    let views = table_views(input)?;
    let visit_schedule = input
        .visit_schedule
        .or_else(|| input.tables.get("TV").map(|tv| &tv.data));

    let outcomes = if options.parallel_layers {
        run_parallel(&views, input.registry, visit_schedule)?
    } else {
        Layer::ALL
            .iter()
            .map(|layer| run_layer(*layer, &views, input.registry, visit_schedule))
            .collect::<PolarsResult<Vec<_>>>()?
    };

    let report = score(outcomes, &views, options);
    info!(
        score = report.score,
        ready = report.ready,
        blocking = report.counts.blocking,
        advisory = report.counts.advisory,
        "conformance evaluated"
    );
    Ok(report)
}

fn table_views<'a>(input: &ConformanceInput<'a>) -> Result<Vec<TableView<'a>>, ConformanceError> {
    let mut views = Vec::with_capacity(input.tables.len());
    for frame in input.tables.iter() {
        let Some(domain) = input.registry.domain(&frame.domain_code) else {
            debug!(domain = %frame.domain_code, "no registry entry, skipping table");
            continue;
        };
        let view = TableView::new(domain, frame)?;
        if domain.carries_subjects() && !view.has("USUBJID") {
            return Err(ConformanceError::MissingSubjectKey {
                domain: domain.code.clone(),
            });
        }
        views.push(view);
    }
    Ok(views)
}

fn run_layer(
    layer: Layer,
    views: &[TableView<'_>],
    registry: &DomainRegistry,
    visit_schedule: Option<&DataFrame>,
) -> PolarsResult<LayerOutcome> {
    let outcome = match layer {
        Layer::Structural => structural::check(views)?,
        Layer::Vocabulary => vocabulary::check(views, registry)?,
        Layer::CrossTable => cross_table::check(views, visit_schedule)?,
        Layer::Temporal => temporal::check(views)?,
    };
    debug!(
        %layer,
        checked = outcome.checked,
        passed = outcome.passed,
        defects = outcome.defects.len(),
        "layer evaluated"
    );
    Ok(outcome)
}

/// One scoped thread per layer over the shared views.
fn run_parallel(
    views: &[TableView<'_>],
    registry: &DomainRegistry,
    visit_schedule: Option<&DataFrame>,
) -> Result<Vec<LayerOutcome>, ConformanceError> {
    std::thread::scope(|s| {
        let handles: Vec<_> = Layer::ALL
            .iter()
            .map(|layer| {
                let layer = *layer;
                (
                    layer,
                    s.spawn(move || run_layer(layer, views, registry, visit_schedule)),
                )
            })
            .collect();
        handles
            .into_iter()
            .map(|(layer, handle)| match handle.join() {
                Ok(outcome) => Ok(outcome?),
                Err(_) => Err(ConformanceError::LayerPanicked { layer }),
            })
            .collect()
    })
}

fn score(outcomes: Vec<LayerOutcome>, views: &[TableView<'_>], options: &ConformanceOptions) -> ConformanceReport {
    let weights = &options.weights;
    let total_weight = weights.total();
    let layers: Vec<LayerScore> = outcomes
        .iter()
        .map(|outcome| LayerScore {
            layer: outcome.layer,
            weight: weights.weight(outcome.layer),
            checked: outcome.checked,
            passed: outcome.passed,
            score: outcome.score(),
        })
        .collect();
    let overall = layers.iter().map(|l| l.score * l.weight).sum::<f64>() / total_weight;

    let mut defects: Vec<Defect> = outcomes.into_iter().flat_map(|o| o.defects).collect();
    sort_defects(&mut defects);
    let counts = DefectCounts::from_defects(&defects);
    let structural_clean = layers
        .iter()
        .filter(|l| l.layer == Layer::Structural)
        .all(|l| l.passed == l.checked);
    let ready = overall >= options.ready_threshold && structural_clean && counts.blocking == 0;

    ConformanceReport {
        score: overall,
        ready,
        threshold: options.ready_threshold,
        layers,
        counts,
        domains: summarize(views, &defects),
        defects,
    }
}

fn summarize(views: &[TableView<'_>], defects: &[Defect]) -> Vec<DomainSummary> {
    let mut summaries: BTreeMap<&str, DomainSummary> = views
        .iter()
        .map(|view| (view.code(), DomainSummary::new(view.code(), view.height())))
        .collect();
    for defect in defects {
        summaries
            .entry(defect.domain.as_str())
            .or_insert_with(|| DomainSummary::new(&defect.domain, 0))
            .count(defect.severity);
    }
    summaries.into_values().collect()
}
