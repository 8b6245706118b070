//! Controlled terminology membership.
//!
//! Values must match a submission value exactly. Synonyms accepted during
//! derivation are not valid here.

use polars::prelude::PolarsResult;
use sdtm_model::{Layer, RuleId};
use sdtm_standards::DomainRegistry;
use tracing::debug;

use super::{LayerOutcome, TableView};

pub fn check(views: &[TableView<'_>], registry: &DomainRegistry) -> PolarsResult<LayerOutcome> {
    let mut outcome = LayerOutcome::new(Layer::Vocabulary);
    for view in views {
        for (variable, codelist_code) in view.domain.coded_variables() {
            let Some(codelist) = registry.codelist(codelist_code) else {
                debug!(
                    domain = view.code(),
                    variable = %variable.name,
                    codelist = codelist_code,
                    "codelist not loaded, skipping"
                );
                continue;
            };
            let Some(values) = view.strings(&variable.name)? else {
                continue;
            };
            let rule = if codelist.extensible {
                RuleId::ExtensibleTermNotInCodelist
            } else {
                RuleId::ClosedTermNotInCodelist
            };
            for (row, value) in values.iter().enumerate().filter(|(_, v)| !v.is_empty()) {
                outcome.evaluate(rule, codelist.contains(value), || {
                    view.defect(
                        rule,
                        format!(
                            "{} value '{value}' is not in codelist {} ({})",
                            variable.name, codelist.name, codelist.code
                        ),
                    )
                    .with_variable(&variable.name)
                    .with_record(view.record(row))
                });
            }
        }
    }
    Ok(outcome)
}
