//! Defects raised while deriving, before rows have their final position.

use sdtm_model::RuleId;

/// A derivation defect tied to a record's input position.
///
/// Rows are only known after sequencing, so steps record the input order and
/// the engine resolves it to a [`sdtm_model::RecordKey`] at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub rule: RuleId,
    pub variable: Option<String>,
    /// Input order of the affected record; `None` for table-level issues.
    pub order: Option<usize>,
    pub message: String,
}

impl Issue {
    pub fn record(rule: RuleId, order: usize, message: impl Into<String>) -> Self {
        Self {
            rule,
            variable: None,
            order: Some(order),
            message: message.into(),
        }
    }

    pub fn table(rule: RuleId, message: impl Into<String>) -> Self {
        Self {
            rule,
            variable: None,
            order: None,
            message: message.into(),
        }
    }

    pub fn on(mut self, variable: &str) -> Self {
        self.variable = Some(variable.to_string());
        self
    }
}
