pub mod ct;
pub mod defect;
pub mod domain;
pub mod error;
pub mod findings;
pub mod lookup;
pub mod options;
pub mod rules;

pub use ct::{Codelist, Term};
pub use defect::{Defect, DefectCounts, RecordKey, Severity, sort_defects};
pub use domain::{
    BaselineSpec, CoreDesignation, DatasetClass, Domain, DomainDependency, StudyDayPair,
    TimingPair, Variable, VariableType,
};
pub use error::{ModelError, Result};
pub use findings::{TestCodeResolution, TestDefinition, UnitConversion};
pub use lookup::CaseInsensitiveSet;
pub use options::{ConformanceOptions, DerivationOptions, LayerWeights, TieBreak};
pub use rules::{Layer, RuleId};
