//! Read-only catalog of domain metadata consulted by derivation and conformance.

use std::collections::BTreeMap;

use sdtm_model::{Codelist, Domain, DomainDependency, UnitConversion};
use tracing::debug;

use crate::codelists::builtin_codelists;
use crate::domains::builtin_domains;
use crate::error::StandardsError;
use crate::findings::{TestLookup, lb_tests, unit_conversions, vs_tests};

#[derive(Debug, Clone, Default)]
pub struct DomainRegistry {
    domains: BTreeMap<String, Domain>,
    codelists: BTreeMap<String, Codelist>,
    test_lookups: BTreeMap<String, TestLookup>,
    conversions: Vec<UnitConversion>,
}

impl DomainRegistry {
    /// An empty registry, mostly useful in tests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in domains, codelists, test lookups and unit conversions.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for domain in builtin_domains() {
            registry.insert_domain(domain);
        }
        for codelist in builtin_codelists() {
            registry.insert_codelist(codelist);
        }
        registry.insert_test_lookup("LB", lb_tests());
        registry.insert_test_lookup("VS", vs_tests());
        for conversion in unit_conversions() {
            registry.insert_conversion(conversion);
        }
        registry
    }

    pub fn insert_domain(&mut self, domain: Domain) {
        self.domains.insert(domain.code.to_uppercase(), domain);
    }

    pub fn insert_codelist(&mut self, codelist: Codelist) {
        self.codelists.insert(codelist.code.to_uppercase(), codelist);
    }

    /// Merges codelists from a CT release. Terms are added to existing
    /// codelists and the release's extensibility wins.
    pub fn merge_codelists(&mut self, codelists: Vec<Codelist>) -> usize {
        let count = codelists.len();
        for incoming in codelists {
            match self.codelists.get_mut(&incoming.code.to_uppercase()) {
                Some(existing) => {
                    existing.extensible = incoming.extensible;
                    for term in incoming.terms.into_values() {
                        existing.add_term(term);
                    }
                }
                None => self.insert_codelist(incoming),
            }
        }
        debug!(merged = count, total = self.codelists.len(), "merged codelists");
        count
    }

    pub fn insert_test_lookup(&mut self, domain: &str, lookup: TestLookup) {
        self.test_lookups.insert(domain.to_uppercase(), lookup);
    }

    pub fn insert_conversion(&mut self, conversion: UnitConversion) {
        self.conversions.push(conversion);
    }

    pub fn domain(&self, code: &str) -> Option<&Domain> {
        self.domains.get(&code.to_uppercase())
    }

    pub fn require_domain(&self, code: &str) -> Result<&Domain, StandardsError> {
        self.domain(code).ok_or_else(|| StandardsError::UnknownDomain {
            code: code.to_string(),
        })
    }

    pub fn contains(&self, code: &str) -> bool {
        self.domains.contains_key(&code.to_uppercase())
    }

    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.domains.values()
    }

    pub fn domain_codes(&self) -> Vec<&str> {
        self.domains.values().map(|d| d.code.as_str()).collect()
    }

    pub fn dependencies(&self, code: &str) -> &[DomainDependency] {
        self.domain(code)
            .map(|d| d.dependencies.as_slice())
            .unwrap_or_default()
    }

    pub fn codelist(&self, code: &str) -> Option<&Codelist> {
        self.codelists.get(&code.to_uppercase())
    }

    /// Codelist bound to a domain variable, when the binding resolves.
    pub fn codelist_for(&self, domain: &str, variable: &str) -> Option<&Codelist> {
        self.domain(domain)?
            .variable(variable)?
            .codelist_code
            .as_deref()
            .and_then(|code| self.codelist(code))
    }

    pub fn codelist_count(&self) -> usize {
        self.codelists.len()
    }

    pub fn test_lookup(&self, domain: &str) -> Option<&TestLookup> {
        self.test_lookups.get(&domain.to_uppercase())
    }

    /// Conversion for a test between two units; unit names compare case-insensitively.
    pub fn conversion(&self, test_code: &str, from_unit: &str, to_unit: &str) -> Option<&UnitConversion> {
        self.conversions.iter().find(|c| {
            c.test_code.eq_ignore_ascii_case(test_code)
                && c.from_unit.eq_ignore_ascii_case(from_unit)
                && c.to_unit.eq_ignore_ascii_case(to_unit)
        })
    }
}
