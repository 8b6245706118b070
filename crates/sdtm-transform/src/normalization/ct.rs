//! Controlled Terminology (CT) normalization.

use sdtm_model::Domain;
use sdtm_standards::DomainRegistry;

use crate::records::RecordSet;

/// Rewrites codelist-governed values that match a term's synonym, or differ
/// only by case, to the canonical submission value.
///
/// Values with no match are left untouched for conformance to judge.
pub fn normalize_terminology(set: &mut RecordSet, domain: &Domain, registry: &DomainRegistry) {
    for (variable, codelist_code) in domain.coded_variables() {
        let name = variable.name.as_str();
        if !set.has_column(name) {
            continue;
        }
        let Some(codelist) = registry.codelist(codelist_code) else {
            continue;
        };
        for record in &mut set.records {
            let value = record.get(name);
            if value.is_empty() {
                continue;
            }
            if let Some(canonical) = codelist.normalize(value)
                && canonical != value
            {
                let canonical = canonical.to_string();
                record.set(name, canonical);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::WorkRecord;

    #[test]
    fn rewrites_synonyms_and_leaves_unknown_values() {
        let registry = DomainRegistry::builtin();
        let dm = registry.domain("DM").unwrap();
        let records = ["Male", "f", "X", ""]
            .iter()
            .enumerate()
            .map(|(order, sex)| {
                let mut record = WorkRecord::new(order);
                record.set("SEX", *sex);
                record
            })
            .collect();
        let mut set = RecordSet::new(records, ["SEX"]);

        normalize_terminology(&mut set, dm, &registry);

        let values: Vec<&str> = set.records.iter().map(|r| r.get("SEX")).collect();
        assert_eq!(values, vec!["M", "F", "X", ""]);
    }
}
