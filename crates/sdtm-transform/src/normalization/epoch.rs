//! EPOCH assignment from trial elements.

use sdtm_model::Domain;

use crate::datetime::parse_iso8601;
use crate::records::RecordSet;
use crate::reference::PeriodTable;

/// Sets EPOCH from the element containing each record's anchor date.
///
/// EPOCH is always derived when the domain has an anchor. Without a period
/// table, or when no element contains the date, it is left empty.
pub fn assign_epochs(set: &mut RecordSet, domain: &Domain, periods: Option<&PeriodTable>) {
    let Some(anchor) = domain.epoch_anchor.as_deref() else {
        return;
    };
    if !domain.has_variable("EPOCH") {
        return;
    }
    for record in &mut set.records {
        let epoch = periods
            .zip(parse_iso8601(record.get(anchor)))
            .and_then(|(table, at)| table.epoch_at(record.get("USUBJID"), &at))
            .unwrap_or_default()
            .to_string();
        record.set("EPOCH", epoch);
    }
    set.add_column("EPOCH");
}
