//! Subject reference dates and trial element periods read from the snapshot.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use polars::prelude::{DataFrame, PolarsResult};
use sdtm_common::{column_strings, has_column};

use crate::datetime::{IsoDateTime, compare_at_common_precision, parse_iso8601};
use crate::frame::ProducedTables;

/// RFSTDTC per subject, from a produced DM.
#[derive(Debug, Clone, Default)]
pub struct SubjectReferences {
    starts: BTreeMap<String, String>,
}

impl SubjectReferences {
    /// Empty when DM has not been produced or carries no RFSTDTC.
    pub fn from_snapshot(snapshot: &ProducedTables) -> PolarsResult<Self> {
        match snapshot.get("DM") {
            Some(dm) => Self::from_frame(&dm.data),
            None => Ok(Self::default()),
        }
    }

    pub fn from_frame(dm: &DataFrame) -> PolarsResult<Self> {
        if !has_column(dm, "USUBJID") || !has_column(dm, "RFSTDTC") {
            return Ok(Self::default());
        }
        let subjects = column_strings(dm, "USUBJID")?;
        let starts = column_strings(dm, "RFSTDTC")?;
        Ok(Self {
            starts: subjects
                .into_iter()
                .zip(starts)
                .filter(|(subject, start)| !subject.is_empty() && !start.is_empty())
                .collect(),
        })
    }

    pub fn reference_start(&self, usubjid: &str) -> Option<&str> {
        self.starts.get(usubjid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }
}

/// One trial element a subject passed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub epoch: String,
    pub start: IsoDateTime,
    /// `None` for an element still open at data cut.
    pub end: Option<IsoDateTime>,
}

impl Period {
    fn contains(&self, at: &IsoDateTime) -> bool {
        compare_at_common_precision(&self.start, at) != Ordering::Greater
            && self
                .end
                .as_ref()
                .is_none_or(|end| compare_at_common_precision(at, end) != Ordering::Greater)
    }
}

/// SE elements per subject, ordered by start.
#[derive(Debug, Clone, Default)]
pub struct PeriodTable {
    subjects: BTreeMap<String, Vec<Period>>,
}

impl PeriodTable {
    /// `None` when SE has not been produced.
    pub fn from_snapshot(snapshot: &ProducedTables) -> PolarsResult<Option<Self>> {
        snapshot
            .get("SE")
            .map(|se| Self::from_frame(&se.data))
            .transpose()
    }

    /// Elements without an EPOCH or a parseable start are skipped.
    pub fn from_frame(se: &DataFrame) -> PolarsResult<Self> {
        let mut subjects: BTreeMap<String, Vec<Period>> = BTreeMap::new();
        if !["USUBJID", "EPOCH", "SESTDTC"].iter().all(|c| has_column(se, c)) {
            return Ok(Self { subjects });
        }
        let ids = column_strings(se, "USUBJID")?;
        let epochs = column_strings(se, "EPOCH")?;
        let starts = column_strings(se, "SESTDTC")?;
        let ends = if has_column(se, "SEENDTC") {
            column_strings(se, "SEENDTC")?
        } else {
            vec![String::new(); se.height()]
        };
        for (((id, epoch), start), end) in ids.into_iter().zip(epochs).zip(starts).zip(ends) {
            let Some(start) = parse_iso8601(&start) else {
                continue;
            };
            if id.is_empty() || epoch.is_empty() {
                continue;
            }
            subjects.entry(id).or_default().push(Period {
                epoch,
                start,
                end: parse_iso8601(&end),
            });
        }
        for periods in subjects.values_mut() {
            periods.sort_by(|a, b| compare_at_common_precision(&a.start, &b.start));
        }
        Ok(Self { subjects })
    }

    pub fn periods(&self, usubjid: &str) -> &[Period] {
        self.subjects.get(usubjid).map(Vec::as_slice).unwrap_or_default()
    }

    /// Epoch of the element containing `at`.
    ///
    /// Only dates with at least day precision are placed. When `at` sits on a
    /// boundary shared by two elements, the later element wins.
    pub fn epoch_at(&self, usubjid: &str, at: &IsoDateTime) -> Option<&str> {
        at.date()?;
        self.periods(usubjid)
            .iter()
            .filter(|period| period.contains(at))
            .last()
            .map(|period| period.epoch.as_str())
    }
}
