//! ISO 8601 date/time parsing, normalization and comparison.
//!
//! Per SDTMIG 4.4.4, date/time values use ISO 8601 extended format at the
//! precision that was collected. A month-only date stays `2003-12`; nothing is
//! imputed.

use std::cmp::Ordering;

use chrono::{Datelike, Month, NaiveDate, NaiveDateTime, Timelike};

/// Time-of-day precision carried by a full datetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimePrecision {
    Minute,
    Second,
}

/// A date/time at the precision it was collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoDateTime {
    Year(i32),
    YearMonth { year: i32, month: u32 },
    Date(NaiveDate),
    DateTime {
        value: NaiveDateTime,
        precision: TimePrecision,
    },
}

impl IsoDateTime {
    /// Formats in ISO 8601 extended format at the carried precision.
    pub fn to_iso8601(&self) -> String {
        match self {
            IsoDateTime::Year(year) => format!("{year:04}"),
            IsoDateTime::YearMonth { year, month } => format!("{year:04}-{month:02}"),
            IsoDateTime::Date(date) => date.format("%Y-%m-%d").to_string(),
            IsoDateTime::DateTime {
                value,
                precision: TimePrecision::Minute,
            } => value.format("%Y-%m-%dT%H:%M").to_string(),
            IsoDateTime::DateTime {
                value,
                precision: TimePrecision::Second,
            } => value.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// The calendar date, when day precision was collected.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            IsoDateTime::Date(date) => Some(*date),
            IsoDateTime::DateTime { value, .. } => Some(value.date()),
            _ => None,
        }
    }

    /// Year, month, day, hour, minute, second, truncated to the collected precision.
    fn components(&self) -> Vec<i64> {
        match self {
            IsoDateTime::Year(year) => vec![i64::from(*year)],
            IsoDateTime::YearMonth { year, month } => vec![i64::from(*year), i64::from(*month)],
            IsoDateTime::Date(date) => date_components(*date),
            IsoDateTime::DateTime { value, precision } => {
                let mut parts = date_components(value.date());
                parts.push(i64::from(value.hour()));
                parts.push(i64::from(value.minute()));
                if *precision == TimePrecision::Second {
                    parts.push(i64::from(value.second()));
                }
                parts
            }
        }
    }
}

fn date_components(date: NaiveDate) -> Vec<i64> {
    vec![
        i64::from(date.year()),
        i64::from(date.month()),
        i64::from(date.day()),
    ]
}

/// Compares two values at the precision both of them carry.
///
/// `2024-01` and `2024-01-15` compare equal; `2024-01-15T08:00` and
/// `2024-01-15T09:00` do not.
pub fn compare_at_common_precision(a: &IsoDateTime, b: &IsoDateTime) -> Ordering {
    let left = a.components();
    let right = b.components();
    let common = left.len().min(right.len());
    left[..common].cmp(&right[..common])
}

/// Total chronological order. Values equal at their common precision sort
/// less precise first, so `2024-01-14` < `2024-01-14T09:00` < `2024-01-14T10:00`.
pub fn compare_chronologically(a: &IsoDateTime, b: &IsoDateTime) -> Ordering {
    a.components().cmp(&b.components())
}

/// Checks a character layout where `d` is an ASCII digit and any other
/// character must match exactly.
fn matches_layout(value: &str, layout: &str) -> bool {
    value.len() == layout.len()
        && value.bytes().zip(layout.bytes()).all(|(v, l)| match l {
            b'd' => v.is_ascii_digit(),
            other => v == other,
        })
}

/// Parses a value already in ISO 8601 extended format.
///
/// Accepts `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM`,
/// `YYYY-MM-DDTHH:MM:SS` and fractional seconds.
pub fn parse_iso8601(value: &str) -> Option<IsoDateTime> {
    let value = value.trim();
    if matches_layout(value, "dddd") {
        return value.parse::<i32>().ok().map(IsoDateTime::Year);
    }
    if matches_layout(value, "dddd-dd") {
        let year = value[..4].parse::<i32>().ok()?;
        let month = value[5..]
            .parse::<u32>()
            .ok()
            .filter(|m| (1..=12).contains(m))?;
        return Some(IsoDateTime::YearMonth { year, month });
    }
    if matches_layout(value, "dddd-dd-dd") {
        return NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .map(IsoDateTime::Date);
    }
    if matches_layout(value, "dddd-dd-ddTdd:dd") {
        return NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
            .ok()
            .map(|value| IsoDateTime::DateTime {
                value,
                precision: TimePrecision::Minute,
            });
    }
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value, None),
    };
    if matches_layout(whole, "dddd-dd-ddTdd:dd:dd")
        && fraction.is_none_or(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
    {
        return NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|value| IsoDateTime::DateTime {
                value,
                precision: TimePrecision::Second,
            });
    }
    None
}

/// Outcome of normalizing a collected date/time value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateNormalization {
    Missing,
    Iso(String),
    /// Not recognised; the trimmed original is kept.
    Unparseable(String),
}

/// Converts a collected date/time to ISO 8601 without imputing missing parts.
pub fn normalize_datetime(raw: &str) -> DateNormalization {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DateNormalization::Missing;
    }
    if parse_iso8601(trimmed).is_some() {
        return DateNormalization::Iso(trimmed.to_string());
    }
    match parse_collected(trimmed) {
        Some(parsed) => DateNormalization::Iso(parsed.to_iso8601()),
        None => DateNormalization::Unparseable(trimmed.to_string()),
    }
}

fn parse_collected(value: &str) -> Option<IsoDateTime> {
    try_parse_datetime(value)
        .or_else(|| try_parse_date(value).map(IsoDateTime::Date))
        .or_else(|| try_parse_partial(value))
}

fn try_parse_datetime(value: &str) -> Option<IsoDateTime> {
    let formats = [
        ("%Y-%m-%d %H:%M:%S", TimePrecision::Second),
        ("%Y-%m-%d %H:%M", TimePrecision::Minute),
        ("%Y/%m/%d %H:%M:%S", TimePrecision::Second),
        ("%Y/%m/%d %H:%M", TimePrecision::Minute),
        ("%d-%b-%Y %H:%M:%S", TimePrecision::Second),
        ("%d-%b-%Y %H:%M", TimePrecision::Minute),
        ("%d%b%Y:%H:%M:%S", TimePrecision::Second),
        ("%m/%d/%Y %H:%M:%S", TimePrecision::Second),
        ("%m/%d/%Y %H:%M", TimePrecision::Minute),
    ];
    formats.iter().find_map(|(fmt, precision)| {
        NaiveDateTime::parse_from_str(value, fmt)
            .ok()
            .map(|value| IsoDateTime::DateTime {
                value,
                precision: *precision,
            })
    })
}

fn try_parse_date(value: &str) -> Option<NaiveDate> {
    let formats = [
        "%Y/%m/%d",
        "%d-%b-%Y",
        "%d-%B-%Y",
        "%d %b %Y",
        "%d%b%Y",
        "%m/%d/%Y",
        "%b %d, %Y",
        "%B %d, %Y",
    ];
    if matches_layout(value, "dddddddd") {
        return NaiveDate::parse_from_str(value, "%Y%m%d").ok();
    }
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

fn is_unknown_marker(token: &str) -> bool {
    matches!(
        token.to_ascii_uppercase().as_str(),
        "UN" | "UNK" | "UK" | "XX" | "XXX" | "--"
    )
}

fn parse_year(token: &str) -> Option<i32> {
    matches_layout(token, "dddd")
        .then(|| token.parse::<i32>().ok())
        .flatten()
}

fn parse_month(token: &str) -> Option<u32> {
    if token.bytes().all(|b| b.is_ascii_digit()) && (1..=2).contains(&token.len()) {
        return token.parse::<u32>().ok().filter(|m| (1..=12).contains(m));
    }
    token.parse::<Month>().ok().map(|m| m.number_from_month())
}

fn year_month(year: i32, month: Option<u32>) -> IsoDateTime {
    match month {
        Some(month) => IsoDateTime::YearMonth { year, month },
        None => IsoDateTime::Year(year),
    }
}

/// Partial dates: unknown-component markers and month-year forms.
fn try_parse_partial(value: &str) -> Option<IsoDateTime> {
    let tokens: Vec<&str> = value
        .split(['-', ' ', '/'])
        .filter(|t| !t.is_empty())
        .collect();
    match tokens.as_slice() {
        // UN-JAN-2024, UNK-UNK-2024
        [day, month, year] if is_unknown_marker(day) => {
            let year = parse_year(year)?;
            if is_unknown_marker(month) {
                return Some(IsoDateTime::Year(year));
            }
            Some(year_month(year, Some(parse_month(month)?)))
        }
        // 2024-01-UN, 2024-UN-UN
        [year, month, day] if is_unknown_marker(day) => {
            let year = parse_year(year)?;
            if is_unknown_marker(month) {
                return Some(IsoDateTime::Year(year));
            }
            Some(year_month(year, Some(parse_month(month)?)))
        }
        // JAN-2024, 01/2024, UNK-2024
        [month, year] => {
            let year = parse_year(year)?;
            if is_unknown_marker(month) {
                return Some(IsoDateTime::Year(year));
            }
            Some(year_month(year, Some(parse_month(month)?)))
        }
        // JAN2024
        [compact] if compact.len() == 7 && compact.is_char_boundary(3) => {
            let (month, year) = compact.split_at(3);
            let year = parse_year(year)?;
            if is_unknown_marker(month) {
                return Some(IsoDateTime::Year(year));
            }
            Some(year_month(year, Some(parse_month(month)?)))
        }
        _ => None,
    }
}

/// True for values already valid ISO 8601 extended format.
pub fn is_valid_iso8601(value: &str) -> bool {
    parse_iso8601(value).is_some()
}
