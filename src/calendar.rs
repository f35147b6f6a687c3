//! Time-axis normalization for CF-convention model calendars.
//!
//! Climate-model output encodes time as numeric offsets from an arbitrary
//! origin, declared by a units string of the form `"<unit> since
//! <YYYY>-<MM>-<DD>[ HH:MM:SS]"` plus an optional `calendar` attribute. Many
//! models run a 365-day ("no-leap") calendar: February never has a 29th day,
//! and offset arithmetic must use a fixed 365-day year regardless of what the
//! Gregorian calendar says about the target year. Delegating that arithmetic
//! to a Gregorian-only date library silently shifts every date by up to a day
//! per skipped leap day over a long run, so no-leap offsets are resolved here
//! by tracking day-of-year modulo 365.

use chrono::{Datelike, NaiveDate, TimeDelta};

use crate::errors::{PipelineError, Result};
use crate::series::CfDate;

/// Month lengths of the fixed 365-day model year
const NOLEAP_DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Offset unit declared by the time variable's units string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Days,
    Hours,
    Seconds,
}

impl TimeUnit {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "day" | "days" | "d" => Some(TimeUnit::Days),
            "hour" | "hours" | "hr" | "hrs" | "h" => Some(TimeUnit::Hours),
            "second" | "seconds" | "sec" | "secs" | "s" => Some(TimeUnit::Seconds),
            _ => None,
        }
    }

    /// Converts an offset in this unit to fractional days.
    fn to_days(self, offset: f64) -> f64 {
        match self {
            TimeUnit::Days => offset,
            TimeUnit::Hours => offset / 24.0,
            TimeUnit::Seconds => offset / 86_400.0,
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeUnit::Days => write!(f, "days"),
            TimeUnit::Hours => write!(f, "hours"),
            TimeUnit::Seconds => write!(f, "seconds"),
        }
    }
}

/// Calendar variant the offsets are counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarKind {
    /// Ordinary Gregorian arithmetic
    Standard,
    /// Fixed 365-day years, no February 29th
    NoLeap,
}

impl CalendarKind {
    /// Maps a CF `calendar` attribute value to a supported kind.
    ///
    /// Unknown names are an error rather than a silent Gregorian fallback.
    pub fn parse(name: &str, source: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "standard" | "gregorian" | "proleptic_gregorian" => Ok(CalendarKind::Standard),
            "noleap" | "no_leap" | "365_day" => Ok(CalendarKind::NoLeap),
            _ => Err(PipelineError::UnknownCalendar {
                calendar: name.to_string(),
                source_name: source.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for CalendarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalendarKind::Standard => write!(f, "standard"),
            CalendarKind::NoLeap => write!(f, "noleap"),
        }
    }
}

/// Parsed time-coordinate encoding of one source: offset unit, origin date,
/// calendar variant. Read once per source and immutable thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeEncoding {
    pub unit: TimeUnit,
    pub origin: CfDate,
    pub calendar: CalendarKind,
    /// Raw units string, kept for diagnostics
    pub units_str: String,
}

impl TimeEncoding {
    /// Parses a units string and optional calendar attribute.
    ///
    /// A missing calendar attribute defaults to `standard`, per CF convention.
    pub fn parse(units: &str, calendar: Option<&str>, source: &str) -> Result<Self> {
        let malformed = |reason: &str| PipelineError::MalformedTimeUnits {
            units: units.to_string(),
            source_name: source.to_string(),
            reason: reason.to_string(),
        };

        // Expected: "<unit> since <YYYY>-<MM>-<DD>" with an optional time-of-day tail
        let parts: Vec<&str> = units.splitn(3, ' ').collect();
        if parts.len() < 3 || parts[1] != "since" {
            return Err(malformed("expected '<unit> since <date>'"));
        }

        let unit = TimeUnit::parse(parts[0])
            .ok_or_else(|| malformed(&format!("unsupported unit '{}'", parts[0])))?;

        // Tolerate both "1850-01-01 00:00:00" and "1850-01-01T00:00:00" tails.
        let date_str = parts[2]
            .split_whitespace()
            .next()
            .unwrap_or(parts[2])
            .split('T')
            .next()
            .unwrap_or(parts[2]);
        let origin = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map(|d| CfDate::new(d.year(), d.month(), d.day()))
            .map_err(|e| malformed(&format!("bad origin date '{date_str}': {e}")))?;

        let calendar = match calendar {
            Some(name) => CalendarKind::parse(name, source)?,
            None => CalendarKind::Standard,
        };

        if calendar == CalendarKind::NoLeap
            && origin.day > NOLEAP_DAYS_IN_MONTH[origin.month as usize - 1]
        {
            return Err(malformed("origin date does not exist in a no-leap calendar"));
        }

        Ok(TimeEncoding {
            unit,
            origin,
            calendar,
            units_str: units.to_string(),
        })
    }
}

/// Converts raw numeric time offsets into calendar dates.
///
/// The output has the same length and order as `offsets`. Sub-day precision is
/// dropped: offsets are floored to whole days before arithmetic, so a monthly
/// mean stamped mid-month resolves to that month.
pub fn normalize(offsets: &[f64], encoding: &TimeEncoding, source: &str) -> Result<Vec<CfDate>> {
    offsets
        .iter()
        .map(|&offset| {
            let days = encoding.unit.to_days(offset).floor() as i64;
            match encoding.calendar {
                CalendarKind::NoLeap => noleap_add_days(encoding.origin, days),
                CalendarKind::Standard => standard_add_days(encoding.origin, days, encoding, source),
            }
        })
        .collect()
}

/// 365-day calendar arithmetic: day-of-year modulo the fixed year length.
fn noleap_add_days(origin: CfDate, days: i64) -> Result<CfDate> {
    let total = noleap_day_of_year0(origin.month, origin.day) + days;
    let year = origin.year + total.div_euclid(365) as i32;
    let (month, day) = noleap_month_day(total.rem_euclid(365) as u32);
    Ok(CfDate::new(year, month, day))
}

fn noleap_day_of_year0(month: u32, day: u32) -> i64 {
    let preceding: u32 = NOLEAP_DAYS_IN_MONTH[..month as usize - 1].iter().sum();
    (preceding + day - 1) as i64
}

fn noleap_month_day(mut doy0: u32) -> (u32, u32) {
    for (i, &len) in NOLEAP_DAYS_IN_MONTH.iter().enumerate() {
        if doy0 < len {
            return (i as u32 + 1, doy0 + 1);
        }
        doy0 -= len;
    }
    unreachable!("day-of-year already reduced modulo 365")
}

fn standard_add_days(
    origin: CfDate,
    days: i64,
    encoding: &TimeEncoding,
    source: &str,
) -> Result<CfDate> {
    let overflow = |detail: &str| PipelineError::MalformedTimeUnits {
        units: encoding.units_str.clone(),
        source_name: source.to_string(),
        reason: detail.to_string(),
    };

    let base = NaiveDate::from_ymd_opt(origin.year, origin.month, origin.day)
        .ok_or_else(|| overflow("origin is not a valid Gregorian date"))?;
    let date = base
        .checked_add_signed(TimeDelta::days(days))
        .ok_or_else(|| overflow(&format!("offset of {days} days overflows the date range")))?;

    Ok(CfDate::new(date.year(), date.month(), date.day()))
}
