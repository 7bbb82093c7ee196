//! Calendar arithmetic shared by the rule cascade and the fuzzy parser.
//!
//! Month arithmetic clamps to the last day of the target month, so
//! `2025-01-31 + 1 month = 2025-02-28`. Nothing here reads the system clock.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

use crate::error::{ResolveError, Result};

/// Add `days` calendar days to `date`.
pub(crate) fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| ResolveError::InvalidDate(format!("{date} + {days} days is out of range")))
}

/// Shift `date` forward by `months` calendar months, clamping the day-of-month.
pub(crate) fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months)).ok_or_else(|| {
        ResolveError::InvalidDate(format!("{date} + {months} months is out of range"))
    })
}

/// Shift `date` forward by whole years (Feb 29 clamps to Feb 28).
pub(crate) fn add_years(date: NaiveDate, years: u32) -> Result<NaiveDate> {
    let months = years
        .checked_mul(12)
        .ok_or_else(|| ResolveError::InvalidDate(format!("{years} years is out of range")))?;
    add_months(date, months)
}

/// Number of days in the given month, or `None` for an invalid year/month.
pub(crate) fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.signed_duration_since(first).num_days() as u32)
}

/// Days to step forward from `from` to reach `to` (0..=6).
pub(crate) fn days_until(from: Weekday, to: Weekday) -> u64 {
    let delta = to.num_days_from_monday() as i64 - from.num_days_from_monday() as i64;
    delta.rem_euclid(7) as u64
}

/// The first month (starting with `date`'s own) that has day `day`, within
/// `max_months` month steps.
pub(crate) fn first_month_with_day(
    date: NaiveDate,
    day: u32,
    max_months: u32,
) -> Result<NaiveDate> {
    let mut cursor = date;
    for _ in 0..max_months {
        if let Some(found) = cursor.with_day(day) {
            return Ok(found);
        }
        cursor = add_months(cursor, 1)?;
    }
    Err(ResolveError::NoMatchingDay {
        day,
        months: max_months,
    })
}

/// Full English weekday name. Abbreviations are not accepted.
pub(crate) fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Weekday name, full or abbreviated ("sat", "tues", "thurs").
pub(crate) fn parse_weekday_lenient(s: &str) -> Option<Weekday> {
    parse_weekday(s).or(match s {
        "mon" => Some(Weekday::Mon),
        "tue" | "tues" => Some(Weekday::Tue),
        "wed" => Some(Weekday::Wed),
        "thu" | "thur" | "thurs" => Some(Weekday::Thu),
        "fri" => Some(Weekday::Fri),
        "sat" => Some(Weekday::Sat),
        "sun" => Some(Weekday::Sun),
        _ => None,
    })
}

/// Parse a month name to number (1-12).
pub(crate) fn parse_month(s: &str) -> Option<u32> {
    match s {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sep" | "sept" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}
