//! Resolve free-text date expressions against a reference instant.
//!
//! All functions take the reference "now" explicitly; nothing here reads the
//! system clock. The expression is trimmed and lower-cased, then matched
//! against the rule table in [`crate::rules`]. The first rule whose pattern
//! matches decides the outcome. When no rule matches, the expression goes to
//! a lenient token-based parser, and year-less dates that land in
//! the past are moved forward one year.
//!
//! # Entry points
//!
//! - [`resolve`] — total: `Some(date)` or `None` for anything unparseable
//! - [`resolve_iso`] — same, formatted as `YYYY-MM-DD`
//! - [`resolve_detailed`] — the matched [`Rule`] on success, the reason on failure
//! - [`resolve_in_timezone`] — reference taken from a UTC instant seen in an IANA timezone
//! - [`reference_in_timezone`] — the same conversion on its own

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc, Weekday};
use chrono_tz::Tz;
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::debug;

use crate::calendar::{
    add_days, add_months, add_years, days_until, first_month_with_day, parse_weekday,
};
use crate::error::{ResolveError, Result};
use crate::fuzzy::parse_fuzzy;
use crate::rules::{match_rule, Rule};

/// Forward search bound for "the 4th of next month"; any day 1-31 exists
/// within two consecutive months.
const NEXT_MONTH_SEARCH_LIMIT: u32 = 12;

/// Options for [`DateResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveOptions {
    /// How many months (starting with the reference month) a bare
    /// day-of-month like "the 31st" may scan before giving up.
    pub ordinal_scan_months: u32,
    /// Move year-less fallback dates that fall before the reference date
    /// forward by one year ("March 15" typed in April means next March).
    pub roll_past_dates_forward: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            ordinal_scan_months: 12,
            roll_past_dates_forward: true,
        }
    }
}

/// A successfully resolved expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDate {
    /// The input, as given.
    pub expression: String,
    /// The calendar date (serialized as `YYYY-MM-DD`).
    pub date: NaiveDate,
    /// Which rule produced the date.
    pub rule: Rule,
    /// Human-readable form (e.g., "Friday, April 11, 2025").
    pub interpretation: String,
}

impl ResolvedDate {
    /// The date as an ISO 8601 `YYYY-MM-DD` string.
    pub fn iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

impl std::fmt::Display for ResolvedDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.date.format("%Y-%m-%d"))
    }
}

/// Resolves date expressions with a fixed set of [`ResolveOptions`].
///
/// Holds no mutable state; a single resolver can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct DateResolver {
    options: ResolveOptions,
}

impl DateResolver {
    pub fn new(options: ResolveOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Resolve `expression`, or `None` if it cannot be resolved.
    ///
    /// Never panics and never returns an error: empty input, unknown phrases
    /// and impossible dates all map to `None`.
    pub fn resolve(&self, expression: &str, reference: NaiveDateTime) -> Option<NaiveDate> {
        self.resolve_detailed(expression, reference)
            .ok()
            .map(|resolved| resolved.date)
    }

    /// Resolve `expression` to a `YYYY-MM-DD` string.
    pub fn resolve_iso(&self, expression: &str, reference: NaiveDateTime) -> Option<String> {
        self.resolve_detailed(expression, reference)
            .ok()
            .map(|resolved| resolved.iso())
    }

    /// Resolve `expression`, reporting which rule fired or why it failed.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::EmptyExpression`] for empty or whitespace-only input
    /// - [`ResolveError::Unrecognized`] when neither a rule nor the lenient
    ///   parser finds a date
    /// - [`ResolveError::InvalidDate`] when the expression names a date that
    ///   does not exist or overflows the calendar
    /// - [`ResolveError::NoMatchingDay`] when a bare day-of-month is not
    ///   found within [`ResolveOptions::ordinal_scan_months`]
    pub fn resolve_detailed(
        &self,
        expression: &str,
        reference: NaiveDateTime,
    ) -> Result<ResolvedDate> {
        match self.resolve_date(expression, reference.date()) {
            Ok((date, rule)) => {
                debug!(expression, %rule, %date, "resolved date expression");
                Ok(ResolvedDate {
                    expression: expression.to_string(),
                    date,
                    rule,
                    interpretation: format_interpretation(date),
                })
            }
            Err(e) => {
                debug!(expression, error = %e, "date expression is unparseable");
                Err(e)
            }
        }
    }

    fn resolve_date(&self, expression: &str, today: NaiveDate) -> Result<(NaiveDate, Rule)> {
        let normalized = expression.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ResolveError::EmptyExpression);
        }

        if let Some((rule, caps)) = match_rule(&normalized) {
            let date = self.apply_rule(rule, &caps, today)?;
            return Ok((date, rule));
        }

        let date = self.fallback(&normalized, today)?;
        Ok((date, Rule::Fuzzy))
    }

    fn apply_rule(&self, rule: Rule, caps: &Captures<'_>, today: NaiveDate) -> Result<NaiveDate> {
        match rule {
            Rule::NextDay | Rule::Tomorrow => add_days(today, 1),
            Rule::NextWeek => add_days(today, 7),
            Rule::WeekdayNextWeek => {
                let target = capture_weekday(caps)?;
                let shifted = add_days(today, 7)?;
                add_days(shifted, days_until(shifted.weekday(), target))
            }
            Rule::NextMonth => add_months(today, 1),
            Rule::InMonths => {
                let months = match caps.get(1) {
                    Some(n) => parse_count(n.as_str())?,
                    None => 1,
                };
                add_months(today, months)
            }
            Rule::DaysFrom => {
                let days = parse_count(&caps[1])?;
                let base = match caps.get(2).map(|m| m.as_str()) {
                    Some("tomorrow") => add_days(today, 1)?,
                    _ => today,
                };
                add_days(base, days.into())
            }
            Rule::NextNDays => add_days(today, parse_count(&caps[1])?.into()),
            Rule::NextWeekday => {
                // Lands on the occurrence after the coming one: on a Tuesday,
                // "next friday" is Friday of the following week, not in 3 days.
                let target = capture_weekday(caps)?;
                let ahead = match days_until(today.weekday(), target) {
                    0 => 7,
                    n => n,
                };
                add_days(today, ahead + 7)
            }
            Rule::DayOfNextMonth => {
                let day = capture_day(caps)?;
                let next_month = add_months(today, 1)?;
                first_month_with_day(next_month, day, NEXT_MONTH_SEARCH_LIMIT)
            }
            Rule::DayOfMonth => {
                let day = capture_day(caps)?;
                self.next_day_of_month(today, day)
            }
            // Has no entry in the rule table.
            Rule::Fuzzy => Err(ResolveError::Unrecognized(caps[0].to_string())),
        }
    }

    /// The first date on or after `today` whose day-of-month is `day`.
    fn next_day_of_month(&self, today: NaiveDate, day: u32) -> Result<NaiveDate> {
        let months = self.options.ordinal_scan_months;
        let mut cursor = today;
        for _ in 0..months {
            if let Some(candidate) = cursor.with_day(day) {
                if candidate >= today {
                    return Ok(candidate);
                }
            }
            cursor = add_months(cursor, 1)?;
        }
        Err(ResolveError::NoMatchingDay { day, months })
    }

    fn fallback(&self, normalized: &str, today: NaiveDate) -> Result<NaiveDate> {
        let parsed = parse_fuzzy(normalized, today)?;
        if parsed == today {
            return Ok(today);
        }
        if parsed < today && self.options.roll_past_dates_forward && !has_explicit_year(normalized)
        {
            return add_years(parsed, 1);
        }
        Ok(parsed)
    }
}

/// Resolve with default options. See [`DateResolver::resolve`].
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use date_resolver::resolve;
///
/// let now = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap().and_hms_opt(10, 30, 0).unwrap();
/// assert_eq!(resolve("9 days from today", now), NaiveDate::from_ymd_opt(2025, 4, 10));
/// assert_eq!(resolve("random text", now), None);
/// ```
pub fn resolve(expression: &str, reference: NaiveDateTime) -> Option<NaiveDate> {
    DateResolver::default().resolve(expression, reference)
}

/// Resolve with default options to a `YYYY-MM-DD` string.
///
/// ```
/// use chrono::NaiveDate;
/// use date_resolver::resolve_iso;
///
/// let now = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap().and_hms_opt(10, 30, 0).unwrap();
/// assert_eq!(resolve_iso("March 15", now).as_deref(), Some("2026-03-15"));
/// ```
pub fn resolve_iso(expression: &str, reference: NaiveDateTime) -> Option<String> {
    DateResolver::default().resolve_iso(expression, reference)
}

/// Resolve with default options, keeping the rule or failure reason.
pub fn resolve_detailed(expression: &str, reference: NaiveDateTime) -> Result<ResolvedDate> {
    DateResolver::default().resolve_detailed(expression, reference)
}

/// Resolve against `anchor` as seen on a wall clock in `timezone`.
///
/// Use this when the reference comes from `Utc::now()` but "today" should
/// mean the user's local date.
///
/// # Errors
///
/// [`ResolveError::InvalidTimezone`] if `timezone` is not an IANA name, plus
/// everything [`DateResolver::resolve_detailed`] can return.
pub fn resolve_in_timezone(
    anchor: DateTime<Utc>,
    expression: &str,
    timezone: &str,
) -> Result<ResolvedDate> {
    let local = reference_in_timezone(anchor, timezone)?;
    resolve_detailed(expression, local)
}

/// The wall-clock date and time of `anchor` in the IANA `timezone`.
///
/// # Errors
///
/// [`ResolveError::InvalidTimezone`] if `timezone` is not an IANA name.
pub fn reference_in_timezone(anchor: DateTime<Utc>, timezone: &str) -> Result<NaiveDateTime> {
    let tz = parse_timezone(timezone)?;
    Ok(anchor.with_timezone(&tz).naive_local())
}

// ── Internal helpers ────────────────────────────────────────────────────────

/// Parse an IANA timezone string into `Tz`.
fn parse_timezone(s: &str) -> Result<Tz> {
    s.parse::<Tz>()
        .map_err(|_| ResolveError::InvalidTimezone(format!("'{}'", s)))
}

fn has_explicit_year(s: &str) -> bool {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"\b[0-9]{4}\b").expect("year pattern is valid"))
        .is_match(s)
}

fn capture_weekday(caps: &Captures<'_>) -> Result<Weekday> {
    let name = caps.get(1).map_or("", |m| m.as_str());
    parse_weekday(name).ok_or_else(|| ResolveError::Unrecognized(format!("weekday '{name}'")))
}

fn capture_day(caps: &Captures<'_>) -> Result<u32> {
    let day = parse_count(&caps[1])?;
    if !(1..=31).contains(&day) {
        return Err(ResolveError::InvalidDate(format!("day {day}")));
    }
    Ok(day)
}

fn parse_count(s: &str) -> Result<u32> {
    s.parse()
        .map_err(|_| ResolveError::InvalidDate(format!("'{s}' is out of range")))
}

fn format_interpretation(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

// ── Tests ───────────────────────────────────────────────────────────────────
