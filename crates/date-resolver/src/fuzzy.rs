//! Lenient date parsing for expressions no cascade rule recognizes.
//!
//! The input is split into tokens and each token is classified on its own:
//! numeric dates (`2025-02-20`, `02/20/2025`), month and weekday names, day
//! numbers with optional ordinal suffixes, years and times of day. Words that
//! carry no date information ("on", "of", "this", "at") are skipped, so
//! `"on Saturday"` and `"1st of March"` both parse.
//!
//! Numeric dates are read month-first (`02/03/2025` is February 3rd) unless
//! the first field cannot be a month. Components the text does not mention
//! are taken from the reference date.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, Weekday};
use regex::Regex;
use tracing::trace;

use crate::calendar::{add_days, days_in_month, days_until, parse_month, parse_weekday_lenient};
use crate::error::{ResolveError, Result};

struct TokenPatterns {
    iso: Regex,
    compact: Regex,
    numeric_triple: Regex,
    numeric_pair: Regex,
    year: Regex,
    day: Regex,
    clock: Regex,
    meridiem_time: Regex,
}

impl TokenPatterns {
    /// Whether `word` is a complete token shape that must not be split apart.
    fn is_whole_token(&self, word: &str) -> bool {
        MERIDIEM.contains(&word)
            || self.iso.is_match(word)
            || self.numeric_triple.is_match(word)
            || self.numeric_pair.is_match(word)
            || self.day.is_match(word)
            || self.clock.is_match(word)
            || self.meridiem_time.is_match(word)
    }
}

const MERIDIEM: [&str; 4] = ["am", "pm", "a.m", "p.m"];

fn patterns() -> &'static TokenPatterns {
    static PATTERNS: OnceLock<TokenPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| TokenPatterns {
        // 2025-02-20, 2025-02-20t09:30:00
        iso: Regex::new(r"^([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})(?:t.*)?$")
            .expect("iso token pattern is valid"),
        // 20250220
        compact: Regex::new(r"^([0-9]{4})([0-9]{2})([0-9]{2})$")
            .expect("compact token pattern is valid"),
        // 02/20/2025, 20.02.2025, 2025/02/20
        numeric_triple: Regex::new(r"^([0-9]{1,4})[/.\-]([0-9]{1,2})[/.\-]([0-9]{1,4})$")
            .expect("numeric triple pattern is valid"),
        // 3/15
        numeric_pair: Regex::new(r"^([0-9]{1,2})[/\-]([0-9]{1,2})$")
            .expect("numeric pair pattern is valid"),
        year: Regex::new(r"^([0-9]{4})$").expect("year token pattern is valid"),
        // 15, 15th, 1st
        day: Regex::new(r"^([0-9]{1,2})(?:st|nd|rd|th)?$").expect("day token pattern is valid"),
        // 17:30, 17:30:00
        clock: Regex::new(r"^[0-9]{1,2}:[0-9]{2}(?::[0-9]{2})?$")
            .expect("clock token pattern is valid"),
        // 5pm, 5:30am, 5:30p.m.
        meridiem_time: Regex::new(r"^[0-9]{1,2}(?::[0-9]{2}){0,2}(?:am|pm|a\.m|p\.m)$")
            .expect("meridiem token pattern is valid"),
    })
}

/// Date components collected from the tokens.
#[derive(Debug, Default)]
struct Components {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    weekday: Option<Weekday>,
    saw_time: bool,
}

impl Components {
    fn is_empty(&self) -> bool {
        self.year.is_none()
            && self.month.is_none()
            && self.day.is_none()
            && self.weekday.is_none()
            && !self.saw_time
    }

    fn set_year(&mut self, year: i32) -> Result<()> {
        set_once(&mut self.year, year, "year")
    }

    fn set_month(&mut self, month: u32) -> Result<()> {
        if !(1..=12).contains(&month) {
            return Err(ResolveError::InvalidDate(format!("month {month}")));
        }
        set_once(&mut self.month, month, "month")
    }

    fn set_day(&mut self, day: u32) -> Result<()> {
        if !(1..=31).contains(&day) {
            return Err(ResolveError::InvalidDate(format!("day {day}")));
        }
        set_once(&mut self.day, day, "day")
    }

    fn set_weekday(&mut self, weekday: Weekday) -> Result<()> {
        set_once(&mut self.weekday, weekday, "weekday")
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, what: &str) -> Result<()>
where
    T: PartialEq + std::fmt::Debug,
{
    match slot {
        Some(existing) if *existing != value => Err(ResolveError::InvalidDate(format!(
            "conflicting {what}: {existing:?} and {value:?}"
        ))),
        _ => {
            *slot = Some(value);
            Ok(())
        }
    }
}

/// Parse `text` (already trimmed and lower-cased) leniently.
///
/// # Errors
///
/// [`ResolveError::Unrecognized`] when no token carries date information,
/// [`ResolveError::InvalidDate`] when the tokens describe a date that does
/// not exist (`"february 30"`) or contradict each other.
pub(crate) fn parse_fuzzy(text: &str, reference: NaiveDate) -> Result<NaiveDate> {
    let tokens = tokenize(text);

    let mut parts = Components::default();
    for (i, token) in tokens.iter().enumerate() {
        let followed_by_meridiem = matches!(
            tokens.get(i + 1).copied(),
            Some(next) if MERIDIEM.contains(&next)
        );
        classify(token, followed_by_meridiem, reference.year(), &mut parts)?;
    }

    if parts.is_empty() {
        return Err(ResolveError::Unrecognized(text.to_string()));
    }
    build(&parts, reference)
}

/// Split on whitespace and commas, then break up words that glue month names
/// to numbers (`march15`, `20-feb-2025`) at separators and letter/digit
/// boundaries. Recognized numeric shapes stay intact.
fn tokenize(text: &str) -> Vec<&str> {
    let p = patterns();
    let mut tokens = Vec::new();
    let words = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|t| t.trim_end_matches('.'))
        .filter(|t| !t.is_empty());
    for word in words {
        if p.is_whole_token(word) || !word.chars().any(char::is_alphabetic) {
            tokens.push(word);
        } else {
            split_mixed(word, &mut tokens);
        }
    }
    tokens
}

fn split_mixed<'a>(word: &'a str, out: &mut Vec<&'a str>) {
    let mut push = |piece: &'a str| {
        if !piece.is_empty() {
            out.push(piece);
        }
    };
    let mut start = 0;
    let mut prev_alpha: Option<bool> = None;
    for (i, c) in word.char_indices() {
        if matches!(c, '-' | '/' | '.') {
            push(&word[start..i]);
            start = i + c.len_utf8();
            prev_alpha = None;
            continue;
        }
        let alpha = c.is_alphabetic();
        if prev_alpha.is_some_and(|prev| prev != alpha) {
            push(&word[start..i]);
            start = i;
        }
        prev_alpha = Some(alpha);
    }
    push(&word[start..]);
}

fn classify(
    token: &str,
    followed_by_meridiem: bool,
    pivot_year: i32,
    parts: &mut Components,
) -> Result<()> {
    let p = patterns();

    if let Some(caps) = p.iso.captures(token) {
        parts.set_year(parse_num(&caps[1])? as i32)?;
        parts.set_month(parse_num(&caps[2])?)?;
        return parts.set_day(parse_num(&caps[3])?);
    }

    if let Some(caps) = p.compact.captures(token) {
        parts.set_year(parse_num(&caps[1])? as i32)?;
        parts.set_month(parse_num(&caps[2])?)?;
        return parts.set_day(parse_num(&caps[3])?);
    }

    if let Some(caps) = p.numeric_triple.captures(token) {
        let (a, b, c) = (&caps[1], &caps[2], &caps[3]);
        if a.len() == 4 {
            parts.set_year(parse_num(a)? as i32)?;
            parts.set_month(parse_num(b)?)?;
            return parts.set_day(parse_num(c)?);
        }
        let (month, day) = month_first(parse_num(a)?, parse_num(b)?);
        parts.set_year(expand_year(c, pivot_year)?)?;
        parts.set_month(month)?;
        return parts.set_day(day);
    }

    if let Some(caps) = p.numeric_pair.captures(token) {
        let (month, day) = month_first(parse_num(&caps[1])?, parse_num(&caps[2])?);
        parts.set_month(month)?;
        return parts.set_day(day);
    }

    if p.clock.is_match(token) || p.meridiem_time.is_match(token) {
        parts.saw_time = true;
        return Ok(());
    }

    if let Some(month) = parse_month(token) {
        return parts.set_month(month);
    }

    if let Some(weekday) = parse_weekday_lenient(token) {
        return parts.set_weekday(weekday);
    }

    if p.year.is_match(token) {
        return parts.set_year(parse_num(token)? as i32);
    }

    if let Some(caps) = p.day.captures(token) {
        if followed_by_meridiem {
            parts.saw_time = true;
            return Ok(());
        }
        let n = parse_num(&caps[1])?;
        // A bare number is the day until the day is known, then the year.
        if parts.day.is_none() && (1..=31).contains(&n) {
            return parts.set_day(n);
        }
        if parts.year.is_none() && caps[1].len() == 2 {
            return parts.set_year(expand_year(&caps[1], pivot_year)?);
        }
        return Err(ResolveError::InvalidDate(format!("unexpected number '{token}'")));
    }

    trace!(token, "ignoring token");
    Ok(())
}

fn build(parts: &Components, reference: NaiveDate) -> Result<NaiveDate> {
    let year = parts.year.unwrap_or(reference.year());
    let month = parts.month.unwrap_or(reference.month());
    let month_len = days_in_month(year, month)
        .ok_or_else(|| ResolveError::InvalidDate(format!("{year}-{month:02}")))?;

    let day = match parts.day {
        Some(day) if day > month_len => {
            return Err(ResolveError::InvalidDate(format!(
                "{year}-{month:02} has no day {day}"
            )));
        }
        Some(day) => day,
        None => reference.day().min(month_len),
    };

    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ResolveError::InvalidDate(format!("{year}-{month:02}-{day:02}")))?;

    match parts.weekday {
        Some(weekday) if parts.day.is_none() => {
            add_days(date, days_until(date.weekday(), weekday))
        }
        _ => Ok(date),
    }
}

/// Month-first reading of two numeric fields, swapped when the first cannot
/// be a month but the second can.
fn month_first(first: u32, second: u32) -> (u32, u32) {
    if first > 12 && second <= 12 {
        (second, first)
    } else {
        (first, second)
    }
}

/// Expand a written year. Two-digit years land within 50 years of `pivot_year`.
fn expand_year(digits: &str, pivot_year: i32) -> Result<i32> {
    let n = parse_num(digits)? as i32;
    if digits.len() > 2 {
        return Ok(n);
    }
    let mut year = n + pivot_year / 100 * 100;
    if year >= pivot_year + 50 {
        year -= 100;
    } else if year < pivot_year - 50 {
        year += 100;
    }
    Ok(year)
}

fn parse_num(s: &str) -> Result<u32> {
    s.parse()
        .map_err(|_| ResolveError::InvalidDate(format!("'{s}' is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reference() -> NaiveDate {
        date(2025, 4, 1) // Tuesday
    }

    #[test]
    fn test_iso_and_numeric_formats() {
        let r = reference();
        assert_eq!(parse_fuzzy("2025-02-20", r).unwrap(), date(2025, 2, 20));
        assert_eq!(parse_fuzzy("2025-02-20t09:30:00", r).unwrap(), date(2025, 2, 20));
        assert_eq!(parse_fuzzy("02/20/2025", r).unwrap(), date(2025, 2, 20));
        assert_eq!(parse_fuzzy("20/02/2025", r).unwrap(), date(2025, 2, 20));
        assert_eq!(parse_fuzzy("2025/02/20", r).unwrap(), date(2025, 2, 20));
        assert_eq!(parse_fuzzy("02/03/2025", r).unwrap(), date(2025, 2, 3));
        assert_eq!(parse_fuzzy("3/15", r).unwrap(), date(2025, 3, 15));
        assert_eq!(parse_fuzzy("02/20/25", r).unwrap(), date(2025, 2, 20));
    }

    #[test]
    fn test_month_names_in_any_order() {
        let r = reference();
        assert_eq!(parse_fuzzy("20 feb 2025", r).unwrap(), date(2025, 2, 20));
        assert_eq!(parse_fuzzy("february 20, 2025", r).unwrap(), date(2025, 2, 20));
        assert_eq!(parse_fuzzy("1st of march", r).unwrap(), date(2025, 3, 1));
        assert_eq!(parse_fuzzy("dec. 25", r).unwrap(), date(2025, 12, 25));
        assert_eq!(parse_fuzzy("feb 20 26", r).unwrap(), date(2026, 2, 20));
    }

    #[test]
    fn test_month_names_glued_to_numbers() {
        let r = reference();
        assert_eq!(parse_fuzzy("20-feb-2025", r).unwrap(), date(2025, 2, 20));
        assert_eq!(parse_fuzzy("feb-20-2025", r).unwrap(), date(2025, 2, 20));
        assert_eq!(parse_fuzzy("20feb2025", r).unwrap(), date(2025, 2, 20));
        assert_eq!(parse_fuzzy("march15", r).unwrap(), date(2025, 3, 15));
        assert_eq!(parse_fuzzy("15march", r).unwrap(), date(2025, 3, 15));
        assert_eq!(parse_fuzzy("dec.25", r).unwrap(), date(2025, 12, 25));
        assert_eq!(parse_fuzzy("5 a.m. march 3", r).unwrap(), date(2025, 3, 3));
    }

    #[test]
    fn test_compact_dates() {
        assert_eq!(parse_fuzzy("20250220", reference()).unwrap(), date(2025, 2, 20));
        assert!(matches!(
            parse_fuzzy("20251320", reference()),
            Err(ResolveError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_tokenize_keeps_numeric_shapes() {
        assert_eq!(tokenize("march15"), ["march", "15"]);
        assert_eq!(tokenize("20-feb-2025"), ["20", "feb", "2025"]);
        assert_eq!(tokenize("2025-02-20t09:30:00"), ["2025-02-20t09:30:00"]);
        assert_eq!(tokenize("15th at 5pm"), ["15th", "at", "5pm"]);
        assert_eq!(tokenize("9 a.m."), ["9", "a.m"]);
    }

    #[test]
    fn test_missing_components_default_to_reference() {
        assert_eq!(parse_fuzzy("april", date(2025, 3, 14)).unwrap(), date(2025, 4, 14));
        // Defaulted day clamps to the month length.
        assert_eq!(parse_fuzzy("april", date(2025, 1, 31)).unwrap(), date(2025, 4, 30));
        assert_eq!(parse_fuzzy("2026", reference()).unwrap(), date(2026, 4, 1));
        assert_eq!(parse_fuzzy("in 2 days", reference()).unwrap(), date(2025, 4, 2));
    }

    #[test]
    fn test_weekday_advances_on_or_after_reference() {
        let r = reference();
        assert_eq!(parse_fuzzy("on saturday", r).unwrap(), date(2025, 4, 5));
        assert_eq!(parse_fuzzy("this sat", r).unwrap(), date(2025, 4, 5));
        assert_eq!(parse_fuzzy("tuesday", r).unwrap(), date(2025, 4, 1));
    }

    #[test]
    fn test_times_are_consumed() {
        let r = reference();
        assert_eq!(parse_fuzzy("march 15 at 5pm", r).unwrap(), date(2025, 3, 15));
        assert_eq!(parse_fuzzy("march 15 at 5 pm", r).unwrap(), date(2025, 3, 15));
        assert_eq!(parse_fuzzy("june 3 17:30", r).unwrap(), date(2025, 6, 3));
        assert_eq!(parse_fuzzy("at 9am", r).unwrap(), r);
    }

    #[test]
    fn test_no_date_tokens_is_unrecognized() {
        let r = reference();
        assert!(matches!(
            parse_fuzzy("random text", r),
            Err(ResolveError::Unrecognized(_))
        ));
        assert!(matches!(
            parse_fuzzy("next weekend", r),
            Err(ResolveError::Unrecognized(_))
        ));
    }

    #[test]
    fn test_impossible_dates_are_invalid() {
        let r = reference();
        assert!(matches!(
            parse_fuzzy("february 30", r),
            Err(ResolveError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_fuzzy("2025-13-01", r),
            Err(ResolveError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_fuzzy("march april", r),
            Err(ResolveError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_two_digit_year_window() {
        assert_eq!(expand_year("25", 2025).unwrap(), 2025);
        assert_eq!(expand_year("80", 2025).unwrap(), 1980);
        assert_eq!(expand_year("74", 2025).unwrap(), 2074);
        assert_eq!(expand_year("2031", 2025).unwrap(), 2031);
    }
}
