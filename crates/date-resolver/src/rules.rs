//! The ordered rule table consulted by [`crate::resolver`].
//!
//! Each entry pairs a [`Rule`] with a precompiled, start-anchored pattern.
//! Entries are tried in declaration order and the first match wins, even if
//! applying the rule then fails.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Which branch of the cascade produced a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// `next day`
    NextDay,
    /// `next week`
    NextWeek,
    /// `<weekday> next week`
    WeekdayNextWeek,
    /// `next month`
    NextMonth,
    /// `in a month`, `in 3 months`
    InMonths,
    /// `9 days`, `9 days from today`, `5 days from tomorrow`
    DaysFrom,
    /// `next 5 days`
    NextNDays,
    /// `tomorrow`
    Tomorrow,
    /// `next <weekday>`
    NextWeekday,
    /// `the 4th of next month`, `15 next month`
    DayOfNextMonth,
    /// `the 31st`, `27th`, `5`
    DayOfMonth,
    /// Generic lenient parsing (`2025-02-20`, `March 15`, `on Saturday`).
    Fuzzy,
}

impl Rule {
    pub fn as_str(self) -> &'static str {
        match self {
            Rule::NextDay => "next_day",
            Rule::NextWeek => "next_week",
            Rule::WeekdayNextWeek => "weekday_next_week",
            Rule::NextMonth => "next_month",
            Rule::InMonths => "in_months",
            Rule::DaysFrom => "days_from",
            Rule::NextNDays => "next_n_days",
            Rule::Tomorrow => "tomorrow",
            Rule::NextWeekday => "next_weekday",
            Rule::DayOfNextMonth => "day_of_next_month",
            Rule::DayOfMonth => "day_of_month",
            Rule::Fuzzy => "fuzzy",
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) struct RulePattern {
    pub rule: Rule,
    pub regex: Regex,
}

const WEEKDAYS: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday";

/// The cascade, in priority order. [`Rule::Fuzzy`] has no pattern; it is the
/// fallback when nothing here matches.
pub(crate) fn rule_table() -> &'static [RulePattern] {
    static TABLE: OnceLock<Vec<RulePattern>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let weekday_next_week = format!(r"^({WEEKDAYS})\s+next\s+week");
        let next_weekday = format!(r"^next\s+({WEEKDAYS})\b");
        [
            (Rule::NextDay, r"^next day$"),
            (Rule::NextWeek, r"^next week$"),
            (Rule::WeekdayNextWeek, weekday_next_week.as_str()),
            (Rule::NextMonth, r"^next month$"),
            (Rule::InMonths, r"^in\s+(?:a|([0-9]+))\s+months?"),
            (
                Rule::DaysFrom,
                r"^([0-9]+)\s*days?(?:\s*from\s*(now|today|tomorrow)?)?",
            ),
            (Rule::NextNDays, r"^next\s+([0-9]+)\s*days?"),
            (Rule::Tomorrow, r"^tomorrow$"),
            (Rule::NextWeekday, next_weekday.as_str()),
            (
                Rule::DayOfNextMonth,
                r"^(?:in|on)?\s*(?:the)?\s*([0-9]{1,2})(?:st|nd|rd|th)?\s*(?:of)?\s*next\s*month",
            ),
            (
                Rule::DayOfMonth,
                r"^(?:the)?\s*([0-9]{1,2})(?:st|nd|rd|th)?$",
            ),
        ]
        .into_iter()
        .map(|(rule, pattern)| RulePattern {
            rule,
            regex: Regex::new(pattern).expect("rule patterns are valid regexes"),
        })
        .collect()
    })
}

/// The first rule whose pattern matches `normalized`, if any.
pub(crate) fn match_rule(normalized: &str) -> Option<(Rule, regex::Captures<'_>)> {
    rule_table()
        .iter()
        .find_map(|p| p.regex.captures(normalized).map(|caps| (p.rule, caps)))
}
