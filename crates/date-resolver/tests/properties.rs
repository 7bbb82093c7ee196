use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use date_resolver::{resolve, resolve_iso, resolve_trip, Rule};
use proptest::prelude::*;

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

/// Reference instants between 2000 and ~2054, at any time of day.
fn reference() -> impl Strategy<Value = NaiveDateTime> {
    (0u64..20_000, 0u32..24, 0u32..60).prop_map(|(offset, h, m)| {
        NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .checked_add_days(Days::new(offset))
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    })
}

fn plus_days(reference: NaiveDateTime, n: u64) -> NaiveDate {
    reference.date().checked_add_days(Days::new(n)).unwrap()
}

proptest! {
    #[test]
    fn never_panics_and_output_is_iso(s in ".{0,64}", now in reference()) {
        if let Some(iso) = resolve_iso(&s, now) {
            prop_assert_eq!(iso.len(), 10);
            prop_assert!(NaiveDate::parse_from_str(&iso, "%Y-%m-%d").is_ok(), "bad iso: {}", iso);
        }
    }

    #[test]
    fn words_without_dates_are_unparseable(s in "[qxz]{1,12}( [qxz]{1,12}){0,3}", now in reference()) {
        prop_assert_eq!(resolve(&s, now), None);
    }

    #[test]
    fn tomorrow_equals_next_day(now in reference()) {
        let expected = Some(plus_days(now, 1));
        prop_assert_eq!(resolve("tomorrow", now), expected);
        prop_assert_eq!(resolve("next day", now), expected);
    }

    #[test]
    fn days_from_today_and_tomorrow(n in 0u64..2_000, now in reference()) {
        prop_assert_eq!(resolve(&format!("{n} days from today"), now), Some(plus_days(now, n)));
        prop_assert_eq!(resolve(&format!("{n} days from now"), now), Some(plus_days(now, n)));
        prop_assert_eq!(resolve(&format!("{n} days from tomorrow"), now), Some(plus_days(now, n + 1)));
        prop_assert_eq!(resolve(&format!("next {n} days"), now), Some(plus_days(now, n)));
    }

    #[test]
    fn explicit_iso_dates_round_trip(offset in 0u64..60_000, now in reference()) {
        let date = NaiveDate::from_ymd_opt(1900, 1, 1)
            .unwrap()
            .checked_add_days(Days::new(offset))
            .unwrap();
        let iso = date.format("%Y-%m-%d").to_string();
        let first = resolve_iso(&iso, now);
        prop_assert_eq!(first.as_deref(), Some(iso.as_str()));
        let second = resolve_iso(&iso, now);
        prop_assert_eq!(second, first);
    }

    #[test]
    fn bare_day_of_month_is_never_in_the_past(day in 1u32..=31, now in reference()) {
        let resolved = resolve(&format!("the {day}th"), now).unwrap();
        prop_assert!(resolved >= now.date());
        prop_assert_eq!(resolved.day(), day);
        // Every day-of-month recurs within three months.
        prop_assert!(resolved.signed_duration_since(now.date()).num_days() < 92);
    }

    #[test]
    fn next_weekday_is_eight_to_fourteen_days_out(idx in 0usize..7, now in reference()) {
        let (name, weekday) = WEEKDAYS[idx];
        let resolved = resolve(&format!("next {name}"), now).unwrap();
        let ahead = resolved.signed_duration_since(now.date()).num_days();
        prop_assert_eq!(resolved.weekday(), weekday);
        prop_assert!((8..=14).contains(&ahead), "{} days ahead", ahead);
    }

    #[test]
    fn weekday_next_week_lands_in_days_seven_to_thirteen(idx in 0usize..7, now in reference()) {
        let (name, weekday) = WEEKDAYS[idx];
        let resolved = resolve(&format!("{name} next week"), now).unwrap();
        let ahead = resolved.signed_duration_since(now.date()).num_days();
        prop_assert_eq!(resolved.weekday(), weekday);
        prop_assert!((7..=13).contains(&ahead), "{} days ahead", ahead);
    }

    #[test]
    fn in_months_never_overshoots_day(n in 1u32..48, now in reference()) {
        let resolved = resolve(&format!("in {n} months"), now).unwrap();
        prop_assert!(resolved.day() <= now.day());
        let months = (resolved.year() - now.year()) * 12 + resolved.month() as i32 - now.month() as i32;
        prop_assert_eq!(months, n as i32);
    }

    #[test]
    fn trip_return_never_precedes_departure(a in 0u64..60, b in 0u64..60, now in reference()) {
        let result = resolve_trip(&format!("{a} days"), Some(&format!("{b} days")), now);
        prop_assert_eq!(result.is_ok(), b >= a);
    }
}

#[test]
fn detailed_rule_matches_expression_family() {
    let now = NaiveDate::from_ymd_opt(2025, 4, 1)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap();
    let cases = [
        ("next day", Rule::NextDay),
        ("next week", Rule::NextWeek),
        ("thursday next week", Rule::WeekdayNextWeek),
        ("next month", Rule::NextMonth),
        ("in 2 months", Rule::InMonths),
        ("5 days from tomorrow", Rule::DaysFrom),
        ("next 5 days", Rule::NextNDays),
        ("tomorrow", Rule::Tomorrow),
        ("next monday", Rule::NextWeekday),
        ("in the 4th of next month", Rule::DayOfNextMonth),
        ("the 31st", Rule::DayOfMonth),
        ("February 20, 2025", Rule::Fuzzy),
    ];
    for (expr, rule) in cases {
        let resolved = date_resolver::resolve_detailed(expr, now).unwrap();
        assert_eq!(resolved.rule, rule, "{expr}");
    }
}
