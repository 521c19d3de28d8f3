//! Relative-date phrase detection and literal date-string expansion.
//!
//! Detected ranges are computed against a caller-supplied reference date so
//! the expansion stays deterministic under test. Weeks run Monday–Sunday.

use std::collections::HashSet;

use time::{Date, Duration, Month};

/// Cap on appended date strings so expansion never overwhelms the query.
const MAX_DATE_TERMS: usize = 10;

#[derive(Debug)]
struct DateRange {
    start: Date,
    end: Date,
    label: &'static str,
}

/// Append literal date strings for every relative-date phrase in the query.
///
/// Each day of each detected range is rendered in six formats; the combined
/// terms are deduplicated in generation order and truncated to
/// [`MAX_DATE_TERMS`]. Queries without a phrase pass through unchanged.
pub(crate) fn add_date_context(query: &str, today: Date) -> String {
    let ranges = parse_date_expressions(query, today);
    if ranges.is_empty() {
        return query.to_string();
    }

    let mut seen = HashSet::new();
    let mut terms = Vec::new();
    for range in &ranges {
        let mut day = range.start;
        while day <= range.end {
            for term in format_date_terms(day) {
                if seen.insert(term.clone()) {
                    terms.push(term);
                }
            }
            match day.next_day() {
                Some(next) => day = next,
                None => break,
            }
        }
    }
    terms.truncate(MAX_DATE_TERMS);

    tracing::debug!(
        ranges = ?ranges.iter().map(|range| range.label).collect::<Vec<_>>(),
        terms = terms.len(),
        "Added date search terms"
    );
    format!("{query} {}", terms.join(" "))
}

fn parse_date_expressions(query: &str, today: Date) -> Vec<DateRange> {
    let lower = query.to_lowercase();
    let mut ranges = Vec::new();

    if lower.contains("today") {
        ranges.push(single_day(today, "today"));
    }
    if lower.contains("tomorrow") {
        ranges.push(single_day(today + Duration::days(1), "tomorrow"));
    }
    if lower.contains("yesterday") {
        ranges.push(single_day(today - Duration::days(1), "yesterday"));
    }
    if lower.contains("this week") {
        ranges.push(week_of(today, "this week"));
    }
    if lower.contains("next week") {
        ranges.push(week_of(today + Duration::days(7), "next week"));
    }
    if lower.contains("last week") {
        ranges.push(week_of(today - Duration::days(7), "last week"));
    }
    if lower.contains("this month") {
        ranges.push(month_of(today, "this month"));
    }
    if lower.contains("next month") {
        ranges.push(month_of(first_day_of_next_month(today), "next month"));
    }

    ranges
}

fn single_day(day: Date, label: &'static str) -> DateRange {
    DateRange {
        start: day,
        end: day,
        label,
    }
}

fn week_of(day: Date, label: &'static str) -> DateRange {
    let start = start_of_week(day);
    DateRange {
        start,
        end: start + Duration::days(6),
        label,
    }
}

fn month_of(day: Date, label: &'static str) -> DateRange {
    let start = day.replace_day(1).expect("day 1 exists in every month");
    let length = day.month().length(day.year());
    DateRange {
        start,
        end: day.replace_day(length).expect("month length is a valid day"),
        label,
    }
}

fn start_of_week(day: Date) -> Date {
    day - Duration::days(i64::from(day.weekday().number_days_from_monday()))
}

fn first_day_of_next_month(day: Date) -> Date {
    let (year, month) = match day.month() {
        Month::December => (day.year() + 1, Month::January),
        month => (day.year(), month.next()),
    };
    Date::from_calendar_date(year, month, 1).expect("first of month is a valid date")
}

/// Render one calendar day into the six formats fragments tend to carry.
fn format_date_terms(day: Date) -> [String; 6] {
    let dom = day.day();
    let month_number = day.month() as u8;
    let year = day.year();
    let month = month_name(day.month());
    let short_month = &month[..3];

    [
        format!("{dom} {month} {year}"),
        format!("{month} {dom} {year}"),
        format!("{dom} {short_month} {year}"),
        format!("{short_month} {dom} {year}"),
        format!("{dom}/{month_number}/{year}"),
        format!("{month_number}/{dom}/{year}"),
    ]
}

fn month_name(month: Month) -> &'static str {
    match month {
        Month::January => "january",
        Month::February => "february",
        Month::March => "march",
        Month::April => "april",
        Month::May => "may",
        Month::June => "june",
        Month::July => "july",
        Month::August => "august",
        Month::September => "september",
        Month::October => "october",
        Month::November => "november",
        Month::December => "december",
    }
}

/// Labels of the relative-date phrases detected in a query.
#[cfg(test)]
pub(crate) fn detected_labels(query: &str) -> Vec<&'static str> {
    use time::macros::date;
    parse_date_expressions(query, date!(2025 - 08 - 27))
        .into_iter()
        .map(|range| range.label)
        .collect()
}
