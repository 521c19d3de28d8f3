//! Heuristic query rewriting for better retrieval recall.
//!
//! Two independent passes compose: schedule-intent expansion appends a fixed
//! set of domain terms when the query smells like a calendar question, then
//! relative-date expansion turns phrases like "tomorrow" or "next week" into
//! literal date strings fragments are likely to contain. Queries without
//! either signal pass through unchanged.

mod dates;
mod schedule;

use time::{Date, OffsetDateTime};

/// Enhance a query relative to the current UTC date.
pub fn enhance_query(query: &str) -> String {
    enhance_query_at(query, OffsetDateTime::now_utc().date())
}

/// Enhance a query relative to an explicit reference date.
///
/// Schedule expansion is applied first; date expansion runs on its result.
pub fn enhance_query_at(query: &str, today: Date) -> String {
    let expanded = schedule::expand_schedule_intent(query);
    dates::add_date_context(&expanded, today)
}
