//! Schedule-intent detection and domain-term expansion.

use regex::Regex;
use std::sync::OnceLock;

const SCHEDULE_KEYWORDS: [&str; 12] = [
    "schedule",
    "meeting",
    "class",
    "session",
    "appointment",
    "cancelled",
    "postponed",
    "rescheduled",
    "agenda",
    "event",
    "deadline",
    "interview",
];

/// Terms appended to bias retrieval toward schedule-bearing fragments.
const DOMAIN_TERMS: &str = "schedule meeting class event session agenda placement talk interview";

fn what_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"what\s.*\b(today|tomorrow|schedule|happening)\b").expect("static regex compiles")
    })
}

fn has_schedule_intent(query: &str) -> bool {
    let lower = query.to_lowercase();
    SCHEDULE_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
        || what_pattern().is_match(&lower)
}

/// Append the fixed domain terms when the query carries schedule intent.
pub(crate) fn expand_schedule_intent(query: &str) -> String {
    if has_schedule_intent(query) {
        tracing::debug!("Schedule intent detected; appending domain terms");
        format!("{query} {DOMAIN_TERMS}")
    } else {
        query.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_triggers_expansion() {
        let expanded = expand_schedule_intent("is the standup meeting cancelled?");
        assert!(expanded.ends_with(DOMAIN_TERMS));
    }

    #[test]
    fn what_pattern_triggers_expansion() {
        assert!(has_schedule_intent("what is happening on campus"));
        assert!(has_schedule_intent("What do we have today"));
    }

    #[test]
    fn unrelated_query_is_untouched() {
        let query = "explain the refund policy";
        assert_eq!(expand_schedule_intent(query), query);
    }

    #[test]
    fn detection_is_case_insensitive() {
        assert!(has_schedule_intent("INTERVIEW prep notes"));
    }
}
