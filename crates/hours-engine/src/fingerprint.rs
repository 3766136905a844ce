//! Order-independent digest of a resource's periods.
//!
//! Callers use it as the "period data version" part of a cache key. The same
//! periods in any order give the same digest. Names and the resource
//! reference are not part of it.

use sha2::{Digest, Sha256};

use crate::model::{Period, TimeSpan, TimeSpanGroup};
use crate::rule::Rule;

/// SHA-256 over the canonical form of `periods`, hex encoded.
pub fn fingerprint(periods: &[Period]) -> String {
    let mut inputs: Vec<String> = periods.iter().map(period_input).collect();
    inputs.sort();

    let mut hasher = Sha256::new();
    for input in &inputs {
        hasher.update(input.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

fn period_input(period: &Period) -> String {
    let date = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "*".to_string(), |d| d.to_string());
    let mut groups: Vec<String> = period.time_span_groups.iter().map(group_input).collect();
    groups.sort();

    format!(
        "[period:{}|{}|{}|{:?}|{}]{}",
        period.id,
        date(period.start_date),
        date(period.end_date),
        period.resource_state,
        period.is_override,
        groups.concat()
    )
}

fn group_input(group: &TimeSpanGroup) -> String {
    let mut rules: Vec<String> = group.rules.iter().map(rule_input).collect();
    rules.sort();
    let mut spans: Vec<String> = group.time_spans.iter().map(span_input).collect();
    spans.sort();

    format!(
        "[group:{:?}]{}{}",
        group.rule_match,
        rules.concat(),
        spans.concat()
    )
}

fn rule_input(rule: &Rule) -> String {
    match rule {
        Rule::Identity => "[rule:identity]".to_string(),
        Rule::WeekParity { parity } => format!("[rule:week_parity|{parity:?}]"),
        Rule::IsoWeekParity { parity } => format!("[rule:iso_week_parity|{parity:?}]"),
        Rule::WeekdayOfMonth { weekday, ordinal } => {
            format!("[rule:weekday_of_month|{weekday}|{ordinal}]")
        }
        Rule::MonthInterval { every, offset } => {
            format!("[rule:month_interval|{every}|{offset}]")
        }
    }
}

fn span_input(span: &TimeSpan) -> String {
    let time = |t: Option<chrono::NaiveTime>| t.map_or_else(|| "*".to_string(), |t| t.to_string());
    let weekdays = span.weekdays.map_or_else(
        || "*".to_string(),
        |mask| {
            mask.iter()
                .map(|day| day.number_from_monday().to_string())
                .collect::<Vec<_>>()
                .join(",")
        },
    );
    let state = span
        .resource_state
        .map_or_else(|| "*".to_string(), |state| format!("{state:?}"));

    format!(
        "[span:{}|{}|{}|{}|{}]",
        time(span.start_time),
        time(span.end_time),
        weekdays,
        span.full_day,
        state
    )
}

// ── Tests ───────────────────────────────────────────────────────────────────
