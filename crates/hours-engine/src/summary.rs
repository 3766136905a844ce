//! Compact English summaries of a period's recurring pattern.
//!
//! Summaries read the period's time spans only. Dates are never expanded,
//! and rules contribute their descriptions, not their matches.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveTime, Weekday};
use serde::Serialize;

use crate::aggregate::validate_period;
use crate::error::Result;
use crate::model::{Period, RuleMatch, State, TimeSpan, TimeSpanGroup, ALL_WEEKDAYS};

/// The clock hours of a summary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Hours {
    WholeDay,
    /// `end` at or before `start` runs past midnight.
    Span { start: NaiveTime, end: NaiveTime },
}

impl fmt::Display for Hours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hours::WholeDay => f.write_str("whole day"),
            Hours::Span { start, end } => {
                write!(f, "{}–{}", start.format("%H:%M"), end.format("%H:%M"))
            }
        }
    }
}

/// Consecutive weekdays, both ends included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WeekdayRange {
    pub first: Weekday,
    pub last: Weekday,
}

impl fmt::Display for WeekdayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}–{}", self.first, self.last)
        }
    }
}

/// Weekdays sharing the same hours and state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    pub weekdays: Vec<WeekdayRange>,
    pub hours: Hours,
    pub state: State,
}

impl fmt::Display for SummaryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days: Vec<String> = self.weekdays.iter().map(ToString::to_string).collect();
        write!(
            f,
            "{} {} {}",
            days.join(", "),
            self.hours,
            self.state.label().to_lowercase()
        )
    }
}

/// Summary of one time span group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    /// Sorted by first weekday, then hours.
    pub entries: Vec<SummaryEntry>,
    /// English descriptions of the group's rules, in rule order.
    pub rules: Vec<String>,
    pub rule_match: RuleMatch,
}

impl fmt::Display for GroupSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self.entries.iter().map(ToString::to_string).collect();
        f.write_str(&entries.join(", "))
    }
}

// ── summarize ───────────────────────────────────────────────────────────────

/// Summarize each time span group of `period`.
///
/// Groups without time spans are skipped. A period with no groups at all and
/// a defined state summarizes as a single whole-day entry for every weekday.
///
/// # Errors
///
/// Returns [`crate::HoursError::Configuration`] if the period fails
/// validation.
pub fn summarize(period: &Period) -> Result<Vec<GroupSummary>> {
    validate_period(period)?;

    if period.time_span_groups.is_empty() {
        if period.resource_state == State::Undefined {
            return Ok(Vec::new());
        }
        return Ok(vec![GroupSummary {
            entries: vec![SummaryEntry {
                weekdays: vec![WeekdayRange {
                    first: Weekday::Mon,
                    last: Weekday::Sun,
                }],
                hours: Hours::WholeDay,
                state: period.resource_state,
            }],
            rules: Vec::new(),
            rule_match: RuleMatch::default(),
        }]);
    }

    Ok(period
        .time_span_groups
        .iter()
        .filter(|group| !group.time_spans.is_empty())
        .map(|group| summarize_group(group, period.resource_state))
        .collect())
}

fn summarize_group(group: &TimeSpanGroup, fallback_state: State) -> GroupSummary {
    // Weekday indices (Monday = 0) keyed by their sorted (hours, state) signature.
    let mut by_signature: BTreeMap<Vec<(Hours, State)>, Vec<usize>> = BTreeMap::new();
    for (index, day) in ALL_WEEKDAYS.into_iter().enumerate() {
        let mut signature: Vec<(Hours, State)> = group
            .time_spans
            .iter()
            .filter(|span| span.weekdays.is_none_or(|mask| mask.contains(day)))
            .filter_map(|span| span_hours(span).map(|hours| (hours, span_state(span, fallback_state))))
            .collect();
        if signature.is_empty() {
            continue;
        }
        signature.sort();
        signature.dedup();
        by_signature.entry(signature).or_default().push(index);
    }

    let mut entries: Vec<(usize, SummaryEntry)> = Vec::new();
    for (signature, days) in by_signature {
        let weekdays = weekday_ranges(&days);
        let first_day = days.first().copied().unwrap_or_default();
        for (hours, state) in signature {
            entries.push((
                first_day,
                SummaryEntry {
                    weekdays: weekdays.clone(),
                    hours,
                    state,
                },
            ));
        }
    }
    entries.sort_by(|(day_a, a), (day_b, b)| {
        day_a
            .cmp(day_b)
            .then(a.hours.cmp(&b.hours))
            .then(a.state.cmp(&b.state))
    });

    GroupSummary {
        entries: entries.into_iter().map(|(_, entry)| entry).collect(),
        rules: group.rules.iter().map(|rule| rule.describe()).collect(),
        rule_match: group.rule_match,
    }
}

fn span_hours(span: &TimeSpan) -> Option<Hours> {
    if span.full_day {
        return Some(Hours::WholeDay);
    }
    Some(Hours::Span {
        start: span.start_time?,
        end: span.end_time?,
    })
}

fn span_state(span: &TimeSpan, fallback_state: State) -> State {
    span.resource_state.unwrap_or(fallback_state)
}

/// Collapse sorted weekday indices into runs of consecutive days.
fn weekday_ranges(days: &[usize]) -> Vec<WeekdayRange> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for &day in days {
        match runs.last_mut() {
            Some((_, last)) if *last + 1 == day => *last = day,
            _ => runs.push((day, day)),
        }
    }
    runs.into_iter()
        .map(|(first, last)| WeekdayRange {
            first: ALL_WEEKDAYS[first],
            last: ALL_WEEKDAYS[last],
        })
        .collect()
}

// ── period_as_text ──────────────────────────────────────────────────────────

/// Multi-line description of `period` for reports.
///
/// # Errors
///
/// Returns [`crate::HoursError::Configuration`] if the period fails
/// validation.
pub fn period_as_text(period: &Period) -> Result<String> {
    let groups = summarize(period)?;

    let mut text = String::new();
    if let Some(name) = &period.name {
        text.push_str(name);
        text.push('\n');
    }
    text.push_str(&format!("Date period: {}", date_range_text(period)));
    if period.is_override {
        text.push_str(" (override)");
    }
    text.push_str("\nOpening hours:\n");

    if groups.is_empty() {
        text.push_str("\n Not specified\n");
    }
    for (index, group) in groups.iter().enumerate() {
        if index > 0 {
            text.push_str("\n ---\n");
        }
        text.push('\n');
        for entry in &group.entries {
            text.push_str(&format!(" {entry}\n"));
        }
        if !group.rules.is_empty() {
            let quantifier = match group.rule_match {
                RuleMatch::Any => "any",
                RuleMatch::All => "every one",
            };
            text.push_str(&format!("\n In effect when {quantifier} of these match:\n"));
            for rule in &group.rules {
                text.push_str(&format!(" - {rule}\n"));
            }
        }
    }
    Ok(text)
}

fn date_range_text(period: &Period) -> String {
    match (period.start_date, period.end_date) {
        (None, None) => "Not specified".to_string(),
        (Some(start), Some(end)) if start == end => start.to_string(),
        (start, end) => format!(
            "{} - {}",
            start.map(|d| d.to_string()).unwrap_or_default(),
            end.map(|d| d.to_string()).unwrap_or_default()
        ),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
