//! Expand a resource's periods into day-indexed candidate intervals.
//!
//! A period that cannot be interpreted is reported as a [`Diagnostic`] and
//! left out; every other period is still expanded.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{HoursError, Result};
use crate::model::{midnight, Period, PeriodId, ResolvedInterval, RuleMatch, State, TimeSpanGroup};
use crate::rule::{evaluate, Rule};
use crate::span;

/// A period that was skipped, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub period_id: PeriodId,
    pub error: HoursError,
}

/// Candidate intervals per date, before precedence and merging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Per date, in input order: period, then group, then time span.
    pub candidates: BTreeMap<NaiveDate, Vec<ResolvedInterval>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Expand `periods` over `[query_start, query_end]`.
///
/// Every period is validated, including ones outside the window, so the same
/// data always yields the same diagnostics.
pub fn aggregate(periods: &[Period], query_start: NaiveDate, query_end: NaiveDate) -> Aggregation {
    let mut aggregation = Aggregation::default();

    for period in periods {
        match expand_period(period, query_start, query_end) {
            Ok(intervals) => {
                for interval in intervals {
                    aggregation
                        .candidates
                        .entry(interval.date)
                        .or_default()
                        .push(interval);
                }
            }
            Err(error) => {
                tracing::warn!(period = %period.id, %error, "skipping unresolvable period");
                aggregation.diagnostics.push(Diagnostic {
                    period_id: period.id,
                    error,
                });
            }
        }
    }

    aggregation
}

/// Check a period's bounds, rules, and time spans.
///
/// # Errors
///
/// Returns the first [`HoursError::Configuration`] found.
pub fn validate_period(period: &Period) -> Result<()> {
    if let (Some(start), Some(end)) = (period.start_date, period.end_date) {
        if start > end {
            return Err(HoursError::Configuration(format!(
                "period ends on {end}, before its start date {start}"
            )));
        }
    }
    for group in &period.time_span_groups {
        for rule in &group.rules {
            rule.validate(period.start_date)?;
        }
        for time_span in &group.time_spans {
            span::validate(time_span)?;
        }
    }
    Ok(())
}

fn expand_period(
    period: &Period,
    query_start: NaiveDate,
    query_end: NaiveDate,
) -> Result<Vec<ResolvedInterval>> {
    validate_period(period)?;

    let Some((from, to)) = period.clip(query_start, query_end) else {
        return Ok(Vec::new());
    };
    let provenance = period.provenance();

    // A period with no time spans at all still states something for its
    // whole range, unless that state is undefined.
    if period.time_span_groups.is_empty() {
        if period.resource_state == State::Undefined {
            return Ok(Vec::new());
        }
        return Ok(from
            .iter_days()
            .take_while(|date| *date <= to)
            .filter_map(|date| {
                let next = date.succ_opt()?;
                Some(ResolvedInterval {
                    date,
                    start: midnight(date),
                    end: midnight(next),
                    state: period.resource_state,
                    full_day: true,
                    provenance,
                })
            })
            .collect());
    }

    let mut intervals = Vec::new();
    for group in &period.time_span_groups {
        for date in group_dates(group, period, from, to)? {
            for time_span in &group.time_spans {
                if let Some(resolved) =
                    span::resolve_validated(time_span, date, period.resource_state)
                {
                    intervals.push(resolved.tagged(date, provenance));
                }
            }
        }
    }
    Ok(intervals)
}

/// Dates in `[from, to]` on which the group's time spans apply.
fn group_dates(
    group: &TimeSpanGroup,
    period: &Period,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<BTreeSet<NaiveDate>> {
    let expand = |rule: &Rule| -> Result<BTreeSet<NaiveDate>> {
        Ok(evaluate(rule, period.start_date, period.end_date, from, to)?.collect())
    };

    let Some((first, rest)) = group.rules.split_first() else {
        return expand(&Rule::Identity);
    };

    let mut dates = expand(first)?;
    for rule in rest {
        let matched = expand(rule)?;
        match group.rule_match {
            RuleMatch::Any => dates.extend(matched),
            RuleMatch::All => dates.retain(|date| matched.contains(date)),
        }
    }
    Ok(dates)
}

// ── Tests ───────────────────────────────────────────────────────────────────
