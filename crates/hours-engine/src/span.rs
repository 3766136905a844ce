//! Turn a time span and an anchor date into a concrete interval.
//!
//! A full-day span covers `[00:00 anchor, 00:00 anchor+1)`. A span whose end
//! is after its start stays on the anchor date. A span whose end is at or
//! before its start runs into the next date: `[anchor+start, anchor+1+end)`.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::error::{HoursError, Result};
use crate::model::{midnight, Provenance, ResolvedInterval, State, TimeSpan};

/// A resolved span before it is tagged with the period it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub state: State,
    pub full_day: bool,
}

impl SpanInterval {
    pub fn tagged(self, date: NaiveDate, provenance: Provenance) -> ResolvedInterval {
        ResolvedInterval {
            date,
            start: self.start,
            end: self.end,
            state: self.state,
            full_day: self.full_day,
            provenance,
        }
    }
}

/// Check the time span's own invariants.
///
/// # Errors
///
/// Returns [`HoursError::Configuration`] when a non-full-day span lacks a
/// start or end time, when start and end are equal, or when the weekday mask
/// is present but empty.
pub fn validate(span: &TimeSpan) -> Result<()> {
    let label = span.name.as_deref().unwrap_or("unnamed");

    if span.weekdays.is_some_and(|mask| mask.is_empty()) {
        return Err(HoursError::Configuration(format!(
            "time span '{label}' has an empty weekday mask"
        )));
    }
    if span.full_day {
        return Ok(());
    }
    match (span.start_time, span.end_time) {
        (Some(start), Some(end)) if start == end => Err(HoursError::Configuration(format!(
            "time span '{label}' starts and ends at {start}"
        ))),
        (Some(_), Some(_)) => Ok(()),
        (None, _) => Err(HoursError::Configuration(format!(
            "time span '{label}' has no start time and is not full-day"
        ))),
        (_, None) => Err(HoursError::Configuration(format!(
            "time span '{label}' has no end time and is not full-day"
        ))),
    }
}

/// Resolve `span` on `anchor`.
///
/// # Arguments
///
/// * `span` — the time span definition
/// * `anchor` — the date the interval is anchored on
/// * `fallback_state` — the period's state, used when the span has none
///
/// # Returns
///
/// `None` when the span's weekday mask excludes the anchor's weekday.
///
/// # Errors
///
/// Returns [`HoursError::Configuration`] if the span fails [`validate`].
pub fn resolve(
    span: &TimeSpan,
    anchor: NaiveDate,
    fallback_state: State,
) -> Result<Option<SpanInterval>> {
    validate(span)?;
    Ok(resolve_validated(span, anchor, fallback_state))
}

/// [`resolve`] for a span that already passed [`validate`].
pub(crate) fn resolve_validated(
    span: &TimeSpan,
    anchor: NaiveDate,
    fallback_state: State,
) -> Option<SpanInterval> {
    if let Some(mask) = span.weekdays {
        if !mask.contains(anchor.weekday()) {
            return None;
        }
    }

    let state = span.resource_state.unwrap_or(fallback_state);
    let next_day = anchor.succ_opt()?;

    if span.full_day {
        return Some(SpanInterval {
            start: midnight(anchor),
            end: midnight(next_day),
            state,
            full_day: true,
        });
    }

    let (start_time, end_time) = (span.start_time?, span.end_time?);
    let end = if end_time > start_time {
        anchor.and_time(end_time)
    } else {
        next_day.and_time(end_time)
    };

    Some(SpanInterval {
        start: anchor.and_time(start_time),
        end,
        state,
        full_day: false,
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────
