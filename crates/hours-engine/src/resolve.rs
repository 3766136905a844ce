//! Public entry points: range resolution and the point-in-time query.
//!
//! `resolve` chains the aggregator, the override resolver, and the merger,
//! after checking the query range against [`ResolveOptions`]. The dates on
//! either side of the range are resolved too, so spans running past midnight
//! are settled against overrides the same way for any query window.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use crate::aggregate::{aggregate, Diagnostic};
use crate::error::{HoursError, Result};
use crate::merge::{merge, settle_midnight_spills};
use crate::model::{Period, ResolvedInterval};
use crate::precedence::{apply_overrides, Precedence, SpecificityFirst};

/// Longest query accepted by default, in days (both ends included).
pub const DEFAULT_MAX_RANGE_DAYS: u32 = 366;

/// Options for [`resolve`] and [`state_at`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Timezone the caller's dates and clock times are expressed in. Carried
    /// into the result; no conversion happens.
    pub timezone: Tz,
    /// Upper bound on the query length. `None` disables the check.
    pub max_range_days: Option<u32>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            max_range_days: Some(DEFAULT_MAX_RANGE_DAYS),
        }
    }
}

impl ResolveOptions {
    /// Set the timezone from an IANA name such as `"Europe/Helsinki"`.
    ///
    /// # Errors
    ///
    /// Returns [`HoursError::InvalidTimezone`] if the name is not a known
    /// IANA timezone.
    pub fn with_timezone(mut self, name: &str) -> Result<Self> {
        self.timezone = parse_timezone(name)?;
        Ok(self)
    }

    pub fn with_max_range_days(mut self, max_range_days: Option<u32>) -> Self {
        self.max_range_days = max_range_days;
        self
    }
}

fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| HoursError::InvalidTimezone(format!("'{name}'")))
}

/// Resolved hours for a query range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    #[serde(serialize_with = "serialize_timezone")]
    pub timezone: Tz,
    /// One entry per date of the query range, possibly empty.
    pub days: BTreeMap<NaiveDate, Vec<ResolvedInterval>>,
    /// Periods left out because they could not be interpreted.
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    /// Intervals anchored on `date`; empty for dates outside the range.
    pub fn intervals_on(&self, date: NaiveDate) -> &[ResolvedInterval] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All intervals, in date order.
    pub fn intervals(&self) -> impl Iterator<Item = &ResolvedInterval> {
        self.days.values().flatten()
    }
}

fn serialize_timezone<S: Serializer>(tz: &Tz, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(tz.name())
}

// ── resolve ─────────────────────────────────────────────────────────────────

/// Resolve `periods` into concrete intervals for every date in
/// `[query_start, query_end]`, using the default [`SpecificityFirst`] order.
///
/// # Arguments
///
/// * `periods` — all periods of one resource, normal and override
/// * `query_start`, `query_end` — the inclusive date range
/// * `options` — timezone context and range limit
///
/// # Errors
///
/// Returns [`HoursError::Range`] if the range is inverted or longer than
/// `options.max_range_days`. Periods that cannot be interpreted do not fail
/// the call; they are reported in [`Resolution::diagnostics`].
pub fn resolve(
    periods: &[Period],
    query_start: NaiveDate,
    query_end: NaiveDate,
    options: &ResolveOptions,
) -> Result<Resolution> {
    resolve_with(periods, query_start, query_end, options, &SpecificityFirst)
}

/// [`resolve`] with a caller-supplied precedence order.
pub fn resolve_with<P>(
    periods: &[Period],
    query_start: NaiveDate,
    query_end: NaiveDate,
    options: &ResolveOptions,
    precedence: &P,
) -> Result<Resolution>
where
    P: Precedence + ?Sized,
{
    check_range(query_start, query_end, options.max_range_days)?;
    tracing::debug!(
        periods = periods.len(),
        %query_start,
        %query_end,
        timezone = options.timezone.name(),
        "resolving opening hours"
    );

    let window_start = query_start.pred_opt().unwrap_or(query_start);
    let window_end = query_end.succ_opt().unwrap_or(query_end);
    let aggregation = aggregate(periods, window_start, window_end);
    let mut days = merge(apply_overrides(aggregation.candidates, precedence));
    settle_midnight_spills(&mut days);
    days.retain(|date, _| (query_start..=query_end).contains(date));
    for date in query_start.iter_days().take_while(|date| *date <= query_end) {
        days.entry(date).or_default();
    }

    Ok(Resolution {
        timezone: options.timezone,
        days,
        diagnostics: aggregation.diagnostics,
    })
}

fn check_range(query_start: NaiveDate, query_end: NaiveDate, max_range_days: Option<u32>) -> Result<()> {
    if query_start > query_end {
        return Err(HoursError::Range(format!(
            "query ends on {query_end}, before it starts on {query_start}"
        )));
    }
    let days = (query_end - query_start).num_days() + 1;
    if let Some(max) = max_range_days {
        if days > i64::from(max) {
            return Err(HoursError::Range(format!(
                "query covers {days} days, more than the limit of {max}"
            )));
        }
    }
    Ok(())
}

// ── state_at ────────────────────────────────────────────────────────────────

/// The interval in effect at `at`, or `None` when nothing covers it.
///
/// The previous date is resolved too, so a span running past midnight into
/// `at`'s date is found. When several intervals contain `at`, the one
/// anchored on `at`'s own date wins, then the earliest-starting.
///
/// # Errors
///
/// Same as [`resolve`]; the range limit is not applied.
pub fn state_at(
    periods: &[Period],
    at: NaiveDateTime,
    options: &ResolveOptions,
) -> Result<Option<ResolvedInterval>> {
    let date = at.date();
    let previous = date.pred_opt().unwrap_or(date);
    let unbounded = options.clone().with_max_range_days(None);
    let resolution = resolve(periods, previous, date, &unbounded)?;

    Ok(resolution
        .intervals()
        .filter(|interval| interval.contains(at))
        .min_by(|a, b| {
            (a.date != date)
                .cmp(&(b.date != date))
                .then(a.start.cmp(&b.start))
        })
        .cloned())
}

// ── Tests ───────────────────────────────────────────────────────────────────
