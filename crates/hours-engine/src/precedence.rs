//! Override handling and the precedence order between periods.
//!
//! On a date touched by any override period, normal periods are dropped and
//! the strongest override period takes the whole date. Without overrides all
//! normal periods stay, ordered strongest first, and the merger settles their
//! conflicts.
//!
//! Intervals the precedence order cannot tell apart (usually spans of one
//! period) are ranked by content: the shorter interval first, then start,
//! end, and state. The order spans are listed in never decides a conflict.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{Provenance, ResolvedInterval};

/// Total order between periods of the same class.
///
/// `Ordering::Less` means `a` is stronger than `b`. Implementations must be
/// deterministic for identical input. Closures of the right shape implement
/// this trait too.
pub trait Precedence {
    fn compare(&self, a: &Provenance, b: &Provenance) -> Ordering;
}

impl<F> Precedence for F
where
    F: Fn(&Provenance, &Provenance) -> Ordering,
{
    fn compare(&self, a: &Provenance, b: &Provenance) -> Ordering {
        self(a, b)
    }
}

/// Default order: the narrower explicit date range wins, an unbounded period
/// is the widest, and among equal widths the greater period id wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecificityFirst;

impl Precedence for SpecificityFirst {
    fn compare(&self, a: &Provenance, b: &Provenance) -> Ordering {
        let width = |p: &Provenance| p.period_days.unwrap_or(i64::MAX);
        width(a)
            .cmp(&width(b))
            .then_with(|| b.period_id.cmp(&a.period_id))
    }
}

/// Apply override precedence to every date of `candidates`.
pub fn apply_overrides<P>(
    candidates: BTreeMap<NaiveDate, Vec<ResolvedInterval>>,
    precedence: &P,
) -> BTreeMap<NaiveDate, Vec<ResolvedInterval>>
where
    P: Precedence + ?Sized,
{
    candidates
        .into_iter()
        .map(|(date, intervals)| (date, resolve_day(intervals, precedence)))
        .collect()
}

/// Apply override precedence to the candidates of a single date.
///
/// The result is ordered strongest first. Ties left by `precedence` go to
/// the shorter interval, so a lunch closure inside a period's opening span
/// cuts the span whichever of the two is listed first.
pub fn resolve_day<P>(mut intervals: Vec<ResolvedInterval>, precedence: &P) -> Vec<ResolvedInterval>
where
    P: Precedence + ?Sized,
{
    let has_override = intervals.iter().any(|i| i.provenance.is_override);
    if has_override {
        intervals.retain(|i| i.provenance.is_override);
    }

    intervals.sort_by(|a, b| {
        precedence
            .compare(&a.provenance, &b.provenance)
            .then_with(|| a.duration_minutes().cmp(&b.duration_minutes()))
            .then(a.start.cmp(&b.start))
            .then(a.end.cmp(&b.end))
            .then(a.state.cmp(&b.state))
    });

    if has_override {
        if let Some(winner) = intervals.first().map(|i| i.provenance.period_id) {
            intervals.retain(|i| i.provenance.period_id == winner);
        }
    }
    intervals
}

// ── Tests ───────────────────────────────────────────────────────────────────
