//! Reduce each date's intervals to a minimal, non-overlapping list.
//!
//! Input for a date is in precedence order, strongest first. Where intervals
//! of different states overlap, the stronger one keeps the overlap and the
//! weaker one is cut back (or split). Intervals of the same state that
//! overlap or touch are joined.
//!
//! [`settle_midnight_spills`] then applies override precedence to the part of
//! an interval that runs into the following date.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{midnight, ResolvedInterval};

/// Merge every date of `filtered`.
pub fn merge(
    filtered: BTreeMap<NaiveDate, Vec<ResolvedInterval>>,
) -> BTreeMap<NaiveDate, Vec<ResolvedInterval>> {
    filtered
        .into_iter()
        .map(|(date, intervals)| (date, merge_day(intervals)))
        .collect()
}

/// Merge the intervals of one date.
///
/// `intervals` must be ordered strongest first. The result is sorted by
/// `(start, end, state)`.
pub fn merge_day(intervals: Vec<ResolvedInterval>) -> Vec<ResolvedInterval> {
    // (rank, interval); rank is the position of the source candidate.
    let mut accepted: Vec<(usize, ResolvedInterval)> = Vec::with_capacity(intervals.len());

    for (rank, candidate) in intervals.into_iter().enumerate() {
        let state = candidate.state;
        let mut pieces = vec![candidate];
        for (_, kept) in accepted.iter().filter(|(_, k)| k.state != state) {
            pieces = pieces
                .into_iter()
                .flat_map(|piece| subtract(piece, kept))
                .collect();
            if pieces.is_empty() {
                break;
            }
        }
        accepted.extend(pieces.into_iter().map(|piece| (rank, piece)));
    }

    coalesce(accepted)
}

/// Settle intervals running past midnight against the following date.
///
/// A date won by an override period belongs to that period from midnight
/// on: spill from the previous date is cut back to midnight unless it comes
/// from the same override period. Spill of an override into a date without
/// overrides cuts that date's intervals instead.
pub fn settle_midnight_spills(days: &mut BTreeMap<NaiveDate, Vec<ResolvedInterval>>) {
    let dates: Vec<NaiveDate> = days.keys().copied().collect();
    for pair in dates.windows(2) {
        let (date, next) = (pair[0], pair[1]);
        if date.succ_opt() != Some(next) {
            continue;
        }
        let boundary = midnight(next);
        let owner = days.get(&next).and_then(|intervals| {
            intervals
                .iter()
                .find(|i| i.provenance.is_override)
                .map(|i| i.provenance.period_id)
        });

        match owner {
            Some(owner) => {
                let Some(intervals) = days.get_mut(&date) else {
                    continue;
                };
                for interval in intervals.iter_mut() {
                    let same_owner = interval.provenance.is_override
                        && interval.provenance.period_id == owner;
                    if interval.end > boundary && !same_owner {
                        tracing::debug!(%date, period = %interval.provenance.period_id, "cutting spill into override date");
                        interval.end = boundary;
                        interval.refresh_full_day();
                    }
                }
            }
            None => {
                let spills: Vec<ResolvedInterval> = days
                    .get(&date)
                    .map(|intervals| {
                        intervals
                            .iter()
                            .filter(|i| i.provenance.is_override && i.end > boundary)
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                if spills.is_empty() {
                    continue;
                }
                let Some(intervals) = days.get_mut(&next) else {
                    continue;
                };
                let mut settled = Vec::with_capacity(intervals.len());
                for interval in intervals.drain(..) {
                    let mut pieces = vec![interval];
                    for spill in &spills {
                        pieces = pieces
                            .into_iter()
                            .flat_map(|piece| subtract(piece, spill))
                            .collect();
                    }
                    settled.extend(pieces);
                }
                *intervals = settled;
            }
        }
    }
}

/// `piece` minus the time covered by `cut`: zero, one, or two pieces.
fn subtract(piece: ResolvedInterval, cut: &ResolvedInterval) -> Vec<ResolvedInterval> {
    if !piece.overlaps(cut) {
        return vec![piece];
    }

    let mut rest = Vec::with_capacity(2);
    if piece.start < cut.start {
        let mut before = piece.clone();
        before.end = cut.start;
        before.refresh_full_day();
        rest.push(before);
    }
    if piece.end > cut.end {
        let mut after = piece;
        after.start = cut.end;
        after.refresh_full_day();
        rest.push(after);
    }
    rest
}

/// Join same-state intervals that overlap or touch; the stronger
/// contributor's provenance survives.
fn coalesce(mut ranked: Vec<(usize, ResolvedInterval)>) -> Vec<ResolvedInterval> {
    ranked.sort_by(|(rank_a, a), (rank_b, b)| {
        a.state
            .cmp(&b.state)
            .then(a.start.cmp(&b.start))
            .then(a.end.cmp(&b.end))
            .then(rank_a.cmp(rank_b))
    });

    let mut joined: Vec<(usize, ResolvedInterval)> = Vec::with_capacity(ranked.len());
    for (rank, interval) in ranked {
        if let Some((last_rank, last)) = joined.last_mut() {
            if last.state == interval.state && interval.start <= last.end {
                if interval.end > last.end {
                    last.end = interval.end;
                    last.refresh_full_day();
                }
                if rank < *last_rank {
                    *last_rank = rank;
                    last.provenance = interval.provenance;
                }
                continue;
            }
        }
        joined.push((rank, interval));
    }

    let mut merged: Vec<ResolvedInterval> = joined.into_iter().map(|(_, i)| i).collect();
    merged.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(a.end.cmp(&b.end))
            .then(a.state.cmp(&b.state))
    });
    merged
}

// ── Tests ───────────────────────────────────────────────────────────────────
