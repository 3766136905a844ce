//! # hours-engine
//!
//! Deterministic opening-hours resolution.
//!
//! The engine turns a resource's stored schedule definitions (date-bounded
//! periods carrying recurrence rules and time-of-day spans) into concrete,
//! non-overlapping intervals for a requested date window. Override periods
//! take precedence over normal ones, spans may run past midnight, and the
//! same input always resolves to the same output. It performs no I/O.
//!
//! ## Modules
//!
//! - [`model`] — Periods, time span groups, time spans, states, resolved intervals
//! - [`rule`] — Recurrence rules → matching dates
//! - [`span`] — Time span + anchor date → concrete interval
//! - [`aggregate`] — Periods → per-date candidate intervals, with diagnostics
//! - [`precedence`] — Override handling and the pluggable precedence order
//! - [`merge`] — Per-date clipping and coalescing into a minimal interval list,
//!   and settling of spans that run into an override date
//! - [`resolve`] — Range resolution and the point-in-time query
//! - [`summary`] — Compact English summaries of a period's pattern
//! - [`fingerprint`] — Order-independent digest of a resource's periods
//! - [`error`] — Error types
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use hours_engine::{resolve, Period, ResolveOptions};
//!
//! let periods: Vec<Period> = serde_json::from_str(r#"[{
//!     "id": 1,
//!     "start_date": "2024-01-01",
//!     "end_date": "2024-01-31",
//!     "resource_state": "open",
//!     "time_span_groups": [{
//!         "time_spans": [{ "start_time": "08:00:00", "end_time": "16:00:00", "weekdays": [1, 2, 3, 4, 5] }]
//!     }]
//! }]"#).unwrap();
//!
//! let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let to = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
//! let resolution = resolve(&periods, from, to, &ResolveOptions::default()).unwrap();
//!
//! assert_eq!(resolution.days.len(), 7);
//! assert_eq!(resolution.intervals().count(), 5);
//! ```

pub mod aggregate;
pub mod error;
pub mod fingerprint;
pub mod merge;
pub mod model;
pub mod precedence;
pub mod resolve;
pub mod rule;
pub mod span;
pub mod summary;

pub use aggregate::{aggregate, validate_period, Aggregation, Diagnostic};
pub use error::{HoursError, Result};
pub use fingerprint::fingerprint;
pub use merge::{merge, merge_day, settle_midnight_spills};
pub use model::{
    Period, PeriodId, Provenance, ResolvedInterval, RuleMatch, State, TimeSpan, TimeSpanGroup,
    WeekdayMask,
};
pub use precedence::{apply_overrides, Precedence, SpecificityFirst};
pub use resolve::{
    resolve, resolve_with, state_at, Resolution, ResolveOptions, DEFAULT_MAX_RANGE_DAYS,
};
pub use rule::{evaluate, MatchingDates, Parity, Rule};
pub use summary::{period_as_text, summarize, GroupSummary, Hours, SummaryEntry, WeekdayRange};
