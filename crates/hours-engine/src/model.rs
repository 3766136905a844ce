//! Schedule definitions handed in by the caller, and the resolved intervals
//! handed back.
//!
//! Everything here is plain data. Periods own their time span groups, groups
//! own their rules and spans, and resolved intervals carry a [`Provenance`]
//! value instead of a reference back into the period graph.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{HoursError, Result};
use crate::rule::Rule;

/// ISO order, Monday first.
pub(crate) const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Map an ISO weekday number (Monday = 1 … Sunday = 7) to a [`Weekday`].
pub(crate) fn weekday_from_iso(number: u8) -> Option<Weekday> {
    match number {
        1..=7 => Some(ALL_WEEKDAYS[usize::from(number - 1)]),
        _ => None,
    }
}

/// `00:00` on `date`.
pub(crate) fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

// ── Identifiers and states ──────────────────────────────────────────────────

/// Stable identifier of a [`Period`], assigned by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodId(pub u64);

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The categorical status a resource has during an interval.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Open,
    Closed,
    #[default]
    Undefined,
    SelfService,
    WithKey,
    WithReservation,
    OpenAndReservable,
    WithKeyAndReservation,
    EnterOnly,
    ExitOnly,
    WeatherPermitting,
    NotInUse,
    Maintenance,
    Reserved,
    ByAppointment,
    NoOpeningHours,
}

impl State {
    /// Whether visitors can get in while the resource is in this state.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            State::Open
                | State::SelfService
                | State::WithKey
                | State::WithReservation
                | State::OpenAndReservable
                | State::WithKeyAndReservation
                | State::EnterOnly
                | State::WeatherPermitting
                | State::Reserved
                | State::ByAppointment
        )
    }

    /// Human-readable English label, e.g. `"Self service"`.
    pub fn label(self) -> &'static str {
        match self {
            State::Open => "Open",
            State::Closed => "Closed",
            State::Undefined => "Undefined",
            State::SelfService => "Self service",
            State::WithKey => "With key",
            State::WithReservation => "With reservation",
            State::OpenAndReservable => "Open and reservable",
            State::WithKeyAndReservation => "With key and reservation",
            State::EnterOnly => "Enter only",
            State::ExitOnly => "Exit only",
            State::WeatherPermitting => "Weather permitting",
            State::NotInUse => "Not in use",
            State::Maintenance => "Maintenance",
            State::Reserved => "Reserved",
            State::ByAppointment => "By appointment",
            State::NoOpeningHours => "No opening hours",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Weekday mask ────────────────────────────────────────────────────────────

/// Set of ISO weekdays a time span applies to.
///
/// Serialized as a list of ISO weekday numbers (`[1, 2, 3, 4, 5]` for Monday
/// to Friday). Numbers outside `1..=7` are rejected when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekdayMask(u8);

impl WeekdayMask {
    pub const EMPTY: WeekdayMask = WeekdayMask(0);
    pub const ALL: WeekdayMask = WeekdayMask(0b0111_1111);
    /// Monday to Friday.
    pub const BUSINESS_DAYS: WeekdayMask = WeekdayMask(0b0001_1111);
    pub const WEEKEND: WeekdayMask = WeekdayMask(0b0110_0000);

    /// Build a mask from ISO weekday numbers (Monday = 1 … Sunday = 7).
    ///
    /// # Errors
    ///
    /// Returns [`HoursError::Configuration`] if any number is outside `1..=7`.
    pub fn from_iso(numbers: &[u8]) -> Result<Self> {
        numbers.iter().try_fold(Self::EMPTY, |mask, &number| {
            weekday_from_iso(number)
                .map(|day| mask.with(day))
                .ok_or_else(|| {
                    HoursError::Configuration(format!(
                        "weekday {number} is not an ISO weekday number (1-7)"
                    ))
                })
        })
    }

    pub fn from_weekdays<I: IntoIterator<Item = Weekday>>(days: I) -> Self {
        days.into_iter().fold(Self::EMPTY, Self::with)
    }

    pub fn with(self, day: Weekday) -> Self {
        WeekdayMask(self.0 | bit(day))
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & bit(day) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The weekdays in this mask, Monday first.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        ALL_WEEKDAYS.into_iter().filter(move |day| self.contains(*day))
    }
}

fn bit(day: Weekday) -> u8 {
    1 << day.num_days_from_monday()
}

impl TryFrom<Vec<u8>> for WeekdayMask {
    type Error = HoursError;

    fn try_from(numbers: Vec<u8>) -> Result<Self> {
        Self::from_iso(&numbers)
    }
}

impl From<WeekdayMask> for Vec<u8> {
    fn from(mask: WeekdayMask) -> Self {
        mask.iter().map(|day| day.number_from_monday() as u8).collect()
    }
}

// ── Schedule definitions ────────────────────────────────────────────────────

/// A date-bounded schedule definition for one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    /// The resource this period belongs to. Informational only: the caller
    /// has already selected the periods that apply.
    #[serde(default)]
    pub resource: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    /// Inclusive. `None` means open-ended in the past.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Inclusive. `None` means open-ended in the future.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, alias = "override")]
    pub is_override: bool,
    #[serde(default)]
    pub resource_state: State,
    #[serde(default)]
    pub time_span_groups: Vec<TimeSpanGroup>,
}

impl Period {
    /// Intersection of this period's bounds with `[from, to]`, or `None` when
    /// they do not meet.
    pub fn clip(&self, from: NaiveDate, to: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.start_date.map_or(from, |s| s.max(from));
        let end = self.end_date.map_or(to, |e| e.min(to));
        (start <= end).then_some((start, end))
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.clip(date, date).is_some()
    }

    /// Number of days in the period, both ends included. `None` when either
    /// end is open.
    pub fn length_days(&self) -> Option<i64> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((end - start).num_days() + 1),
            _ => None,
        }
    }

    pub fn provenance(&self) -> Provenance {
        Provenance {
            period_id: self.id,
            is_override: self.is_override,
            period_days: self.length_days(),
        }
    }
}

/// How the rules of a [`TimeSpanGroup`] combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMatch {
    /// A date qualifies if any rule selects it.
    #[default]
    Any,
    /// A date qualifies only if every rule selects it.
    All,
}

/// Rules paired with the time spans they gate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeSpanGroup {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub rule_match: RuleMatch,
    #[serde(default)]
    pub time_spans: Vec<TimeSpan>,
}

/// A clock-time interval applied on the dates its group selects.
///
/// An `end_time` at or before `start_time` means the span runs past midnight
/// into the next date.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeSpan {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    /// `None` applies the span on every weekday.
    #[serde(default)]
    pub weekdays: Option<WeekdayMask>,
    #[serde(default)]
    pub full_day: bool,
    /// Falls back to the period's state when unset.
    #[serde(default)]
    pub resource_state: Option<State>,
}

// ── Resolved output ─────────────────────────────────────────────────────────

/// What an interval needs to know about the period it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Provenance {
    pub period_id: PeriodId,
    pub is_override: bool,
    /// Inclusive length of the period's date range; `None` when unbounded.
    pub period_days: Option<i64>,
}

/// A concrete, dated, stateful interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedInterval {
    /// The date the interval is anchored on.
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    /// Exclusive. May fall on the following date.
    pub end: NaiveDateTime,
    pub state: State,
    /// Whether the interval covers the whole anchor date.
    pub full_day: bool,
    pub provenance: Provenance,
}

impl ResolvedInterval {
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.end
    }

    pub fn overlaps(&self, other: &ResolvedInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether `[start, end)` spans from midnight of the anchor date to
    /// midnight of the next one (or beyond).
    pub fn covers_whole_day(&self) -> bool {
        match self.date.succ_opt() {
            Some(next) => self.start <= midnight(self.date) && self.end >= midnight(next),
            None => false,
        }
    }

    pub(crate) fn refresh_full_day(&mut self) {
        self.full_day = self.covers_whole_day();
    }

    /// Attach `tz` to the interval's wall-clock instants.
    ///
    /// Returns `None` when either instant does not exist in `tz` (it falls in
    /// a DST gap). Ambiguous instants take the earlier offset.
    pub fn localize(&self, tz: &Tz) -> Option<(DateTime<Tz>, DateTime<Tz>)> {
        let start = tz.from_local_datetime(&self.start).earliest()?;
        let end = tz.from_local_datetime(&self.end).earliest()?;
        Some((start, end))
    }
}
