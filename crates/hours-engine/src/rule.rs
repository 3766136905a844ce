//! Recurrence rules and their expansion into concrete dates.
//!
//! A [`Rule`] is a closed set of date predicates. [`evaluate`] checks the
//! rule against the period it belongs to, then returns a lazy [`MatchingDates`]
//! iterator over the part of the query window the period covers.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{HoursError, Result};
use crate::model::weekday_from_iso;

/// Which weeks a parity rule keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    #[default]
    Every,
    Even,
    Odd,
}

impl Parity {
    fn admits(self, number: i64) -> bool {
        match self {
            Parity::Every => true,
            Parity::Even => number.rem_euclid(2) == 0,
            Parity::Odd => number.rem_euclid(2) == 1,
        }
    }
}

/// A recurrence predicate selecting which dates a time span group applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    /// Every date.
    Identity,
    /// Weeks counted from the Monday-starting week that contains the period's
    /// start date, which is week 0. `even` keeps weeks 0, 2, 4…; `odd` keeps
    /// weeks 1, 3, 5….
    WeekParity { parity: Parity },
    /// Even or odd ISO week numbers of the year.
    IsoWeekParity { parity: Parity },
    /// The `ordinal`-th occurrence of ISO `weekday` (1-7) in each month.
    /// Positive ordinals (1-5) count from the start of the month, negative
    /// ones (-1 to -5) from the end; -1 is the last occurrence.
    WeekdayOfMonth { weekday: u8, ordinal: i8 },
    /// Months counted from the period's start month, which is month 0.
    /// Keeps months `offset`, `offset + every`, `offset + 2 * every`….
    MonthInterval {
        every: u32,
        #[serde(default)]
        offset: u32,
    },
}

/// A rule checked against its period and ready to test dates.
#[derive(Debug, Clone, Copy)]
enum Matcher {
    Every,
    WeekParity { week_zero: NaiveDate, parity: Parity },
    IsoWeekParity { parity: Parity },
    WeekdayOfMonth { weekday: Weekday, ordinal: i8 },
    MonthInterval { month_zero: i64, every: i64, offset: i64 },
}

impl Rule {
    /// Check that the rule can be interpreted inside a period starting at
    /// `period_start`.
    ///
    /// # Errors
    ///
    /// Returns [`HoursError::Configuration`] for missing or inconsistent
    /// criteria.
    pub fn validate(&self, period_start: Option<NaiveDate>) -> Result<()> {
        self.compile(period_start).map(|_| ())
    }

    fn compile(&self, period_start: Option<NaiveDate>) -> Result<Matcher> {
        match *self {
            Rule::Identity => Ok(Matcher::Every),
            Rule::WeekParity { parity } => {
                let start = period_start.ok_or_else(|| {
                    HoursError::Configuration(
                        "week parity needs a period start date to count weeks from".to_string(),
                    )
                })?;
                let week_zero = start
                    .checked_sub_days(Days::new(u64::from(start.weekday().num_days_from_monday())))
                    .ok_or_else(|| {
                        HoursError::Configuration(format!(
                            "cannot count weeks from {start}: its week starts before the first representable date"
                        ))
                    })?;
                Ok(Matcher::WeekParity { week_zero, parity })
            }
            Rule::IsoWeekParity { parity } => Ok(Matcher::IsoWeekParity { parity }),
            Rule::WeekdayOfMonth { weekday, ordinal } => {
                let weekday = weekday_from_iso(weekday).ok_or_else(|| {
                    HoursError::Configuration(format!(
                        "weekday {weekday} is not an ISO weekday number (1-7)"
                    ))
                })?;
                if ordinal == 0 || ordinal.unsigned_abs() > 5 {
                    return Err(HoursError::Configuration(format!(
                        "weekday ordinal {ordinal} must be between 1 and 5 or -1 and -5"
                    )));
                }
                Ok(Matcher::WeekdayOfMonth { weekday, ordinal })
            }
            Rule::MonthInterval { every, offset } => {
                if every == 0 {
                    return Err(HoursError::Configuration(
                        "month interval must be at least 1".to_string(),
                    ));
                }
                let start = period_start.ok_or_else(|| {
                    HoursError::Configuration(
                        "month interval needs a period start date to count months from"
                            .to_string(),
                    )
                })?;
                Ok(Matcher::MonthInterval {
                    month_zero: month_number(start),
                    every: every as i64,
                    offset: offset as i64,
                })
            }
        }
    }

    /// Short English description, e.g. `"last Friday of the month"`.
    pub fn describe(&self) -> String {
        match *self {
            Rule::Identity => "every day".to_string(),
            Rule::WeekParity { parity } => match parity {
                Parity::Every => "every week".to_string(),
                Parity::Even => "every other week from the start of the period".to_string(),
                Parity::Odd => "every other week from the second week of the period".to_string(),
            },
            Rule::IsoWeekParity { parity } => match parity {
                Parity::Every => "every week".to_string(),
                Parity::Even => "even weeks of the year".to_string(),
                Parity::Odd => "odd weeks of the year".to_string(),
            },
            Rule::WeekdayOfMonth { weekday, ordinal } => {
                let day = weekday_from_iso(weekday).map_or("?", weekday_name);
                format!("{} {day} of the month", ordinal_word(ordinal))
            }
            Rule::MonthInterval { every, offset } => {
                let every_text = if every <= 1 {
                    "every month".to_string()
                } else {
                    format!("every {} month", ordinal_suffix(every))
                };
                if offset == 0 {
                    format!("{every_text} in the period")
                } else {
                    format!(
                        "{every_text} in the period, starting from the {} month",
                        ordinal_suffix(offset + 1)
                    )
                }
            }
        }
    }
}

impl Matcher {
    fn matches(&self, date: NaiveDate) -> bool {
        match *self {
            Matcher::Every => true,
            Matcher::WeekParity { week_zero, parity } => {
                let week = (date - week_zero).num_days().div_euclid(7);
                parity.admits(week)
            }
            Matcher::IsoWeekParity { parity } => parity.admits(date.iso_week().week() as i64),
            Matcher::WeekdayOfMonth { weekday, ordinal } => {
                if date.weekday() != weekday {
                    return false;
                }
                let occurrence = if ordinal > 0 {
                    (date.day() as i64 - 1) / 7 + 1
                } else {
                    -((days_in_month(date) as i64 - date.day() as i64) / 7 + 1)
                };
                occurrence == ordinal as i64
            }
            Matcher::MonthInterval {
                month_zero,
                every,
                offset,
            } => {
                let month = month_number(date) - month_zero;
                month >= offset && (month - offset) % every == 0
            }
        }
    }
}

/// Expand `rule` over the intersection of the period bounds and the query
/// window.
///
/// # Arguments
///
/// * `period_start` / `period_end` — the period's inclusive bounds; `None` is
///   open-ended
/// * `query_start` / `query_end` — the inclusive query window
///
/// # Returns
///
/// A lazy iterator of ascending, distinct dates. Clone it to restart.
///
/// # Errors
///
/// Returns [`HoursError::Configuration`] if the rule's criteria are missing
/// or inconsistent (see [`Rule::validate`]).
pub fn evaluate(
    rule: &Rule,
    period_start: Option<NaiveDate>,
    period_end: Option<NaiveDate>,
    query_start: NaiveDate,
    query_end: NaiveDate,
) -> Result<MatchingDates> {
    let matcher = rule.compile(period_start)?;
    let first = period_start.map_or(query_start, |s| s.max(query_start));
    let last = period_end.map_or(query_end, |e| e.min(query_end));

    Ok(MatchingDates {
        matcher,
        next: (first <= last).then_some(first),
        last,
    })
}

/// Dates selected by a rule, in ascending order. See [`evaluate`].
#[derive(Debug, Clone)]
pub struct MatchingDates {
    matcher: Matcher,
    next: Option<NaiveDate>,
    last: NaiveDate,
}

impl MatchingDates {
    /// Whether `date` is selected, ignoring the window.
    pub fn selects(&self, date: NaiveDate) -> bool {
        self.matcher.matches(date)
    }
}

impl Iterator for MatchingDates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        while let Some(date) = self.next {
            if date > self.last {
                self.next = None;
                break;
            }
            self.next = date.succ_opt();
            if self.matcher.matches(date) {
                return Some(date);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            Some(date) if date <= self.last => {
                (0, Some((self.last - date).num_days() as usize + 1))
            }
            _ => (0, Some(0)),
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn month_number(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map_or(31, |last| last.day())
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn ordinal_word(ordinal: i8) -> &'static str {
    match ordinal {
        1 => "first",
        2 => "second",
        3 => "third",
        4 => "fourth",
        5 => "fifth",
        -1 => "last",
        -2 => "second to last",
        -3 => "third to last",
        -4 => "fourth to last",
        -5 => "fifth to last",
        _ => "nth",
    }
}

/// `1` → `"1st"`, `2` → `"2nd"`, `11` → `"11th"`.
fn ordinal_suffix(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

// ── Tests ───────────────────────────────────────────────────────────────────
