use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use hours_engine::{
    fingerprint, resolve, resolve_with, state_at, HoursError, Parity, Period, PeriodId, Provenance,
    ResolveOptions, Rule, RuleMatch, State, TimeSpan, TimeSpanGroup, WeekdayMask,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap()
}

fn hours(start: u32, end: u32, weekdays: Option<WeekdayMask>) -> TimeSpan {
    TimeSpan {
        start_time: NaiveTime::from_hms_opt(start, 0, 0),
        end_time: NaiveTime::from_hms_opt(end, 0, 0),
        weekdays,
        ..TimeSpan::default()
    }
}

fn period(id: u64, start: NaiveDate, end: NaiveDate, state: State, groups: Vec<TimeSpanGroup>) -> Period {
    Period {
        id: PeriodId(id),
        resource: Some(42),
        name: None,
        start_date: Some(start),
        end_date: Some(end),
        is_override: false,
        resource_state: state,
        time_span_groups: groups,
    }
}

fn group(spans: Vec<TimeSpan>) -> TimeSpanGroup {
    TimeSpanGroup {
        time_spans: spans,
        ..TimeSpanGroup::default()
    }
}

fn january_weekdays() -> Period {
    period(
        1,
        date(2024, 1, 1),
        date(2024, 1, 31),
        State::Open,
        vec![group(vec![hours(8, 16, Some(WeekdayMask::BUSINESS_DAYS))])],
    )
}

fn closed_override(id: u64, start: NaiveDate, end: NaiveDate) -> Period {
    Period {
        is_override: true,
        ..period(
            id,
            start,
            end,
            State::Closed,
            vec![group(vec![TimeSpan {
                full_day: true,
                ..TimeSpan::default()
            }])],
        )
    }
}

// ── Override precedence ─────────────────────────────────────────────────────

#[test]
fn test_override_closes_dates_regardless_of_weekday() {
    let periods = [
        january_weekdays(),
        closed_override(2, date(2024, 1, 10), date(2024, 1, 12)),
    ];
    let resolution = resolve(&periods, date(2024, 1, 1), date(2024, 1, 15), &ResolveOptions::default()).unwrap();

    assert_eq!(resolution.days.len(), 15);
    assert!(resolution.diagnostics.is_empty());

    for day in [1, 2, 3, 4, 5, 8, 9, 15] {
        let intervals = resolution.intervals_on(date(2024, 1, day));
        assert_eq!(intervals.len(), 1, "Jan {day}");
        assert_eq!(intervals[0].state, State::Open);
        assert_eq!(intervals[0].start, at(2024, 1, day, 8, 0));
        assert_eq!(intervals[0].end, at(2024, 1, day, 16, 0));
        assert_eq!(intervals[0].provenance.period_id, PeriodId(1));
    }
    for day in [6, 7, 13, 14] {
        assert!(resolution.intervals_on(date(2024, 1, day)).is_empty(), "Jan {day}");
    }
    for day in [10, 11, 12] {
        let intervals = resolution.intervals_on(date(2024, 1, day));
        assert_eq!(intervals.len(), 1, "Jan {day}");
        assert_eq!(intervals[0].state, State::Closed);
        assert!(intervals[0].full_day);
        assert!(intervals[0].provenance.is_override);
    }
    // Wednesday to Friday.
    assert_eq!(date(2024, 1, 10).weekday(), Weekday::Wed);
}

#[test]
fn test_override_without_spans_closes_whole_days() {
    let bare = Period {
        is_override: true,
        ..period(2, date(2024, 1, 10), date(2024, 1, 10), State::Closed, vec![])
    };
    let resolution = resolve(
        &[january_weekdays(), bare],
        date(2024, 1, 9),
        date(2024, 1, 11),
        &ResolveOptions::default(),
    )
    .unwrap();
    let closed = resolution.intervals_on(date(2024, 1, 10));
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].state, State::Closed);
    assert_eq!(resolution.intervals_on(date(2024, 1, 11))[0].state, State::Open);
}

#[test]
fn test_narrowest_override_wins() {
    let holiday_week = closed_override(2, date(2024, 1, 8), date(2024, 1, 14));
    let short_day = Period {
        is_override: true,
        ..period(
            3,
            date(2024, 1, 10),
            date(2024, 1, 10),
            State::Open,
            vec![group(vec![hours(10, 12, None)])],
        )
    };
    let resolution = resolve(
        &[january_weekdays(), holiday_week, short_day],
        date(2024, 1, 9),
        date(2024, 1, 11),
        &ResolveOptions::default(),
    )
    .unwrap();

    let wednesday = resolution.intervals_on(date(2024, 1, 10));
    assert_eq!(wednesday.len(), 1);
    assert_eq!(wednesday[0].provenance.period_id, PeriodId(3));
    assert_eq!(wednesday[0].start, at(2024, 1, 10, 10, 0));
    assert_eq!(resolution.intervals_on(date(2024, 1, 11))[0].provenance.period_id, PeriodId(2));
}

#[test]
fn test_custom_precedence_changes_winner() {
    let a = Period {
        is_override: true,
        ..period(5, date(2024, 1, 1), date(2024, 1, 31), State::Open, vec![group(vec![hours(9, 10, None)])])
    };
    let b = Period {
        is_override: true,
        ..period(6, date(2024, 1, 10), date(2024, 1, 10), State::Open, vec![group(vec![hours(11, 12, None)])])
    };
    let lowest_id_first = |x: &Provenance, y: &Provenance| x.period_id.cmp(&y.period_id);
    let resolution = resolve_with(
        &[a, b],
        date(2024, 1, 10),
        date(2024, 1, 10),
        &ResolveOptions::default(),
        &lowest_id_first,
    )
    .unwrap();
    assert_eq!(resolution.intervals_on(date(2024, 1, 10))[0].provenance.period_id, PeriodId(5));
}

// ── Normal period conflicts ─────────────────────────────────────────────────

#[test]
fn test_narrower_normal_period_truncates_wider() {
    let summer = period(
        2,
        date(2024, 1, 8),
        date(2024, 1, 14),
        State::SelfService,
        vec![group(vec![hours(15, 20, None)])],
    );
    let resolution = resolve(
        &[january_weekdays(), summer],
        date(2024, 1, 10),
        date(2024, 1, 10),
        &ResolveOptions::default(),
    )
    .unwrap();
    let day = resolution.intervals_on(date(2024, 1, 10));
    assert_eq!(day.len(), 2);
    assert_eq!((day[0].state, day[0].end), (State::Open, at(2024, 1, 10, 15, 0)));
    assert_eq!((day[1].state, day[1].start), (State::SelfService, at(2024, 1, 10, 15, 0)));
}

#[test]
fn test_same_state_spans_merge_across_periods() {
    let evenings = period(
        2,
        date(2024, 1, 1),
        date(2024, 1, 31),
        State::Open,
        vec![group(vec![hours(16, 20, Some(WeekdayMask::BUSINESS_DAYS))])],
    );
    let resolution = resolve(
        &[january_weekdays(), evenings],
        date(2024, 1, 10),
        date(2024, 1, 10),
        &ResolveOptions::default(),
    )
    .unwrap();
    let day = resolution.intervals_on(date(2024, 1, 10));
    assert_eq!(day.len(), 1);
    assert_eq!(day[0].start, at(2024, 1, 10, 8, 0));
    assert_eq!(day[0].end, at(2024, 1, 10, 20, 0));
}

#[test]
fn test_lunch_closure_does_not_depend_on_span_order() {
    let lunch = TimeSpan {
        resource_state: Some(State::Closed),
        ..hours(12, 13, None)
    };
    let listed = |spans: Vec<TimeSpan>| {
        period(1, date(2024, 1, 1), date(2024, 1, 31), State::Open, vec![group(spans)])
    };
    let open_first = [listed(vec![hours(8, 16, None), lunch.clone()])];
    let closed_first = [listed(vec![lunch, hours(8, 16, None)])];
    let options = ResolveOptions::default();

    let a = resolve(&open_first, date(2024, 1, 10), date(2024, 1, 10), &options).unwrap();
    let b = resolve(&closed_first, date(2024, 1, 10), date(2024, 1, 10), &options).unwrap();
    assert_eq!(a, b);
    assert_eq!(fingerprint(&open_first), fingerprint(&closed_first));

    let day: Vec<(State, NaiveDateTime, NaiveDateTime)> = a
        .intervals_on(date(2024, 1, 10))
        .iter()
        .map(|i| (i.state, i.start, i.end))
        .collect();
    assert_eq!(
        day,
        vec![
            (State::Open, at(2024, 1, 10, 8, 0), at(2024, 1, 10, 12, 0)),
            (State::Closed, at(2024, 1, 10, 12, 0), at(2024, 1, 10, 13, 0)),
            (State::Open, at(2024, 1, 10, 13, 0), at(2024, 1, 10, 16, 0)),
        ]
    );
}

// ── Midnight crossing ───────────────────────────────────────────────────────

#[test]
fn test_friday_night_runs_into_saturday() {
    let nightclub = period(
        1,
        date(2024, 1, 1),
        date(2024, 1, 31),
        State::Open,
        vec![group(vec![hours(22, 2, Some(WeekdayMask::from_weekdays([Weekday::Fri])))])],
    );
    let resolution = resolve(&[nightclub], date(2024, 1, 12), date(2024, 1, 13), &ResolveOptions::default()).unwrap();

    let friday = resolution.intervals_on(date(2024, 1, 12));
    assert_eq!(friday.len(), 1);
    assert_eq!(friday[0].start, at(2024, 1, 12, 22, 0));
    assert_eq!(friday[0].end, at(2024, 1, 13, 2, 0));
    assert!(resolution.intervals_on(date(2024, 1, 13)).is_empty());
}

fn friday_nights() -> Period {
    period(
        1,
        date(2024, 1, 1),
        date(2024, 1, 31),
        State::Open,
        vec![group(vec![hours(22, 2, Some(WeekdayMask::from_weekdays([Weekday::Fri])))])],
    )
}

#[test]
fn test_override_on_saturday_cuts_friday_night_at_midnight() {
    let periods = [friday_nights(), closed_override(2, date(2024, 1, 13), date(2024, 1, 13))];
    let options = ResolveOptions::default();

    for query_end in [date(2024, 1, 12), date(2024, 1, 13)] {
        let resolution = resolve(&periods, date(2024, 1, 12), query_end, &options).unwrap();
        let friday = resolution.intervals_on(date(2024, 1, 12));
        assert_eq!(friday.len(), 1, "query to {query_end}");
        assert_eq!(friday[0].start, at(2024, 1, 12, 22, 0));
        assert_eq!(friday[0].end, at(2024, 1, 13, 0, 0));
        assert_eq!(friday[0].state, State::Open);
    }

    let resolution = resolve(&periods, date(2024, 1, 12), date(2024, 1, 13), &options).unwrap();
    let saturday = resolution.intervals_on(date(2024, 1, 13));
    assert_eq!(saturday.len(), 1);
    assert_eq!(saturday[0].state, State::Closed);
    assert!(saturday[0].full_day);

    let at_one = at(2024, 1, 13, 1, 0);
    let covering: Vec<_> = resolution.intervals().filter(|i| i.contains(at_one)).collect();
    assert_eq!(covering.len(), 1);
    assert_eq!(covering[0].state, State::Closed);

    let late = state_at(&periods, at_one, &options).unwrap().unwrap();
    assert_eq!(late.state, State::Closed);
    let friday_evening = state_at(&periods, at(2024, 1, 12, 23, 0), &options).unwrap().unwrap();
    assert_eq!(friday_evening.state, State::Open);
}

#[test]
fn test_override_night_cuts_next_morning_of_normal_hours() {
    let early_birds = period(
        1,
        date(2024, 1, 1),
        date(2024, 1, 31),
        State::Open,
        vec![group(vec![hours(0, 6, None)])],
    );
    let late_event = Period {
        is_override: true,
        ..period(2, date(2024, 1, 12), date(2024, 1, 12), State::Closed, vec![group(vec![hours(20, 3, None)])])
    };
    let periods = [early_birds, late_event];
    let options = ResolveOptions::default();

    // Same answer whether or not Friday is part of the query.
    for query_start in [date(2024, 1, 12), date(2024, 1, 13)] {
        let resolution = resolve(&periods, query_start, date(2024, 1, 13), &options).unwrap();
        let saturday = resolution.intervals_on(date(2024, 1, 13));
        assert_eq!(saturday.len(), 1, "query from {query_start}");
        assert_eq!(saturday[0].start, at(2024, 1, 13, 3, 0));
        assert_eq!(saturday[0].end, at(2024, 1, 13, 6, 0));
    }
    let closed = state_at(&periods, at(2024, 1, 13, 2, 0), &options).unwrap().unwrap();
    assert_eq!(closed.state, State::Closed);
}

// ── Rules ───────────────────────────────────────────────────────────────────

#[test]
fn test_every_other_week_selects_weeks_zero_and_two() {
    let alternating = period(
        1,
        date(2024, 1, 1),
        date(2024, 1, 28),
        State::Open,
        vec![TimeSpanGroup {
            rules: vec![Rule::WeekParity { parity: Parity::Even }],
            rule_match: RuleMatch::Any,
            time_spans: vec![hours(8, 16, Some(WeekdayMask::from_weekdays([Weekday::Mon])))],
        }],
    );
    let resolution = resolve(&[alternating], date(2024, 1, 1), date(2024, 1, 28), &ResolveOptions::default()).unwrap();
    let mondays: Vec<NaiveDate> = resolution.intervals().map(|i| i.date).collect();
    assert_eq!(mondays, vec![date(2024, 1, 1), date(2024, 1, 15)]);
}

#[test]
fn test_last_friday_of_month() {
    let monthly = period(
        1,
        date(2024, 1, 1),
        date(2024, 3, 31),
        State::Open,
        vec![TimeSpanGroup {
            rules: vec![Rule::WeekdayOfMonth { weekday: 5, ordinal: -1 }],
            ..group(vec![hours(18, 22, None)])
        }],
    );
    let resolution = resolve(&[monthly], date(2024, 1, 1), date(2024, 3, 31), &ResolveOptions::default()).unwrap();
    let dates: Vec<NaiveDate> = resolution.intervals().map(|i| i.date).collect();
    assert_eq!(dates, vec![date(2024, 1, 26), date(2024, 2, 23), date(2024, 3, 29)]);
}

// ── Diagnostics and errors ──────────────────────────────────────────────────

#[test]
fn test_broken_period_reported_and_rest_resolved() {
    let broken = period(
        9,
        date(2024, 1, 1),
        date(2024, 1, 31),
        State::Open,
        vec![group(vec![TimeSpan {
            start_time: NaiveTime::from_hms_opt(8, 0, 0),
            ..TimeSpan::default()
        }])],
    );
    let resolution = resolve(
        &[broken, january_weekdays()],
        date(2024, 1, 1),
        date(2024, 1, 7),
        &ResolveOptions::default(),
    )
    .unwrap();
    assert_eq!(resolution.diagnostics.len(), 1);
    assert_eq!(resolution.diagnostics[0].period_id, PeriodId(9));
    assert!(matches!(resolution.diagnostics[0].error, HoursError::Configuration(_)));
    assert_eq!(resolution.intervals().count(), 5);
}

#[test]
fn test_week_parity_without_start_date_reported() {
    let mut open_ended = period(
        3,
        date(2024, 1, 1),
        date(2024, 1, 31),
        State::Open,
        vec![TimeSpanGroup {
            rules: vec![Rule::WeekParity { parity: Parity::Odd }],
            ..group(vec![hours(8, 16, None)])
        }],
    );
    open_ended.start_date = None;
    let resolution = resolve(&[open_ended], date(2024, 1, 1), date(2024, 1, 7), &ResolveOptions::default()).unwrap();
    assert_eq!(resolution.diagnostics.len(), 1);
    assert_eq!(resolution.intervals().count(), 0);
}

#[test]
fn test_range_errors_are_fatal() {
    let options = ResolveOptions::default();
    let inverted = resolve(&[january_weekdays()], date(2024, 1, 2), date(2024, 1, 1), &options);
    assert!(matches!(inverted, Err(HoursError::Range(_))));

    let too_long = resolve(&[january_weekdays()], date(2024, 1, 1), date(2025, 1, 1), &options);
    assert!(matches!(too_long, Err(HoursError::Range(_))));
}

// ── Determinism ─────────────────────────────────────────────────────────────

#[test]
fn test_resolution_is_idempotent() {
    let periods = [
        january_weekdays(),
        closed_override(2, date(2024, 1, 10), date(2024, 1, 12)),
    ];
    let options = ResolveOptions::default().with_timezone("Europe/Helsinki").unwrap();
    let first = resolve(&periods, date(2024, 1, 1), date(2024, 1, 31), &options).unwrap();
    let second = resolve(&periods, date(2024, 1, 1), date(2024, 1, 31), &options).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

// ── Point query ─────────────────────────────────────────────────────────────

#[test]
fn test_state_at_during_override() {
    let periods = [
        january_weekdays(),
        closed_override(2, date(2024, 1, 10), date(2024, 1, 12)),
    ];
    let options = ResolveOptions::default();
    let closed = state_at(&periods, at(2024, 1, 10, 9, 0), &options).unwrap().unwrap();
    assert_eq!(closed.state, State::Closed);
    assert!(!closed.state.is_open());

    let open = state_at(&periods, at(2024, 1, 9, 9, 0), &options).unwrap().unwrap();
    assert!(open.state.is_open());

    assert_eq!(state_at(&periods, at(2024, 1, 9, 7, 59), &options).unwrap(), None);
}
