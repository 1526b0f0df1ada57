//! Whole-roster scenarios through the public API.

use chrono::{NaiveDate, NaiveDateTime};
use shiftcal_core::{
    ColumnIndex, EventBuilder, MonthResolver, RosterError, RosterTable, ShiftCode, SkipReason,
    build_events, end_time, parse_roster, start_time,
};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn january() -> RosterTable {
    RosterTable::from_rows(vec![
        vec!["Jan 24"],
        vec!["", "", "1", "2", "3", "4", "5"],
        vec!["Alice", "", "K00", "X", "ZZ9", "", "DK3"],
        vec!["Bob", "RS", "SK2", "K01", "K02", "K03", "K04"],
        vec!["Alice", "", "K04", "K04", "K04", "K04", "K04"],
    ])
}

#[test]
fn single_shift_and_day_off() {
    let table = RosterTable::from_rows(vec![
        vec!["Jan 24"],
        vec!["", "", "1", "2"],
        vec!["Alice", "", "K00", "X"],
    ]);
    let roster = parse_roster(&table, "Alice").unwrap();
    let plan = EventBuilder::default().build(&roster).unwrap();

    assert_eq!(plan.events.len(), 1);
    let event = &plan.events[0];
    assert_eq!(event.label, ShiftCode::K00);
    assert_eq!(event.start, at(2024, 1, 1, 3, 15));
    assert_eq!(event.end, at(2024, 1, 1, 11, 0));
    assert_eq!(plan.skipped.len(), 1);
    assert_eq!(plan.skipped[0].column, ColumnIndex(3));
    assert_eq!(plan.skipped[0].reason, SkipReason::Off);
}

#[test]
fn first_matching_row_wins() {
    let roster = parse_roster(&january(), "Alice").unwrap();
    assert_eq!(roster.person.row, 2);
    assert_eq!(roster.duplicate_rows, vec![4]);

    let plan = EventBuilder::default().build(&roster).unwrap();
    insta::assert_snapshot!(plan.render(), @r"
    K00 2024-01-01 03:15 -> 11:00
    DK3 2024-01-05 03:00 -> 09:00
    ");
    assert_eq!(
        plan.skipped
            .iter()
            .map(|s| &s.reason)
            .collect::<Vec<_>>(),
        vec![
            &SkipReason::Off,
            &SkipReason::UnknownCode("ZZ9".to_string()),
            &SkipReason::Off,
        ]
    );
}

#[test]
fn events_follow_column_order() {
    let roster = parse_roster(&january(), "Bob").unwrap();
    let plan = EventBuilder::default().build(&roster).unwrap();

    let columns: Vec<usize> = plan.events.iter().map(|e| e.column.get()).collect();
    assert_eq!(columns, vec![2, 3, 4, 5, 6]);
    assert!(plan.events.windows(2).all(|w| w[0].start < w[1].start));
    assert!(plan.skipped.is_empty());
}

#[test]
fn names_are_case_sensitive() {
    let err = parse_roster(&january(), "alice").unwrap_err();
    assert!(matches!(err, RosterError::PersonNotFound { ref name } if name == "alice"));
}

#[test]
fn unknown_month_fails_the_build() {
    let table = RosterTable::from_rows(vec![
        vec!["Xyz 24"],
        vec!["", "", "1"],
        vec!["Alice", "", "K00"],
    ]);
    let roster = parse_roster(&table, "Alice").unwrap();
    let err = EventBuilder::default().build(&roster).unwrap_err();
    assert!(matches!(err, RosterError::UnknownMonth { .. }));
    assert!(err.is_header_error());
}

#[test]
fn custom_month_table() {
    let table = RosterTable::from_rows(vec![
        vec!["March 2025"],
        vec!["", "", "31"],
        vec!["Alice", "", "K02"],
    ]);
    let roster = parse_roster(&table, "Alice").unwrap();

    assert!(EventBuilder::default().build(&roster).is_err());

    let builder = EventBuilder::new(MonthResolver::german().with_alias("March", 3));
    let plan = builder.build(&roster).unwrap();
    assert_eq!(plan.events[0].start, at(2025, 3, 31, 4, 0));
    assert_eq!(plan.events[0].end, at(2025, 3, 31, 13, 15));
}

#[test]
fn every_code_starts_before_it_ends() {
    for code in ShiftCode::ALL {
        let start = start_time(code.as_str()).unwrap();
        let end = end_time(code.as_str()).unwrap();
        assert!(start < end, "{code}");
    }
    assert_eq!(start_time("X"), None);
    assert_eq!(end_time("ZZ9"), None);
}

#[test]
fn building_twice_gives_the_same_plan() {
    let roster = parse_roster(&january(), "Alice").unwrap();
    let month = EventBuilder::default().month_year(&roster.header).unwrap();

    let first = build_events(&roster.person.cells, &roster.days, &month);
    let second = build_events(&roster.person.cells, &roster.days, &month);
    assert_eq!(first, second);
}
