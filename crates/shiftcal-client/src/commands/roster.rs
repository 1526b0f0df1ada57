//! Roster inspection commands.

use std::fmt::Write as _;
use std::path::Path;

use shiftcal_core::{EventPlan, RosterTable};
use shiftcal_server::Pipeline;

use crate::error::ClientResult;

/// Print everyone named in the roster.
pub fn people(roster: &Path) -> ClientResult<()> {
    let table = super::read_roster(roster)?;
    print!("{}", render_people(&table));
    Ok(())
}

/// Print the events the roster yields for one person.
pub fn preview(pipeline: &Pipeline, roster: &Path, person: &str, json: bool) -> ClientResult<()> {
    let table = super::read_roster(roster)?;
    let plan = pipeline.plan(&table, person)?;

    if json {
        println!("{}", render_plan_json(&plan)?);
    } else {
        print!("{}", render_plan(person, &plan));
    }
    Ok(())
}

pub(crate) fn render_plan_json(plan: &EventPlan) -> ClientResult<String> {
    Ok(serde_json::to_string_pretty(plan)?)
}

pub(crate) fn render_people(table: &RosterTable) -> String {
    table.people().iter().fold(String::new(), |mut out, name| {
        let _ = writeln!(out, "{name}");
        out
    })
}

pub(crate) fn render_plan(person: &str, plan: &EventPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} shifts for {}", plan.events.len(), person);
    for event in &plan.events {
        let _ = writeln!(out, "  {event}");
    }
    let _ = writeln!(out, "{} days off", plan.days_off());
    for skipped in plan.irregular() {
        let _ = writeln!(out, "  column {}: {}", skipped.column, skipped.reason);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftcal_core::EventBuilder;
    use shiftcal_providers::MemoryCalendar;
    use std::sync::Arc;

    fn table() -> RosterTable {
        RosterTable::from_rows(vec![
            vec!["Feb 24"],
            vec!["", "", "1", "2", "3", "30"],
            vec!["Alice", "RS", "K00", "X", "Q7", "DK1"],
            vec!["Bob", "", "K04", "K04", "", ""],
        ])
    }

    #[test]
    fn people_are_listed_in_roster_order() {
        insta::assert_snapshot!(render_people(&table()), @r"
        Alice
        Bob
        ");
    }

    #[test]
    fn plan_lists_events_and_irregular_skips() {
        let pipeline = Pipeline::new(Arc::new(MemoryCalendar::new()), EventBuilder::default());
        let plan = pipeline.plan(&table(), "Alice").unwrap();

        insta::assert_snapshot!(render_plan("Alice", &plan), @r"
        1 shifts for Alice
          K00 2024-02-01 03:15 -> 11:00
        1 days off
          column 4: unknown shift code 'Q7'
          column 5: day 30 does not exist in this month
        ");
    }

    #[test]
    fn plan_encodes_as_json() {
        let pipeline = Pipeline::new(Arc::new(MemoryCalendar::new()), EventBuilder::default());
        let plan = pipeline.plan(&table(), "Bob").unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&render_plan_json(&plan).unwrap()).unwrap();
        assert_eq!(json["events"][1]["label"], "K04");
        assert_eq!(json["events"][1]["start"], "2024-02-02T07:00:00");
        assert_eq!(json["skipped"].as_array().unwrap().len(), 2);
    }
}
