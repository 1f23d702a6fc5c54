use anyhow::{Result, bail};
use chrono::{Local, Utc};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use liftfuel_core::analytics::CHART_POINTS;
use liftfuel_core::models::{SortOrder, WorkoutSet};
use liftfuel_core::service::{LiftfuelService, RecordOutcome};
use liftfuel_core::sets::{group_by_date, group_by_weekday};

use super::helpers::{json_error, prompt_confirm};

fn exit_unknown_exercise(svc: &LiftfuelService, name: &str, json: bool) -> Result<()> {
    if svc.lookup_exercise(name)?.is_none() {
        let message = format!("No exercise named '{name}'. Add it with `liftfuel exercise add`");
        if json {
            println!("{}", json_error(&message));
        } else {
            eprintln!("{message}");
        }
        process::exit(2);
    }
    Ok(())
}

fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{weight:.0}")
    } else {
        format!("{weight}")
    }
}

pub(crate) fn cmd_set_record(
    svc: &LiftfuelService,
    exercise: &str,
    reps: u32,
    weight: f64,
    yes: bool,
    json: bool,
) -> Result<()> {
    exit_unknown_exercise(svc, exercise, json)?;

    let set = match svc.record_set(exercise, reps, weight, yes, Utc::now())? {
        RecordOutcome::Recorded(set) => set,
        RecordOutcome::NeedsConfirmation { previous, .. } => {
            let when = previous.date.with_timezone(&Local).format("%-I:%M %p");
            if json {
                bail!(
                    "Identical set already recorded at {when}. Re-run with --yes to record it again"
                );
            }
            let question = format!(
                "You recorded {reps} x {} at {when}. Record it again?",
                format_weight(weight)
            );
            if !prompt_confirm(&question)? {
                eprintln!("Not recorded");
                return Ok(());
            }
            match svc.record_set(exercise, reps, weight, true, Utc::now())? {
                RecordOutcome::Recorded(set) => set,
                RecordOutcome::NeedsConfirmation { .. } => bail!("Set was not recorded"),
            }
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&set)?);
    } else {
        println!(
            "Recorded {} x {} for {} (id: {})",
            set.reps,
            format_weight(set.weight),
            set.exercise,
            set.id
        );
    }
    Ok(())
}

pub(crate) fn cmd_set_list(
    svc: &LiftfuelService,
    exercise: &str,
    oldest_first: bool,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct SetRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Reps")]
        reps: u32,
        #[tabled(rename = "Weight")]
        weight: String,
    }

    exit_unknown_exercise(svc, exercise, json)?;
    let order = if oldest_first {
        SortOrder::Ascending
    } else {
        SortOrder::Descending
    };
    let sets = svc.sets_for_exercise(exercise, order)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sets)?);
        return Ok(());
    }

    if sets.is_empty() {
        eprintln!("No sets recorded for '{exercise}'");
        process::exit(2);
    }

    let rows: Vec<SetRow> = sets
        .iter()
        .map(|s| SetRow {
            id: s.id.clone(),
            date: s
                .date
                .with_timezone(&Local)
                .format("%Y-%m-%d %-I:%M %p")
                .to_string(),
            reps: s.reps,
            weight: format_weight(s.weight),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

/// Sets grouped under day headers, newest first.
pub(crate) fn cmd_set_days(
    svc: &LiftfuelService,
    exercise: &str,
    by_date: bool,
    json: bool,
) -> Result<()> {
    exit_unknown_exercise(svc, exercise, json)?;
    let sets = svc.sets_for_exercise(exercise, SortOrder::Descending)?;
    let groups = if by_date {
        group_by_date(&sets, &Local)
    } else {
        group_by_weekday(&sets, &Local)
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    if groups.is_empty() {
        eprintln!("No sets recorded for '{exercise}'");
        process::exit(2);
    }

    for group in &groups {
        println!("  {}", group.label);
        for row in &group.sets {
            let WorkoutSet {
                id, reps, weight, ..
            } = &row.set;
            println!(
                "    {:>8}  {reps} x {}  [{id}]",
                row.time,
                format_weight(*weight)
            );
        }
        println!();
    }
    Ok(())
}

pub(crate) fn cmd_set_delete(svc: &LiftfuelService, id: &str, json: bool) -> Result<()> {
    if let Some(set) = svc.delete_set(id, Utc::now())? {
        if json {
            println!("{}", serde_json::json!({ "deleted": set.id }));
        } else {
            println!(
                "Deleted {} x {} from {}",
                set.reps,
                format_weight(set.weight),
                set.exercise
            );
        }
        Ok(())
    } else {
        if json {
            println!("{}", json_error(&format!("Set {id} not found")));
        } else {
            eprintln!("Set {id} not found");
        }
        process::exit(2);
    }
}

pub(crate) fn cmd_stats(svc: &LiftfuelService, exercise: &str, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct PointRow {
        #[tabled(rename = "Date")]
        label: String,
        #[tabled(rename = "Weight")]
        weight: String,
        #[tabled(rename = "Reps")]
        reps: u32,
    }

    exit_unknown_exercise(svc, exercise, json)?;
    let analytics = svc.exercise_analytics(exercise, &Local)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analytics)?);
        return Ok(());
    }

    let name = &analytics.exercise.name;
    println!("=== {name} ===\n");
    if analytics.points.is_empty() {
        eprintln!("No sets recorded for '{name}'");
        process::exit(2);
    }

    let max = format_weight(analytics.stats.max);
    let avg = analytics.stats.average;
    println!("  Max weight: {max}");
    println!("  Avg weight: {avg:.1}\n");
    println!("  Last {CHART_POINTS} sets:");

    let rows: Vec<PointRow> = analytics
        .points
        .iter()
        .map(|p| PointRow {
            label: p.label.clone(),
            weight: format_weight(p.weight),
            reps: p.reps,
        })
        .collect();
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_weight() {
        assert_eq!(format_weight(100.0), "100");
        assert_eq!(format_weight(102.5), "102.5");
        assert_eq!(format_weight(0.0), "0");
    }
}
