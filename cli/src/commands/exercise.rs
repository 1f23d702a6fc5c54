use anyhow::Result;
use chrono::Utc;
use std::process;
use tabled::{Table, Tabled, settings::Style};

use liftfuel_core::analytics::format_last_used;
use liftfuel_core::models::POPULAR_EXERCISES;
use liftfuel_core::service::LiftfuelService;

use super::helpers::json_error;

pub(crate) fn cmd_exercise_list(svc: &LiftfuelService, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct ExerciseRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Last used")]
        last_used: String,
    }

    let exercises = svc.exercises()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&exercises)?);
        return Ok(());
    }

    let now = Utc::now();
    let rows: Vec<ExerciseRow> = exercises
        .iter()
        .map(|e| ExerciseRow {
            name: e.name.clone(),
            last_used: e
                .last_used
                .map_or_else(|| "-".to_string(), |t| format_last_used(t, now)),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_exercise_add(svc: &LiftfuelService, names: &[String], json: bool) -> Result<()> {
    let created = svc.add_exercises(names)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&created)?);
        return Ok(());
    }

    for exercise in &created {
        println!("Added exercise: {}", exercise.name);
    }
    let skipped = names.iter().filter(|n| !n.trim().is_empty()).count() - created.len();
    if skipped > 0 {
        eprintln!("Skipped {skipped} name(s) that already exist");
    }
    Ok(())
}

pub(crate) fn cmd_exercise_rename(
    svc: &LiftfuelService,
    name: &str,
    new_name: &str,
    json: bool,
) -> Result<()> {
    if svc.lookup_exercise(name)?.is_none() {
        if json {
            println!("{}", json_error(&format!("No exercise named '{name}'")));
        } else {
            eprintln!("No exercise named '{name}'");
        }
        process::exit(2);
    }

    let renamed = svc.rename_exercise(name, new_name)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&renamed)?);
    } else {
        println!("Renamed '{name}' to '{}'", renamed.name);
    }
    Ok(())
}

/// Popular exercises not yet in the user's list.
pub(crate) fn cmd_exercise_suggest(svc: &LiftfuelService, json: bool) -> Result<()> {
    let existing: Vec<String> = svc
        .exercises()?
        .iter()
        .map(|e| e.name.to_lowercase())
        .collect();
    let suggestions: Vec<&str> = POPULAR_EXERCISES
        .iter()
        .copied()
        .filter(|name| !existing.contains(&name.to_lowercase()))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
    } else if suggestions.is_empty() {
        eprintln!("You already track every suggested exercise");
    } else {
        for name in suggestions {
            println!("  {name}");
        }
    }
    Ok(())
}
