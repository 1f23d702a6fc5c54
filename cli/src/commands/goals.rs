use anyhow::{Result, bail};

use liftfuel_core::models::DailyGoals;
use liftfuel_core::service::LiftfuelService;

fn print_goals(goals: &DailyGoals) {
    let DailyGoals {
        calories,
        protein,
        carbs,
        fat,
    } = goals;
    println!("Daily goals: {calories:.0} kcal | P:{protein:.0}g C:{carbs:.0}g F:{fat:.0}g");
}

pub(crate) fn cmd_goals_show(svc: &LiftfuelService, json: bool) -> Result<()> {
    let goals = svc.goals()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
    } else {
        print_goals(&goals);
    }
    Ok(())
}

/// Overwrite the goals. Fields not given keep their current value.
pub(crate) fn cmd_goals_set(
    svc: &LiftfuelService,
    calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
    json: bool,
) -> Result<()> {
    if calories.is_none() && protein.is_none() && carbs.is_none() && fat.is_none() {
        bail!("Nothing to set. Provide at least one of --calories, --protein, --carbs, or --fat");
    }

    let current = svc.goals()?;
    let goals = DailyGoals {
        calories: calories.unwrap_or(current.calories),
        protein: protein.unwrap_or(current.protein),
        carbs: carbs.unwrap_or(current.carbs),
        fat: fat.unwrap_or(current.fat),
    };
    svc.save_goals(&goals)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
    } else {
        print_goals(&goals);
    }
    Ok(())
}
