use anyhow::{Result, bail};
use chrono::{Local, Utc};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use liftfuel_core::analytics::format_servings;
use liftfuel_core::fdc::{FoodRecord, FoodSearchProvider};
use liftfuel_core::service::{LiftfuelService, SearchOutcome};

use super::cancellable;
use super::helpers::{
    json_error, no_neg_zero, parse_date, parse_servings, print_food_table, progress_bar,
    prompt_choice, truncate,
};

/// Turn a search outcome into records, exiting 2 when nothing matched.
fn found_or_exit(outcome: SearchOutcome, what: &str, json: bool) -> Result<Vec<FoodRecord>> {
    match outcome {
        SearchOutcome::Found(foods) => Ok(foods),
        SearchOutcome::NoResults => {
            if json {
                println!("[]");
            } else {
                eprintln!("No results found for '{what}'");
            }
            process::exit(2);
        }
        SearchOutcome::Failed(e) if e.is_retryable() => {
            bail!("{e}. Please try again")
        }
        SearchOutcome::Failed(e) => bail!("{e}"),
    }
}

fn pick_food(mut foods: Vec<FoodRecord>, pick: Option<usize>) -> Result<FoodRecord> {
    let idx = match pick {
        Some(n) if n >= 1 && n <= foods.len() => n - 1,
        Some(n) => bail!("--pick {n} is out of range (1-{})", foods.len()),
        None if foods.len() == 1 => 0,
        None => {
            print_food_table(&foods);
            prompt_choice(foods.len())?
        }
    };
    Ok(foods.swap_remove(idx))
}

pub(crate) async fn cmd_food_search(
    svc: &LiftfuelService,
    provider: &dyn FoodSearchProvider,
    query: &str,
    json: bool,
) -> Result<()> {
    let outcome = cancellable(svc.search_foods(provider, query)).await??;
    let foods = found_or_exit(outcome, query, json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
    } else {
        print_food_table(&foods);
    }
    Ok(())
}

pub(crate) fn cmd_food_recent(svc: &LiftfuelService, clear: bool, json: bool) -> Result<()> {
    if clear {
        svc.clear_recent_searches()?;
    }
    let recent = svc.recent_searches()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recent)?);
    } else if recent.is_empty() {
        eprintln!("No recent searches");
    } else {
        for query in &recent {
            println!("  {query}");
        }
    }
    Ok(())
}

pub(crate) async fn cmd_food_add(
    svc: &LiftfuelService,
    provider: &dyn FoodSearchProvider,
    query: &str,
    servings: &str,
    pick: Option<usize>,
    json: bool,
) -> Result<()> {
    let servings = parse_servings(servings)?;
    let outcome = cancellable(svc.search_foods(provider, query)).await??;
    let foods = found_or_exit(outcome, query, json)?;
    let food = pick_food(foods, pick)?;
    log_meal(svc, &food, servings, json)
}

pub(crate) async fn cmd_food_barcode(
    svc: &LiftfuelService,
    provider: &dyn FoodSearchProvider,
    code: &str,
    servings: &str,
    pick: Option<usize>,
    json: bool,
) -> Result<()> {
    let servings = parse_servings(servings)?;
    let outcome = cancellable(svc.barcode_lookup(provider, code)).await?;
    let foods = found_or_exit(outcome, code, json)?;
    let food = pick_food(foods, pick)?;
    log_meal(svc, &food, servings, json)
}

fn log_meal(svc: &LiftfuelService, food: &FoodRecord, servings: f64, json: bool) -> Result<()> {
    let meal = svc.add_meal(food, servings, Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        let name = &meal.name;
        let servings = format_servings(meal.servings);
        let cal = meal.calories;
        let (p, c, f) = (meal.protein, meal.carbs, meal.fat);
        println!(
            "Logged {servings} x {name}: {cal:.0} kcal | P:{p:.1}g C:{c:.1}g F:{f:.1}g (id: {})",
            meal.id
        );
    }
    Ok(())
}

pub(crate) fn cmd_food_list(svc: &LiftfuelService, date: Option<String>, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Servings")]
        servings: String,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "C")]
        carbs: String,
        #[tabled(rename = "F")]
        fat: String,
    }

    let meals = match date {
        Some(d) => svc.meals_on(parse_date(Some(d))?, &Local)?,
        None => svc.meals()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&meals)?);
        return Ok(());
    }

    if meals.is_empty() {
        eprintln!("No meals logged");
        process::exit(2);
    }

    let rows: Vec<MealRow> = meals
        .iter()
        .map(|m| MealRow {
            id: m.id.clone(),
            time: m.timestamp.with_timezone(&Local).format("%-I:%M %p").to_string(),
            name: truncate(&m.name, 35),
            servings: format!(
                "{} x {:.0}g",
                format_servings(m.servings),
                m.serving_size
            ),
            calories: format!("{:.0}", m.calories),
            protein: format!("{:.1}", m.protein),
            carbs: format!("{:.1}", m.carbs),
            fat: format!("{:.1}", m.fat),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_food_delete(svc: &LiftfuelService, id: &str, json: bool) -> Result<()> {
    if let Some(totals) = svc.delete_meal(id)? {
        if json {
            println!(
                "{}",
                serde_json::json!({ "deleted": id, "totals": totals })
            );
        } else {
            let cal = no_neg_zero(totals.calories);
            println!("Deleted meal {id} ({cal:.0} kcal logged now)");
        }
        Ok(())
    } else {
        if json {
            println!("{}", json_error(&format!("Meal {id} not found")));
        } else {
            eprintln!("Meal {id} not found");
        }
        process::exit(2);
    }
}

pub(crate) fn cmd_food_clear(svc: &LiftfuelService, json: bool) -> Result<()> {
    svc.clear_meals()?;
    if json {
        println!("{}", serde_json::json!({ "cleared": true }));
    } else {
        println!("Cleared today's meals");
    }
    Ok(())
}

pub(crate) fn cmd_food_summary(svc: &LiftfuelService, json: bool) -> Result<()> {
    let summary = svc.nutrition_summary()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let t = &summary.totals;
    let g = &summary.goals;
    let r = &summary.remaining;
    println!("=== Today ({} meals) ===\n", summary.meals.len());
    for (label, current, goal, unit) in [
        ("Calories", t.calories, g.calories, "kcal"),
        ("Protein", t.protein, g.protein, "g"),
        ("Carbs", t.carbs, g.carbs, "g"),
        ("Fat", t.fat, g.fat, "g"),
    ] {
        println!(
            "  {label:<9}{}  {current:.0}/{goal:.0}{unit}",
            progress_bar(current, goal)
        );
    }
    let rcal = no_neg_zero(r.calories);
    let (rp, rc, rf) = (no_neg_zero(r.protein), no_neg_zero(r.carbs), no_neg_zero(r.fat));
    println!("\n  REMAINING: {rcal:.0} kcal | P:{rp:.0}g C:{rc:.0}g F:{rf:.0}g");
    Ok(())
}
