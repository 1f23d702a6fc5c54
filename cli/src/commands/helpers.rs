use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use liftfuel_core::analytics::{food_calorie_distribution, macro_percentage};
use liftfuel_core::fdc::{FoodRecord, NutrientKind, get_nutrient_value};

const BAR_WIDTH: usize = 20;

pub(crate) fn parse_servings(s: &str) -> Result<f64> {
    let trimmed = s.trim().trim_end_matches('x').trim();
    let value: f64 = trimmed
        .parse()
        .with_context(|| format!("Invalid servings: '{s}'. Use a number like '1' or '1.5'"))?;
    if !value.is_finite() || value <= 0.0 {
        bail!("Servings must be greater than 0");
    }
    Ok(value)
}

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday")),
        },
    }
}

fn read_line() -> Result<String> {
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    Ok(line)
}

pub(crate) fn prompt_choice(count: usize) -> Result<usize> {
    eprint!("\nSelect a food (1-{count}): ");
    let line = read_line()?;
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

pub(crate) fn prompt_confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N]: ");
    let line = read_line()?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub(crate) fn print_food_table(foods: &[FoodRecord]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "FDC ID")]
        id: u64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Serving")]
        serving: String,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "C")]
        carbs: String,
        #[tabled(rename = "F")]
        fat: String,
        #[tabled(rename = "P/C/F %")]
        split: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let dist = food_calorie_distribution(f);
            FoodRow {
                idx: i + 1,
                id: f.fdc_id,
                name: truncate(&f.description, 35),
                serving: f.serving_size.map_or("100g".into(), |s| {
                    let unit = f.serving_size_unit.as_deref().unwrap_or("g");
                    format!("{s:.0}{}", unit.to_lowercase())
                }),
                calories: format!("{:.0}", get_nutrient_value(f, NutrientKind::Energy)),
                protein: format!("{:.1}", get_nutrient_value(f, NutrientKind::Protein)),
                carbs: format!("{:.1}", get_nutrient_value(f, NutrientKind::Carbs)),
                fat: format!("{:.1}", get_nutrient_value(f, NutrientKind::Fat)),
                split: format!(
                    "{:.0}/{:.0}/{:.0}",
                    dist.protein_pct, dist.carbs_pct, dist.fat_pct
                ),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..9)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// Text progress bar for `current` against `goal`.
pub(crate) fn progress_bar(current: f64, goal: f64) -> String {
    let pct = macro_percentage(current, goal);
    #[allow(clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((pct / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!(
        "[{}{}] {pct:>3.0}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
