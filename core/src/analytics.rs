//! Pure computations turning repository data into display-ready numbers.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};

use crate::fdc::FoodRecord;
use crate::models::{
    CalorieDistribution, ChartPoint, DailyGoals, ExerciseStats, MacroTotals, WorkoutSet, round1,
};

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Number of recent sets plotted on the progress charts.
pub const CHART_POINTS: usize = 7;

/// Heaviest and mean weight across `sets`; both zero for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn exercise_stats(sets: &[WorkoutSet]) -> ExerciseStats {
    if sets.is_empty() {
        return ExerciseStats::default();
    }
    let max = sets.iter().map(|s| s.weight).fold(f64::MIN, f64::max);
    let sum: f64 = sets.iter().map(|s| s.weight).sum();
    ExerciseStats {
        max,
        average: round1(sum / sets.len() as f64),
    }
}

/// Progress-bar fill for `current` against `goal`, in `[0, 100]`.
/// A goal that is zero, negative, or not finite yields 0.
#[must_use]
pub fn macro_percentage(current: f64, goal: f64) -> f64 {
    if !goal.is_finite() || goal <= 0.0 || !current.is_finite() {
        return 0.0;
    }
    (current / goal * 100.0).clamp(0.0, 100.0)
}

/// What is left of each goal after `totals`. Negative when over.
#[must_use]
pub fn macro_remaining(goals: &DailyGoals, totals: &MacroTotals) -> MacroTotals {
    MacroTotals {
        calories: round1(goals.calories - totals.calories),
        protein: round1(goals.protein - totals.protein),
        carbs: round1(goals.carbs - totals.carbs),
        fat: round1(goals.fat - totals.fat),
    }
}

/// Share of calories contributed by each macro, from grams.
#[must_use]
pub fn calorie_distribution(protein_g: f64, carbs_g: f64, fat_g: f64) -> CalorieDistribution {
    let protein = protein_g * KCAL_PER_G_PROTEIN;
    let carbs = carbs_g * KCAL_PER_G_CARBS;
    let fat = fat_g * KCAL_PER_G_FAT;
    let total = protein + carbs + fat;
    if !total.is_finite() || total <= 0.0 {
        return CalorieDistribution::default();
    }
    CalorieDistribution {
        protein_pct: protein / total * 100.0,
        carbs_pct: carbs / total * 100.0,
        fat_pct: fat / total * 100.0,
    }
}

#[must_use]
pub fn food_calorie_distribution(food: &FoodRecord) -> CalorieDistribution {
    let (protein, carbs, fat) = food.macro_grams();
    calorie_distribution(protein, carbs, fat)
}

/// The last `limit` sets of an ascending list, labelled "Jun 16" in `tz`.
#[must_use]
pub fn chart_points<Tz>(sets_ascending: &[WorkoutSet], limit: usize, tz: &Tz) -> Vec<ChartPoint>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let start = sets_ascending.len().saturating_sub(limit);
    sets_ascending[start..]
        .iter()
        .map(|s| ChartPoint {
            label: s.date.with_timezone(tz).format("%b %-d").to_string(),
            weight: s.weight,
            reps: s.reps,
        })
        .collect()
}

/// Relative "last used" label: Today, Yesterday, 3d ago, 2w ago, 4m ago.
#[must_use]
pub fn format_last_used(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = now.signed_duration_since(then).num_days();
    match days {
        i64::MIN..=0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{days}d ago"),
        7..=29 => format!("{}w ago", days / 7),
        _ => format!("{}m ago", days / 30),
    }
}

/// Servings without trailing zeros: 1, 1.5, 0.125.
#[must_use]
pub fn format_servings(value: f64) -> String {
    let formatted = format!("{value:.3}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}
