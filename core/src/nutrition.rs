use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::warn;

use crate::collection::Collection;
use crate::fdc::{FoodRecord, NutrientKind, get_nutrient_value};
use crate::models::{
    DEFAULT_SERVING_SIZE_G, DailyGoals, MacroTotals, Meal, clamp_servings, new_id, round1,
    validate_goals,
};
use crate::store::{DAILY_GOALS_KEY, KeyValueStore, TODAY_MEALS_KEY, load_json, save_json};

/// Field-wise sum of the meals' macros, each running total rounded to one
/// decimal.
#[must_use]
pub fn compute_totals(meals: &[Meal]) -> MacroTotals {
    meals.iter().fold(MacroTotals::default(), |acc, m| MacroTotals {
        calories: round1(acc.calories + m.calories),
        protein: round1(acc.protein + m.protein),
        carbs: round1(acc.carbs + m.carbs),
        fat: round1(acc.fat + m.fat),
    })
}

/// Build the meal logged for `servings` of `food`.
pub fn meal_from_food(food: &FoodRecord, servings: f64, at: DateTime<Utc>) -> Result<Meal> {
    let servings = clamp_servings(servings)?;
    let scaled = |kind| round1(get_nutrient_value(food, kind) * servings);
    Ok(Meal {
        id: new_id(),
        name: food.description.clone(),
        calories: scaled(NutrientKind::Energy),
        protein: scaled(NutrientKind::Protein),
        carbs: scaled(NutrientKind::Carbs),
        fat: scaled(NutrientKind::Fat),
        serving_size: round1(food.serving_size.unwrap_or(DEFAULT_SERVING_SIZE_G)),
        servings,
        timestamp: at,
    })
}

/// Meals whose timestamp falls on `date` in `tz`.
#[must_use]
pub fn filter_by_date<Tz: TimeZone>(meals: &[Meal], date: NaiveDate, tz: &Tz) -> Vec<Meal> {
    meals
        .iter()
        .filter(|m| m.timestamp.with_timezone(tz).date_naive() == date)
        .cloned()
        .collect()
}

pub struct NutritionRepository {
    store: Arc<dyn KeyValueStore>,
    meals: Collection<Meal>,
}

impl NutritionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            meals: Collection::new(store.clone(), TODAY_MEALS_KEY),
            store,
        }
    }

    /// Read goals and meals. Missing goals fall back to the defaults.
    pub fn load_goals_and_meals(&self) -> Result<(DailyGoals, Vec<Meal>)> {
        let goals = self.goals()?;
        let meals = self.meals.load_with(|raw| (raw.unwrap_or_default(), false))?;
        Ok((goals, meals))
    }

    pub fn goals(&self) -> Result<DailyGoals> {
        let goals = load_json(self.store.as_ref(), DAILY_GOALS_KEY).inspect_err(|e| {
            warn!(key = DAILY_GOALS_KEY, "Failed to load: {e:#}");
        })?;
        Ok(goals.unwrap_or_default())
    }

    pub fn save_goals(&self, goals: &DailyGoals) -> Result<()> {
        validate_goals(goals)?;
        save_json(self.store.as_ref(), DAILY_GOALS_KEY, goals).inspect_err(|e| {
            warn!(key = DAILY_GOALS_KEY, "Failed to persist: {e:#}");
        })
    }

    pub fn meals(&self) -> Result<Vec<Meal>> {
        self.meals.items()
    }

    pub fn totals(&self) -> Result<MacroTotals> {
        Ok(compute_totals(&self.meals.items()?))
    }

    pub fn add_meal(&self, food: &FoodRecord, servings: f64, at: DateTime<Utc>) -> Result<Meal> {
        let meal = meal_from_food(food, servings, at)?;
        self.meals.update(|meals| {
            meals.push(meal.clone());
            Ok((meal, true))
        })
    }

    /// Remove a meal by id. Returns false when no meal had that id.
    pub fn delete_meal(&self, id: &str) -> Result<bool> {
        self.meals.update(|meals| {
            let before = meals.len();
            meals.retain(|m| m.id != id);
            let removed = meals.len() != before;
            Ok((removed, removed))
        })
    }

    pub fn clear_meals(&self) -> Result<()> {
        self.meals.clear()
    }

    pub fn meals_by_date<Tz: TimeZone>(&self, date: NaiveDate, tz: &Tz) -> Result<Vec<Meal>> {
        Ok(filter_by_date(&self.meals.items()?, date, tz))
    }

    pub(crate) fn invalidate(&self) -> Result<()> {
        self.meals.invalidate()
    }
}
