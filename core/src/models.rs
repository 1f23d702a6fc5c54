use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Exercise seeded into an empty exercise list on first load.
pub const DEFAULT_EXERCISE: &str = "Bench Press";

/// Suggestions offered when adding exercises, most popular first.
pub const POPULAR_EXERCISES: &[&str] = &[
    "Bench Press",
    "Squat",
    "Deadlift",
    "Lat Pulldown",
    "Incline Dumbbell Press",
    "Leg Extension",
    "Incline Bench Press",
    "Pull-Up",
    "Dips",
    "Tricep Pushdown (Rope)",
    "Overhead Press",
    "Shoulder Press",
    "Leg Press",
    "Hammer Curls",
];

pub const MIN_SERVINGS: f64 = 0.001;
pub const MAX_SERVINGS: f64 = 999.999;
pub const DEFAULT_SERVING_SIZE_G: f64 = 100.0;

/// Generate a fresh record id.
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

impl Exercise {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            last_used: None,
        }
    }

    #[must_use]
    pub fn name_key(&self) -> String {
        self.name.to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSet {
    pub id: String,
    /// Owning exercise. Absent on records written before sets carried a
    /// foreign key; those are resolved by name on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_id: Option<String>,
    /// Exercise name at the time of recording, kept for display.
    pub exercise: String,
    pub reps: u32,
    pub weight: f64,
    pub date: DateTime<Utc>,
}

impl WorkoutSet {
    #[must_use]
    pub fn belongs_to(&self, exercise: &Exercise) -> bool {
        match &self.exercise_id {
            Some(id) => *id == exercise.id,
            None => self.exercise == exercise.name,
        }
    }

    /// Same exercise, same reps, same weight.
    #[must_use]
    pub fn same_effort(&self, other: &WorkoutSet) -> bool {
        let same_exercise = match (&self.exercise_id, &other.exercise_id) {
            (Some(a), Some(b)) => a == b,
            _ => self.exercise == other.exercise,
        };
        same_exercise && self.reps == other.reps && self.weight == other.weight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyGoals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Default for DailyGoals {
    fn default() -> Self {
        Self {
            calories: 2000.0,
            protein: 150.0,
            carbs: 250.0,
            fat: 65.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: String,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default = "default_serving_size")]
    pub serving_size: f64,
    #[serde(default = "default_servings")]
    pub servings: f64,
    pub timestamp: DateTime<Utc>,
}

fn default_serving_size() -> f64 {
    DEFAULT_SERVING_SIZE_G
}

fn default_servings() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ExerciseStats {
    pub max: f64,
    pub average: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CalorieDistribution {
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fat_pct: f64,
}

/// A set rendered under a day header, with its local time of day.
#[derive(Debug, Clone, Serialize)]
pub struct SetRow {
    pub time: String,
    #[serde(flatten)]
    pub set: WorkoutSet,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayGroup {
    pub label: String,
    pub sets: Vec<SetRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub weight: f64,
    pub reps: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[must_use]
pub fn round1(value: f64) -> f64 {
    round_to(value, 1)
}

/// Round a serving multiplier to 3 decimals and clamp it to
/// `[MIN_SERVINGS, MAX_SERVINGS]`.
pub fn clamp_servings(servings: f64) -> Result<f64> {
    if !servings.is_finite() || servings <= 0.0 {
        bail!("Servings must be a positive number (got {servings})");
    }
    Ok(round_to(servings, 3).clamp(MIN_SERVINGS, MAX_SERVINGS))
}

/// Trim and validate an exercise name.
pub fn validate_exercise_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("Exercise name must not be empty");
    }
    Ok(trimmed.to_string())
}

pub fn validate_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight < 0.0 {
        bail!("Weight must be a non-negative number (got {weight})");
    }
    Ok(())
}

pub fn validate_goals(goals: &DailyGoals) -> Result<()> {
    for (label, value) in [
        ("calories", goals.calories),
        ("protein", goals.protein),
        ("carbs", goals.carbs),
        ("fat", goals.fat),
    ] {
        if !value.is_finite() || value < 0.0 {
            bail!("Goal for {label} must be a non-negative number (got {value})");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round1() {
        assert!((round1(123.45) - 123.5).abs() < f64::EPSILON);
        assert!((round1(0.04) - 0.0).abs() < f64::EPSILON);
        assert!((round1(99.99) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_servings() {
        assert!((clamp_servings(1.5).unwrap() - 1.5).abs() < f64::EPSILON);
        assert!((clamp_servings(1.23456).unwrap() - 1.235).abs() < 1e-9);
        assert!((clamp_servings(0.0001).unwrap() - MIN_SERVINGS).abs() < f64::EPSILON);
        assert!((clamp_servings(5000.0).unwrap() - MAX_SERVINGS).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_servings_invalid() {
        assert!(clamp_servings(0.0).is_err());
        assert!(clamp_servings(-1.0).is_err());
        assert!(clamp_servings(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_exercise_name() {
        assert_eq!(validate_exercise_name("  Squat ").unwrap(), "Squat");
        assert!(validate_exercise_name("   ").is_err());
    }

    #[test]
    fn test_validate_goals() {
        assert!(validate_goals(&DailyGoals::default()).is_ok());
        let bad = DailyGoals {
            protein: -5.0,
            ..DailyGoals::default()
        };
        assert!(validate_goals(&bad).is_err());
    }

    #[test]
    fn test_meal_defaults_for_missing_fields() {
        let json = r#"{"id":"1700000000000","name":"Oats","calories":389,
            "protein":16.9,"carbs":66.3,"fat":6.9,"timestamp":"2024-06-15T08:00:00.000Z"}"#;
        let meal: Meal = serde_json::from_str(json).unwrap();
        assert!((meal.servings - 1.0).abs() < f64::EPSILON);
        assert!((meal.serving_size - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_exercise_legacy_json() {
        let json = r#"[{"id":"1","name":"Bench Press"},
            {"id":"2","name":"Squat","lastUsed":"2024-06-15T15:40:00.000Z"}]"#;
        let list: Vec<Exercise> = serde_json::from_str(json).unwrap();
        assert!(list[0].last_used.is_none());
        assert!(list[1].last_used.is_some());

        let out = serde_json::to_string(&list[1]).unwrap();
        assert!(out.contains("\"lastUsed\""));
    }

    #[test]
    fn test_same_effort_uses_id_when_present() {
        let date = Utc::now();
        let a = WorkoutSet {
            id: new_id(),
            exercise_id: Some("ex-1".into()),
            exercise: "Squat".into(),
            reps: 5,
            weight: 100.0,
            date,
        };
        let mut b = a.clone();
        b.exercise = "Back Squat".into();
        assert!(a.same_effort(&b));
        b.exercise_id = Some("ex-2".into());
        assert!(!a.same_effort(&b));
    }
}
