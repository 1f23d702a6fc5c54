use std::fmt::Display;
use std::path::Path;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analytics::{CHART_POINTS, chart_points, exercise_stats, macro_remaining};
use crate::exercises::ExerciseRepository;
use crate::fdc::{FoodRecord, FoodSearchProvider, SearchError};
use crate::models::{
    ChartPoint, DailyGoals, Exercise, ExerciseStats, MacroTotals, Meal, SortOrder, WorkoutSet,
};
use crate::nutrition::{NutritionRepository, compute_totals};
use crate::sets::WorkoutSetRepository;
use crate::store::{
    EXERCISES_KEY, KeyValueStore, MemoryStore, RECENT_SEARCHES_KEY, SqliteStore, WORKOUT_SETS_KEY,
    load_json, save_json,
};

/// How many distinct recent food searches are remembered.
pub const RECENT_SEARCH_LIMIT: usize = 5;

/// Emitted after every successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    ExercisesChanged,
    SetsChanged,
    MealsChanged,
    GoalsChanged,
}

/// Result of asking to record a set.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    Recorded(WorkoutSet),
    /// An identical set was recorded moments ago. Nothing was written; call
    /// again with `confirm = true` to record it anyway.
    NeedsConfirmation {
        candidate: WorkoutSet,
        previous: WorkoutSet,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct NutritionSummary {
    pub goals: DailyGoals,
    pub totals: MacroTotals,
    pub remaining: MacroTotals,
    pub meals: Vec<Meal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseAnalytics {
    pub exercise: Exercise,
    pub stats: ExerciseStats,
    pub points: Vec<ChartPoint>,
}

/// What the caller should tell the user after a food search.
#[derive(Debug)]
pub enum SearchOutcome {
    Found(Vec<FoodRecord>),
    NoResults,
    Failed(SearchError),
}

/// Which stored collections `clear` wipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    All,
    /// Exercises together with their recorded sets.
    Exercises,
    WorkoutSets,
}

pub struct LiftfuelService {
    store: Arc<dyn KeyValueStore>,
    exercises: ExerciseRepository,
    sets: WorkoutSetRepository,
    nutrition: NutritionRepository,
    subscribers: Mutex<Vec<Sender<ChangeEvent>>>,
}

impl LiftfuelService {
    pub fn new(db_path: &Path) -> Result<Self> {
        let store = SqliteStore::open(db_path)?;
        Ok(Self::with_store(Arc::new(store)))
    }

    #[must_use]
    pub fn new_in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            exercises: ExerciseRepository::new(store.clone()),
            sets: WorkoutSetRepository::new(store.clone()),
            nutrition: NutritionRepository::new(store.clone()),
            store,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    // --- Change notifications ---

    pub fn subscribe(&self) -> Result<Receiver<ChangeEvent>> {
        let (tx, rx) = channel();
        self.subscribers
            .lock()
            .map_err(|_| anyhow!("Subscriber list lock poisoned"))?
            .push(tx);
        Ok(rx)
    }

    fn notify(&self, event: ChangeEvent) {
        debug!(?event, "Change");
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|tx| tx.send(event).is_ok());
        }
    }

    // --- Exercises ---

    /// Load exercises and sets, linking legacy sets to exercise ids.
    pub fn load_exercises(&self) -> Result<Vec<Exercise>> {
        let exercises = self.exercises.load()?;
        self.sets.load(&exercises)?;
        Ok(exercises)
    }

    pub fn add_exercises<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Exercise>> {
        self.exercises.load()?;
        let created = self.exercises.add(names)?;
        if !created.is_empty() {
            info!(count = created.len(), "Added exercises");
            self.notify(ChangeEvent::ExercisesChanged);
        }
        Ok(created)
    }

    pub fn exercises(&self) -> Result<Vec<Exercise>> {
        self.exercises.list()
    }

    /// `Ok(None)` when no exercise has that name; errors only on storage
    /// failures.
    pub fn lookup_exercise(&self, name: &str) -> Result<Option<Exercise>> {
        self.exercises.find_by_name(name)
    }

    pub fn find_exercise(&self, name: &str) -> Result<Exercise> {
        self.lookup_exercise(name)?
            .with_context(|| format!("No exercise named '{name}'"))
    }

    /// Rename an exercise and carry the new name onto its recorded sets.
    pub fn rename_exercise(&self, name: &str, new_name: &str) -> Result<Exercise> {
        let exercise = self.find_exercise(name)?;
        let renamed = self.exercises.rename(&exercise.id, new_name)?;
        self.sets.rename_exercise(&renamed.id, &renamed.name)?;
        self.notify(ChangeEvent::ExercisesChanged);
        self.notify(ChangeEvent::SetsChanged);
        Ok(renamed)
    }

    // --- Sets ---

    /// Record a set for the named exercise at `at`.
    ///
    /// When an identical set was recorded within the duplicate window and
    /// `confirm` is false, nothing is written and the previous set is
    /// returned for the caller to confirm against.
    pub fn record_set(
        &self,
        exercise_name: &str,
        reps: u32,
        weight: f64,
        confirm: bool,
        at: DateTime<Utc>,
    ) -> Result<RecordOutcome> {
        let exercise = self.find_exercise(exercise_name)?;
        let candidate = WorkoutSetRepository::draft(&exercise, reps, weight, at)?;

        if !confirm {
            if let Some(previous) = self.sets.recent_duplicate(&candidate, at)? {
                info!(exercise = %exercise.name, reps, weight, "Possible duplicate set");
                return Ok(RecordOutcome::NeedsConfirmation {
                    candidate,
                    previous,
                });
            }
        }

        let set = self.sets.insert(candidate)?;
        self.notify(ChangeEvent::SetsChanged);
        self.touch_after_commit(Some(&exercise.id), &exercise.name, at);
        Ok(RecordOutcome::Recorded(set))
    }

    /// Move `lastUsed` once a set change is already stored. A failure here
    /// leaves the old timestamp in place and is only logged, so the committed
    /// set change is still reported as done.
    fn touch_after_commit(&self, exercise_id: Option<&str>, name: &str, at: DateTime<Utc>) {
        let touched = match exercise_id {
            Some(id) => self.exercises.touch_last_used_by_id(id, at),
            None => self.exercises.touch_last_used(name, at),
        };
        match touched {
            Ok(true) => self.notify(ChangeEvent::ExercisesChanged),
            Ok(false) => {}
            Err(e) => warn!(exercise = %name, "Last used date not updated: {e:#}"),
        }
    }

    pub fn sets_for_exercise(&self, name: &str, order: SortOrder) -> Result<Vec<WorkoutSet>> {
        let exercise = self.find_exercise(name)?;
        self.sets.list_for_exercise(&exercise, order)
    }

    /// Delete a set, returning `None` when no set has that id. The owning
    /// exercise's `lastUsed` is moved to `at`.
    pub fn delete_set(&self, id: &str, at: DateTime<Utc>) -> Result<Option<WorkoutSet>> {
        let Some(removed) = self.sets.delete(id)? else {
            return Ok(None);
        };
        self.notify(ChangeEvent::SetsChanged);
        self.touch_after_commit(removed.exercise_id.as_deref(), &removed.exercise, at);
        Ok(Some(removed))
    }

    /// Stats and chart points, with point labels in `tz`.
    pub fn exercise_analytics<Tz>(&self, name: &str, tz: &Tz) -> Result<ExerciseAnalytics>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let exercise = self.find_exercise(name)?;
        let sets = self.sets.list_for_exercise(&exercise, SortOrder::Ascending)?;
        Ok(ExerciseAnalytics {
            stats: exercise_stats(&sets),
            points: chart_points(&sets, CHART_POINTS, tz),
            exercise,
        })
    }

    // --- Nutrition ---

    pub fn nutrition_summary(&self) -> Result<NutritionSummary> {
        let (goals, meals) = self.nutrition.load_goals_and_meals()?;
        let totals = compute_totals(&meals);
        Ok(NutritionSummary {
            goals,
            remaining: macro_remaining(&goals, &totals),
            totals,
            meals,
        })
    }

    pub fn goals(&self) -> Result<DailyGoals> {
        self.nutrition.goals()
    }

    pub fn save_goals(&self, goals: &DailyGoals) -> Result<()> {
        self.nutrition.save_goals(goals)?;
        self.notify(ChangeEvent::GoalsChanged);
        Ok(())
    }

    pub fn add_meal(&self, food: &FoodRecord, servings: f64, at: DateTime<Utc>) -> Result<Meal> {
        let meal = self.nutrition.add_meal(food, servings, at)?;
        info!(name = %meal.name, calories = meal.calories, "Added meal");
        self.notify(ChangeEvent::MealsChanged);
        Ok(meal)
    }

    /// Delete a meal and return the new totals, or `None` when no meal has
    /// that id.
    pub fn delete_meal(&self, id: &str) -> Result<Option<MacroTotals>> {
        if !self.nutrition.delete_meal(id)? {
            return Ok(None);
        }
        self.notify(ChangeEvent::MealsChanged);
        self.nutrition.totals().map(Some)
    }

    pub fn clear_meals(&self) -> Result<()> {
        self.nutrition.clear_meals()?;
        self.notify(ChangeEvent::MealsChanged);
        Ok(())
    }

    pub fn meals(&self) -> Result<Vec<Meal>> {
        self.nutrition.meals()
    }

    pub fn meals_on<Tz: TimeZone>(&self, date: NaiveDate, tz: &Tz) -> Result<Vec<Meal>> {
        self.nutrition.meals_by_date(date, tz)
    }

    // --- Food search ---

    /// Search by name, remembering the query. Failures are reported in the
    /// outcome rather than as an error so callers can offer a retry.
    pub async fn search_foods(
        &self,
        provider: &dyn FoodSearchProvider,
        query: &str,
    ) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchOutcome::Failed(SearchError::EmptyQuery));
        }
        match provider.search_by_name(query).await {
            Ok(foods) if foods.is_empty() => Ok(SearchOutcome::NoResults),
            Ok(foods) => {
                self.remember_search(query)?;
                Ok(SearchOutcome::Found(foods))
            }
            Err(e) => {
                warn!(query, "Food search failed: {e}");
                Ok(SearchOutcome::Failed(e))
            }
        }
    }

    pub async fn barcode_lookup(
        &self,
        provider: &dyn FoodSearchProvider,
        code: &str,
    ) -> SearchOutcome {
        let code = code.trim();
        if code.is_empty() {
            return SearchOutcome::Failed(SearchError::EmptyQuery);
        }
        match provider.search_by_barcode(code).await {
            Ok(foods) if foods.is_empty() => SearchOutcome::NoResults,
            Ok(foods) => SearchOutcome::Found(foods),
            Err(e) => {
                warn!(code, "Barcode lookup failed: {e}");
                SearchOutcome::Failed(e)
            }
        }
    }

    pub fn recent_searches(&self) -> Result<Vec<String>> {
        Ok(load_json(self.store.as_ref(), RECENT_SEARCHES_KEY)?.unwrap_or_default())
    }

    fn remember_search(&self, query: &str) -> Result<()> {
        let mut recent: Vec<String> = self.recent_searches()?;
        recent.retain(|q| q != query);
        recent.insert(0, query.to_string());
        recent.truncate(RECENT_SEARCH_LIMIT);
        save_json(self.store.as_ref(), RECENT_SEARCHES_KEY, &recent)
    }

    pub fn clear_recent_searches(&self) -> Result<()> {
        self.store.remove(RECENT_SEARCHES_KEY)
    }

    // --- Bulk clear ---

    pub fn clear(&self, scope: ClearScope) -> Result<()> {
        match scope {
            ClearScope::All => self.store.clear()?,
            ClearScope::Exercises => self.store.remove_many(&[EXERCISES_KEY, WORKOUT_SETS_KEY])?,
            ClearScope::WorkoutSets => self.store.remove(WORKOUT_SETS_KEY)?,
        }
        self.exercises.invalidate()?;
        self.sets.invalidate()?;
        self.nutrition.invalidate()?;
        info!(?scope, "Cleared stored data");

        match scope {
            ClearScope::All => {
                self.notify(ChangeEvent::ExercisesChanged);
                self.notify(ChangeEvent::SetsChanged);
                self.notify(ChangeEvent::MealsChanged);
                self.notify(ChangeEvent::GoalsChanged);
            }
            ClearScope::Exercises => {
                self.notify(ChangeEvent::ExercisesChanged);
                self.notify(ChangeEvent::SetsChanged);
            }
            ClearScope::WorkoutSets => self.notify(ChangeEvent::SetsChanged),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdc::fixtures::{nutrient_by_id, nutrient_by_name, yogurt};
    use crate::store::testing::FlakyStore;
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct MockProvider {
        foods: Vec<FoodRecord>,
    }

    #[async_trait]
    impl FoodSearchProvider for MockProvider {
        async fn search_by_name(&self, _query: &str) -> Result<Vec<FoodRecord>, SearchError> {
            Ok(self.foods.clone())
        }

        async fn search_by_barcode(&self, code: &str) -> Result<Vec<FoodRecord>, SearchError> {
            Ok(self
                .foods
                .iter()
                .filter(|f| f.gtin_upc.as_deref() == Some(code))
                .cloned()
                .collect())
        }
    }

    struct DownProvider;

    #[async_trait]
    impl FoodSearchProvider for DownProvider {
        async fn search_by_name(&self, _query: &str) -> Result<Vec<FoodRecord>, SearchError> {
            Err(SearchError::Timeout)
        }

        async fn search_by_barcode(&self, _code: &str) -> Result<Vec<FoodRecord>, SearchError> {
            Err(SearchError::Status(500))
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 16, h, m, 0).unwrap()
    }

    fn food(calories: f64) -> FoodRecord {
        FoodRecord {
            description: format!("{calories} kcal thing"),
            food_nutrients: vec![nutrient_by_id(1008, calories), nutrient_by_id(1003, 1.0)],
            ..FoodRecord::default()
        }
    }

    #[test]
    fn test_add_exercise_twice_with_different_case() {
        let svc = LiftfuelService::new_in_memory();
        svc.add_exercises(&["Squat"]).unwrap();
        svc.add_exercises(&["squat"]).unwrap();

        let list = svc.load_exercises().unwrap();
        let squats: Vec<_> = list
            .iter()
            .filter(|e| e.name.eq_ignore_ascii_case("squat"))
            .collect();
        assert_eq!(squats.len(), 1);
        assert_eq!(squats[0].name, "Squat");
    }

    #[test]
    fn test_record_duplicate_needs_confirmation() {
        let svc = LiftfuelService::new_in_memory();
        svc.add_exercises(&["Squat"]).unwrap();

        let first = svc.record_set("Squat", 5, 100.0, false, at(10, 0)).unwrap();
        assert!(matches!(first, RecordOutcome::Recorded(_)));

        let second = svc.record_set("Squat", 5, 100.0, false, at(10, 1)).unwrap();
        let RecordOutcome::NeedsConfirmation { previous, .. } = second else {
            panic!("expected duplicate prompt");
        };
        assert_eq!(previous.reps, 5);
        assert_eq!(
            svc.sets_for_exercise("Squat", SortOrder::Ascending)
                .unwrap()
                .len(),
            1
        );

        let confirmed = svc.record_set("Squat", 5, 100.0, true, at(10, 1)).unwrap();
        assert!(matches!(confirmed, RecordOutcome::Recorded(_)));
        assert_eq!(
            svc.sets_for_exercise("Squat", SortOrder::Ascending)
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_record_set_touches_last_used() {
        let svc = LiftfuelService::new_in_memory();
        svc.add_exercises(&["Squat"]).unwrap();
        svc.record_set("squat", 5, 100.0, false, at(10, 0)).unwrap();
        assert_eq!(svc.find_exercise("Squat").unwrap().last_used, Some(at(10, 0)));
    }

    #[test]
    fn test_record_set_unknown_exercise() {
        let svc = LiftfuelService::new_in_memory();
        assert!(svc.record_set("Nope", 5, 100.0, false, at(10, 0)).is_err());
    }

    #[test]
    fn test_delete_set_touches_last_used() {
        let svc = LiftfuelService::new_in_memory();
        svc.add_exercises(&["Squat"]).unwrap();
        let RecordOutcome::Recorded(set) =
            svc.record_set("Squat", 5, 100.0, false, at(10, 0)).unwrap()
        else {
            panic!("expected recorded set");
        };

        assert!(svc.delete_set(&set.id, at(11, 0)).unwrap().is_some());
        assert_eq!(svc.find_exercise("Squat").unwrap().last_used, Some(at(11, 0)));
        assert!(svc.delete_set(&set.id, at(11, 5)).unwrap().is_none());
    }

    fn flaky_service() -> (Arc<FlakyStore>, LiftfuelService) {
        let store = Arc::new(FlakyStore::default());
        let svc = LiftfuelService::with_store(store.clone());
        svc.add_exercises(&["Squat"]).unwrap();
        (store, svc)
    }

    #[test]
    fn test_set_changes_survive_last_used_write_failure() {
        let (store, svc) = flaky_service();
        let RecordOutcome::Recorded(first) =
            svc.record_set("Squat", 5, 100.0, false, at(10, 0)).unwrap()
        else {
            panic!("expected recorded set");
        };
        store.fail_writes_to(EXERCISES_KEY);

        let outcome = svc.record_set("Squat", 3, 120.0, false, at(10, 10)).unwrap();
        assert!(matches!(outcome, RecordOutcome::Recorded(_)));
        assert_eq!(svc.find_exercise("Squat").unwrap().last_used, Some(at(10, 0)));

        let removed = svc.delete_set(&first.id, at(11, 0)).unwrap();
        assert_eq!(removed.map(|s| s.id), Some(first.id.clone()));
        assert_eq!(
            svc.sets_for_exercise("Squat", SortOrder::Ascending)
                .unwrap()
                .len(),
            1
        );
        assert!(svc.delete_set(&first.id, at(11, 5)).unwrap().is_none());
    }

    #[test]
    fn test_delete_set_write_failure_is_an_error() {
        let (store, svc) = flaky_service();
        let RecordOutcome::Recorded(set) =
            svc.record_set("Squat", 5, 100.0, false, at(10, 0)).unwrap()
        else {
            panic!("expected recorded set");
        };
        store.set_fail_writes(true);

        assert!(svc.delete_set(&set.id, at(11, 0)).is_err());
        assert_eq!(
            svc.sets_for_exercise("Squat", SortOrder::Ascending)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_lookup_exercise() {
        let svc = LiftfuelService::new_in_memory();
        svc.add_exercises(&["Squat"]).unwrap();
        assert!(svc.lookup_exercise(" squat ").unwrap().is_some());
        assert!(svc.lookup_exercise("Dips").unwrap().is_none());
    }

    #[test]
    fn test_rename_keeps_history() {
        let svc = LiftfuelService::new_in_memory();
        svc.add_exercises(&["Squat", "Dips"]).unwrap();
        svc.record_set("Squat", 5, 100.0, false, at(10, 0)).unwrap();

        svc.rename_exercise("Squat", "Back Squat").unwrap();
        let sets = svc
            .sets_for_exercise("Back Squat", SortOrder::Descending)
            .unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].exercise, "Back Squat");
        assert!(svc.rename_exercise("Back Squat", "dips").is_err());
    }

    #[test]
    fn test_exercise_analytics() {
        let svc = LiftfuelService::new_in_memory();
        svc.add_exercises(&["Squat"]).unwrap();
        svc.record_set("Squat", 5, 100.0, false, at(10, 0)).unwrap();
        svc.record_set("Squat", 3, 120.0, false, at(10, 10)).unwrap();

        let analytics = svc.exercise_analytics("Squat", &Utc).unwrap();
        assert!((analytics.stats.max - 120.0).abs() < f64::EPSILON);
        assert!((analytics.stats.average - 110.0).abs() < f64::EPSILON);
        assert_eq!(analytics.points.len(), 2);
    }

    #[test]
    fn test_meal_totals_scenario() {
        let svc = LiftfuelService::new_in_memory();
        svc.add_meal(&food(300.0), 1.0, at(8, 0)).unwrap();
        let middle = svc.add_meal(&food(450.0), 1.0, at(12, 0)).unwrap();
        svc.add_meal(&food(250.0), 1.0, at(18, 0)).unwrap();

        let summary = svc.nutrition_summary().unwrap();
        assert!((summary.totals.calories - 1000.0).abs() < f64::EPSILON);
        assert!((summary.remaining.calories - 1000.0).abs() < f64::EPSILON);

        let totals = svc.delete_meal(&middle.id).unwrap().unwrap();
        assert!((totals.calories - 550.0).abs() < f64::EPSILON);
        assert!(svc.delete_meal(&middle.id).unwrap().is_none());
    }

    #[test]
    fn test_subscribers_see_changes() {
        let svc = LiftfuelService::new_in_memory();
        let rx = svc.subscribe().unwrap();

        svc.add_exercises(&["Squat"]).unwrap();
        svc.save_goals(&DailyGoals::default()).unwrap();
        svc.add_meal(&yogurt(), 1.0, at(8, 0)).unwrap();

        let events: Vec<ChangeEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                ChangeEvent::ExercisesChanged,
                ChangeEvent::GoalsChanged,
                ChangeEvent::MealsChanged
            ]
        );
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let svc = LiftfuelService::new_in_memory();
        drop(svc.subscribe().unwrap());
        svc.add_exercises(&["Squat"]).unwrap();
        assert!(svc.subscribers.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clear_scopes() {
        let svc = LiftfuelService::new_in_memory();
        svc.add_exercises(&["Squat"]).unwrap();
        svc.record_set("Squat", 5, 100.0, false, at(10, 0)).unwrap();
        svc.add_meal(&yogurt(), 1.0, at(8, 0)).unwrap();

        svc.clear(ClearScope::WorkoutSets).unwrap();
        assert!(
            svc.sets_for_exercise("Squat", SortOrder::Ascending)
                .unwrap()
                .is_empty()
        );
        assert_eq!(svc.meals().unwrap().len(), 1);

        svc.record_set("Squat", 3, 120.0, false, at(10, 5)).unwrap();
        svc.clear(ClearScope::Exercises).unwrap();
        assert!(svc.find_exercise("Squat").is_err());
        assert!(svc.store.get(WORKOUT_SETS_KEY).unwrap().is_none());

        svc.clear(ClearScope::All).unwrap();
        let names: Vec<String> = svc
            .load_exercises()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Bench Press"]);
        assert!(svc.meals().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_sets_do_not_block_other_data() {
        let store = Arc::new(MemoryStore::new());
        let svc = LiftfuelService::with_store(store.clone());
        svc.add_meal(&yogurt(), 1.0, at(8, 0)).unwrap();
        store.set(WORKOUT_SETS_KEY, "{oops").unwrap();

        assert!(svc.load_exercises().is_err());
        assert_eq!(svc.nutrition_summary().unwrap().meals.len(), 1);
        assert!(svc.goals().is_ok());

        svc.clear(ClearScope::WorkoutSets).unwrap();
        let names: Vec<String> = svc
            .load_exercises()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Bench Press"]);
    }

    #[tokio::test]
    async fn test_search_foods_remembers_queries() {
        let svc = LiftfuelService::new_in_memory();
        let provider = MockProvider {
            foods: vec![yogurt()],
        };

        for q in ["yogurt", "oats", "yogurt", "rice", "eggs", "milk", "tofu"] {
            let outcome = svc.search_foods(&provider, q).await.unwrap();
            assert!(matches!(outcome, SearchOutcome::Found(_)));
        }
        assert_eq!(
            svc.recent_searches().unwrap(),
            vec!["tofu", "milk", "eggs", "rice", "yogurt"]
        );

        svc.clear_recent_searches().unwrap();
        assert!(svc.recent_searches().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_empty_and_failed() {
        let svc = LiftfuelService::new_in_memory();
        let empty = MockProvider { foods: vec![] };

        let outcome = svc.search_foods(&empty, "nothing").await.unwrap();
        assert!(matches!(outcome, SearchOutcome::NoResults));

        let outcome = svc.search_foods(&empty, "   ").await.unwrap();
        assert!(matches!(
            outcome,
            SearchOutcome::Failed(SearchError::EmptyQuery)
        ));

        let outcome = svc.search_foods(&DownProvider, "rice").await.unwrap();
        let SearchOutcome::Failed(err) = outcome else {
            panic!("expected failure");
        };
        assert!(err.is_retryable());
        assert!(svc.recent_searches().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_barcode_lookup() {
        let svc = LiftfuelService::new_in_memory();
        let cola = FoodRecord {
            fdc_id: 534_358,
            description: "COCA-COLA".to_string(),
            gtin_upc: Some("049000000443".to_string()),
            food_nutrients: vec![nutrient_by_name("Energy", 39.0)],
            ..FoodRecord::default()
        };
        let provider = MockProvider { foods: vec![cola] };

        let found = svc.barcode_lookup(&provider, "049000000443").await;
        assert!(matches!(found, SearchOutcome::Found(ref f) if f.len() == 1));

        let missing = svc.barcode_lookup(&provider, "000").await;
        assert!(matches!(missing, SearchOutcome::NoResults));

        let failed = svc.barcode_lookup(&DownProvider, "000").await;
        assert!(matches!(failed, SearchOutcome::Failed(SearchError::Status(500))));
    }
}
