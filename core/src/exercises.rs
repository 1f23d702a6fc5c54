use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::collection::Collection;
use crate::models::{DEFAULT_EXERCISE, Exercise, validate_exercise_name};
use crate::store::{EXERCISES_KEY, KeyValueStore};

pub struct ExerciseRepository {
    exercises: Collection<Exercise>,
}

/// Name order used for every exercise listing: case-insensitive, ties broken
/// by the raw name so the order is total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Drop exercises whose lowercase name was already seen, keeping the first.
#[must_use]
pub fn dedup_by_name(exercises: Vec<Exercise>) -> Vec<Exercise> {
    let mut seen = HashSet::new();
    exercises
        .into_iter()
        .filter(|e| seen.insert(e.name_key()))
        .collect()
}

impl ExerciseRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            exercises: Collection::new(store, EXERCISES_KEY),
        }
    }

    /// Load the exercise list, seeding the default exercise on first run and
    /// writing back a de-duplicated list when stored names collide. Returned
    /// sorted by name.
    pub fn load(&self) -> Result<Vec<Exercise>> {
        let mut list = self.exercises.load_with(|raw| match raw {
            None => {
                info!("No exercises stored, seeding '{DEFAULT_EXERCISE}'");
                (vec![Exercise::new(DEFAULT_EXERCISE)], true)
            }
            Some(loaded) => {
                let before = loaded.len();
                let unique = dedup_by_name(loaded);
                let removed = before - unique.len();
                if removed > 0 {
                    info!(removed, "Removed duplicate exercises");
                }
                (unique, removed > 0)
            }
        })?;
        list.sort_by(|a, b| compare_names(&a.name, &b.name));
        Ok(list)
    }

    /// Sorted view of the cached list without re-reading storage.
    pub fn list(&self) -> Result<Vec<Exercise>> {
        let mut list = self.exercises.items()?;
        list.sort_by(|a, b| compare_names(&a.name, &b.name));
        Ok(list)
    }

    pub fn get(&self, id: &str) -> Result<Option<Exercise>> {
        Ok(self.exercises.items()?.into_iter().find(|e| e.id == id))
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Exercise>> {
        let key = name.trim().to_lowercase();
        Ok(self
            .exercises
            .items()?
            .into_iter()
            .find(|e| e.name_key() == key))
    }

    /// Append one exercise per name. Blank names and names that already
    /// exist (case-insensitively, including earlier names in the same batch)
    /// are skipped. Returns the records actually created.
    pub fn add<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Exercise>> {
        self.exercises.update(|list| {
            let mut seen: HashSet<String> = list.iter().map(Exercise::name_key).collect();
            let mut created = Vec::new();
            for name in names {
                let Ok(name) = validate_exercise_name(name.as_ref()) else {
                    continue;
                };
                if !seen.insert(name.to_lowercase()) {
                    continue;
                }
                let exercise = Exercise::new(&name);
                list.push(exercise.clone());
                created.push(exercise);
            }
            let changed = !created.is_empty();
            Ok((created, changed))
        })
    }

    /// Set `lastUsed` on the first exercise with exactly this name.
    /// Returns false when no exercise matched.
    pub fn touch_last_used(&self, name: &str, when: DateTime<Utc>) -> Result<bool> {
        self.touch(|e| e.name == name, when)
    }

    pub fn touch_last_used_by_id(&self, id: &str, when: DateTime<Utc>) -> Result<bool> {
        self.touch(|e| e.id == id, when)
    }

    fn touch<P>(&self, matches: P, when: DateTime<Utc>) -> Result<bool>
    where
        P: Fn(&Exercise) -> bool,
    {
        self.exercises.update(|list| match list.iter_mut().find(|e| matches(e)) {
            Some(exercise) => {
                exercise.last_used = Some(when);
                Ok((true, true))
            }
            None => Ok((false, false)),
        })
    }

    /// Rename an exercise, refusing names another exercise already uses.
    pub fn rename(&self, id: &str, new_name: &str) -> Result<Exercise> {
        let new_name = validate_exercise_name(new_name)?;
        let key = new_name.to_lowercase();
        self.exercises.update(|list| {
            if list.iter().any(|e| e.id != id && e.name_key() == key) {
                bail!("An exercise named '{new_name}' already exists");
            }
            let Some(exercise) = list.iter_mut().find(|e| e.id == id) else {
                bail!("Exercise {id} not found");
            };
            exercise.name.clone_from(&new_name);
            Ok((exercise.clone(), true))
        })
    }

    /// Remove every exercise; the next `load` seeds the default again.
    pub fn clear(&self) -> Result<()> {
        self.exercises.clear()
    }

    pub(crate) fn invalidate(&self) -> Result<()> {
        self.exercises.invalidate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, save_json};
    use chrono::TimeZone;

    fn repo() -> (Arc<dyn KeyValueStore>, ExerciseRepository) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let repo = ExerciseRepository::new(store.clone());
        (store, repo)
    }

    fn names(list: &[Exercise]) -> Vec<&str> {
        list.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_load_seeds_default() {
        let (store, repo) = repo();
        let list = repo.load().unwrap();
        assert_eq!(names(&list), vec!["Bench Press"]);
        assert!(store.get(EXERCISES_KEY).unwrap().is_some());
    }

    #[test]
    fn test_load_dedups_and_sorts() {
        let (store, repo) = repo();
        let stored = vec![
            Exercise::new("squat"),
            Exercise::new("Bench Press"),
            Exercise::new("Squat"),
            Exercise::new("deadlift"),
        ];
        let first_squat_id = stored[0].id.clone();
        save_json(store.as_ref(), EXERCISES_KEY, &stored).unwrap();

        let list = repo.load().unwrap();
        assert_eq!(names(&list), vec!["Bench Press", "deadlift", "squat"]);
        assert_eq!(list[2].id, first_squat_id);

        // Storage was rewritten without the duplicate, in original order
        let persisted: Vec<Exercise> =
            crate::store::load_json(store.as_ref(), EXERCISES_KEY).unwrap().unwrap();
        assert_eq!(names(&persisted), vec!["squat", "Bench Press", "deadlift"]);
    }

    #[test]
    fn test_load_is_idempotent() {
        let (store, repo) = repo();
        let stored = vec![
            Exercise::new("Row"),
            Exercise::new("row"),
            Exercise::new("Curl"),
        ];
        save_json(store.as_ref(), EXERCISES_KEY, &stored).unwrap();

        let first = repo.load().unwrap();
        let second = repo.load().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_add_skips_case_insensitive_duplicates() {
        let (_, repo) = repo();
        repo.load().unwrap();

        let created = repo.add(&["Squat"]).unwrap();
        assert_eq!(created.len(), 1);
        let created = repo.add(&["squat", "  ", "SQUAT"]).unwrap();
        assert!(created.is_empty());

        let list = repo.load().unwrap();
        let squats = list.iter().filter(|e| e.name_key() == "squat").count();
        assert_eq!(squats, 1);
        assert!(list.iter().any(|e| e.name == "Squat"));
    }

    #[test]
    fn test_add_dedups_within_batch() {
        let (_, repo) = repo();
        let created = repo.add(&["Dips", "dips", "Pull-Up"]).unwrap();
        assert_eq!(names(&created), vec!["Dips", "Pull-Up"]);
        assert_ne!(created[0].id, created[1].id);
    }

    #[test]
    fn test_touch_last_used() {
        let (_, repo) = repo();
        repo.load().unwrap();
        let when = Utc.with_ymd_and_hms(2024, 6, 16, 15, 40, 0).unwrap();

        assert!(repo.touch_last_used("Bench Press", when).unwrap());
        assert!(!repo.touch_last_used("Nope", when).unwrap());

        let bench = repo.find_by_name("bench press").unwrap().unwrap();
        assert_eq!(bench.last_used, Some(when));
    }

    #[test]
    fn test_rename() {
        let (_, repo) = repo();
        let created = repo.add(&["Squat", "Deadlift"]).unwrap();

        let renamed = repo.rename(&created[0].id, "Back Squat").unwrap();
        assert_eq!(renamed.name, "Back Squat");
        assert!(repo.rename(&created[0].id, "deadlift").is_err());
        assert!(repo.rename("missing", "Anything").is_err());
        // Changing only the case of its own name is allowed
        assert!(repo.rename(&created[1].id, "DEADLIFT").is_ok());
    }

    #[test]
    fn test_clear_reseeds() {
        let (_, repo) = repo();
        repo.add(&["Squat"]).unwrap();
        repo.clear().unwrap();
        assert_eq!(names(&repo.load().unwrap()), vec!["Bench Press"]);
    }

    #[test]
    fn test_round_trip() {
        let (store, repo) = repo();
        repo.load().unwrap();
        repo.add(&["Leg Press", "Dips"]).unwrap();
        let before = repo.list().unwrap();

        let fresh = ExerciseRepository::new(store);
        assert_eq!(fresh.load().unwrap(), before);
    }
}
