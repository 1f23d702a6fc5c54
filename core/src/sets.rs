use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use tracing::info;

use crate::collection::Collection;
use crate::models::{
    DayGroup, Exercise, SetRow, SortOrder, WorkoutSet, new_id, validate_weight,
};
use crate::store::{KeyValueStore, WORKOUT_SETS_KEY};

/// Identical sets recorded closer together than this are treated as a
/// probable double submit.
pub const DUPLICATE_WINDOW_SECS: i64 = 5 * 60;

/// The most recent set with the same exercise, reps, and weight as
/// `candidate` recorded within the duplicate window before `now`.
#[must_use]
pub fn find_recent_duplicate<'a>(
    existing: &'a [WorkoutSet],
    candidate: &WorkoutSet,
    now: DateTime<Utc>,
) -> Option<&'a WorkoutSet> {
    let window = TimeDelta::zero()..=TimeDelta::seconds(DUPLICATE_WINDOW_SECS);
    existing
        .iter()
        .filter(|s| s.id != candidate.id && s.same_effort(candidate))
        .filter(|s| window.contains(&now.signed_duration_since(s.date)))
        .max_by_key(|s| s.date)
}

#[must_use]
pub fn duplicate_check(existing: &[WorkoutSet], candidate: &WorkoutSet, now: DateTime<Utc>) -> bool {
    find_recent_duplicate(existing, candidate, now).is_some()
}

pub fn sort_sets(sets: &mut [WorkoutSet], order: SortOrder) {
    match order {
        SortOrder::Ascending => sets.sort_by_key(|s| s.date),
        SortOrder::Descending => sets.sort_by(|a, b| b.date.cmp(&a.date)),
    }
}

fn set_row<Tz>(set: &WorkoutSet, tz: &Tz) -> SetRow
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    SetRow {
        time: set.date.with_timezone(tz).format("%-I:%M %p").to_string(),
        set: set.clone(),
    }
}

fn group_by<Tz, K, F>(sets: &[WorkoutSet], tz: &Tz, key_of: F) -> Vec<DayGroup>
where
    Tz: TimeZone,
    Tz::Offset: Display,
    K: Eq + std::hash::Hash,
    F: Fn(&DateTime<Tz>) -> (K, String),
{
    let mut groups: Vec<DayGroup> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();
    for set in sets {
        let local = set.date.with_timezone(tz);
        let (key, label) = key_of(&local);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(DayGroup {
                label,
                sets: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].sets.push(set_row(set, tz));
    }
    groups
}

/// Bucket sets under their uppercase weekday name ("SUNDAY") in `tz`.
///
/// The key is the weekday alone, so sets from the same weekday of different
/// weeks land in one bucket. Use [`group_by_date`] for per-date headers.
/// Groups keep the order in which their first set appears.
pub fn group_by_weekday<Tz>(sets: &[WorkoutSet], tz: &Tz) -> Vec<DayGroup>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    group_by(sets, tz, |local| {
        let label = local.format("%A").to_string().to_uppercase();
        (label.clone(), label)
    })
}

/// Bucket sets by local calendar date, labelled like "SUNDAY, JUN 16".
pub fn group_by_date<Tz>(sets: &[WorkoutSet], tz: &Tz) -> Vec<DayGroup>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    group_by(sets, tz, |local| {
        let date: NaiveDate = local.date_naive();
        let label = local.format("%A, %b %-d").to_string().to_uppercase();
        (date, label)
    })
}

/// Fill in `exercise_id` on sets written before sets carried one, matching
/// the stored name exactly first and case-insensitively second. Returns how
/// many sets were updated.
pub fn assign_exercise_ids(sets: &mut [WorkoutSet], exercises: &[Exercise]) -> usize {
    let mut updated = 0;
    for set in sets.iter_mut().filter(|s| s.exercise_id.is_none()) {
        let owner = exercises
            .iter()
            .find(|e| e.name == set.exercise)
            .or_else(|| {
                let key = set.exercise.to_lowercase();
                exercises.iter().find(|e| e.name_key() == key)
            });
        if let Some(owner) = owner {
            set.exercise_id = Some(owner.id.clone());
            updated += 1;
        }
    }
    updated
}

pub struct WorkoutSetRepository {
    sets: Collection<WorkoutSet>,
}

impl WorkoutSetRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            sets: Collection::new(store, WORKOUT_SETS_KEY),
        }
    }

    /// Re-read all sets, linking legacy records to `exercises` by name and
    /// writing the result back when anything was linked.
    pub fn load(&self, exercises: &[Exercise]) -> Result<Vec<WorkoutSet>> {
        self.sets.load_with(|raw| {
            let mut sets = raw.unwrap_or_default();
            let linked = assign_exercise_ids(&mut sets, exercises);
            if linked > 0 {
                info!(linked, "Linked legacy sets to exercise ids");
            }
            (sets, linked > 0)
        })
    }

    pub fn all(&self) -> Result<Vec<WorkoutSet>> {
        self.sets.items()
    }

    /// Build the set that `add` would record, without persisting it.
    pub fn draft(
        exercise: &Exercise,
        reps: u32,
        weight: f64,
        at: DateTime<Utc>,
    ) -> Result<WorkoutSet> {
        validate_weight(weight)?;
        Ok(WorkoutSet {
            id: new_id(),
            exercise_id: Some(exercise.id.clone()),
            exercise: exercise.name.clone(),
            reps,
            weight,
            date: at,
        })
    }

    pub fn add(
        &self,
        exercise: &Exercise,
        reps: u32,
        weight: f64,
        at: DateTime<Utc>,
    ) -> Result<WorkoutSet> {
        let set = Self::draft(exercise, reps, weight, at)?;
        self.insert(set)
    }

    pub fn insert(&self, set: WorkoutSet) -> Result<WorkoutSet> {
        validate_weight(set.weight)?;
        self.sets.update(|sets| {
            sets.push(set.clone());
            Ok((set, true))
        })
    }

    pub fn recent_duplicate(
        &self,
        candidate: &WorkoutSet,
        now: DateTime<Utc>,
    ) -> Result<Option<WorkoutSet>> {
        let sets = self.sets.items()?;
        Ok(find_recent_duplicate(&sets, candidate, now).cloned())
    }

    pub fn list_for_exercise(
        &self,
        exercise: &Exercise,
        order: SortOrder,
    ) -> Result<Vec<WorkoutSet>> {
        let mut sets: Vec<WorkoutSet> = self
            .sets
            .items()?
            .into_iter()
            .filter(|s| s.belongs_to(exercise))
            .collect();
        sort_sets(&mut sets, order);
        Ok(sets)
    }

    /// Remove a set by id, returning it when it existed.
    pub fn delete(&self, id: &str) -> Result<Option<WorkoutSet>> {
        self.sets.update(|sets| match sets.iter().position(|s| s.id == id) {
            Some(pos) => Ok((Some(sets.remove(pos)), true)),
            None => Ok((None, false)),
        })
    }

    /// Rewrite the display name on every set owned by `exercise_id`.
    pub fn rename_exercise(&self, exercise_id: &str, new_name: &str) -> Result<usize> {
        self.sets.update(|sets| {
            let mut renamed = 0;
            for set in sets
                .iter_mut()
                .filter(|s| s.exercise_id.as_deref() == Some(exercise_id))
            {
                set.exercise = new_name.to_string();
                renamed += 1;
            }
            Ok((renamed, renamed > 0))
        })
    }

    pub fn clear(&self) -> Result<()> {
        self.sets.clear()
    }

    pub(crate) fn invalidate(&self) -> Result<()> {
        self.sets.invalidate()
    }
}
