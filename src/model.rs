// src/model.rs
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use strum_macros::{Display, EnumString};

pub type ProfileId = i64;
pub type SetId = i64;

const DEFAULT_PROFILE_ID: ProfileId = 1;
const DEFAULT_PROFILE_NAME: &str = "User 1";

/// Built-in categories seeded into every new document.
const BUILTIN_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Chest",
        &["Bench Press", "Dumbbell Press", "Incline Bench Press", "Push-ups", "Dips"],
    ),
    ("Back", &["Pull-ups", "Deadlift", "Bent-over Row", "Lat Pulldown"]),
    ("Legs", &["Squat", "Leg Press", "Lunges", "Calf Raises"]),
    (
        "Shoulders",
        &["Overhead Press", "Lateral Raises", "Front Raises", "Shrugs"],
    ),
    (
        "Arms",
        &["Bicep Curls", "Tricep Extensions", "Hammer Curls", "Skull Crushers"],
    ),
    ("Core", &["Plank", "Crunches", "Leg Raises", "Russian Twists"]),
];

/// The fixed set of profile pictures. Unknown values read from storage
/// collapse to the default instead of failing the whole document.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(from = "String", into = "String")]
pub enum Avatar {
    #[default]
    Lifter,
    Runner,
    Cyclist,
    Swimmer,
    Boxer,
    Climber,
}

impl From<String> for Avatar {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl From<Avatar> for String {
    fn from(value: Avatar) -> Self {
        value.to_string()
    }
}

/// One recorded set. `category` is a snapshot taken when the set was logged,
/// not a reference into the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedSet {
    pub id: SetId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub weight: String,
    pub reps: String,
    #[serde(default)]
    pub note: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    #[serde(default)]
    pub avatar: Avatar,
    #[serde(default)]
    pub exercises: Vec<LoggedSet>, // Most recent first
}

impl Profile {
    pub fn new(id: ProfileId, name: impl Into<String>, avatar: Avatar) -> Self {
        Self {
            id,
            name: name.into(),
            avatar,
            exercises: Vec::new(),
        }
    }

    pub fn find_set(&self, id: SetId) -> Option<&LoggedSet> {
        self.exercises.iter().find(|s| s.id == id)
    }
}

/// Category name -> exercise names, both in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(IndexMap<String, Vec<String>>);

// `IndexMap` equality ignores order; two catalogs listing the same categories
// in a different order are different catalogs.
impl PartialEq for Catalog {
    fn eq(&self, other: &Self) -> bool {
        self.0.iter().eq(other.0.iter())
    }
}

impl Eq for Catalog {}

impl Catalog {
    pub fn builtin() -> Self {
        Self(
            BUILTIN_CATEGORIES
                .iter()
                .map(|(category, exercises)| {
                    (
                        (*category).to_string(),
                        exercises.iter().map(|e| (*e).to_string()).collect(),
                    )
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.0.contains_key(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn exercises(&self, category: &str) -> Option<&[String]> {
        self.0.get(category).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// First category, in catalog order, that lists `exercise`.
    pub fn category_of(&self, exercise: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, exercises)| exercises.iter().any(|e| e == exercise))
            .map(|(category, _)| category.as_str())
    }

    pub(crate) fn insert_category(&mut self, category: String) -> bool {
        if self.0.contains_key(&category) {
            return false;
        }
        self.0.insert(category, Vec::new());
        true
    }

    pub(crate) fn push_exercise(&mut self, category: &str, exercise: String) -> bool {
        match self.0.get_mut(category) {
            Some(list) if !list.contains(&exercise) => {
                list.push(exercise);
                true
            }
            _ => false,
        }
    }

    /// Moves the exercise list to `new`, keeping the category's position.
    pub(crate) fn rename_category(&mut self, old: &str, new: String) -> bool {
        if self.0.contains_key(&new) {
            return false;
        }
        let Some((index, _, exercises)) = self.0.shift_remove_full(old) else {
            return false;
        };
        let (last, _) = self.0.insert_full(new, exercises);
        self.0.move_index(last, index);
        true
    }

    pub(crate) fn remove_category(&mut self, category: &str) -> bool {
        self.0.shift_remove(category).is_some()
    }

    pub(crate) fn rename_exercise(&mut self, category: &str, old: &str, new: String) -> bool {
        let Some(list) = self.0.get_mut(category) else {
            return false;
        };
        if list.contains(&new) {
            return false;
        }
        match list.iter_mut().find(|e| e.as_str() == old) {
            Some(slot) => {
                *slot = new;
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_exercise(&mut self, category: &str, exercise: &str) -> bool {
        let Some(list) = self.0.get_mut(category) else {
            return false;
        };
        let before = list.len();
        list.retain(|e| e != exercise);
        list.len() != before
    }
}

/// The whole persisted application state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub profiles: Vec<Profile>,
    #[serde(default = "Catalog::builtin")]
    pub exercise_categories: Catalog,
    pub active_profile_id: ProfileId,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            profiles: vec![Profile::new(
                DEFAULT_PROFILE_ID,
                DEFAULT_PROFILE_NAME,
                Avatar::default(),
            )],
            exercise_categories: Catalog::builtin(),
            active_profile_id: DEFAULT_PROFILE_ID,
        }
    }
}

impl Document {
    pub fn profile(&self, id: ProfileId) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub(crate) fn profile_mut(&mut self, id: ProfileId) -> Option<&mut Profile> {
        self.profiles.iter_mut().find(|p| p.id == id)
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        self.profile(self.active_profile_id)
    }

    pub(crate) fn active_profile_mut(&mut self) -> Option<&mut Profile> {
        let id = self.active_profile_id;
        self.profile_mut(id)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.exercise_categories
    }

    pub(crate) fn next_profile_id(&self, now_millis: i64) -> Option<ProfileId> {
        next_id(now_millis, self.profiles.iter().map(|p| p.id))
    }

    pub(crate) fn next_set_id(&self, now_millis: i64) -> Option<SetId> {
        next_id(
            now_millis,
            self.profiles
                .iter()
                .flat_map(|p| p.exercises.iter().map(|s| s.id)),
        )
    }

    /// Restores the profile invariants on a document read from storage.
    /// Returns a description of each repair made.
    pub fn repair(&mut self) -> Vec<String> {
        let mut repairs = Vec::new();
        if self.profiles.is_empty() {
            let catalog = std::mem::take(&mut self.exercise_categories);
            *self = Self {
                exercise_categories: catalog,
                ..Self::default()
            };
            repairs.push("document had no profiles; default profile created".to_string());
            return repairs;
        }
        if self.active_profile().is_none() {
            let fallback = self.profiles[0].id;
            repairs.push(format!(
                "active profile {} does not exist; switched to {}",
                self.active_profile_id, fallback
            ));
            self.active_profile_id = fallback;
        }
        let profile_ids = self.profiles.iter_mut().map(|p| &mut p.id).collect();
        dedupe_ids(profile_ids, "profile", &mut repairs);
        let set_ids = self
            .profiles
            .iter_mut()
            .flat_map(|p| p.exercises.iter_mut().map(|s| &mut s.id))
            .collect();
        dedupe_ids(set_ids, "set", &mut repairs);
        repairs
    }
}

/// Gives every repeated id after its first occurrence a fresh one.
fn dedupe_ids(ids: Vec<&mut i64>, kind: &str, repairs: &mut Vec<String>) {
    let mut in_use: BTreeSet<i64> = ids.iter().map(|id| **id).collect();
    let mut seen = BTreeSet::new();
    for id in ids {
        if seen.insert(*id) {
            continue;
        }
        let Some(fresh) = next_id(0, in_use.iter().copied()) else {
            continue;
        };
        repairs.push(format!("duplicate {kind} id {}; renumbered to {fresh}", *id));
        *id = fresh;
        seen.insert(fresh);
        in_use.insert(fresh);
    }
}

/// Timestamp-derived ids, bumped past every id in use so they stay unique.
/// Once the largest id in use is `i64::MAX` the lowest free id at or after
/// `now_millis` is taken instead; `None` only if every such id is used.
fn next_id(now_millis: i64, used: impl Iterator<Item = i64>) -> Option<i64> {
    let used: BTreeSet<i64> = used.collect();
    match used.last() {
        Some(&max) if max >= now_millis => max
            .checked_add(1)
            .or_else(|| (now_millis..=i64::MAX).find(|id| !used.contains(id))),
        _ => Some(now_millis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_document_is_well_formed() {
        let doc = Document::default();
        assert_eq!(doc.profiles.len(), 1);
        assert_eq!(doc.active_profile().map(|p| p.name.as_str()), Some("User 1"));
        assert_eq!(
            doc.catalog().categories().collect::<Vec<_>>(),
            vec!["Chest", "Back", "Legs", "Shoulders", "Arms", "Core"]
        );
    }

    #[test]
    fn next_id_skips_past_collisions() {
        assert_eq!(next_id(100, [1, 2, 3].into_iter()), Some(100));
        assert_eq!(next_id(100, [100].into_iter()), Some(101));
        assert_eq!(next_id(100, [250, 7].into_iter()), Some(251));
        assert_eq!(next_id(5, std::iter::empty()), Some(5));
    }

    #[test]
    fn next_id_does_not_overflow_at_the_top_of_the_range() {
        assert_eq!(next_id(100, [i64::MAX].into_iter()), Some(100));
        assert_eq!(next_id(100, [100, 101, i64::MAX].into_iter()), Some(102));
        assert_eq!(next_id(i64::MAX, [i64::MAX].into_iter()), None);
    }

    #[test]
    fn catalogs_in_a_different_order_are_not_equal() {
        let mut reordered = Catalog::default();
        for category in ["Back", "Chest"] {
            reordered.insert_category(category.to_string());
        }
        let mut ordered = Catalog::default();
        for category in ["Chest", "Back"] {
            ordered.insert_category(category.to_string());
        }
        assert_ne!(ordered, reordered);
        assert_eq!(ordered, ordered.clone());
    }

    #[test]
    fn repair_renumbers_duplicate_ids() {
        let set = |id| LoggedSet {
            id,
            name: "Squat".into(),
            category: "Legs".into(),
            weight: "100".into(),
            reps: "5".into(),
            note: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
        };
        let mut first = Profile::new(1, "User 1", Avatar::Lifter);
        first.exercises = vec![set(10), set(10)];
        let mut second = Profile::new(1, "Copy", Avatar::Runner);
        second.exercises = vec![set(10)];
        let mut doc = Document {
            profiles: vec![first, second],
            exercise_categories: Catalog::builtin(),
            active_profile_id: 1,
        };

        let repairs = doc.repair();
        assert_eq!(repairs.len(), 3);
        assert_eq!(doc.profiles[0].id, 1);
        assert_eq!(doc.profiles[1].id, 2);
        let set_ids: Vec<_> = doc
            .profiles
            .iter()
            .flat_map(|p| p.exercises.iter().map(|s| s.id))
            .collect();
        assert_eq!(set_ids, vec![10, 11, 12]);
        assert_eq!(doc.active_profile().map(|p| p.name.as_str()), Some("User 1"));
    }

    #[test]
    fn unknown_avatar_falls_back_to_default() {
        assert_eq!(Avatar::from("runner".to_string()), Avatar::Runner);
        assert_eq!(Avatar::from("Cyclist".to_string()), Avatar::Cyclist);
        assert_eq!(Avatar::from("/img/avatar3.png".to_string()), Avatar::Lifter);
    }

    #[test]
    fn rename_category_keeps_position() {
        let mut catalog = Catalog::builtin();
        assert!(catalog.rename_category("Legs", "Lower Body".to_string()));
        assert_eq!(
            catalog.categories().collect::<Vec<_>>(),
            vec!["Chest", "Back", "Lower Body", "Shoulders", "Arms", "Core"]
        );
        assert_eq!(catalog.exercises("Lower Body").map(<[String]>::len), Some(4));
        assert!(!catalog.rename_category("Legs", "Again".to_string()));
        assert!(!catalog.rename_category("Chest", "Back".to_string()));
    }

    #[test]
    fn category_of_returns_first_match_in_catalog_order() {
        let mut catalog = Catalog::builtin();
        catalog.push_exercise("Core", "Squat".to_string());
        assert_eq!(catalog.category_of("Squat"), Some("Legs"));
        assert_eq!(catalog.category_of("Rowing"), None);
    }

    #[test]
    fn repair_fixes_dangling_active_profile() {
        let mut doc = Document::default();
        doc.profiles.push(Profile::new(42, "Second", Avatar::Boxer));
        doc.active_profile_id = 999;
        let repairs = doc.repair();
        assert_eq!(repairs.len(), 1);
        assert_eq!(doc.active_profile_id, 1);
    }

    #[test]
    fn repair_replaces_empty_profile_list_but_keeps_catalog() {
        let mut doc = Document {
            profiles: Vec::new(),
            exercise_categories: Catalog::default(),
            active_profile_id: 7,
        };
        doc.exercise_categories.insert_category("Cardio".to_string());
        doc.repair();
        assert_eq!(doc.profiles.len(), 1);
        assert_eq!(doc.active_profile_id, 1);
        assert_eq!(doc.catalog().categories().collect::<Vec<_>>(), vec!["Cardio"]);
    }
}
