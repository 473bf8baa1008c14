// src/command.rs
use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::input::{required_name, Note, Reps, Weight};
use crate::model::{Avatar, Document, LoggedSet, Profile, ProfileId, SetId};

/// Why a command was refused. The document is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("The {0} is required.")]
    MissingField(&'static str),
    #[error("The {0} name cannot be empty.")]
    EmptyName(&'static str),
    #[error("Invalid weight '{0}': expected a number such as 60 or 62.5.")]
    InvalidWeight(String),
    #[error("Weight '{0}' is out of range (0 to 1000).")]
    WeightOutOfRange(String),
    #[error("Weight '{0}' has more than two decimal places.")]
    TooManyDecimals(String),
    #[error("Invalid reps '{0}': expected a positive whole number.")]
    InvalidReps(String),
    #[error("Exercise '{0}' is not in the catalog; choose a category for it.")]
    MissingCategory(String),
    #[error("Category '{0}' already exists.")]
    DuplicateCategory(String),
    #[error("Exercise '{exercise}' already exists in '{category}'.")]
    DuplicateExercise { exercise: String, category: String },
    #[error("Exercise '{exercise}' already belongs to category '{category}'.")]
    ExerciseInOtherCategory { exercise: String, category: String },
    #[error("Cannot delete the last profile.")]
    LastProfile,
    #[error("No free id is left for a new {0}.")]
    IdsExhausted(&'static str),
}

/// A validated request to log one set. Built from raw form values with
/// [`NewLoggedSet::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoggedSet {
    pub name: String,
    /// Only consulted when `name` is not in the catalog yet.
    pub category: Option<String>,
    pub weight: Weight,
    pub reps: Reps,
    pub note: Note,
}

impl NewLoggedSet {
    /// # Errors
    /// Returns the first `Rejection` found among the fields.
    pub fn parse(
        name: &str,
        category: Option<&str>,
        weight: &str,
        reps: &str,
        note: &str,
    ) -> Result<Self, Rejection> {
        Ok(Self {
            name: required_name(name, "exercise")?,
            category: category
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            weight: Weight::parse(weight)?,
            reps: Reps::parse(reps)?,
            note: Note::sanitize(note),
        })
    }
}

/// Editable fields of a logged set. `None` leaves the field as it is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetPatch {
    pub weight: Option<Weight>,
    pub reps: Option<Reps>,
    pub note: Option<Note>,
}

impl SetPatch {
    /// # Errors
    /// Returns a `Rejection` if a provided weight or reps value is invalid.
    pub fn parse(
        weight: Option<&str>,
        reps: Option<&str>,
        note: Option<&str>,
    ) -> Result<Self, Rejection> {
        Ok(Self {
            weight: weight.map(Weight::parse).transpose()?,
            reps: reps.map(Reps::parse).transpose()?,
            note: note.map(Note::sanitize),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.weight.is_none() && self.reps.is_none() && self.note.is_none()
    }
}

/// Every mutation the application supports. Destructive commands assume the
/// caller already obtained confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SwitchProfile {
        id: ProfileId,
    },
    AddProfile {
        name: String,
        avatar: Option<Avatar>,
    },
    UpdateProfile {
        id: ProfileId,
        name: String,
        avatar: Avatar,
    },
    DeleteProfile {
        id: ProfileId,
    },
    AddLoggedSet(NewLoggedSet),
    UpdateLoggedSet {
        id: SetId,
        patch: SetPatch,
    },
    DeleteLoggedSet {
        id: SetId,
    },
    AddCategory {
        name: String,
    },
    AddExerciseToCategory {
        exercise: String,
        category: String,
    },
    RenameCategory {
        old: String,
        new: String,
    },
    DeleteCategory {
        name: String,
    },
    RenameExercise {
        category: String,
        old: String,
        new: String,
    },
    DeleteExercise {
        category: String,
        exercise: String,
    },
}

/// Result of a successful `apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing matched or nothing differed; the input document still stands.
    Unchanged,
    Changed {
        document: Document,
        /// Id of the profile or set the command created, if any.
        created: Option<i64>,
    },
}

/// Computes the document that results from `command`. The input is never
/// modified. New ids come from the instant `now` in epoch milliseconds;
/// logged sets are dated with the calendar day of `now` in its own offset.
/// Every category and exercise name is trimmed before it is looked up.
///
/// # Errors
/// Returns a `Rejection` when the command violates a document rule.
pub fn apply(
    document: &Document,
    command: Command,
    now: DateTime<FixedOffset>,
) -> Result<Transition, Rejection> {
    let mut next = document.clone();
    let now_millis = now.timestamp_millis();
    let mut created = None;

    let changed = match command {
        Command::SwitchProfile { id } => {
            if next.active_profile_id == id || next.profile(id).is_none() {
                false
            } else {
                next.active_profile_id = id;
                true
            }
        }
        Command::AddProfile { name, avatar } => {
            let name = required_name(&name, "profile")?;
            let id = next
                .next_profile_id(now_millis)
                .ok_or(Rejection::IdsExhausted("profile"))?;
            next.profiles
                .push(Profile::new(id, name, avatar.unwrap_or_default()));
            created = Some(id);
            true
        }
        Command::UpdateProfile { id, name, avatar } => {
            let name = required_name(&name, "profile")?;
            match next.profile_mut(id) {
                Some(p) if p.name != name || p.avatar != avatar => {
                    p.name = name;
                    p.avatar = avatar;
                    true
                }
                _ => false,
            }
        }
        Command::DeleteProfile { id } => {
            if next.profiles.len() <= 1 {
                return Err(Rejection::LastProfile);
            }
            match next.profiles.iter().position(|p| p.id == id) {
                Some(index) => {
                    next.profiles.remove(index);
                    if next.active_profile_id == id {
                        next.active_profile_id = next.profiles[0].id;
                    }
                    true
                }
                None => false,
            }
        }
        Command::AddLoggedSet(entry) => {
            let category = resolve_category(&mut next, &entry)?;
            let id = next
                .next_set_id(now_millis)
                .ok_or(Rejection::IdsExhausted("set"))?;
            let set = LoggedSet {
                id,
                name: entry.name,
                category,
                weight: entry.weight.to_string(),
                reps: entry.reps.to_string(),
                note: entry.note.into_string(),
                date: now.date_naive(),
            };
            match next.active_profile_mut() {
                Some(profile) => {
                    profile.exercises.insert(0, set);
                    created = Some(id);
                    true
                }
                None => false,
            }
        }
        Command::UpdateLoggedSet { id, patch } => next
            .active_profile_mut()
            .and_then(|p| p.exercises.iter_mut().find(|s| s.id == id))
            .is_some_and(|set| patch_set(set, patch)),
        Command::DeleteLoggedSet { id } => next.active_profile_mut().is_some_and(|p| {
            let before = p.exercises.len();
            p.exercises.retain(|s| s.id != id);
            p.exercises.len() != before
        }),
        Command::AddCategory { name } => {
            let name = required_name(&name, "category")?;
            next.exercise_categories.insert_category(name)
        }
        Command::AddExerciseToCategory { exercise, category } => {
            let exercise = required_name(&exercise, "exercise")?;
            let category = category.trim();
            let catalog = &next.exercise_categories;
            match catalog.exercises(category) {
                None => false,
                Some(list) if list.contains(&exercise) => false,
                Some(_) => {
                    if let Some(owner) = catalog.category_of(&exercise) {
                        return Err(Rejection::ExerciseInOtherCategory {
                            exercise,
                            category: owner.to_string(),
                        });
                    }
                    next.exercise_categories.push_exercise(category, exercise)
                }
            }
        }
        Command::RenameCategory { old, new } => {
            let new = required_name(&new, "category")?;
            let old = old.trim();
            let catalog = &next.exercise_categories;
            if !catalog.contains_category(old) {
                false
            } else if new == old || catalog.contains_category(&new) {
                return Err(Rejection::DuplicateCategory(new));
            } else {
                next.exercise_categories.rename_category(old, new)
            }
        }
        Command::DeleteCategory { name } => next.exercise_categories.remove_category(name.trim()),
        Command::RenameExercise { category, old, new } => {
            let new = required_name(&new, "exercise")?;
            let category = category.trim().to_string();
            let old = old.trim();
            let catalog = &next.exercise_categories;
            match catalog.exercises(&category) {
                Some(list) if list.iter().any(|e| e == old) => {
                    if list.contains(&new) {
                        return Err(Rejection::DuplicateExercise {
                            exercise: new,
                            category,
                        });
                    }
                    if let Some(owner) = catalog.category_of(&new) {
                        return Err(Rejection::ExerciseInOtherCategory {
                            exercise: new,
                            category: owner.to_string(),
                        });
                    }
                    next.exercise_categories.rename_exercise(&category, old, new)
                }
                _ => false,
            }
        }
        Command::DeleteExercise { category, exercise } => next
            .exercise_categories
            .remove_exercise(category.trim(), exercise.trim()),
    };

    Ok(if changed {
        Transition::Changed {
            document: next,
            created,
        }
    } else {
        Transition::Unchanged
    })
}

/// Catalogued exercises keep their catalog category. New ones need an explicit
/// category, which is created on demand before the exercise is added to it.
fn resolve_category(document: &mut Document, entry: &NewLoggedSet) -> Result<String, Rejection> {
    let catalog = &mut document.exercise_categories;
    if let Some(category) = catalog.category_of(&entry.name) {
        return Ok(category.to_string());
    }
    let category = entry
        .category
        .clone()
        .ok_or_else(|| Rejection::MissingCategory(entry.name.clone()))?;
    catalog.insert_category(category.clone());
    catalog.push_exercise(&category, entry.name.clone());
    Ok(category)
}

fn patch_set(set: &mut LoggedSet, patch: SetPatch) -> bool {
    let before = set.clone();
    if let Some(weight) = patch.weight {
        set.weight = weight.to_string();
    }
    if let Some(reps) = patch.reps {
        set.reps = reps.to_string();
    }
    if let Some(note) = patch.note {
        set.note = note.into_string();
    }
    *set != before
}
