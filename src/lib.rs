// src/lib.rs
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

// --- Declare modules ---
pub mod command;
mod config;
pub mod input;
pub mod model;
pub mod report;
pub mod store;

// --- Expose public types ---
pub use command::{apply, Command, NewLoggedSet, Rejection, SetPatch, Transition};
pub use config::{
    get_config_path as get_config_path_util, load as load_config_util, parse_color,
    save as save_config_util, Config, Error as ConfigError, StandardColor, Theme,
};
pub use input::{Note, Reps, Weight};
pub use model::{Avatar, Catalog, Document, LoggedSet, Profile, ProfileId, SetId};
pub use report::{group_sets, Bucket, ExerciseGroup, NumberedSet, View};
pub use store::{Error as StoreError, JsonFileStore, MemoryStore, Store, STORAGE_KEY};

/// What a dispatched command did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A profile or set was created with this id.
    Created(i64),
    Changed,
    /// Nothing matched, or the document already looked like that.
    Unchanged,
}

/// Holds the current document and writes it back after every change.
pub struct AppService {
    pub config: Config,
    pub config_path: PathBuf,
    document: Document,
    store: Box<dyn Store>,
    save_failure: Option<StoreError>,
}

impl AppService {
    /// Initializes the application service.
    /// # Errors
    /// Returns `anyhow::Error` if config/data path determination, loading, or initialization fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;

        let data_path = match &config.data_file {
            Some(path) => path.clone(),
            None => store::get_data_path().context("Failed to determine data file path")?,
        };
        let store = JsonFileStore::new(data_path);

        Self::with_store(config, Box::new(store), config_path)
    }

    /// Builds a service over an arbitrary store, loading its document.
    /// # Errors
    /// Returns `anyhow::Error` if the stored record exists but cannot be read.
    pub fn with_store(config: Config, mut store: Box<dyn Store>, config_path: PathBuf) -> Result<Self> {
        let document = store::load_document(store.as_mut())
            .with_context(|| format!("Failed to read document from {}", store.location()))?;
        Ok(Self {
            config,
            config_path,
            document,
            store,
            save_failure: None,
        })
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    /// Where the document is persisted.
    pub fn data_location(&self) -> String {
        self.store.location()
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save(&self.config_path, &self.config)
    }

    /// Sets the view used when none is requested.
    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_default_view(&mut self, view: View) -> Result<(), ConfigError> {
        self.config.default_view = view;
        self.save_config()
    }

    // --- Dispatch ---

    /// Applies `command` to the current document using the system clock in the
    /// local time zone.
    /// # Errors
    /// Returns the `Rejection` if the command is refused; the document is unchanged.
    pub fn dispatch(&mut self, command: Command) -> Result<Outcome, Rejection> {
        self.dispatch_at(command, Local::now().fixed_offset())
    }

    /// Applies `command` as if issued at `now`.
    /// A failed write is logged and kept for `take_save_failure`; the new
    /// document stays in effect either way.
    /// # Errors
    /// Returns the `Rejection` if the command is refused; the document is unchanged.
    pub fn dispatch_at(
        &mut self,
        command: Command,
        now: DateTime<FixedOffset>,
    ) -> Result<Outcome, Rejection> {
        debug!(?command, "dispatching");
        match apply(&self.document, command, now)? {
            Transition::Unchanged => Ok(Outcome::Unchanged),
            Transition::Changed { document, created } => {
                self.document = document;
                self.persist();
                Ok(created.map_or(Outcome::Changed, Outcome::Created))
            }
        }
    }

    fn persist(&mut self) {
        match store::save_document(self.store.as_mut(), &self.document) {
            Ok(()) => info!("saved document to {}", self.store.location()),
            Err(e) => {
                error!("failed to save document to {}: {e}", self.store.location());
                self.save_failure = Some(e);
            }
        }
    }

    /// The most recent write failure since the last call, if any.
    pub fn take_save_failure(&mut self) -> Option<StoreError> {
        self.save_failure.take()
    }

    // --- Profiles ---

    /// Makes `id` the active profile. Unknown ids leave the document as is.
    /// # Errors
    /// Never rejects; the `Result` mirrors `dispatch`.
    pub fn switch_profile(&mut self, id: ProfileId) -> Result<Outcome, Rejection> {
        self.dispatch(Command::SwitchProfile { id })
    }

    /// Adds a profile and returns its id.
    /// # Errors
    /// `Rejection::EmptyName` if `name` is blank.
    pub fn add_profile(&mut self, name: &str, avatar: Option<Avatar>) -> Result<Outcome, Rejection> {
        self.dispatch(Command::AddProfile {
            name: name.to_string(),
            avatar,
        })
    }

    /// Renames and/or re-pictures a profile; omitted values are kept.
    /// # Errors
    /// `Rejection::EmptyName` if a blank name is given.
    pub fn update_profile(
        &mut self,
        id: ProfileId,
        name: Option<&str>,
        avatar: Option<Avatar>,
    ) -> Result<Outcome, Rejection> {
        let Some(current) = self.document.profile(id) else {
            return Ok(Outcome::Unchanged);
        };
        let command = Command::UpdateProfile {
            id,
            name: name.map_or_else(|| current.name.clone(), str::to_string),
            avatar: avatar.unwrap_or(current.avatar),
        };
        self.dispatch(command)
    }

    /// # Errors
    /// `Rejection::LastProfile` if only one profile is left.
    pub fn delete_profile(&mut self, id: ProfileId) -> Result<Outcome, Rejection> {
        self.dispatch(Command::DeleteProfile { id })
    }

    // --- Logged sets ---

    /// Validates raw form values and logs a set on the active profile.
    /// # Errors
    /// Returns a `Rejection` for invalid input or a new exercise without a category.
    pub fn add_logged_set(
        &mut self,
        exercise: &str,
        category: Option<&str>,
        weight: &str,
        reps: &str,
        note: &str,
    ) -> Result<Outcome, Rejection> {
        let entry = NewLoggedSet::parse(exercise, category, weight, reps, note)?;
        self.dispatch(Command::AddLoggedSet(entry))
    }

    /// Edits weight, reps and/or note of a set on the active profile.
    /// # Errors
    /// Returns a `Rejection` for invalid weight or reps.
    pub fn update_logged_set(
        &mut self,
        id: SetId,
        weight: Option<&str>,
        reps: Option<&str>,
        note: Option<&str>,
    ) -> Result<Outcome, Rejection> {
        let patch = SetPatch::parse(weight, reps, note)?;
        self.dispatch(Command::UpdateLoggedSet { id, patch })
    }

    /// # Errors
    /// Never rejects; the `Result` mirrors `dispatch`.
    pub fn delete_logged_set(&mut self, id: SetId) -> Result<Outcome, Rejection> {
        self.dispatch(Command::DeleteLoggedSet { id })
    }

    // --- Catalog ---

    /// # Errors
    /// `Rejection::EmptyName` if `name` is blank.
    pub fn add_category(&mut self, name: &str) -> Result<Outcome, Rejection> {
        self.dispatch(Command::AddCategory {
            name: name.to_string(),
        })
    }

    /// # Errors
    /// Returns a `Rejection` if the name is blank or used by another category.
    pub fn add_exercise_to_category(&mut self, exercise: &str, category: &str) -> Result<Outcome, Rejection> {
        self.dispatch(Command::AddExerciseToCategory {
            exercise: exercise.to_string(),
            category: category.to_string(),
        })
    }

    /// # Errors
    /// `Rejection::DuplicateCategory` if `new` exists or equals `old`.
    pub fn rename_category(&mut self, old: &str, new: &str) -> Result<Outcome, Rejection> {
        self.dispatch(Command::RenameCategory {
            old: old.to_string(),
            new: new.to_string(),
        })
    }

    /// # Errors
    /// Never rejects; the `Result` mirrors `dispatch`.
    pub fn delete_category(&mut self, name: &str) -> Result<Outcome, Rejection> {
        self.dispatch(Command::DeleteCategory {
            name: name.to_string(),
        })
    }

    /// # Errors
    /// Returns a `Rejection` if `new` is blank or already in the catalog.
    pub fn rename_exercise(&mut self, category: &str, old: &str, new: &str) -> Result<Outcome, Rejection> {
        self.dispatch(Command::RenameExercise {
            category: category.to_string(),
            old: old.to_string(),
            new: new.to_string(),
        })
    }

    /// # Errors
    /// Never rejects; the `Result` mirrors `dispatch`.
    pub fn delete_exercise(&mut self, category: &str, exercise: &str) -> Result<Outcome, Rejection> {
        self.dispatch(Command::DeleteExercise {
            category: category.to_string(),
            exercise: exercise.to_string(),
        })
    }

    // --- Queries ---

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.document.profiles
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        self.document.active_profile()
    }

    pub fn catalog(&self) -> &Catalog {
        self.document.catalog()
    }

    /// Looks up a set on the active profile.
    pub fn find_set(&self, id: SetId) -> Option<&LoggedSet> {
        self.active_profile().and_then(|p| p.find_set(id))
    }

    /// The active profile's history grouped by `view`, or by the configured
    /// default view.
    pub fn grouped_history(&self, view: Option<View>) -> Vec<Bucket<'_>> {
        let view = view.unwrap_or(self.config.default_view);
        self.active_profile()
            .map(|p| group_sets(&p.exercises, view))
            .unwrap_or_default()
    }
}
