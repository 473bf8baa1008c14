// src/store.rs
use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::de::IgnoredAny;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::model::Document;

/// Name the document is stored under; also the file stem on disk.
pub const STORAGE_KEY: &str = "gymTrackerData";
const APP_DATA_DIR: &str = "gym-tracker";
const CATALOG_FIELD: &str = "exerciseCategories";
const SET_ASIDE_EXTENSION: &str = "json.bad";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing document file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to (de)serialize document (JSON): {0}")]
    Json(#[from] serde_json::Error),
    #[error("Document store rejected the write: {0}")]
    WriteRefused(String),
}

/// A single slot holding the serialized document.
pub trait Store {
    /// Returns `Ok(None)` when nothing has been stored yet.
    ///
    /// # Errors
    /// Returns `Error` when the slot exists but cannot be read.
    fn read(&self) -> Result<Option<String>, Error>;

    /// # Errors
    /// Returns `Error` when the contents cannot be written.
    fn write(&mut self, contents: &str) -> Result<(), Error>;

    /// Human-readable location, for messages.
    fn location(&self) -> String;

    /// Moves an unreadable record out of the way so the next write cannot
    /// replace it. Returns where it went, or `None` if the store keeps no copy.
    ///
    /// # Errors
    /// Returns `Error` when the record exists but cannot be moved.
    fn set_aside(&mut self) -> Result<Option<String>, Error> {
        Ok(None)
    }
}

/// Gets the default path of the document file within the app's data directory.
///
/// # Errors
/// Returns `Error::DataDir` if the platform has no data directory.
pub fn get_data_path() -> Result<PathBuf, Error> {
    let data_dir = dirs::data_dir().ok_or(Error::DataDir)?;
    Ok(data_dir
        .join(APP_DATA_DIR)
        .join(format!("{STORAGE_KEY}.json")))
}

/// Stores the document as a JSON file, replacing it atomically on write.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Store for JsonFileStore {
    fn read(&self) -> Result<Option<String>, Error> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, contents: &str) -> Result<(), Error> {
        if let Some(parent_dir) = self.path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                fs::create_dir_all(parent_dir)?;
            }
        }
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn set_aside(&mut self) -> Result<Option<String>, Error> {
        let target = self.path.with_extension(SET_ASIDE_EXTENSION);
        match fs::rename(&self.path, &target) {
            Ok(()) => Ok(Some(target.display().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store. Clones share the same slot, so a caller can keep a handle
/// to inspect what was written.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<String>>>,
    refuse_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(contents.into()))),
            refuse_writes: false,
        }
    }

    /// A store whose writes always fail, leaving the slot untouched.
    pub fn refusing_writes() -> Self {
        Self {
            refuse_writes: true,
            ..Self::default()
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl Store for MemoryStore {
    fn read(&self) -> Result<Option<String>, Error> {
        Ok(self.contents())
    }

    fn write(&mut self, contents: &str) -> Result<(), Error> {
        if self.refuse_writes {
            return Err(Error::WriteRefused(self.location()));
        }
        *self.slot.borrow_mut() = Some(contents.to_string());
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

/// Only records whether the catalog field is present.
#[derive(Deserialize)]
struct CatalogPresence {
    #[serde(rename = "exerciseCategories")]
    exercise_categories: Option<IgnoredAny>,
}

/// Parses a stored document. A record without a catalog gets the built-in one.
/// Categories keep the order they have in the record.
///
/// # Errors
/// Returns `Error::Json` for anything that is not a document.
pub fn decode(raw: &str) -> Result<Document, Error> {
    let document: Document = serde_json::from_str(raw)?;
    if let Ok(CatalogPresence {
        exercise_categories: None,
    }) = serde_json::from_str(raw)
    {
        info!("stored document has no {CATALOG_FIELD}; using the built-in catalog");
    }
    Ok(document)
}

/// # Errors
/// Returns `Error::Json` if serialization fails.
pub fn encode(document: &Document) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Reads the document from `store`, falling back to the default document when
/// nothing is stored or the record is malformed, and repairing dangling
/// profile references and duplicate ids. A malformed record is set aside
/// first so it survives the next write.
///
/// # Errors
/// Only I/O failures reading an existing record are returned.
pub fn load_document(store: &mut dyn Store) -> Result<Document, Error> {
    let Some(raw) = store.read()? else {
        info!("no stored document at {}; starting fresh", store.location());
        return Ok(Document::default());
    };
    let mut document = match decode(&raw) {
        Ok(document) => document,
        Err(e) => {
            warn!(
                "could not parse document at {}: {e}; starting from defaults",
                store.location()
            );
            match store.set_aside() {
                Ok(Some(kept)) => warn!("unreadable document moved to {kept}"),
                Ok(None) => {}
                Err(e) => error!(
                    "could not move unreadable document at {} aside: {e}",
                    store.location()
                ),
            }
            return Ok(Document::default());
        }
    };
    for repair in document.repair() {
        warn!("{repair}");
    }
    Ok(document)
}

/// # Errors
/// Returns `Error` if the document cannot be serialized or written.
pub fn save_document(store: &mut dyn Store, document: &Document) -> Result<(), Error> {
    let contents = encode(document)?;
    store.write(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Avatar, Catalog, LoggedSet, Profile};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn sample_document() -> Document {
        let mut profile = Profile::new(1, "User 1", Avatar::Swimmer);
        profile.exercises.push(LoggedSet {
            id: 1_715_000_000_000,
            name: "Squat".into(),
            category: "Legs".into(),
            weight: "102.5".into(),
            reps: "5".into(),
            note: "Good form".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
        });
        Document {
            profiles: vec![profile, Profile::new(2, "Guest", Avatar::Runner)],
            exercise_categories: Catalog::builtin(),
            active_profile_id: 2,
        }
    }

    #[test]
    fn file_round_trip_preserves_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("nested").join("data.json"));
        let document = sample_document();
        save_document(&mut store, &document).unwrap();
        assert!(store.path().exists());
        assert_eq!(load_document(&mut store).unwrap(), document);
    }

    #[test]
    fn encoded_document_uses_camel_case_field_names() {
        let encoded = encode(&sample_document()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["activeProfileId"], 2);
        assert_eq!(value["profiles"][0]["avatar"], "swimmer");
        assert_eq!(value["profiles"][0]["exercises"][0]["date"], "2024-05-06");
        assert_eq!(value["exerciseCategories"]["Legs"][0], "Squat");
    }

    #[test]
    fn catalog_order_survives_round_trip() {
        let mut document = Document::default();
        document.exercise_categories.insert_category("Cardio".into());
        document.exercise_categories.insert_category("Abs".into());
        let decoded = decode(&encode(&document).unwrap()).unwrap();
        assert_eq!(
            decoded.catalog().categories().collect::<Vec<_>>(),
            document.catalog().categories().collect::<Vec<_>>()
        );
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("absent.json"));
        assert_eq!(load_document(&mut store).unwrap(), Document::default());
    }

    #[test]
    fn malformed_record_loads_default() {
        for raw in ["{not json", "[]", r#"{"profiles": "nope"}"#] {
            let mut store = MemoryStore::with_contents(raw);
            assert_eq!(load_document(&mut store).unwrap(), Document::default());
        }
    }

    #[test]
    fn missing_catalog_is_backfilled() {
        let raw = r#"{
            "profiles": [{"id": 1, "name": "User 1", "avatar": "/avatars/a1.png", "exercises": [
                {"id": 5, "name": "Squat", "category": "Legs", "weight": "80", "reps": "8", "date": "2024-01-02"}
            ]}],
            "activeProfileId": 1
        }"#;
        let document = load_document(&mut MemoryStore::with_contents(raw)).unwrap();
        assert_eq!(document.exercise_categories, Catalog::builtin());
        let profile = document.active_profile().unwrap();
        assert_eq!(profile.avatar, Avatar::Lifter);
        assert_eq!(profile.exercises[0].note, "");
    }

    #[test]
    fn dangling_active_profile_is_repaired_on_load() {
        let mut document = sample_document();
        document.active_profile_id = 77;
        let mut store = MemoryStore::with_contents(encode(&document).unwrap());
        assert_eq!(load_document(&mut store).unwrap().active_profile_id, 1);
    }

    #[test]
    fn catalog_order_survives_a_file_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("data.json"));
        let mut document = Document::default();
        document.exercise_categories.insert_category("Cardio".into());
        document
            .exercise_categories
            .rename_category("Back", "Upper Back".into());
        save_document(&mut store, &document).unwrap();

        let reloaded = load_document(&mut store).unwrap();
        assert_eq!(
            reloaded.catalog().categories().collect::<Vec<_>>(),
            vec!["Chest", "Upper Back", "Legs", "Shoulders", "Arms", "Core", "Cardio"]
        );
    }

    #[test]
    fn malformed_file_is_set_aside_before_it_can_be_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let raw = r#"{"profiles": [{"id": "one"}], "activeProfileId": 1}"#;
        fs::write(&path, raw).unwrap();
        let mut store = JsonFileStore::new(&path);

        assert_eq!(load_document(&mut store).unwrap(), Document::default());
        let kept = dir.path().join("data.json.bad");
        assert_eq!(fs::read_to_string(&kept).unwrap(), raw);
        assert!(!path.exists());

        save_document(&mut store, &Document::default()).unwrap();
        assert_eq!(fs::read_to_string(&kept).unwrap(), raw);
    }

    #[test]
    fn memory_store_clones_share_contents() {
        let handle = MemoryStore::new();
        let mut store = handle.clone();
        save_document(&mut store, &Document::default()).unwrap();
        assert!(handle.contents().is_some());

        let mut refusing = MemoryStore::refusing_writes();
        assert!(save_document(&mut refusing, &Document::default()).is_err());
        assert_eq!(refusing.contents(), None);
    }
}
