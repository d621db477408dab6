//! Flat-file JSON persistence for catalog and availability documents.
//!
//! Documents are addressed by key and live as pretty-printed `<key>.json`
//! files under a single data directory. Writes go through a sibling temp
//! file and a rename so a crashed run never leaves a half-written document
//! behind; loads of absent documents return `Ok(None)` (first run, empty
//! catalog).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Key of the persisted catalog document (`all_facilities.json`).
pub const CATALOG_KEY: &str = "all_facilities";
/// Key of the grouped availability document (`facility_availability.json`).
pub const AVAILABILITY_KEY: &str = "facility_availability";
/// Key of the run-metadata sibling document (`detailed_availability.json`).
pub const DETAILED_KEY: &str = "detailed_availability";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize document \"{key}\": {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads and writes JSON documents by key under a data directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn document_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Loads a document by key, or `Ok(None)` if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read, or
    /// [`StoreError::Parse`] if its contents are not the expected JSON.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let path = self.document_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key, "no persisted document");
                return Ok(None);
            }
            Err(e) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };

        let document = serde_json::from_str(&content).map_err(|e| StoreError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Some(document))
    }

    /// Writes a document by key, creating the data directory on first use.
    ///
    /// The document is written to `<key>.json.tmp` and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialize`] if the document cannot be encoded,
    /// or [`StoreError::Io`] for any filesystem failure.
    pub fn save<T: Serialize>(&self, key: &str, document: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io {
            path: self.dir.display().to_string(),
            source: e,
        })?;

        let json = serde_json::to_vec_pretty(document).map_err(|e| StoreError::Serialize {
            key: key.to_owned(),
            source: e,
        })?;

        let path = self.document_path(key);
        let tmp_path = self.dir.join(format!("{key}.json.tmp"));
        write_all(&tmp_path, &json)?;
        fs::rename(&tmp_path, &path).map_err(|e| StoreError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        tracing::info!(key, bytes = json.len(), "document saved");
        Ok(())
    }
}

fn write_all(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let io_err = |e: std::io::Error| StoreError::Io {
        path: path.display().to_string(),
        source: e,
    };
    let mut file = fs::File::create(path).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn sample_document() -> BTreeMap<String, Vec<String>> {
        let mut doc = BTreeMap::new();
        doc.insert(
            "Aug 20, 2025".to_owned(),
            vec!["09:00 - 10:30".to_owned(), "13:00 - 14:00".to_owned()],
        );
        doc
    }

    #[test]
    fn load_missing_document_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let loaded: Option<BTreeMap<String, Vec<String>>> = store.load(CATALOG_KEY).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        store.save(AVAILABILITY_KEY, &sample_document()).unwrap();
        let loaded: Option<BTreeMap<String, Vec<String>>> = store.load(AVAILABILITY_KEY).unwrap();
        assert_eq!(loaded, Some(sample_document()));
    }

    #[test]
    fn save_creates_data_dir_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data");
        let store = JsonStore::new(&nested);

        store.save(DETAILED_KEY, &sample_document()).unwrap();
        assert!(nested.join("detailed_availability.json").exists());
        assert!(!nested.join("detailed_availability.json.tmp").exists());
    }

    #[test]
    fn save_overwrites_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        store.save(AVAILABILITY_KEY, &sample_document()).unwrap();
        let mut updated = sample_document();
        updated.insert("Aug 21, 2025".to_owned(), vec!["10:00 - 11:00".to_owned()]);
        store.save(AVAILABILITY_KEY, &updated).unwrap();

        let loaded: Option<BTreeMap<String, Vec<String>>> = store.load(AVAILABILITY_KEY).unwrap();
        assert_eq!(loaded, Some(updated));
    }

    #[test]
    fn load_surfaces_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        std::fs::write(dir.path().join("all_facilities.json"), "{ not json").unwrap();

        let result: Result<Option<BTreeMap<String, Vec<String>>>, _> = store.load(CATALOG_KEY);
        assert!(matches!(result, Err(StoreError::Parse { .. })));
    }

    #[test]
    fn documents_are_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        store.save(AVAILABILITY_KEY, &sample_document()).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("facility_availability.json")).unwrap();
        assert!(raw.contains('\n'), "output is human-inspectable");
    }
}
