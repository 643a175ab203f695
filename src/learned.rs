//! The learned-terms set and the key/value persistence it is mirrored to.

use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Storage key for the serialized learned set.
pub const LEARNED_KEY: &str = "learnedTerms";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Minimal string key/value store; values are whole JSON documents.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Deletes `key`; a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Whether values outlive the process.
    fn is_durable(&self) -> bool {
        true
    }
}

/// Process-local store used by tests and anonymous web sessions.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.write().remove(key);
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }
}

/// One JSON file per key under a base directory.
pub struct JsonFileStore {
    base_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// `<data dir>/crumb-gloss`, falling back to the working directory.
    pub fn default_dir() -> PathBuf {
        #[cfg(feature = "cli")]
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        #[cfg(not(feature = "cli"))]
        let base = PathBuf::from(".");
        base.join("crumb-gloss")
    }

    fn file_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.base_dir.join(format!("{name}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.file_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.file_path(key);
        let tmp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.file_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Ids the user has marked as learned. Ids are not validated against the
/// content store; unknown ids are kept and simply never rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnedSet {
    key: String,
    ids: BTreeSet<String>,
}

impl LearnedSet {
    pub fn empty(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ids: BTreeSet::new(),
        }
    }

    /// Reads the set once. Missing, unreadable or malformed values all
    /// rehydrate as the empty set.
    pub fn load(store: &dyn KeyValueStore, key: impl Into<String>) -> Self {
        let key = key.into();
        let ids = match store.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(ids) => ids.into_iter().collect(),
                Err(err) => {
                    warn!(key = %key, error = %err, "discarding malformed learned set");
                    BTreeSet::new()
                }
            },
            Ok(None) => BTreeSet::new(),
            Err(err) => {
                warn!(key = %key, error = %err, "failed to read learned set");
                BTreeSet::new()
            }
        };
        Self { key, ids }
    }

    /// Flips membership and returns whether `id` is now learned.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    /// Overwrites the stored value with the whole set.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        let ids: Vec<&str> = self.ids.iter().map(String::as_str).collect();
        store.set(&self.key, &serde_json::to_string(&ids)?)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores_membership() {
        let mut set = LearnedSet::empty(LEARNED_KEY);
        assert!(set.toggle("biga"));
        assert!(set.contains("biga"));
        assert!(!set.toggle("biga"));
        assert!(!set.contains("biga"));
        assert!(set.is_empty());
    }

    #[test]
    fn save_overwrites_value_as_json_array() {
        let store = MemoryStore::new();
        let mut set = LearnedSet::empty(LEARNED_KEY);
        set.toggle("poolish");
        set.toggle("biga");
        set.save(&store).unwrap();
        assert_eq!(
            store.get(LEARNED_KEY).unwrap().as_deref(),
            Some(r#"["biga","poolish"]"#)
        );
        set.toggle("biga");
        set.save(&store).unwrap();
        assert_eq!(
            store.get(LEARNED_KEY).unwrap().as_deref(),
            Some(r#"["poolish"]"#)
        );
    }

    #[test]
    fn malformed_value_loads_as_empty() {
        let store = MemoryStore::new();
        store.set(LEARNED_KEY, "{not json").unwrap();
        assert!(LearnedSet::load(&store, LEARNED_KEY).is_empty());
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state")).unwrap();
        let mut set = LearnedSet::load(&store, LEARNED_KEY);
        assert!(set.is_empty());
        set.toggle("levain");
        set.save(&store).unwrap();

        let reopened = JsonFileStore::new(dir.path().join("state")).unwrap();
        let restored = LearnedSet::load(&reopened, LEARNED_KEY);
        assert!(restored.contains("levain"));
        assert_eq!(restored.len(), 1);
        assert!(!dir.path().join("state").join("learnedTerms.tmp").exists());
    }

    #[test]
    fn file_store_keeps_session_keys_apart() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        store.set("learnedTerms.abc", "[\"a\"]").unwrap();
        store.set("learnedTerms.xyz", "[\"b\"]").unwrap();
        assert_eq!(
            store.get("learnedTerms.abc").unwrap().as_deref(),
            Some("[\"a\"]")
        );
        assert_eq!(store.get("learnedTerms.none").unwrap(), None);
    }

    #[test]
    fn remove_deletes_the_value_and_tolerates_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let files = JsonFileStore::new(dir.path()).unwrap();
        files.set("learnedTerms.abc", "[]").unwrap();
        files.remove("learnedTerms.abc").unwrap();
        files.remove("learnedTerms.abc").unwrap();
        assert_eq!(files.get("learnedTerms.abc").unwrap(), None);
        assert!(files.is_durable());

        let memory = MemoryStore::new();
        memory.set("learnedTerms.abc", "[]").unwrap();
        memory.remove("learnedTerms.abc").unwrap();
        assert_eq!(memory.get("learnedTerms.abc").unwrap(), None);
        assert!(!memory.is_durable());
    }
}
