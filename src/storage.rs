//! Storage layer for td
//!
//! Persistent state is a local key-value store holding one slot, the
//! serialized task sequence. On disk the store is a directory:
//!
//! ```text
//! <data dir>/                   # --data-dir, $TD_DATA_DIR, or platform data dir
//!   config.toml                 # Optional configuration
//!   todos.json                  # The task slot (key "todos" by default)
//!   todos.json.lock             # Advisory lock taken during writes
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};
use crate::task::Task;

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "TD_DATA_DIR";

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Default key of the task slot
pub const DEFAULT_SLOT: &str = "todos";

const SLOT_EXTENSION: &str = "json";

/// A local string key-value store, one value per key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Directory-backed store: each key is `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    lock_timeout_ms: u64,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{SLOT_EXTENSION}"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Io(err)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        lock::write_atomic_locked(self.path_for(key), value.as_bytes(), self.lock_timeout_ms)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        lock::remove_locked(self.path_for(key), self.lock_timeout_ms)
    }
}

/// In-process store. Counts writes so callers can observe persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` and `remove` calls
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        self.writes += 1;
        Ok(())
    }
}

/// The task slot inside a key-value store.
#[derive(Debug, Clone)]
pub struct TaskStorage<S> {
    backend: S,
    slot: String,
}

impl<S: KeyValueStore> TaskStorage<S> {
    pub fn new(backend: S, slot: impl Into<String>) -> Self {
        Self {
            backend,
            slot: slot.into(),
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Read the slot. Absent, unreadable, or malformed data is an empty list.
    pub fn load(&self) -> Vec<Task> {
        let raw = match self.backend.get(&self.slot) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(slot = %self.slot, error = %err, "task slot unreadable; starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => tasks,
            Err(err) => {
                tracing::warn!(slot = %self.slot, error = %err, "task slot malformed; starting empty");
                Vec::new()
            }
        }
    }

    /// Overwrite the slot with the full sequence.
    pub fn save(&mut self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string(tasks)?;
        self.backend.set(&self.slot, &json)?;
        tracing::debug!(slot = %self.slot, tasks = tasks.len(), "task slot saved");
        Ok(())
    }

    /// Remove the slot entirely.
    pub fn clear(&mut self) -> Result<()> {
        self.backend.remove(&self.slot)?;
        tracing::debug!(slot = %self.slot, "task slot cleared");
        Ok(())
    }

    pub fn read_raw(&self) -> Result<Option<String>> {
        self.backend.get(&self.slot)
    }

    /// Replace the slot with already-validated contents.
    pub fn write_raw(&mut self, raw: &str) -> Result<()> {
        self.backend.set(&self.slot, raw)
    }
}

/// Location of td state on disk
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `explicit` (flag or env via clap) wins, then the platform data dir.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        if let Some(root) = explicit {
            return Ok(Self::new(root));
        }
        let dirs = directories::ProjectDirs::from("", "", "td").ok_or(Error::NoDataDir)?;
        Ok(Self::new(dirs.data_dir()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn file_store(&self, lock_timeout_ms: u64) -> FileStore {
        FileStore::new(self.root.clone()).with_lock_timeout(lock_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn task(id: &str, text: &str, done: bool, created_at: i64) -> Task {
        Task {
            id: id.to_string(),
            text: text.to_string(),
            done,
            created_at,
        }
    }

    #[test]
    fn load_after_save_round_trips() {
        let dir = tempdir().expect("tempdir");
        let mut storage = TaskStorage::new(FileStore::new(dir.path()), DEFAULT_SLOT);
        let tasks = vec![
            task("b", "walk dog", false, 2),
            task("a", "buy milk", true, 1),
        ];

        storage.save(&tasks).expect("save");
        assert_eq!(storage.load(), tasks);
    }

    #[test]
    fn missing_slot_loads_empty() {
        let dir = tempdir().expect("tempdir");
        let storage = TaskStorage::new(FileStore::new(dir.path()), DEFAULT_SLOT);
        assert!(storage.load().is_empty());
        assert!(storage.read_raw().expect("read").is_none());
    }

    #[test]
    fn malformed_slot_loads_empty() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        fs::write(store.path_for(DEFAULT_SLOT), "{not json").expect("write");

        let storage = TaskStorage::new(store, DEFAULT_SLOT);
        assert!(storage.load().is_empty());
    }

    #[test]
    fn wrong_shape_slot_loads_empty() {
        let mut backend = MemoryStore::new();
        backend
            .set(DEFAULT_SLOT, r#"{"not":"an array"}"#)
            .expect("set");
        let storage = TaskStorage::new(backend, DEFAULT_SLOT);
        assert!(storage.load().is_empty());
    }

    #[test]
    fn slot_uses_camel_case_created_at() {
        let mut storage = TaskStorage::new(MemoryStore::new(), DEFAULT_SLOT);
        storage
            .save(&[task("x", "a", true, 1)])
            .expect("save");
        let raw = storage.read_raw().expect("read").expect("slot");
        assert_eq!(raw, r#"[{"id":"x","text":"a","done":true,"createdAt":1}]"#);
    }

    #[test]
    fn clear_removes_slot_file() {
        let dir = tempdir().expect("tempdir");
        let mut storage = TaskStorage::new(FileStore::new(dir.path()), "custom");
        storage.save(&[task("x", "a", false, 1)]).expect("save");
        let path = storage.backend().path_for("custom");
        assert!(path.exists());

        storage.clear().expect("clear");
        assert!(!path.exists());
        assert!(storage.load().is_empty());
    }

    #[test]
    fn memory_store_counts_writes() {
        let mut storage = TaskStorage::new(MemoryStore::new(), DEFAULT_SLOT);
        assert_eq!(storage.backend().writes(), 0);
        storage.save(&[]).expect("save");
        storage.clear().expect("clear");
        assert_eq!(storage.backend().writes(), 2);
    }

    #[test]
    fn explicit_data_dir_wins() {
        let dir = tempdir().expect("tempdir");
        let data_dir = DataDir::resolve(Some(dir.path().to_path_buf())).expect("resolve");
        assert_eq!(data_dir.root(), dir.path());
        assert_eq!(data_dir.config_file(), dir.path().join("config.toml"));
        assert_eq!(
            data_dir.file_store(100).path_for("todos"),
            dir.path().join("todos.json")
        );
    }
}
