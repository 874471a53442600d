//! Opening the data directory, config, and task store for a command.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::storage::{DataDir, FileStore, TaskStorage};
use crate::task::TaskStore;

pub(crate) struct TaskContext {
    pub(crate) store: TaskStore<FileStore>,
    pub(crate) config: Config,
    pub(crate) data_dir: DataDir,
}

pub(crate) fn load_context(data_dir: Option<PathBuf>) -> Result<TaskContext> {
    let data_dir = DataDir::resolve(data_dir)?;
    let config = Config::load_or_default(&data_dir.config_file())?;
    let backend = data_dir.file_store(config.storage.lock_timeout_ms);
    let storage = TaskStorage::new(backend, config.storage.slot.clone());
    let store = TaskStore::open(storage)?;
    tracing::debug!(
        data_dir = %data_dir.root().display(),
        slot = %config.storage.slot,
        tasks = store.tasks().len(),
        "task store opened"
    );
    Ok(TaskContext {
        store,
        config,
        data_dir,
    })
}
