//! JSON export and validated import of the task sequence.
//!
//! Export writes a pretty-printed array. Import accepts only an array of
//! task objects; anything else is rejected before the slot is touched.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::lock;
use crate::storage::KeyValueStore;
use crate::task::{Task, TaskStore, TaskMint};

/// Path argument meaning stdin/stdout.
pub const STDIO_PATH: &str = "-";

/// Pretty JSON array of `tasks`, newline terminated.
pub fn export_json(tasks: &[Task]) -> Result<String> {
    let mut json = serde_json::to_string_pretty(tasks)?;
    json.push('\n');
    Ok(json)
}

/// Write the export to `path` atomically.
pub fn export_to_file(tasks: &[Task], path: &Path) -> Result<()> {
    let json = export_json(tasks)?;
    lock::write_atomic(path, json.as_bytes())?;
    tracing::debug!(path = %path.display(), tasks = tasks.len(), "exported tasks");
    Ok(())
}

/// Read import contents from a file, or stdin for `-`.
pub fn read_source(path: &str) -> Result<String> {
    if path == STDIO_PATH {
        let mut raw = String::new();
        io::stdin().read_to_string(&mut raw)?;
        return Ok(raw);
    }
    Ok(fs::read_to_string(path)?)
}

/// Parse import contents: an array of task objects with unique ids and
/// non-blank text.
pub fn parse_import(raw: &str) -> Result<Vec<Task>> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| Error::ImportRejected(format!("not valid JSON: {err}")))?;

    let Value::Array(items) = value else {
        return Err(Error::ImportRejected(format!(
            "expected a JSON array of tasks, found {}",
            json_kind(&value)
        )));
    };

    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let task: Task = serde_json::from_value(item)
            .map_err(|err| Error::ImportRejected(format!("item {index} is not a task: {err}")))?;
        if task.text.trim().is_empty() {
            return Err(Error::ImportRejected(format!("item {index} has empty text")));
        }
        if !seen.insert(task.id.clone()) {
            return Err(Error::ImportRejected(format!(
                "item {index} repeats task id '{}'",
                task.id
            )));
        }
        tasks.push(task);
    }
    Ok(tasks)
}

/// Replace the slot with `raw` and reload the store from it.
///
/// Rejected contents leave both the slot and the store unchanged.
pub fn import_into<S: KeyValueStore, M: TaskMint>(
    store: &mut TaskStore<S, M>,
    raw: &str,
) -> Result<usize> {
    let tasks = parse_import(raw)?;
    store.storage_mut().write_raw(raw.trim())?;
    store.reload()?;
    tracing::debug!(tasks = tasks.len(), "imported tasks");
    Ok(tasks.len())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
