//! Task model, the transition function, and the owned task store.
//!
//! All mutation goes through [`TaskStore::apply`], which runs the pure
//! [`transition`] and persists the result before it becomes visible.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, TaskStorage};

/// A single todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub done: bool,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
}

impl Task {
    /// Creation time as `YYYY-MM-DD HH:MM` UTC.
    pub fn created_label(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.created_at)
            .map(|value| value.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| self.created_at.to_string())
    }
}

/// Identity and creation time for a task about to be added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStamp {
    pub id: String,
    pub created_at: i64,
}

/// Source of fresh task stamps.
pub trait TaskMint {
    /// Returns a stamp whose id is not used by any task in `existing`.
    fn mint(&mut self, existing: &[Task]) -> TaskStamp;
}

/// Lowercase ULID ids and wall-clock creation times.
#[derive(Debug, Clone, Copy, Default)]
pub struct UlidMint;

impl TaskMint for UlidMint {
    fn mint(&mut self, existing: &[Task]) -> TaskStamp {
        let taken: HashSet<&str> = existing.iter().map(|task| task.id.as_str()).collect();
        let id = loop {
            let candidate = Ulid::new().to_string().to_lowercase();
            if !taken.contains(candidate.as_str()) {
                break candidate;
            }
        };
        TaskStamp {
            id,
            created_at: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace the whole sequence (startup hydrate or reload).
    Initialize(Vec<Task>),
    Add(String),
    Toggle(String),
    Delete(String),
    Edit { id: String, text: String },
    ClearDone,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Initialize(_) => "initialize",
            Action::Add(_) => "add",
            Action::Toggle(_) => "toggle",
            Action::Delete(_) => "delete",
            Action::Edit { .. } => "edit",
            Action::ClearDone => "clear_done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// No-op: the sequence stays as it is and nothing is written.
    Unchanged,
    Changed(Vec<Task>),
}

/// Trimmed text, or `None` when nothing is left.
pub fn normalize_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Compute the next sequence for `action`. `mint` is consulted only by Add.
pub fn transition(current: &[Task], action: Action, mint: &mut dyn TaskMint) -> Transition {
    match action {
        Action::Initialize(tasks) => Transition::Changed(tasks),
        Action::Add(raw) => {
            let Some(text) = normalize_text(&raw) else {
                return Transition::Unchanged;
            };
            let stamp = mint.mint(current);
            let mut next = Vec::with_capacity(current.len() + 1);
            next.push(Task {
                id: stamp.id,
                text,
                done: false,
                created_at: stamp.created_at,
            });
            next.extend_from_slice(current);
            Transition::Changed(next)
        }
        Action::Toggle(id) => {
            if !current.iter().any(|task| task.id == id) {
                return Transition::Unchanged;
            }
            Transition::Changed(
                current
                    .iter()
                    .map(|task| {
                        if task.id == id {
                            Task {
                                done: !task.done,
                                ..task.clone()
                            }
                        } else {
                            task.clone()
                        }
                    })
                    .collect(),
            )
        }
        Action::Delete(id) => {
            if !current.iter().any(|task| task.id == id) {
                return Transition::Unchanged;
            }
            Transition::Changed(
                current
                    .iter()
                    .filter(|task| task.id != id)
                    .cloned()
                    .collect(),
            )
        }
        Action::Edit { id, text } => {
            let Some(text) = normalize_text(&text) else {
                return Transition::Unchanged;
            };
            let Some(target) = current.iter().find(|task| task.id == id) else {
                return Transition::Unchanged;
            };
            if target.text == text {
                return Transition::Unchanged;
            }
            Transition::Changed(
                current
                    .iter()
                    .map(|task| {
                        if task.id == id {
                            Task {
                                text: text.clone(),
                                ..task.clone()
                            }
                        } else {
                            task.clone()
                        }
                    })
                    .collect(),
            )
        }
        Action::ClearDone => {
            if !current.iter().any(|task| task.done) {
                return Transition::Unchanged;
            }
            Transition::Changed(current.iter().filter(|task| !task.done).cloned().collect())
        }
    }
}

/// The single owner of the in-memory task sequence.
pub struct TaskStore<S, M = UlidMint> {
    tasks: Vec<Task>,
    storage: TaskStorage<S>,
    mint: M,
}

impl<S: KeyValueStore> TaskStore<S, UlidMint> {
    /// Hydrate from the slot with the default mint.
    pub fn open(storage: TaskStorage<S>) -> Result<Self> {
        Self::open_with_mint(storage, UlidMint)
    }
}

impl<S: KeyValueStore, M: TaskMint> TaskStore<S, M> {
    pub fn open_with_mint(storage: TaskStorage<S>, mint: M) -> Result<Self> {
        let mut store = Self {
            tasks: Vec::new(),
            storage,
            mint,
        };
        store.reload()?;
        Ok(store)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn storage(&self) -> &TaskStorage<S> {
        &self.storage
    }

    pub(crate) fn storage_mut(&mut self) -> &mut TaskStorage<S> {
        &mut self.storage
    }

    /// Run `action`; returns whether the sequence changed.
    ///
    /// A changed sequence is saved before it replaces the in-memory one, so a
    /// failed write leaves both sides as they were. Initialize is not written
    /// back: its sequence was just read from the slot.
    pub fn apply(&mut self, action: Action) -> Result<bool> {
        let name = action.name();
        let persist = !matches!(action, Action::Initialize(_));
        match transition(&self.tasks, action, &mut self.mint) {
            Transition::Unchanged => {
                tracing::debug!(action = name, "no-op");
                Ok(false)
            }
            Transition::Changed(next) => {
                if persist {
                    self.storage.save(&next)?;
                }
                tracing::debug!(action = name, tasks = next.len(), "applied");
                self.tasks = next;
                Ok(true)
            }
        }
    }

    /// Re-read the slot and replace the in-memory sequence.
    pub fn reload(&mut self) -> Result<()> {
        let tasks = self.storage.load();
        self.apply(Action::Initialize(tasks))?;
        Ok(())
    }

    /// Remove the slot and empty the sequence.
    pub fn reset(&mut self) -> Result<()> {
        self.storage.clear()?;
        self.tasks.clear();
        Ok(())
    }

    /// Full id, or a unique case-insensitive prefix of one.
    ///
    /// An exact id always wins, so `x` and `X` stay distinct; case-folded
    /// matching only applies when no id is spelled exactly like `input`.
    /// `Ok(None)` when nothing matches, so callers keep no-op semantics.
    pub fn resolve_task_id(&self, input: &str) -> Result<Option<String>> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
        }
        if let Some(task) = self.get(input) {
            return Ok(Some(task.id.clone()));
        }

        let needle = input.to_lowercase();
        let mut folded = self
            .tasks
            .iter()
            .filter(|task| task.id.to_lowercase() == needle)
            .map(|task| task.id.as_str());
        if let Some(id) = folded.next() {
            if let Some(other) = folded.next() {
                return Err(Error::InvalidArgument(format!(
                    "ambiguous task id '{input}': {id}, {other}"
                )));
            }
            return Ok(Some(id.to_string()));
        }

        let mut matches: Vec<&str> = self
            .tasks
            .iter()
            .filter(|task| task.id.to_lowercase().starts_with(&needle))
            .map(|task| task.id.as_str())
            .collect();
        matches.sort_unstable();
        matches.dedup();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches[0].to_string())),
            _ => Err(Error::InvalidArgument(format!(
                "ambiguous task id '{input}': {}",
                matches.join(", ")
            ))),
        }
    }
}
