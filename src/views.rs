//! Read-only projections of the task sequence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::task::Task;

/// Which tasks a list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Done,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Done => "done",
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.done,
            Filter::Done => task.done,
        }
    }

    /// Next filter in tab order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Filter::All => Filter::Active,
            Filter::Active => Filter::Done,
            Filter::Done => Filter::All,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "done" => Ok(Filter::Done),
            other => Err(Error::InvalidArgument(format!(
                "unknown filter '{other}' (expected all, active, or done)"
            ))),
        }
    }
}

/// Tasks matching `filter`, in sequence order.
pub fn filtered(tasks: &[Task], filter: Filter) -> Vec<&Task> {
    tasks.iter().filter(|task| filter.matches(task)).collect()
}

/// Number of tasks not yet done.
pub fn remaining_count(tasks: &[Task]) -> usize {
    tasks.iter().filter(|task| !task.done).count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    pub total: usize,
    pub done: usize,
    pub active: usize,
    /// Rounded half up; 0 when there are no tasks
    pub done_percent: u32,
}

pub fn completion_stats(tasks: &[Task]) -> CompletionStats {
    let total = tasks.len();
    let done = tasks.iter().filter(|task| task.done).count();
    let done_percent = if total == 0 {
        0
    } else {
        ((200 * done + total) / (2 * total)) as u32
    };
    CompletionStats {
        total,
        done,
        active: total - done,
        done_percent,
    }
}

/// Task with the smallest `created_at`; the first one wins a tie.
pub fn earliest_created(tasks: &[Task]) -> Option<&Task> {
    tasks.iter().reduce(|earliest, task| {
        if task.created_at < earliest.created_at {
            task
        } else {
            earliest
        }
    })
}

/// "1 item left" / "3 items left"
pub fn remaining_label(count: usize) -> String {
    if count == 1 {
        "1 item left".to_string()
    } else {
        format!("{count} items left")
    }
}
