//! td task command implementations.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::storage::FileStore;
use crate::task::{Action, Task, TaskStore};
use crate::views::{self, CompletionStats, Filter};

use super::context::load_context;
use super::GlobalOptions;

pub struct AddOptions {
    pub text: String,
    pub globals: GlobalOptions,
}

pub struct ListOptions {
    pub filter: Option<Filter>,
    pub globals: GlobalOptions,
}

pub struct ToggleOptions {
    pub id: String,
    pub globals: GlobalOptions,
}

pub struct EditOptions {
    pub id: String,
    pub text: String,
    pub globals: GlobalOptions,
}

pub struct DeleteOptions {
    pub id: String,
    pub globals: GlobalOptions,
}

pub struct TuiOptions {
    pub filter: Option<Filter>,
    pub globals: GlobalOptions,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let mut ctx = load_context(options.globals.data_dir.clone())?;
    let changed = ctx.store.apply(Action::Add(options.text))?;
    let task = if changed {
        ctx.store.tasks().first().cloned()
    } else {
        None
    };

    let mut human = match task.as_ref() {
        Some(task) => {
            let mut human = HumanOutput::new("Task added");
            human.push_summary("ID", task.id.clone());
            human.push_summary("Text", task.text.clone());
            human
        }
        None => HumanOutput::new("Nothing to add: text is empty"),
    };
    human.push_summary("Remaining", views::remaining_count(ctx.store.tasks()).to_string());

    let output = TaskChangeOutput::new(changed, task, ctx.store.tasks());
    emit_success(options.globals.output(), "add", &output, Some(&human))
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.globals.data_dir.clone())?;
    let filter = match options.filter {
        Some(filter) => filter,
        None => ctx.config.ui.filter()?,
    };
    let tasks: Vec<Task> = views::filtered(ctx.store.tasks(), filter)
        .into_iter()
        .cloned()
        .collect();
    let remaining = views::remaining_count(ctx.store.tasks());

    let mut human = HumanOutput::new(format!("Tasks ({filter})"));
    human.push_summary("Showing", tasks.len().to_string());
    human.push_summary("Remaining", views::remaining_label(remaining));
    for task in &tasks {
        human.push_row(format_task_line(task));
    }
    if ctx.store.tasks().is_empty() {
        human.push_next_step("td add <text>");
    }

    let output = TaskListOutput {
        filter,
        total: tasks.len(),
        remaining,
        tasks,
    };
    emit_success(options.globals.output(), "list", &output, Some(&human))
}

pub fn run_toggle(options: ToggleOptions) -> Result<()> {
    let mut ctx = load_context(options.globals.data_dir.clone())?;
    let Some(id) = ctx.store.resolve_task_id(&options.id)? else {
        return emit_no_match(&ctx.store, &options.id, "toggle", &options.globals);
    };
    let changed = ctx.store.apply(Action::Toggle(id.clone()))?;
    let task = ctx.store.get(&id).cloned();

    let header = match task.as_ref() {
        Some(task) if task.done => "Task done",
        Some(_) => "Task reopened",
        None => "No matching task",
    };
    let mut human = HumanOutput::new(header);
    if let Some(task) = task.as_ref() {
        human.push_summary("ID", task.id.clone());
        human.push_summary("Text", task.text.clone());
    }
    human.push_summary("Remaining", views::remaining_count(ctx.store.tasks()).to_string());

    let output = TaskChangeOutput::new(changed, task, ctx.store.tasks());
    emit_success(options.globals.output(), "toggle", &output, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let mut ctx = load_context(options.globals.data_dir.clone())?;
    let Some(id) = ctx.store.resolve_task_id(&options.id)? else {
        return emit_no_match(&ctx.store, &options.id, "edit", &options.globals);
    };
    let changed = ctx.store.apply(Action::Edit {
        id: id.clone(),
        text: options.text,
    })?;
    let task = ctx.store.get(&id).cloned();

    let mut human = HumanOutput::new(if changed {
        "Task updated"
    } else {
        "Task unchanged"
    });
    if let Some(task) = task.as_ref() {
        human.push_summary("ID", task.id.clone());
        human.push_summary("Text", task.text.clone());
    }
    if !changed {
        human.push_warning("new text is empty or identical to the current text");
    }

    let output = TaskChangeOutput::new(changed, task, ctx.store.tasks());
    emit_success(options.globals.output(), "edit", &output, Some(&human))
}

pub fn run_delete(options: DeleteOptions) -> Result<()> {
    let mut ctx = load_context(options.globals.data_dir.clone())?;
    let Some(id) = ctx.store.resolve_task_id(&options.id)? else {
        return emit_no_match(&ctx.store, &options.id, "rm", &options.globals);
    };
    let task = ctx.store.get(&id).cloned();
    let changed = ctx.store.apply(Action::Delete(id))?;

    let mut human = HumanOutput::new("Task deleted");
    if let Some(task) = task.as_ref() {
        human.push_summary("ID", task.id.clone());
        human.push_summary("Text", task.text.clone());
    }
    human.push_summary("Remaining", views::remaining_count(ctx.store.tasks()).to_string());

    let output = TaskChangeOutput::new(changed, task, ctx.store.tasks());
    emit_success(options.globals.output(), "rm", &output, Some(&human))
}

pub fn run_clear_done(globals: GlobalOptions) -> Result<()> {
    let mut ctx = load_context(globals.data_dir.clone())?;
    let before = ctx.store.tasks().len();
    let changed = ctx.store.apply(Action::ClearDone)?;
    let removed = before - ctx.store.tasks().len();

    let mut human = HumanOutput::new(if changed {
        "Completed tasks cleared"
    } else {
        "No completed tasks"
    });
    human.push_summary("Removed", removed.to_string());
    human.push_summary("Remaining", views::remaining_count(ctx.store.tasks()).to_string());

    let output = ClearDoneOutput {
        changed,
        removed,
        remaining: views::remaining_count(ctx.store.tasks()),
    };
    emit_success(globals.output(), "clear-done", &output, Some(&human))
}

pub fn run_stats(globals: GlobalOptions) -> Result<()> {
    let ctx = load_context(globals.data_dir.clone())?;
    let stats = views::completion_stats(ctx.store.tasks());
    let earliest = views::earliest_created(ctx.store.tasks()).cloned();
    let remaining = views::remaining_count(ctx.store.tasks());

    let mut human = HumanOutput::new("Task stats");
    human.push_summary("Total", stats.total.to_string());
    human.push_summary("Done", stats.done.to_string());
    human.push_summary("Active", stats.active.to_string());
    human.push_summary("Done %", format!("{}%", stats.done_percent));
    human.push_summary("Remaining", views::remaining_label(remaining));
    if let Some(task) = earliest.as_ref() {
        human.push_summary(
            "Oldest",
            format!("{} ({})", task.text, task.created_label()),
        );
    }
    human.push_row(format!("Data dir: {}", ctx.data_dir.root().display()));

    let output = StatsOutput {
        stats,
        remaining,
        earliest,
    };
    emit_success(globals.output(), "stats", &output, Some(&human))
}

pub fn run_tui(options: TuiOptions) -> Result<()> {
    if options.globals.json {
        return Err(Error::InvalidArgument(
            "td tui does not support --json".to_string(),
        ));
    }
    if options.globals.quiet {
        return Err(Error::InvalidArgument(
            "td tui does not support --quiet".to_string(),
        ));
    }
    let ctx = load_context(options.globals.data_dir)?;
    let filter = match options.filter {
        Some(filter) => filter,
        None => ctx.config.ui.filter()?,
    };
    crate::ui::todo_viewer::run(ctx.store, filter, ctx.config.ui.show_stats)
}

/// Missing ids are a no-op, reported as information with a success exit.
fn emit_no_match(
    store: &TaskStore<FileStore>,
    input: &str,
    command: &str,
    globals: &GlobalOptions,
) -> Result<()> {
    let mut human = HumanOutput::new("No matching task");
    human.push_summary("ID", input.to_string());
    human.push_next_step("td list");
    let output = TaskChangeOutput::new(false, None, store.tasks());
    emit_success(globals.output(), command, &output, Some(&human))
}

pub(crate) fn format_task_line(task: &Task) -> String {
    let mark = if task.done { "x" } else { " " };
    format!(
        "[{mark}] {}  {}  ({})",
        task.id,
        task.text,
        task.created_label()
    )
}

#[derive(Serialize)]
struct TaskChangeOutput {
    changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<Task>,
    remaining: usize,
}

impl TaskChangeOutput {
    fn new(changed: bool, task: Option<Task>, tasks: &[Task]) -> Self {
        Self {
            changed,
            task,
            remaining: views::remaining_count(tasks),
        }
    }
}

#[derive(Serialize)]
struct TaskListOutput {
    filter: Filter,
    total: usize,
    remaining: usize,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct ClearDoneOutput {
    changed: bool,
    removed: usize,
    remaining: usize,
}

#[derive(Serialize)]
struct StatsOutput {
    #[serde(flatten)]
    stats: CompletionStats,
    remaining: usize,
    earliest: Option<Task>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::tests::task;

    #[test]
    fn task_line_marks_done() {
        let line = format_task_line(&task("abc", "buy milk", true, 0));
        assert_eq!(line, "[x] abc  buy milk  (1970-01-01 00:00)");
        let line = format_task_line(&task("abc", "walk dog", false, 0));
        assert!(line.starts_with("[ ] abc"));
    }

    #[test]
    fn stats_output_flattens_counts() {
        let tasks = vec![task("a", "x", true, 5), task("b", "y", false, 3)];
        let output = StatsOutput {
            stats: views::completion_stats(&tasks),
            remaining: views::remaining_count(&tasks),
            earliest: views::earliest_created(&tasks).cloned(),
        };
        let json = serde_json::to_value(&output).expect("json");
        assert_eq!(json["total"], 2);
        assert_eq!(json["donePercent"], 50);
        assert_eq!(json["remaining"], 1);
        assert_eq!(json["earliest"]["id"], "b");
    }
}
