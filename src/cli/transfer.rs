//! td export / import / reset command implementations.

use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::transfer::{self, STDIO_PATH};

use super::context::load_context;
use super::GlobalOptions;

pub struct ExportOptions {
    pub path: String,
    pub globals: GlobalOptions,
}

pub struct ImportOptions {
    pub path: String,
    pub globals: GlobalOptions,
}

pub struct ResetOptions {
    pub yes: bool,
    pub globals: GlobalOptions,
}

pub fn run_export(options: ExportOptions) -> Result<()> {
    let ctx = load_context(options.globals.data_dir.clone())?;
    let tasks = ctx.store.tasks();

    // The export itself is the stdout payload; no envelope around it.
    if options.path == STDIO_PATH {
        let json = transfer::export_json(tasks)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(json.as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }

    let path = PathBuf::from(&options.path);
    transfer::export_to_file(tasks, &path)?;

    let mut human = HumanOutput::new("Tasks exported");
    human.push_summary("Path", path.display().to_string());
    human.push_summary("Tasks", tasks.len().to_string());

    let output = TransferOutput {
        path: path.display().to_string(),
        tasks: tasks.len(),
    };
    emit_success(options.globals.output(), "export", &output, Some(&human))
}

pub fn run_import(options: ImportOptions) -> Result<()> {
    let mut ctx = load_context(options.globals.data_dir.clone())?;
    let raw = transfer::read_source(&options.path)?;
    let replaced = ctx.store.tasks().len();
    let count = transfer::import_into(&mut ctx.store, &raw)?;

    let mut human = HumanOutput::new("Tasks imported");
    human.push_summary("Source", options.path.clone());
    human.push_summary("Tasks", count.to_string());
    human.push_summary("Replaced", replaced.to_string());
    human.push_next_step("td list");

    let output = ImportOutput {
        path: options.path.clone(),
        tasks: count,
        replaced,
    };
    emit_success(options.globals.output(), "import", &output, Some(&human))
}

pub fn run_reset(options: ResetOptions) -> Result<()> {
    if !options.yes {
        return Err(Error::ConfirmationRequired(
            "reset removes every task; pass --yes to confirm".to_string(),
        ));
    }
    let mut ctx = load_context(options.globals.data_dir.clone())?;
    let removed = ctx.store.tasks().len();
    ctx.store.reset()?;
    tracing::debug!(removed, "tasks reset");

    let mut human = HumanOutput::new("All tasks removed");
    human.push_summary("Removed", removed.to_string());

    let output = ResetOutput { removed };
    emit_success(options.globals.output(), "reset", &output, Some(&human))
}

#[derive(Serialize)]
struct TransferOutput {
    path: String,
    tasks: usize,
}

#[derive(Serialize)]
struct ImportOutput {
    path: String,
    tasks: usize,
    replaced: usize,
}

#[derive(Serialize)]
struct ResetOutput {
    removed: usize,
}
