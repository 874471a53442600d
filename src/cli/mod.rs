//! Command-line interface for td
//!
//! This module defines the CLI structure using clap derive macros.
//! Task commands live in `task`, import/export and reset in `transfer`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::views::Filter;

mod context;
mod task;
mod transfer;

/// td - a todo list with local persistence
///
/// Add, toggle, edit, and delete tasks; filter and count them; export and
/// import the whole list as JSON; or browse it in a terminal UI.
#[derive(Parser, Debug)]
#[command(name = "td")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the task slot and config.toml
    #[arg(long, global = true, env = crate::storage::DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a task
    Add {
        /// Task text (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// List tasks
    #[command(alias = "ls")]
    List {
        /// Which tasks to show (default from config)
        #[arg(short, long, value_enum)]
        filter: Option<Filter>,
    },

    /// Flip a task between done and not done
    Toggle {
        /// Task id or unique id prefix
        id: String,
    },

    /// Replace a task's text
    Edit {
        /// Task id or unique id prefix
        id: String,

        /// New text (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Delete a task
    #[command(alias = "delete")]
    Rm {
        /// Task id or unique id prefix
        id: String,
    },

    /// Delete every completed task
    ClearDone,

    /// Show completion stats
    Stats,

    /// Write all tasks as a JSON array
    Export {
        /// Output file, or - for stdout
        #[arg(default_value = crate::transfer::STDIO_PATH)]
        path: String,
    },

    /// Replace all tasks with a JSON array from a file
    Import {
        /// Input file, or - for stdin
        path: String,
    },

    /// Remove every task
    Reset {
        /// Confirm removing every task
        #[arg(long)]
        yes: bool,
    },

    /// Browse and edit tasks in a terminal UI
    Tui {
        /// Initial filter (default from config)
        #[arg(short, long, value_enum)]
        filter: Option<Filter>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let globals = GlobalOptions {
            data_dir: self.data_dir,
            json: self.json,
            quiet: self.quiet,
        };
        match self.command {
            Commands::Add { text } => task::run_add(task::AddOptions {
                text: text.join(" "),
                globals,
            }),
            Commands::List { filter } => task::run_list(task::ListOptions { filter, globals }),
            Commands::Toggle { id } => task::run_toggle(task::ToggleOptions { id, globals }),
            Commands::Edit { id, text } => task::run_edit(task::EditOptions {
                id,
                text: text.join(" "),
                globals,
            }),
            Commands::Rm { id } => task::run_delete(task::DeleteOptions { id, globals }),
            Commands::ClearDone => task::run_clear_done(globals),
            Commands::Stats => task::run_stats(globals),
            Commands::Export { path } => {
                transfer::run_export(transfer::ExportOptions { path, globals })
            }
            Commands::Import { path } => {
                transfer::run_import(transfer::ImportOptions { path, globals })
            }
            Commands::Reset { yes } => transfer::run_reset(transfer::ResetOptions { yes, globals }),
            Commands::Tui { filter } => task::run_tui(task::TuiOptions { filter, globals }),
        }
    }
}

/// Flags shared by every subcommand
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

impl GlobalOptions {
    fn output(&self) -> crate::output::OutputOptions {
        crate::output::OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }
}
