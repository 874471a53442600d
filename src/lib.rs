//! td - Todo List Library
//!
//! This library provides the core functionality for the td CLI tool: an
//! ordered list of tasks with local persistence, derived views, and JSON
//! import/export.
//!
//! # Core Concepts
//!
//! - **Task store**: the single owner of the task sequence; every mutation
//!   is an [`task::Action`] applied through [`task::TaskStore::apply`]
//! - **Persistent slot**: one key in a local key-value store holding the
//!   serialized sequence, rewritten after every change
//! - **Views**: filtered lists, remaining count, completion stats
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `config.toml`
//! - `error`: Error types and result aliases
//! - `lock`: File locking and atomic writes
//! - `output`: Human and JSON output envelopes
//! - `storage`: Key-value store backends and the task slot
//! - `task`: Task model, transition function, task store
//! - `transfer`: JSON export and validated import
//! - `ui`: Terminal UI
//! - `views`: Derived read-only projections

pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod output;
pub mod storage;
pub mod task;
pub mod transfer;
pub mod ui;
pub mod views;

pub use error::{Error, Result};
