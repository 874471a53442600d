//! Interactive terminal views

pub mod todo_viewer;
