#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A scratch data directory for one test.
pub struct TestData {
    dir: TempDir,
}

impl TestData {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn slot_path(&self) -> PathBuf {
        self.dir.path().join("todos.json")
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file("config.toml", contents)
    }

    pub fn read_slot(&self) -> Option<String> {
        fs::read_to_string(self.slot_path()).ok()
    }

    pub fn slot_tasks(&self) -> Result<Value, Box<dyn std::error::Error>> {
        let raw = fs::read_to_string(self.slot_path())?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// `td` pointed at this data directory.
    pub fn td(&self) -> Command {
        let mut cmd = td_cmd();
        cmd.env("TD_DATA_DIR", self.dir.path());
        cmd
    }

    /// Run `td --json <args>` and return the envelope's `data`.
    pub fn json(&self, args: &[&str]) -> Result<Value, Box<dyn std::error::Error>> {
        let output = self.td().arg("--json").args(args).output()?;
        if !output.status.success() {
            return Err(format!(
                "td {:?} failed: {}",
                args,
                String::from_utf8_lossy(&output.stdout)
            )
            .into());
        }
        let envelope: Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(envelope["schema_version"], "td.v1");
        assert_eq!(envelope["status"], "success");
        Ok(envelope["data"].clone())
    }

    /// Add a task and return its id.
    pub fn add(&self, text: &str) -> Result<String, Box<dyn std::error::Error>> {
        let data = self.json(&["add", text])?;
        data["task"]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| "add returned no task id".into())
    }
}

pub fn td_cmd() -> Command {
    let mut cmd = Command::cargo_bin("td").expect("binary");
    cmd.env_remove("TD_DATA_DIR");
    cmd.env_remove("RUST_LOG");
    cmd
}
