mod support;

use std::fs;

use predicates::str::contains;
use serde_json::{json, Value};

use support::TestData;

#[test]
fn export_to_stdout_is_bare_array() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new();
    data.add("buy milk")?;

    for args in [vec!["export"], vec!["--json", "export", "-"]] {
        let output = data.td().args(&args).output()?;
        assert!(output.status.success());
        let exported: Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(exported, data.slot_tasks()?);
    }
    Ok(())
}

#[test]
fn export_to_file_then_import_elsewhere() -> Result<(), Box<dyn std::error::Error>> {
    let source = TestData::new();
    source.add("one")?;
    source.add("two")?;
    let backup = source.path().join("backup.json");
    let backup_arg = backup.to_str().ok_or("non-utf8 path")?;

    let out = source.json(&["export", backup_arg])?;
    assert_eq!(out["tasks"], 2);
    let exported = fs::read_to_string(&backup)?;
    assert!(exported.contains("\n  {"));

    let target = TestData::new();
    target.add("will be replaced")?;
    let out = target.json(&["import", backup_arg])?;
    assert_eq!(out["tasks"], 2);
    assert_eq!(out["replaced"], 1);
    assert_eq!(target.slot_tasks()?, source.slot_tasks()?);
    Ok(())
}

#[test]
fn import_single_task_replaces_everything() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new();
    data.add("old")?;
    let file = data.write_file(
        "incoming.json",
        r#"[{"id":"x","text":"a","done":true,"createdAt":1}]"#,
    )?;

    data.td()
        .args(["import", file.to_str().ok_or("non-utf8 path")?])
        .assert()
        .success()
        .stdout(contains("Tasks imported"));

    let expected = json!([{"id": "x", "text": "a", "done": true, "createdAt": 1}]);
    assert_eq!(data.slot_tasks()?, expected);
    assert_eq!(data.json(&["list"])?["tasks"], expected);
    Ok(())
}

#[test]
fn import_of_non_array_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new();
    data.add("keep me")?;
    let before = data.read_slot();
    let file = data.write_file("bad.json", r#"{"not":"an array"}"#)?;
    let file_arg = file.to_str().ok_or("non-utf8 path")?;

    data.td()
        .args(["import", file_arg])
        .assert()
        .code(2)
        .stderr(contains("Import rejected"))
        .stderr(contains("hint: run `td export`"));

    let output = data.td().args(["--json", "import", file_arg]).output()?;
    assert_eq!(output.status.code(), Some(2));
    let envelope: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(envelope["status"], "error");
    assert_eq!(envelope["command"], "import");
    assert_eq!(envelope["error"]["kind"], "user_error");
    assert_eq!(envelope["error"]["code"], 2);

    assert_eq!(data.read_slot(), before);
    Ok(())
}

#[test]
fn import_of_blank_text_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new();
    data.add("keep me")?;
    let before = data.read_slot();

    data.td()
        .args(["import", "-"])
        .write_stdin(r#"[{"id":"b","text":"  ","done":false,"createdAt":1}]"#)
        .assert()
        .code(2)
        .stderr(contains("item 0 has empty text"));

    assert_eq!(data.read_slot(), before);
    Ok(())
}

#[test]
fn import_from_stdin() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new();
    data.td()
        .args(["import", "-"])
        .write_stdin(r#"[{"id":"s1","text":"piped","done":false,"createdAt":7}]"#)
        .assert()
        .success();
    assert_eq!(data.slot_tasks()?[0]["text"], "piped");
    Ok(())
}

#[test]
fn missing_import_file_is_operation_failure() {
    let data = TestData::new();
    data.td()
        .args(["import", "does-not-exist.json"])
        .assert()
        .code(4);
}

#[test]
fn reset_requires_confirmation() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new();
    data.add("precious")?;

    data.td()
        .arg("reset")
        .assert()
        .code(2)
        .stderr(contains("--yes"));
    assert!(data.read_slot().is_some());

    let out = data.json(&["reset", "--yes"])?;
    assert_eq!(out["removed"], 1);
    assert!(data.read_slot().is_none());
    assert_eq!(data.json(&["list"])?["total"], 0);
    Ok(())
}
