mod support;

use predicates::str::contains;

use support::TestData;

#[test]
fn stats_on_empty_list_are_zero() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new();
    let stats = data.json(&["stats"])?;
    assert_eq!(stats["total"], 0);
    assert_eq!(stats["done"], 0);
    assert_eq!(stats["active"], 0);
    assert_eq!(stats["donePercent"], 0);
    assert!(stats["earliest"].is_null());
    Ok(())
}

#[test]
fn stats_after_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestData::new();
    data.write_file(
        "todos.json",
        r#"[{"id":"w","text":"walk dog","done":false,"createdAt":2000},{"id":"m","text":"buy milk","done":true,"createdAt":1000}]"#,
    )?;

    let stats = data.json(&["stats"])?;
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["done"], 1);
    assert_eq!(stats["active"], 1);
    assert_eq!(stats["donePercent"], 50);
    assert_eq!(stats["remaining"], 1);
    assert_eq!(stats["earliest"]["text"], "buy milk");

    data.td()
        .arg("stats")
        .assert()
        .success()
        .stdout(contains("Task stats"))
        .stdout(contains("  Done %: 50%"))
        .stdout(contains("  Oldest: buy milk (1970-01-01 00:00)"));
    Ok(())
}
