//! CLI integration tests
//!
//! These tests run the `xmltool` binary against the files in `tests/fixtures`.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn xmltool() -> Command {
    let mut cmd = Command::cargo_bin("xmltool").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

// ============================================================================
// chk
// ============================================================================

#[test]
fn test_chk_valid_document() {
    xmltool()
        .arg("chk")
        .arg(fixture("library.xsd"))
        .arg(fixture("library.xml"))
        .assert()
        .success()
        .stdout("XML Schema valid!\n")
        .stderr("");
}

#[test]
fn test_chk_invalid_document() {
    xmltool()
        .arg("chk")
        .arg(fixture("library.xsd"))
        .arg(fixture("library_invalid.xml"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("XML Schema valid!").not())
        .stderr(predicate::str::contains("978-0441013593"))
        .stderr(predicate::str::contains("validation failed").not());
}

#[test]
fn test_chk_verbose_shows_summary() {
    xmltool()
        .args(["chk", "-v"])
        .arg(fixture("library.xsd"))
        .arg(fixture("library_invalid.xml"))
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("validation failed\n"))
        .stderr(predicate::str::contains("'-1'"));
}

#[test]
fn test_chk_debug_echo() {
    let schema = fixture("library.xsd");
    xmltool()
        .args(["chk", "-vv"])
        .arg(&schema)
        .arg(fixture("library.xml"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("CheckParams {"))
        .stdout(predicate::str::contains(format!("Schema: {}\n", schema.display())))
        .stdout(predicate::str::ends_with("XML Schema valid!\n"));
}

#[test]
fn test_chk_undeclared_root() {
    xmltool()
        .arg("chk")
        .arg(fixture("library.xsd"))
        .arg(fixture("catalog.xml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("is not an element of the schema"));
}

#[test]
fn test_chk_missing_schema() {
    xmltool()
        .args(["chk", "-v"])
        .arg(fixture("absent.xsd"))
        .arg(fixture("library.xml"))
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("XML Schema load failed.\n"))
        .stderr(predicate::str::contains("absent.xsd"));
}

// ============================================================================
// json / yaml
// ============================================================================

#[test]
fn test_json_export() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("library.json");

    xmltool()
        .arg("json")
        .arg(fixture("library.xsd"))
        .arg(fixture("library.xml"))
        .arg(&output)
        .assert()
        .success()
        .stdout("")
        .stderr("");

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("{\n    \"@xmlns\": \"urn:example:library\",\n    \"@name\": \"City\","));
    assert!(!text.ends_with('\n'));

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let books = value["book"].as_array().unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0]["@isbn"], "9780441013593");
    assert_eq!(books[0]["@available"], true);
    assert_eq!(books[0]["title"], "Dune");
    assert_eq!(books[0]["author"], serde_json::json!(["Frank Herbert"]));
    assert_eq!(books[0]["pages"], 412);
    assert_eq!(books[1]["@available"], false);
    assert!(books[1].get("year").is_none());
}

#[test]
fn test_json_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("library.json");
    fs::write(&output, "{}").unwrap();

    xmltool()
        .arg("json")
        .arg(fixture("library.xsd"))
        .arg(fixture("library.xml"))
        .arg(&output)
        .assert()
        .code(1)
        .stderr(format!("cannot overwrite {}\n", output.display()));

    assert_eq!(fs::read_to_string(&output).unwrap(), "{}");
}

#[test]
fn test_json_overwrite_flag() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("library.json");
    fs::write(&output, "{}").unwrap();

    xmltool()
        .args(["json", "-o", "-v"])
        .arg(fixture("library.xsd"))
        .arg(fixture("library.xml"))
        .arg(&output)
        .assert()
        .success()
        .stderr(format!("overwriting {}\n", output.display()));

    assert!(fs::read_to_string(&output).unwrap().contains("\"Dune\""));
}

#[test]
fn test_json_overwrite_warning_needs_verbose() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("library.json");
    fs::write(&output, "{}").unwrap();

    xmltool()
        .args(["json", "--overwrite"])
        .arg(fixture("library.xsd"))
        .arg(fixture("library.xml"))
        .arg(&output)
        .assert()
        .success()
        .stderr("");
}

#[test]
fn test_json_invalid_document_still_converts() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("invalid.json");

    xmltool()
        .args(["json", "-v"])
        .arg(fixture("library.xsd"))
        .arg(fixture("library_invalid.xml"))
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("978-0441013593"));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(value["book"][0]["@isbn"], "978-0441013593");
    assert_eq!(value["book"][0]["pages"], "-1");
}

#[test]
fn test_json_undeclared_root_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("catalog.json");

    xmltool()
        .arg("json")
        .arg(fixture("library.xsd"))
        .arg(fixture("catalog.xml"))
        .arg(&output)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'catalog' is not an element of the schema"));

    assert!(!output.exists());
}

#[test]
fn test_yaml_export() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("library.yaml");

    xmltool()
        .arg("yaml")
        .arg(fixture("library.xsd"))
        .arg(fixture("library.xml"))
        .arg(&output)
        .assert()
        .success();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("'@name': City\nbook:\n- '@isbn': '9780441013593'\n"));
    assert!(text.contains("  title: Dune\n"));
    assert!(text.contains("  pages: 412\n"));
}

// ============================================================================
// Usage
// ============================================================================

#[test]
fn test_missing_arguments() {
    xmltool()
        .args(["json", "schema.xsd"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_unknown_subcommand() {
    xmltool().arg("inspect").assert().code(2);
}

#[test]
fn test_version() {
    xmltool()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("xmltool "));
}
