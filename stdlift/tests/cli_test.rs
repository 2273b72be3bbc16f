//! Command-line behavior of the `stdlift` binary.
#![allow(clippy::unwrap_used)]

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const LO_FILE: &str = "package a\n\nimport \"github.com/samber/lo\"\n\nfunc f(m map[string]int) []string {\n\treturn lo.Keys(m)\n}\n";

fn module(go: &str) -> Result<TempDir> {
    let temp = TempDir::new()?;
    fs::write(
        temp.path().join("go.mod"),
        format!("module example.com/m\n\ngo {go}\n"),
    )?;
    Ok(temp)
}

fn stdlift() -> Result<Command> {
    let mut cmd = Command::cargo_bin("stdlift-bin")?;
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn test_reports_findings() -> Result<()> {
    let temp = module("1.23")?;
    fs::write(temp.path().join("a.go"), LO_FILE)?;

    stdlift()?
        .arg(temp.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "a.go:6:9: github.com/samber/lo.Keys can be replaced with maps.Keys [STD001] (fixable)",
        ))
        .stdout(predicate::str::contains(
            "a.go:3:8: The github.com/samber/lo import is no longer necessary [STD003] (fixable)",
        ));
    Ok(())
}

#[test]
fn test_module_version_gates_rules() -> Result<()> {
    let temp = module("1.21")?;
    fs::write(temp.path().join("a.go"), LO_FILE)?;

    stdlift()?
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No replaceable helpers found."));
    Ok(())
}

#[test]
fn test_nested_modules_use_their_own_version() -> Result<()> {
    let temp = module("1.23")?;
    fs::write(temp.path().join("a.go"), LO_FILE)?;
    let legacy = temp.path().join("legacy");
    fs::create_dir(&legacy)?;
    fs::write(legacy.join("go.mod"), "module example.com/legacy\n\ngo 1.20\n")?;
    fs::write(legacy.join("b.go"), LO_FILE)?;

    let output = stdlift()?.arg("--json").arg(temp.path()).output()?;
    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let files: Vec<&str> = report["findings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["file"].as_str().unwrap())
        .collect();
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.ends_with("a.go")), "{files:?}");
    Ok(())
}

#[test]
fn test_fix_writes_files() -> Result<()> {
    let temp = module("1.23")?;
    let path = temp.path().join("a.go");
    fs::write(&path, LO_FILE)?;

    stdlift()?
        .arg("--fix")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 2 fixes in 1 files (0 skipped)"));

    assert_eq!(
        fs::read_to_string(&path)?,
        "package a\n\nimport \"maps\"\n\nfunc f(m map[string]int) []string {\n\treturn maps.Keys(m)\n}\n"
    );

    // A second run has nothing left to do.
    stdlift()?.arg(temp.path()).assert().success();
    Ok(())
}

#[test]
fn test_diff_prints_without_writing() -> Result<()> {
    let temp = module("1.23")?;
    let path = temp.path().join("a.go");
    fs::write(&path, LO_FILE)?;

    stdlift()?
        .arg("--diff")
        .arg(temp.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("==> "))
        .stdout(predicate::str::contains("\treturn maps.Keys(m)\n"));

    assert_eq!(fs::read_to_string(&path)?, LO_FILE);
    Ok(())
}

#[test]
fn test_config_file_is_honored() -> Result<()> {
    let temp = module("1.23")?;
    fs::write(temp.path().join("a.go"), LO_FILE)?;
    fs::write(
        temp.path().join(".stdlift.toml"),
        "[stdlift]\nignore = [\"github.com/samber/lo.Keys\"]\n",
    )?;

    stdlift()?
        .arg(temp.path())
        .assert()
        .success();
    Ok(())
}

#[test]
fn test_tests_and_vendor_are_skipped() -> Result<()> {
    let temp = module("1.23")?;
    fs::write(temp.path().join("a_test.go"), LO_FILE)?;
    let vendor = temp.path().join("vendor").join("github.com").join("x");
    fs::create_dir_all(&vendor)?;
    fs::write(vendor.join("v.go"), LO_FILE)?;

    stdlift()?.arg(temp.path()).assert().success();
    stdlift()?
        .arg("--include-tests")
        .arg(temp.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("a_test.go"));
    Ok(())
}

#[test]
fn test_parse_errors_are_reported() -> Result<()> {
    let temp = module("1.23")?;
    fs::write(temp.path().join("bad.go"), "package a\n\nfunc {\n")?;

    stdlift()?
        .arg("--json")
        .arg(temp.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"parse_errors\": 1"));
    Ok(())
}

#[test]
fn test_usage_errors() -> Result<()> {
    stdlift()?
        .arg("--fix")
        .arg("--diff")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
    stdlift()?
        .arg("does/not/exist")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does not exist"));
    Ok(())
}
