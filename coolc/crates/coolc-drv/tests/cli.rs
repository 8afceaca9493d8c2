//! End-to-end tests of the `coolc` binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn coolc() -> Command {
    Command::cargo_bin("coolc").unwrap()
}

#[test]
fn test_no_arguments_fails_with_usage() {
    coolc()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Usage: coolc"));
}

#[test]
fn test_missing_file_fails() {
    coolc()
        .arg("no_such_file.cl")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read no_such_file.cl"));
}

#[test]
fn test_compiles_next_to_input() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("prog.cl");
    std::fs::write(&source_path, "class Main { main(): Int { 0 }; };").unwrap();

    coolc().arg(&source_path).assert().success();

    let assembly = std::fs::read_to_string(dir.path().join("prog.s")).unwrap();
    assert!(assembly.contains("Main.main:"));
    assert!(assembly.contains("\t.globl\theap_start"));
}

#[test]
fn test_stdout_mode() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("prog.cl");
    std::fs::write(&source_path, "class Main { main(): Int { 0 }; };").unwrap();

    coolc()
        .arg("--stdout")
        .arg(&source_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Main_protObj:"));
    assert!(!dir.path().join("prog.s").exists());
}

#[test]
fn test_emit_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("prog.cl");
    std::fs::write(&source_path, "class Main { main(): Int { 0 }; };").unwrap();

    coolc()
        .arg("--emit-tokens")
        .arg(&source_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("#1 CLASS"))
        .stdout(predicate::str::contains("#1 TYPEID Main"))
        .stdout(predicate::str::starts_with("#name"));
}

#[test]
fn test_emit_ast() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("prog.cl");
    std::fs::write(&source_path, "class Main { main(): Int { 0 }; };").unwrap();

    coolc()
        .arg("--emit-ast")
        .arg(&source_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("_program"))
        .stdout(predicate::str::contains("_method"));
}

#[test]
fn test_syntax_error_exit_code_and_message() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("bad.cl");
    std::fs::write(&source_path, "class Main {").unwrap();

    coolc()
        .arg(&source_path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("syntax error at or near EOF"));
}

#[test]
fn test_semantic_error_exit_code_and_message() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("nomain.cl");
    std::fs::write(&source_path, "class Foo { };").unwrap();

    coolc()
        .arg(&source_path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::diff("Class Main is not defined.\n"));
}

#[test]
fn test_multiple_inputs_compile_independently() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.cl");
    let b = dir.path().join("b.cl");
    std::fs::write(&a, "class Main { main(): Int { 1 }; };").unwrap();
    std::fs::write(&b, "class Main { main(): Int { 2 }; };").unwrap();

    coolc().arg(&a).arg(&b).assert().success();

    assert!(dir.path().join("a.s").exists());
    assert!(dir.path().join("b.s").exists());
}

#[test]
fn test_first_failing_file_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.cl");
    let good = dir.path().join("good.cl");
    std::fs::write(&bad, "class Foo { };").unwrap();
    std::fs::write(&good, "class Main { main(): Int { 0 }; };").unwrap();

    coolc().arg(&bad).arg(&good).assert().failure().code(1);
    assert!(!dir.path().join("good.s").exists());
}
