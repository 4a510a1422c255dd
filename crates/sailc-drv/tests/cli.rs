//! End-to-end driver tests: invoke the `sailc` binary on real files and
//! check artifacts, diagnostics, and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn sailc() -> Command {
    Command::cargo_bin("sailc").expect("binary builds")
}

#[test]
fn compiles_minimal_program() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("hello.sfn");
    fs::write(&input, "fn main() -> void { print.info(\"hi\"); }").expect("write");

    sailc()
        .arg(&input)
        .arg("--compile-only")
        .assert()
        .success();

    let artifact = dir.path().join("hello.py");
    let python = fs::read_to_string(artifact).expect("artifact exists");
    assert!(python.contains("def main() -> None:"));
    assert!(python.contains("print(\"hi\")"));
}

#[test]
fn honors_explicit_output_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("prog.sfn");
    let output = dir.path().join("custom_name.py");
    fs::write(&input, "fn main() -> void { }").expect("write");

    sailc()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--compile-only")
        .assert()
        .success();

    assert!(output.exists());
}

#[test]
fn reports_parse_error_with_caret() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("bad.sfn");
    fs::write(&input, "fn main() -> void {\n  let = 1;\n}").expect("write");

    sailc()
        .arg(&input)
        .arg("--compile-only")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error["))
        .stderr(predicate::str::contains("let = 1;"))
        .stderr(predicate::str::contains("^"));
}

#[test]
fn reports_lexer_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("bad.sfn");
    fs::write(&input, "let x = \"unterminated").expect("write");

    sailc()
        .arg(&input)
        .arg("--compile-only")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unterminated string literal"));
}

#[test]
fn reports_validation_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("bad.sfn");
    fs::write(&input, "return 1;").expect("write");

    sailc()
        .arg(&input)
        .arg("--compile-only")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("'return' outside"));
}

#[test]
fn rejects_circular_imports() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("a.sfn"),
        "import { b_fn } from \"./b.sfn\";\nfn a_fn() -> void { }",
    )
    .expect("write a");
    fs::write(
        dir.path().join("b.sfn"),
        "import { a_fn } from \"./a.sfn\";\nfn b_fn() -> void { }",
    )
    .expect("write b");
    let input = dir.path().join("main.sfn");
    fs::write(&input, "import { a_fn } from \"./a.sfn\";\nfn main() -> void { a_fn(); }")
        .expect("write main");

    sailc()
        .arg(&input)
        .arg("--compile-only")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("circular import detected"));

    // No artifact is produced for the failing source
    assert!(!dir.path().join("main.py").exists());
}

#[test]
fn missing_input_fails() {
    sailc()
        .arg("/definitely/not/here.sfn")
        .arg("--compile-only")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn force_bootstrap_flag_is_accepted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("prog.sfn");
    fs::write(&input, "fn main() -> void { }").expect("write");

    sailc()
        .arg(&input)
        .arg("--compile-only")
        .arg("--force-bootstrap")
        .assert()
        .success();
}

#[test]
fn emitted_artifact_is_deterministic() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("prog.sfn");
    fs::write(
        &input,
        "fn id<T>(x -> T) -> T { return x; }\nfn main() -> void { print.info(id<number>(42)); }",
    )
    .expect("write");

    sailc().arg(&input).arg("--compile-only").assert().success();
    let first = fs::read_to_string(dir.path().join("prog.py")).expect("first");

    sailc().arg(&input).arg("--compile-only").assert().success();
    let second = fs::read_to_string(dir.path().join("prog.py")).expect("second");

    assert_eq!(first, second);
}

#[test]
fn import_embeds_dependency() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("mathlib.sfn"),
        "fn double(x: number) -> number { return x * 2; }",
    )
    .expect("write dep");
    let input = dir.path().join("main.sfn");
    fs::write(
        &input,
        "import { double } from \"./mathlib.sfn\";\nfn main() -> void { print.info(double(21)); }",
    )
    .expect("write main");

    sailc().arg(&input).arg("--compile-only").assert().success();

    let python = fs::read_to_string(dir.path().join("main.py")).expect("artifact");
    assert!(python.contains("def double(x: float) -> float:"));
    assert!(python.contains("class mathlib:"));
}
