// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end tests for the `elm-watch` binary, driving it as a real
//! subprocess against a stub `elm` compiler on `PATH`.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

/// Writes a stub `elm` executable that always succeeds, emitting nothing on
/// stdout/stderr — enough for `install_dependencies` and a `Success` compile
/// with no postprocess step.
fn stub_elm_always_succeeds(bin_dir: &Path) {
    write_stub(bin_dir, "#!/bin/sh\nexit 0\n");
}

/// Writes a stub `elm` executable that reports one compile error via the
/// `elm make --report=json` protocol (S6-adjacent: exercising the
/// `ElmMakeErrors` rendering path end to end).
fn stub_elm_reports_compile_error(bin_dir: &Path) {
    write_stub(
        bin_dir,
        r#"#!/bin/sh
case "$*" in
  *--output=*)
    cat >&2 <<'JSON'
{"type":"compile-errors","errors":[{"path":"src/Main.elm","name":"Main","problems":[{"title":"TYPE MISMATCH","region":{"start":{"line":1,"column":1},"end":{"line":1,"column":1}},"message":["the types don't match"]}]}]}
JSON
    exit 1
    ;;
  *)
    exit 0
    ;;
esac
"#,
    );
}

fn write_stub(bin_dir: &Path, script: &str) {
    fs::create_dir_all(bin_dir).unwrap();
    let path = bin_dir.join("elm");
    fs::write(&path, script).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}

fn path_with_stub_first(bin_dir: &Path) -> std::ffi::OsString {
    let existing = std::env::var_os("PATH").unwrap_or_default();
    let mut paths = vec![bin_dir.to_path_buf()];
    paths.extend(std::env::split_paths(&existing));
    std::env::join_paths(paths).unwrap()
}

fn write_project(root: &Path, target_json: &str) {
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/Main.elm"), "module Main exposing (main)\n").unwrap();
    fs::write(
        root.join("elm-watch.json"),
        format!(r#"{{"targets":{{"main":{target_json}}}}}"#),
    )
    .unwrap();
}

#[test]
fn make_compiles_a_single_target_successfully() {
    let project = TempDir::new().unwrap();
    let bin_dir = project.path().join("bin");
    stub_elm_always_succeeds(&bin_dir);
    write_project(project.path(), r#"{"inputs":["src/Main.elm"],"output":"build/main.js"}"#);

    Command::cargo_bin("elm-watch")
        .unwrap()
        .current_dir(project.path())
        .env("PATH", path_with_stub_first(&bin_dir))
        .args(["make"])
        .assert()
        .success();
}

#[test]
fn make_reports_compile_errors_and_exits_with_compile_error_code() {
    let project = TempDir::new().unwrap();
    let bin_dir = project.path().join("bin");
    stub_elm_reports_compile_error(&bin_dir);
    write_project(project.path(), r#"{"inputs":["src/Main.elm"],"output":"build/main.js"}"#);

    let output = Command::cargo_bin("elm-watch")
        .unwrap()
        .current_dir(project.path())
        .env("PATH", path_with_stub_first(&bin_dir))
        .args(["make"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("TYPE MISMATCH"));
}

#[test]
fn make_without_an_elm_watch_json_fails_with_bad_args_code() {
    let project = TempDir::new().unwrap();

    Command::cargo_bin("elm-watch")
        .unwrap()
        .current_dir(project.path())
        .args(["make"])
        .assert()
        .code(2);
}

#[test]
fn make_rejects_combining_debug_and_optimize() {
    let project = TempDir::new().unwrap();
    write_project(project.path(), r#"{"inputs":["src/Main.elm"],"output":"build/main.js"}"#);

    Command::cargo_bin("elm-watch")
        .unwrap()
        .current_dir(project.path())
        .args(["make", "--debug", "--optimize"])
        .assert()
        .code(2);
}

#[test]
fn make_typechecks_a_target_with_no_output_path() {
    let project = TempDir::new().unwrap();
    let bin_dir = project.path().join("bin");
    stub_elm_always_succeeds(&bin_dir);
    write_project(project.path(), r#"{"inputs":["src/Main.elm"]}"#);

    Command::cargo_bin("elm-watch")
        .unwrap()
        .current_dir(project.path())
        .env("PATH", path_with_stub_first(&bin_dir))
        .args(["make"])
        .assert()
        .success();
}
