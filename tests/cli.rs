mod util;

use std::fs;

use tempfile::tempdir;
use util::{run, run_expect_failure, run_in};

#[test]
fn eval_prints_display_and_type() {
    let stdout = run(&["eval", "--bind", "3", "--bind", "1", "x0 + x1"]);
    assert_eq!(stdout, "4\nint\n");
}

#[test]
fn eval_accepts_typed_bindings() {
    let stdout = run(&["eval", "--bind", "str:foo", "--bind", "int:1", "x0 + x1"]);
    assert_eq!(stdout, "foo1\ndata\n");
    let stdout = run(&["eval", "--bind", "null", "x0 + x0"]);
    assert_eq!(stdout, "\nundef\n");
}

#[test]
fn eval_json_output() {
    let stdout = run(&["eval", "--json", "--bind", "'abcd'", "--bind", "'bc'", "x0 - x1"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(parsed["display"], "ad");
    assert_eq!(parsed["type"], "data");
}

#[test]
fn eval_expression_starting_with_minus() {
    assert_eq!(run(&["eval", "-5 / 0"]), "0\nint\n");
}

#[test]
fn script_prints_generated_oracle_script() {
    let stdout = run(&["script", "--bind", "3", "--bind", "null", "x0 + x1"]);
    assert_eq!(
        stdout,
        "x0 = 3;\nx1 = NULL;\ndisplay(x0 + x1);\ndisplay('\\n' + typeof(x0 + x1));\n"
    );
}

#[test]
fn unsupported_operation_fails_with_code() {
    let output = run_expect_failure(&["eval", "make_list(1) + 1"]);
    assert!(
        output.stderr.contains("E003"),
        "expected E003 in stderr, got {}",
        output.stderr
    );
}

#[test]
fn invalid_binding_is_rejected() {
    let output = run_expect_failure(&["eval", "--bind", "int:zz", "x0"]);
    assert!(output.stderr.contains("int:zz"), "stderr: {}", output.stderr);
}

#[test]
fn config_reads_explicit_file() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("oracle.toml");
    fs::write(&path, "nasl_binary = \"/opt/nasl\"\n").expect("write config");
    let stdout = run_in(
        &["config", "--config", path.to_str().expect("utf-8 path")],
        dir.path(),
    );
    assert!(stdout.contains("nasl_binary = \"/opt/nasl\""), "{stdout}");
    assert!(stdout.contains("redis_binary = \"redis-server\""), "{stdout}");
}

#[test]
fn check_without_reference_tools_fails() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("oracle.toml");
    fs::write(&path, "redis_binary = \"/nonexistent/redis-server\"\n").expect("write config");
    let output = run_expect_failure(&[
        "check",
        "--config",
        path.to_str().expect("utf-8 path"),
        "1 + 1",
    ]);
    assert!(output.stderr.contains("cross-check failed"), "{}", output.stderr);
}
