//! Integration tests for the crag CLI.
//!
//! Generation runs use `--dry-run` so no Node tooling is needed; the printed
//! generator command shows what would have been spawned.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const COLLECTION: &str = r#"{
    "info": {"name": "Shop"},
    "item": [{"name": "Orders", "item": [{"name": "List orders", "request": "https://shop.dev/orders"}]}]
}"#;

fn crag_cmd() -> Command {
    Command::cargo_bin("crag").unwrap()
}

fn project(config: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("crag.config.yaml"), config).unwrap();
    fs::write(dir.path().join("shop.postman_collection.json"), COLLECTION).unwrap();
    dir
}

#[test]
fn cli_shows_help() {
    crag_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generate TypeScript API clients"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn generate_api_help_lists_flags() {
    crag_cmd()
        .args(["generate", "api", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--path"))
        .stdout(predicate::str::contains("--destination"))
        .stdout(predicate::str::contains("--client-only"))
        .stdout(predicate::str::contains("--hooks-only"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn cli_shows_version() {
    crag_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("crag 0.1.0"));
}

#[test]
fn cli_rejects_client_only_with_hooks_only() {
    crag_cmd()
        .args(["generate", "api", "--client-only", "--hooks-only"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn missing_config_is_fatal() {
    let dir = TempDir::new().unwrap();

    crag_cmd()
        .current_dir(dir.path())
        .args(["generate", "api"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"))
        .stderr(predicate::str::contains("crag.config.yaml"));
}

#[test]
fn path_flag_works_without_config() {
    let dir = TempDir::new().unwrap();

    crag_cmd()
        .current_dir(dir.path())
        .args(["generate", "api", "--dry-run", "--client-only", "--path", "spec.yaml", "-d", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "npx --yes @hey-api/openapi-ts --input spec.yaml --output out --plugins @hey-api/typescript @hey-api/sdk",
        ))
        .stdout(predicate::str::contains("@tanstack/react-query").not())
        .stdout(predicate::str::contains("Generated API client"));
}

#[test]
fn dry_run_uses_configured_inputs_and_output() {
    let dir = project("input: ./openapi.yaml\noutput: src/api\n");

    crag_cmd()
        .current_dir(dir.path())
        .args(["generate", "api", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("openapi.yaml --output"))
        .stdout(predicate::str::contains("src/api"))
        .stdout(predicate::str::contains(
            "--plugins @hey-api/typescript @hey-api/sdk @tanstack/react-query",
        ))
        .stdout(predicate::str::contains("Generated API client and React hooks"))
        .stdout(predicate::str::contains("1 succeeded, 0 failed"));
}

#[test]
fn hooks_only_disables_client_output() {
    let dir = project("input: ./openapi.yaml\n");

    crag_cmd()
        .current_dir(dir.path())
        .args(["generate", "api", "--dry-run", "--hooks-only"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "--plugins @tanstack/react-query --client false --types false --services false",
        ))
        .stdout(predicate::str::contains("Generated React hooks"));
}

#[test]
fn explicit_config_flag_is_honoured() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("conf")).unwrap();
    fs::write(
        dir.path().join("conf/api.json"),
        r#"{"input": [{"type": "openapi", "path": "https://api.example.com/openapi.json"}]}"#,
    )
    .unwrap();

    crag_cmd()
        .current_dir(dir.path())
        .args(["--config", "conf/api.json", "generate", "api", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--input https://api.example.com/openapi.json"));
}

#[test]
fn postman_collections_are_converted_before_generation() {
    let dir = project("input:\n  - type: postman\n    path: ./shop.postman_collection.json\n");

    crag_cmd()
        .current_dir(dir.path())
        .args(["generate", "api", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".openapi.json --output"))
        .stdout(predicate::str::contains("Generated API client and React hooks"));
}

#[test]
fn failing_inputs_do_not_stop_later_ones() {
    let dir = project(
        "input:\n  - type: postman\n    path: ./missing.postman_collection.json\n  - type: swagger\n    path: ./x.yaml\n  - ./openapi.yaml\n",
    );

    crag_cmd()
        .current_dir(dir.path())
        .args(["generate", "api", "--dry-run"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error generating OpenAPI spec from Postman Collection"))
        .stderr(predicate::str::contains("unknown input type 'swagger'"))
        .stdout(predicate::str::contains("Generated API client and React hooks"))
        .stdout(predicate::str::contains("1 succeeded, 2 failed"));
}

#[test]
fn empty_input_list_succeeds() {
    let dir = project("output: gen\n");

    crag_cmd()
        .current_dir(dir.path())
        .args(["generate", "api", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No inputs configured"));
}

#[test]
fn each_failure_is_reported_once() {
    let dir = project("input:\n  - type: postman\n    path: ./missing.postman_collection.json\n");

    let output = crag_cmd()
        .current_dir(dir.path())
        .args(["generate", "api", "--dry-run"])
        .assert()
        .code(1)
        .get_output()
        .stderr
        .clone();

    let stderr = String::from_utf8(output).unwrap();
    assert_eq!(
        stderr
            .matches("Error generating OpenAPI spec from Postman Collection")
            .count(),
        1,
        "stderr: {stderr}"
    );
}

#[test]
fn dry_run_prints_one_command_per_generated_input() {
    let dir = project("input:\n  - ./a.yaml\n  - ./b.yaml\n");

    let output = crag_cmd()
        .current_dir(dir.path())
        .args(["generate", "api", "--dry-run"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    let commands: Vec<_> = stdout
        .lines()
        .filter(|line| line.starts_with("npx --yes @hey-api/openapi-ts"))
        .collect();
    assert_eq!(commands.len(), 2);
    assert!(commands[0].contains("a.yaml"));
    assert!(commands[1].contains("b.yaml"));
}
