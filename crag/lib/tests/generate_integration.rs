//! End-to-end tests for the generation pipeline.
//!
//! A small shell script stands in for `openapi-ts`: it copies the input
//! document into the output directory and appends its arguments to
//! `invocations.txt`, which lets the tests inspect exactly what the generator
//! received.
#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use crag_lib::openapi::OpenApiDocument;
use crag_lib::{
    CragConfig, ExternalGenerator, GenerateOptions, GenerationDriver, GenerationMode, InputFailure,
};
use tempfile::TempDir;

const FAKE_GENERATOR: &str = r#"out="$4"; mkdir -p "$out" && cp "$2" "$out/" && echo "$@" >> "$out/invocations.txt""#;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Creates a project directory holding the fixtures and a config listing `inputs`.
fn project(inputs: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in ["openapi.yaml", "petstore.postman_collection.json"] {
        fs::copy(fixtures().join(name), dir.path().join(name)).unwrap();
    }

    let config = format!(
        "input:\n{inputs}\noutput: generated\ngenerator:\n  command: sh\n  args: ['-c', '{script}', 'sh']\n",
        script = FAKE_GENERATOR.replace('\'', "''"),
    );
    fs::write(dir.path().join("crag.config.yaml"), config).unwrap();
    dir
}

fn driver_for(dir: &TempDir) -> GenerationDriver<ExternalGenerator> {
    let loaded = CragConfig::load(None, dir.path(), true).unwrap();
    let generator = ExternalGenerator::new(loaded.config.generator.clone());
    GenerationDriver::new(loaded.config, generator)
}

fn invocations(dir: &TempDir) -> Vec<String> {
    fs::read_to_string(dir.path().join("generated/invocations.txt"))
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

#[tokio::test]
async fn generates_from_openapi_and_postman_inputs() {
    let dir = project(
        "  - ./openapi.yaml\n  - type: postman\n    path: ./petstore.postman_collection.json",
    );
    let driver = driver_for(&dir);

    let report = driver.run(&GenerateOptions::default()).await;

    assert!(
        report.is_success(),
        "failures: {:?}",
        report.failures().collect::<Vec<_>>()
    );
    assert_eq!(report.succeeded(), 2);

    let generated = dir.path().join("generated");
    assert!(generated.join("openapi.yaml").is_file());

    let calls = invocations(&dir);
    assert_eq!(calls.len(), 2);
    assert!(calls[0].contains("--plugins @hey-api/typescript @hey-api/sdk @tanstack/react-query"));

    let converted = fs::read_dir(&generated)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .find(|path| path.to_string_lossy().ends_with(".openapi.json"))
        .expect("converted Postman document was handed to the generator");
    let doc: OpenApiDocument =
        serde_json::from_str(&fs::read_to_string(converted).unwrap()).unwrap();

    assert_eq!(doc.info.title, "Petstore");
    assert_eq!(doc.info.version, "2.0.1");
    assert_eq!(doc.servers[0].url, "https://petstore.example.com");
    assert_eq!(doc.operation_count(), 4);
    assert_eq!(doc.operation("get", "/api/health").unwrap().tags, vec!["General"]);
    assert_eq!(doc.operation("post", "/api/pets").unwrap().tags, vec!["Pets"]);

    let get_pet = doc.operation("get", "/api/pets/{petId}").unwrap();
    assert_eq!(get_pet.parameters[0].name, "petId");
    assert!(get_pet.parameters[0].required);

    let list = doc.operation("get", "/api/pets").unwrap();
    assert_eq!(list.parameters.len(), 1, "Accept header is not a parameter");
    assert_eq!(list.parameters[0].name, "limit");

    assert!(doc.components.unwrap().security_schemes.contains_key("bearerAuth"));
}

#[tokio::test]
async fn failed_conversion_does_not_abort_following_inputs() {
    let dir = project(
        "  - type: postman\n    path: ./missing.postman_collection.json\n  - ./openapi.yaml",
    );
    let driver = driver_for(&dir);

    let report = driver.run(&GenerateOptions::default()).await;

    assert_eq!(report.failed(), 1);
    assert_eq!(report.succeeded(), 1);

    let (input, failure) = report.failures().next().unwrap();
    assert!(input.ends_with("missing.postman_collection.json"));
    assert!(matches!(failure, InputFailure::Conversion(_)));
    assert!(
        failure
            .to_string()
            .starts_with("Error generating OpenAPI spec from Postman Collection")
    );

    assert!(dir.path().join("generated/openapi.yaml").is_file());
    assert_eq!(invocations(&dir).len(), 1);
}

#[tokio::test]
async fn hooks_only_and_destination_reach_the_generator() {
    let dir = project("  - ./openapi.yaml");
    let driver = driver_for(&dir);
    let destination = dir.path().join("hooks");

    let options = GenerateOptions {
        destination: Some(destination.clone()),
        mode: GenerationMode::HooksOnly,
    };
    let report = driver.run(&options).await;

    assert!(report.is_success());
    assert!(destination.join("openapi.yaml").is_file());

    let calls = fs::read_to_string(destination.join("invocations.txt")).unwrap();
    assert!(calls.contains(
        "--plugins @tanstack/react-query --client false --types false --services false"
    ));
    assert!(!calls.contains("@hey-api/sdk"));
}

#[tokio::test]
async fn failing_generator_is_reported_per_input() {
    let dir = project("  - ./openapi.yaml\n  - ./does-not-exist.yaml");
    let driver = driver_for(&dir);

    let report = driver.run(&GenerateOptions::default()).await;

    assert_eq!(report.succeeded(), 1);
    let (input, failure) = report.failures().next().unwrap();
    assert!(input.ends_with("does-not-exist.yaml"));
    assert!(matches!(failure, InputFailure::Generation(_)));
}
