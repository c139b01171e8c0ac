//! Postman collection to OpenAPI conversion.
//!
//! Collections are read from disk or fetched over HTTP, converted into an
//! [`OpenApiDocument`](crate::openapi::OpenApiDocument), and written to a
//! temporary file the external generator can read.
//!
//! ## Mapping
//!
//! - Top-level folders become tags; requests outside any folder receive the
//!   default tag (`General`).
//! - `:id` and `{{id}}` path segments become `{id}` path parameters.
//! - `{{baseUrl}}`-style hosts are expanded from collection variables.
//! - Raw JSON bodies and saved responses become examples.
//! - Collection `bearer`, `basic` and `apikey` auth become security schemes.

mod collection;
mod convert;

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

pub use collection::Collection;
pub use convert::{ConvertOptions, convert};

use crate::error::{ConversionError, PostmanError};
use crate::input::is_remote;
use crate::openapi::OpenApiDocument;

/// Reads a collection from a local path or an `http(s)` URL.
///
/// ## Errors
///
/// Returns [`PostmanError`] when the collection cannot be read, fetched or parsed.
pub async fn load_collection(location: &str) -> Result<Collection, PostmanError> {
    let contents = if is_remote(location) {
        tracing::debug!(url = location, "fetching remote collection");
        reqwest::get(location)
            .await?
            .error_for_status()?
            .text()
            .await?
    } else {
        tokio::fs::read_to_string(location).await?
    };

    Ok(serde_json::from_str(&contents)?)
}

/// Parses and converts collection JSON held in memory.
pub fn convert_str(json: &str, options: &ConvertOptions) -> Result<OpenApiDocument, PostmanError> {
    let collection: Collection = serde_json::from_str(json)?;
    convert(&collection, options)
}

/// A converted document on disk. The file is removed when this is dropped.
#[derive(Debug)]
pub struct ConvertedSpec {
    file: NamedTempFile,
    operations: usize,
}

impl ConvertedSpec {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Number of operations in the written document.
    pub fn operations(&self) -> usize {
        self.operations
    }
}

/// Writes a document as pretty JSON to a fresh temporary file.
pub fn write_document(document: &OpenApiDocument) -> Result<ConvertedSpec, PostmanError> {
    let mut file = tempfile::Builder::new()
        .prefix("crag-")
        .suffix(".openapi.json")
        .tempfile()
        .map_err(PostmanError::Write)?;

    serde_json::to_writer_pretty(&mut file, document).map_err(|e| PostmanError::Write(e.into()))?;
    file.flush().map_err(PostmanError::Write)?;

    Ok(ConvertedSpec {
        file,
        operations: document.operation_count(),
    })
}

/// Loads, converts and writes a collection in one step.
///
/// ## Errors
///
/// Any failure is wrapped in a [`ConversionError`] naming the collection.
pub async fn convert_location(
    location: &str,
    options: &ConvertOptions,
) -> Result<ConvertedSpec, ConversionError> {
    convert_to_file(location, options)
        .await
        .map_err(|cause| ConversionError::new(location, cause))
}

async fn convert_to_file(
    location: &str,
    options: &ConvertOptions,
) -> Result<ConvertedSpec, PostmanError> {
    let collection = load_collection(location).await?;
    let document = convert(&collection, options)?;
    tracing::info!(
        collection = %collection.info.name,
        operations = document.operation_count(),
        "converted Postman collection"
    );
    write_document(&document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const COLLECTION: &str = r#"{
        "info": {"name": "Pets", "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"},
        "item": [{"name": "List pets", "request": {"method": "GET", "url": "https://pets.dev/pets"}}]
    }"#;

    #[tokio::test]
    async fn converts_local_collection_to_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pets.postman_collection.json");
        std::fs::write(&path, COLLECTION).unwrap();

        let spec = convert_location(path.to_str().unwrap(), &ConvertOptions::default())
            .await
            .unwrap();

        assert_eq!(spec.operations(), 1);
        let written: OpenApiDocument =
            serde_json::from_str(&std::fs::read_to_string(spec.path()).unwrap()).unwrap();
        assert_eq!(written.info.title, "Pets");
        assert!(written.operation("get", "/pets").is_some());

        let temp_path = spec.path().to_path_buf();
        drop(spec);
        assert!(!temp_path.exists());
    }

    #[tokio::test]
    async fn fetches_remote_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/pets.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(COLLECTION))
            .mount(&server)
            .await;

        let url = format!("{}/collections/pets.json", server.uri());
        let collection = load_collection(&url).await.unwrap();

        assert_eq!(collection.info.name, "Pets");
    }

    #[tokio::test]
    async fn remote_http_errors_are_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = load_collection(&format!("{}/missing.json", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, PostmanError::Fetch(_)));
    }

    #[tokio::test]
    async fn missing_file_is_wrapped_with_context() {
        let err = convert_location("/definitely/not/here.json", &ConvertOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.collection, "/definitely/not/here.json");
        assert!(
            err.to_string()
                .starts_with("Error generating OpenAPI spec from Postman Collection")
        );
        assert!(matches!(err.cause, PostmanError::Read(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = convert_str("{\"item\": []}", &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, PostmanError::Parse(_)));
    }
}
