//! Error types for the crag library.
//!
//! Configuration errors are fatal to a command. Everything else is scoped to a
//! single input and ends up in an [`InputFailure`] inside the generation report.

use std::path::PathBuf;

use thiserror::Error;

use crate::input::InputKind;

/// Errors raised while locating or parsing the project configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// None of the well-known config file names exist.
    #[error("no config file found in '{dir}' (looked for {candidates})")]
    NotFound {
        /// Directory that was searched.
        dir: PathBuf,
        /// Comma separated list of file names that were tried.
        candidates: String,
    },

    /// The config file exists but could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for the expected shape.
    #[error("failed to parse YAML config '{path}': {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file is not valid JSON for the expected shape.
    #[error("failed to parse JSON config '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Validation failures for a single input declaration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The `type` tag is not one of the recognized variants.
    #[error("unknown input type '{0}', expected \"openapi\" or \"postman\"")]
    UnknownType(String),

    /// A structured declaration without a `type` tag.
    #[error("input declaration is missing a `type`")]
    MissingType,

    /// A structured declaration without a `path`.
    #[error("{kind} input declaration is missing a `path`")]
    MissingPath { kind: InputKind },

    /// The path is present but blank.
    #[error("input path must not be empty")]
    EmptyPath,
}

/// Underlying causes of a failed Postman conversion.
#[derive(Debug, Error)]
pub enum PostmanError {
    /// The collection file could not be read.
    #[error("failed to read collection: {0}")]
    Read(#[from] std::io::Error),

    /// The remote collection could not be downloaded.
    #[error("failed to fetch collection: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The collection is not valid Postman JSON.
    #[error("failed to parse collection: {0}")]
    Parse(#[from] serde_json::Error),

    /// The collection parsed but contains no requests.
    #[error("collection '{0}' does not contain any requests")]
    Empty(String),

    /// The converted document could not be persisted for the generator.
    #[error("failed to write converted document: {0}")]
    Write(#[source] std::io::Error),
}

/// A Postman collection could not be turned into an OpenAPI document.
#[derive(Debug, Error)]
#[error("Error generating OpenAPI spec from Postman Collection '{collection}'")]
pub struct ConversionError {
    /// Location of the collection that failed.
    pub collection: String,
    #[source]
    pub cause: PostmanError,
}

impl ConversionError {
    pub(crate) fn new(collection: impl Into<String>, cause: impl Into<PostmanError>) -> Self {
        Self {
            collection: collection.into(),
            cause: cause.into(),
        }
    }
}

/// Failures reported by the external code generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The generator program could not be started.
    #[error("failed to start generator '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The generator ran but exited unsuccessfully.
    #[error("generator exited with {status}: {stderr}")]
    Failed {
        /// Human readable exit status.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },
}

/// Invalid combination of artifact selection flags.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ModeError {
    #[error("--client-only and --hooks-only cannot be used together")]
    ConflictingFlags,
}

/// Why a single input did not produce generated code.
#[derive(Debug, Error)]
pub enum InputFailure {
    #[error(transparent)]
    Invalid(#[from] InputError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Generation(#[from] GeneratorError),
}
