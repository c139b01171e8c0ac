//! Input declarations and their normalization.
//!
//! A project config lists API descriptions either as a bare path (shorthand for
//! an OpenAPI spec) or as a record with an explicit `type` tag:
//!
//! ```yaml
//! input:
//!   - ./specs/petstore.yaml
//!   - type: postman
//!     path: ./collections/billing.json
//! ```
//!
//! [`InputEntry::normalize`] turns either form into an [`InputDeclaration`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// The kind of API description an input points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// An OpenAPI (or Swagger) document, local or remote.
    #[serde(rename = "openapi")]
    OpenApi,
    /// A Postman collection that must be converted first.
    Postman,
}

impl InputKind {
    /// The tag used for this kind in config files.
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::OpenApi => "openapi",
            InputKind::Postman => "postman",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputKind {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openapi" => Ok(InputKind::OpenApi),
            "postman" => Ok(InputKind::Postman),
            other => Err(InputError::UnknownType(other.to_string())),
        }
    }
}

/// A structured declaration exactly as written in the config file.
///
/// Fields stay loosely typed so that one bad entry is reported against that
/// entry alone instead of rejecting the whole config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDeclaration {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// One entry of the `input` list in the project config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputEntry {
    /// A bare path, always treated as an OpenAPI document.
    Shorthand(String),
    /// A record with an explicit `type` tag.
    Declared(RawDeclaration),
}

impl InputEntry {
    /// Produces the canonical `{ type, path }` form of this entry.
    ///
    /// ## Errors
    ///
    /// Returns [`InputError`] when the `type` tag is missing or unknown, or
    /// when the path is missing or blank.
    pub fn normalize(&self) -> Result<InputDeclaration, InputError> {
        match self {
            InputEntry::Shorthand(path) => InputDeclaration::new(InputKind::OpenApi, path.clone()),
            InputEntry::Declared(raw) => {
                let kind: InputKind = raw.kind.as_deref().ok_or(InputError::MissingType)?.parse()?;
                let path = raw.path.clone().ok_or(InputError::MissingPath { kind })?;
                InputDeclaration::new(kind, path)
            }
        }
    }

    /// A short label for reports, usable even when the entry is invalid.
    pub fn label(&self) -> String {
        match self {
            InputEntry::Shorthand(path) => path.clone(),
            InputEntry::Declared(raw) => match (&raw.path, &raw.kind) {
                (Some(path), _) => path.clone(),
                (None, Some(kind)) => format!("<{kind} input without path>"),
                (None, None) => "<empty input>".to_string(),
            },
        }
    }
}

impl From<&str> for InputEntry {
    fn from(path: &str) -> Self {
        InputEntry::Shorthand(path.to_string())
    }
}

impl From<InputDeclaration> for InputEntry {
    fn from(decl: InputDeclaration) -> Self {
        InputEntry::Declared(RawDeclaration {
            kind: Some(decl.kind.as_str().to_string()),
            path: Some(decl.path),
        })
    }
}

/// A validated input: what it is and where to find it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDeclaration {
    #[serde(rename = "type")]
    pub kind: InputKind,
    pub path: String,
}

impl InputDeclaration {
    /// Builds a declaration, rejecting blank paths.
    pub fn new(kind: InputKind, path: impl Into<String>) -> Result<Self, InputError> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(InputError::EmptyPath);
        }
        Ok(Self { kind, path })
    }

    /// Whether the path is an `http(s)` URL rather than a local file.
    pub fn is_remote(&self) -> bool {
        is_remote(&self.path)
    }
}

pub(crate) fn is_remote(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}
