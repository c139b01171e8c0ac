//! Project configuration.
//!
//! crag reads `crag.config.yaml`, `crag.config.yml` or `crag.config.json` from
//! the working directory (or the file passed with `--config`):
//!
//! ```yaml
//! input:
//!   - ./openapi.yaml
//!   - type: postman
//!     path: ./collections/billing.json
//! output: ./src/client
//! generator:
//!   command: npx
//!   args: ["--yes", "@hey-api/openapi-ts"]
//!   config_file: ./openapi-ts.config.ts
//! postman:
//!   default_tag: General
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;
use crate::input::{InputEntry, is_remote};

/// File names probed, in order, when no explicit config path is given.
pub const CONFIG_FILE_NAMES: [&str; 3] =
    ["crag.config.yaml", "crag.config.yml", "crag.config.json"];

const DEFAULT_OUTPUT: &str = "src/client";
const DEFAULT_TAG: &str = "General";

/// Top level configuration for `crag generate api`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CragConfig {
    /// API descriptions to generate code for, processed in order.
    #[serde(default, deserialize_with = "one_or_many")]
    pub input: Vec<InputEntry>,

    /// Default output directory, overridden by `--destination`.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    #[serde(default)]
    pub generator: GeneratorSettings,

    #[serde(default)]
    pub postman: PostmanSettings,
}

impl Default for CragConfig {
    fn default() -> Self {
        Self {
            input: Vec::new(),
            output: default_output(),
            generator: GeneratorSettings::default(),
            postman: PostmanSettings::default(),
        }
    }
}

/// How to invoke the external code generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Program to spawn.
    pub command: String,
    /// Arguments placed before the generated ones.
    pub args: Vec<String>,
    /// Generator config file handed through with `--file`.
    pub config_file: Option<PathBuf>,
    /// Extra environment for the generator process.
    pub env: BTreeMap<String, String>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            command: "npx".to_string(),
            args: vec!["--yes".to_string(), "@hey-api/openapi-ts".to_string()],
            config_file: None,
            env: BTreeMap::new(),
        }
    }
}

/// Options for Postman collection conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostmanSettings {
    /// Tag given to requests that are not inside a folder.
    pub default_tag: String,
}

impl Default for PostmanSettings {
    fn default() -> Self {
        Self {
            default_tag: DEFAULT_TAG.to_string(),
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

/// Accepts either a single entry or a list for `input`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<InputEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<InputEntry>),
        One(InputEntry),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(entries) => entries,
        OneOrMany::One(entry) => vec![entry],
    })
}

/// A parsed config together with the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: CragConfig,
    /// `None` when defaults were used because no file was required.
    pub source: Option<PathBuf>,
}

impl CragConfig {
    /// Finds the first well-known config file inside `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Reads and parses a config file, choosing the format by extension.
    ///
    /// Relative paths inside the file are rebased onto the file's directory.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config: CragConfig = if is_json {
            serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        };

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.rebased(base))
    }

    /// Loads the explicit config file, or discovers one in `cwd`.
    ///
    /// When `required` is false and nothing is found, defaults are returned
    /// with paths resolved against `cwd`.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::NotFound`] when a config is required but none
    /// exists, or any read/parse error from [`CragConfig::from_file`].
    pub fn load(
        explicit: Option<&Path>,
        cwd: &Path,
        required: bool,
    ) -> Result<LoadedConfig, ConfigError> {
        let path = match explicit {
            Some(path) => Some(if path.is_absolute() {
                path.to_path_buf()
            } else {
                cwd.join(path)
            }),
            None => Self::discover(cwd),
        };

        match path {
            Some(path) => {
                let config = Self::from_file(&path)?;
                tracing::info!(
                    config = %path.display(),
                    inputs = config.input.len(),
                    "loaded config"
                );
                Ok(LoadedConfig {
                    config,
                    source: Some(path),
                })
            }
            None if required => Err(ConfigError::NotFound {
                dir: cwd.to_path_buf(),
                candidates: CONFIG_FILE_NAMES.join(", "),
            }),
            None => {
                tracing::debug!("no config file found, using defaults");
                Ok(LoadedConfig {
                    config: CragConfig::default().rebased(cwd),
                    source: None,
                })
            }
        }
    }

    /// Resolves every relative local path against `base`.
    fn rebased(mut self, base: &Path) -> Self {
        self.output = rebase(base, &self.output);
        self.generator.config_file = self.generator.config_file.map(|p| rebase(base, &p));
        self.input = self
            .input
            .into_iter()
            .map(|entry| rebase_entry(base, entry))
            .collect();
        self
    }
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn rebase_path_str(base: &Path, path: String) -> String {
    if path.trim().is_empty() || is_remote(&path) {
        path
    } else {
        rebase(base, Path::new(&path)).to_string_lossy().into_owned()
    }
}

fn rebase_entry(base: &Path, entry: InputEntry) -> InputEntry {
    match entry {
        InputEntry::Shorthand(path) => InputEntry::Shorthand(rebase_path_str(base, path)),
        InputEntry::Declared(mut raw) => {
            raw.path = raw.path.map(|p| rebase_path_str(base, p));
            InputEntry::Declared(raw)
        }
    }
}
