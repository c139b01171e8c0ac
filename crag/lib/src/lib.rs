//! Library behind the `crag` CLI.
//!
//! Turns API descriptions (OpenAPI documents or Postman collections) into a
//! TypeScript client and React Query hooks by driving an external generator,
//! `@hey-api/openapi-ts` by default.
//!
//! ## Flow
//!
//! 1. [`CragConfig`] is loaded from `crag.config.{yaml,yml,json}`.
//! 2. Each [`InputEntry`] is normalized into an [`InputDeclaration`].
//! 3. Postman collections are converted to OpenAPI ([`postman`]).
//! 4. The [`GenerationMode`] picks the generator plugins.
//! 5. The [`GenerationDriver`] calls the [`CodeGenerator`] once per input and
//!    collects a [`GenerationReport`].
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use crag_lib::{CragConfig, ExternalGenerator, GenerateOptions, GenerationDriver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let loaded = CragConfig::load(None, Path::new("."), true)?;
//! let generator = ExternalGenerator::new(loaded.config.generator.clone());
//! let driver = GenerationDriver::new(loaded.config, generator);
//!
//! let report = driver.run(&GenerateOptions::default()).await;
//! println!("{} succeeded, {} failed", report.succeeded(), report.failed());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod generator;
pub mod input;
pub mod mode;
pub mod openapi;
pub mod postman;

pub use config::{CragConfig, GeneratorSettings, LoadedConfig, PostmanSettings};
pub use driver::{GenerateOptions, GenerationDriver, GenerationReport, InputOutcome};
pub use error::{
    ConfigError, ConversionError, GeneratorError, InputError, InputFailure, ModeError, PostmanError,
};
pub use generator::{CodeGenerator, DryRunGenerator, ExternalGenerator, GenerationRequest};
pub use input::{InputDeclaration, InputEntry, InputKind, RawDeclaration};
pub use mode::{GenerationMode, GeneratorOverrides};
