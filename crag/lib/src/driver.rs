//! The generation loop.
//!
//! Inputs are processed strictly one after another. A failing input is logged,
//! recorded in the [`GenerationReport`] and the loop moves on; nothing short of
//! a config error stops a run.

use std::path::{Path, PathBuf};

use crate::config::CragConfig;
use crate::error::InputFailure;
use crate::generator::{CodeGenerator, GenerationRequest};
use crate::input::{InputEntry, InputKind};
use crate::mode::GenerationMode;
use crate::postman::{self, ConvertOptions};

/// Per-invocation options coming from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Overrides the configured output directory.
    pub destination: Option<PathBuf>,
    pub mode: GenerationMode,
}

/// What happened to one configured input.
#[derive(Debug)]
pub struct InputOutcome {
    /// The input's path, or a placeholder for malformed entries.
    pub input: String,
    pub output: PathBuf,
    pub result: Result<GenerationMode, InputFailure>,
}

impl InputOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a whole run, in input order.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub outcomes: Vec<InputOutcome>,
}

impl GenerationReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// True when every input generated (vacuously true for no inputs).
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &InputFailure)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.input.as_str(), e)))
    }
}

/// Drives one generator over every configured input.
#[derive(Debug)]
pub struct GenerationDriver<G> {
    config: CragConfig,
    generator: G,
}

impl<G: CodeGenerator> GenerationDriver<G> {
    pub fn new(config: CragConfig, generator: G) -> Self {
        Self { config, generator }
    }

    pub fn config(&self) -> &CragConfig {
        &self.config
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// The explicit destination if given, else the configured output.
    pub fn output_dir(&self, destination: Option<&Path>) -> PathBuf {
        destination.map_or_else(|| self.config.output.clone(), Path::to_path_buf)
    }

    /// Generates code for every input, continuing past failures.
    pub async fn run(&self, options: &GenerateOptions) -> GenerationReport {
        tracing::debug!(config = ?self.config, ?options, "starting generation");

        if self.config.input.is_empty() {
            tracing::warn!("no inputs configured, nothing to generate");
        }

        let output = self.output_dir(options.destination.as_deref());
        let mut report = GenerationReport::default();

        for entry in &self.config.input {
            let input = entry.label();
            tracing::info!(%input, output = %output.display(), mode = %options.mode, "generating");

            let result = self.generate_one(entry, &output, options.mode).await;
            match &result {
                Ok(mode) => tracing::info!(%input, "{}", mode.success_message()),
                // surfaced to the user through the report
                Err(err) => tracing::info!(%input, error = %err, "generation failed"),
            }

            report.outcomes.push(InputOutcome {
                input,
                output: output.clone(),
                result,
            });
        }

        report
    }

    async fn generate_one(
        &self,
        entry: &InputEntry,
        output: &Path,
        mode: GenerationMode,
    ) -> Result<GenerationMode, InputFailure> {
        let declaration = entry.normalize()?;

        // the converted document must outlive the generator call
        let mut converted = None;
        let input = match declaration.kind {
            InputKind::OpenApi => declaration.path.clone(),
            InputKind::Postman => {
                let options = ConvertOptions::with_default_tag(&self.config.postman.default_tag);
                let spec = postman::convert_location(&declaration.path, &options).await?;
                converted.insert(spec).path().to_string_lossy().into_owned()
            }
        };

        let request = GenerationRequest {
            input,
            output: output.to_path_buf(),
            plugins: mode.plugins(),
            config_file: self.config.generator.config_file.clone(),
            overrides: mode.overrides(),
        };

        self.generator.generate(&request).await?;
        Ok(mode)
    }
}
