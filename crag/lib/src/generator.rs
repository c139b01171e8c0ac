//! The external code generator seam.
//!
//! [`CodeGenerator`] is what the driver calls once per input. The production
//! implementation, [`ExternalGenerator`], spawns `@hey-api/openapi-ts` (or any
//! configured command) as a child process.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tokio::process::Command;

use crate::config::GeneratorSettings;
use crate::error::GeneratorError;
use crate::mode::GeneratorOverrides;

/// Everything the generator needs for one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// OpenAPI document location (path or URL).
    pub input: String,
    /// Directory that receives the generated code.
    pub output: PathBuf,
    /// Ordered plugin identifiers.
    pub plugins: Vec<String>,
    /// Generator config file, if any.
    pub config_file: Option<PathBuf>,
    /// Switches that suppress client output (hooks-only runs).
    pub overrides: Option<GeneratorOverrides>,
}

impl GenerationRequest {
    /// Command line arguments understood by `openapi-ts`.
    pub fn cli_args(&self) -> Vec<String> {
        let mut args = vec![
            "--input".to_string(),
            self.input.clone(),
            "--output".to_string(),
            self.output.to_string_lossy().into_owned(),
        ];

        if !self.plugins.is_empty() {
            args.push("--plugins".to_string());
            args.extend(self.plugins.iter().cloned());
        }

        if let Some(config_file) = &self.config_file {
            args.push("--file".to_string());
            args.push(config_file.to_string_lossy().into_owned());
        }

        if let Some(overrides) = self.overrides {
            for (flag, enabled) in [
                ("--client", overrides.client),
                ("--types", overrides.types),
                ("--services", overrides.services),
            ] {
                args.push(flag.to_string());
                args.push(enabled.to_string());
            }
        }

        args
    }
}

/// Emits code for a single OpenAPI document.
///
/// Uses native async functions in traits; implementations must be
/// `Send + Sync` so the driver can be shared across tasks.
pub trait CodeGenerator: Send + Sync {
    /// Runs the generator for one request.
    ///
    /// ## Errors
    ///
    /// Returns [`GeneratorError`] if the generator cannot run or fails.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<(), GeneratorError>> + Send;
}

/// Runs the configured generator command as a child process.
#[derive(Debug, Clone)]
pub struct ExternalGenerator {
    settings: GeneratorSettings,
}

impl ExternalGenerator {
    pub fn new(settings: GeneratorSettings) -> Self {
        Self { settings }
    }

    /// The full command line for a request, program first.
    pub fn command_line(&self, request: &GenerationRequest) -> Vec<String> {
        std::iter::once(self.settings.command.clone())
            .chain(self.settings.args.iter().cloned())
            .chain(request.cli_args())
            .collect()
    }
}

impl CodeGenerator for ExternalGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<(), GeneratorError> {
        let args = request.cli_args();
        tracing::debug!(program = %self.settings.command, ?args, "spawning generator");

        let output = Command::new(&self.settings.command)
            .args(&self.settings.args)
            .args(&args)
            .envs(&self.settings.env)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| GeneratorError::Spawn {
                program: self.settings.command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::trace!(stdout = %stdout.trim(), "generator output");
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(GeneratorError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Records the command that would run instead of running it.
#[derive(Debug)]
pub struct DryRunGenerator {
    inner: ExternalGenerator,
    planned: Mutex<Vec<Vec<String>>>,
}

impl DryRunGenerator {
    pub fn new(settings: GeneratorSettings) -> Self {
        Self {
            inner: ExternalGenerator::new(settings),
            planned: Mutex::new(Vec::new()),
        }
    }

    /// Command lines recorded so far, in call order.
    pub fn planned(&self) -> Vec<Vec<String>> {
        self.planned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CodeGenerator for DryRunGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<(), GeneratorError> {
        let command = self.inner.command_line(request);
        tracing::debug!(?command, "dry run, not spawning generator");
        self.planned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::GenerationMode;

    fn request(mode: GenerationMode) -> GenerationRequest {
        GenerationRequest {
            input: "spec.yaml".into(),
            output: PathBuf::from("out"),
            plugins: mode.plugins(),
            config_file: None,
            overrides: mode.overrides(),
        }
    }

    #[test]
    fn cli_args_for_client_and_hooks() {
        assert_eq!(
            request(GenerationMode::ClientAndHooks).cli_args(),
            vec![
                "--input",
                "spec.yaml",
                "--output",
                "out",
                "--plugins",
                "@hey-api/typescript",
                "@hey-api/sdk",
                "@tanstack/react-query",
            ]
        );
    }

    #[test]
    fn cli_args_for_hooks_only_disable_client_output() {
        let mut req = request(GenerationMode::HooksOnly);
        req.config_file = Some(PathBuf::from("openapi-ts.config.ts"));

        assert_eq!(
            req.cli_args(),
            vec![
                "--input",
                "spec.yaml",
                "--output",
                "out",
                "--plugins",
                "@tanstack/react-query",
                "--file",
                "openapi-ts.config.ts",
                "--client",
                "false",
                "--types",
                "false",
                "--services",
                "false",
            ]
        );
    }

    #[test]
    fn command_line_prefixes_program_and_args() {
        let generator = ExternalGenerator::new(GeneratorSettings::default());
        let line = generator.command_line(&request(GenerationMode::ClientOnly));
        assert_eq!(&line[..5], ["npx", "--yes", "@hey-api/openapi-ts", "--input", "spec.yaml"]);
    }

    #[tokio::test]
    async fn dry_run_records_command_lines_without_spawning() {
        let generator = DryRunGenerator::new(GeneratorSettings {
            command: "crag-test-no-such-generator".into(),
            args: vec![],
            ..GeneratorSettings::default()
        });

        generator.generate(&request(GenerationMode::ClientOnly)).await.unwrap();
        generator.generate(&request(GenerationMode::HooksOnly)).await.unwrap();

        let planned = generator.planned();
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0][..3], ["crag-test-no-such-generator", "--input", "spec.yaml"]);
        assert!(planned[1].contains(&"--client".to_string()));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let generator = ExternalGenerator::new(GeneratorSettings {
            command: "crag-test-no-such-generator".into(),
            args: vec![],
            ..GeneratorSettings::default()
        });

        let err = generator
            .generate(&request(GenerationMode::ClientOnly))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GeneratorError::Spawn { ref program, .. } if program == "crag-test-no-such-generator"
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_captures_stderr() {
        let generator = ExternalGenerator::new(GeneratorSettings {
            command: "sh".into(),
            args: vec!["-c".into(), "echo boom >&2; exit 3".into(), "sh".into()],
            ..GeneratorSettings::default()
        });

        let err = generator
            .generate(&request(GenerationMode::ClientOnly))
            .await
            .unwrap_err();

        match err {
            GeneratorError::Failed { status, stderr } => {
                assert!(status.contains('3'));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_exit_is_ok() {
        let generator = ExternalGenerator::new(GeneratorSettings {
            command: "true".into(),
            args: vec![],
            ..GeneratorSettings::default()
        });

        generator
            .generate(&request(GenerationMode::HooksOnly))
            .await
            .unwrap();
    }
}
