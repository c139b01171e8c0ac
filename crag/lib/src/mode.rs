//! Artifact selection: which generator plugins run for an input.

use std::fmt;

use serde::Serialize;

use crate::error::ModeError;

/// Plugins that emit the TypeScript types and the SDK client.
pub const CLIENT_PLUGINS: &[&str] = &["@hey-api/typescript", "@hey-api/sdk"];

/// Plugin that emits React Query hooks.
pub const HOOKS_PLUGINS: &[&str] = &["@tanstack/react-query"];

/// Which artifacts a generation run produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Client and hooks.
    #[default]
    ClientAndHooks,
    /// Only the TypeScript client.
    ClientOnly,
    /// Only the React Query hooks.
    HooksOnly,
}

impl GenerationMode {
    /// Derives the mode from the `--client-only` / `--hooks-only` flags.
    ///
    /// ## Errors
    ///
    /// Returns [`ModeError::ConflictingFlags`] when both flags are set.
    pub fn from_flags(client_only: bool, hooks_only: bool) -> Result<Self, ModeError> {
        match (client_only, hooks_only) {
            (false, false) => Ok(GenerationMode::ClientAndHooks),
            (true, false) => Ok(GenerationMode::ClientOnly),
            (false, true) => Ok(GenerationMode::HooksOnly),
            (true, true) => Err(ModeError::ConflictingFlags),
        }
    }

    pub fn includes_client(self) -> bool {
        !matches!(self, GenerationMode::HooksOnly)
    }

    pub fn includes_hooks(self) -> bool {
        !matches!(self, GenerationMode::ClientOnly)
    }

    /// Ordered plugin identifiers handed to the generator.
    pub fn plugins(self) -> Vec<String> {
        let client = self.includes_client().then_some(CLIENT_PLUGINS);
        let hooks = self.includes_hooks().then_some(HOOKS_PLUGINS);

        client
            .into_iter()
            .chain(hooks)
            .flatten()
            .map(|p| (*p).to_string())
            .collect()
    }

    /// Explicit switches that stop the generator from emitting client code.
    pub fn overrides(self) -> Option<GeneratorOverrides> {
        match self {
            GenerationMode::HooksOnly => Some(GeneratorOverrides::hooks_only()),
            _ => None,
        }
    }

    /// The message printed after a successful run.
    pub fn success_message(self) -> &'static str {
        match self {
            GenerationMode::ClientAndHooks => "Generated API client and React hooks",
            GenerationMode::ClientOnly => "Generated API client",
            GenerationMode::HooksOnly => "Generated React hooks",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GenerationMode::ClientAndHooks => "client + hooks",
            GenerationMode::ClientOnly => "client only",
            GenerationMode::HooksOnly => "hooks only",
        })
    }
}

/// Generator switches that suppress client, type and service output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GeneratorOverrides {
    pub client: bool,
    pub types: bool,
    pub services: bool,
}

impl GeneratorOverrides {
    pub fn hooks_only() -> Self {
        Self {
            client: false,
            types: false,
            services: false,
        }
    }
}
