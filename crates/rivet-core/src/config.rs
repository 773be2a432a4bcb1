//! Configuration file loading for rivet.
//!
//! Reads `rivet.json` from a directory and provides typed access to all settings.
//! Falls back to defaults when the file is missing or sections are incomplete; a
//! file that exists but does not parse is an error.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{DiagnosticKind, VerificationMode};

pub const CONFIG_FILE: &str = "rivet.json";
pub const DEFAULT_DOCS_URL: &str = "https://docs.rs/rivet-verify/latest/rivet_verify/diagnostics/";

/// Top-level rivet configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RivetConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub container: ContainerOptions,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
}

/// Composition behaviour toggles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerOptions {
    #[serde(default)]
    pub allow_overriding_registrations: bool,
    #[serde(default)]
    pub resolve_unregistered_concrete_types: bool,
    /// Fail strategy preparation when a consumer depends directly on a
    /// shorter-lived producer.
    #[serde(default)]
    pub enforce_lifestyle_mismatches: bool,
}

/// Container-wide diagnostic settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default)]
    pub suppress: Vec<DiagnosticKind>,
    #[serde(default = "default_docs_url")]
    pub docs_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationConfig {
    #[serde(default)]
    pub mode: VerificationMode,
}

fn default_version() -> String {
    "0.3.0".to_string()
}
fn default_docs_url() -> String {
    DEFAULT_DOCS_URL.to_string()
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            suppress: vec![],
            docs_url: default_docs_url(),
        }
    }
}

impl Default for RivetConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            container: ContainerOptions::default(),
            diagnostics: DiagnosticsConfig::default(),
            verification: VerificationConfig::default(),
        }
    }
}

impl RivetConfig {
    /// Load configuration from `rivet.json` inside the given directory.
    /// Returns defaults if the file doesn't exist.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let config_path = dir.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&config_path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %config_path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: config_path.display().to_string(),
                    source,
                })
            }
        };
        Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: config_path.display().to_string(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}
