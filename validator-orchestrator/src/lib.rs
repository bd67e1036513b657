//! Translation Validator client - submit C++/Rust pairs and read the verdict
//!
//! This crate provides:
//! - A relay client for the IR-generation and validation endpoints
//! - A two-stage submission orchestrator with run tracking and status notifications
//! - A formatter that splits verifier reports into sections and highlights them
//! - A catalog of ready-made C++/Rust example pairs
//! - A JSON API that proxies the relay for browser front-ends

pub mod api;
pub mod catalog;
pub mod model;
pub mod orchestrator;
pub mod relay;
pub mod report;

pub use model::{FunctionHints, IrPair, Submission, ValidationResult};
pub use orchestrator::{Orchestrator, PipelineSnapshot, PipelineState};
pub use relay::{HttpRelay, RelayBackend, RelayError};
pub use report::{format_report, FormattedReport, Section};

use std::path::Path;
use thiserror::Error;

/// Environment variable that overrides the configured relay URL
pub const RELAY_URL_ENV: &str = "RELAY_URL";

/// Errors from loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Configuration for the validator client and proxy
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ValidatorConfig {
    /// Base URL of the relay in front of the validator
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    /// Maximum characters accepted per code snippet
    #[serde(default = "default_max_code_length")]
    pub max_code_length: usize,

    /// Maximum characters accepted per generated IR module
    #[serde(default = "default_max_ir_length")]
    pub max_ir_length: usize,

    /// Client-side request timeout; unset leaves timeouts to the relay
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Address the proxy server binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Function compared on the C++ side when the caller gives none
    #[serde(default)]
    pub default_cpp_function: Option<String>,

    /// Function compared on the Rust side when the caller gives none
    #[serde(default)]
    pub default_rust_function: Option<String>,
}

fn default_relay_url() -> String { "http://localhost:3001".to_string() }
fn default_max_code_length() -> usize { 10_000 }
fn default_max_ir_length() -> usize { 200_000 }
fn default_listen_addr() -> String { "0.0.0.0:3000".to_string() }

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            max_code_length: default_max_code_length(),
            max_ir_length: default_max_ir_length(),
            request_timeout_secs: None,
            listen_addr: default_listen_addr(),
            default_cpp_function: None,
            default_rust_function: None,
        }
    }
}

impl ValidatorConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Load configuration from a file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents, &display),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: display,
                source,
            }),
        }
    }

    /// Apply `RELAY_URL` from the environment, if set
    pub fn with_env_overrides(self) -> Self {
        self.with_relay_override(std::env::var(RELAY_URL_ENV).ok())
    }

    fn with_relay_override(mut self, relay_url: Option<String>) -> Self {
        if let Some(url) = relay_url.filter(|u| !u.trim().is_empty()) {
            self.relay_url = url;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ValidatorConfig::from_toml("", "inline").unwrap();
        assert_eq!(config.relay_url, "http://localhost:3001");
        assert_eq!(config.max_code_length, 10_000);
        assert_eq!(config.max_ir_length, 200_000);
        assert_eq!(config.request_timeout_secs, None);
        assert_eq!(config.listen_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_partial_config() {
        let config = ValidatorConfig::from_toml(
            "relay_url = \"http://relay:4000\"\nmax_code_length = 64\nrequest_timeout_secs = 30\n",
            "inline",
        )
        .unwrap();
        assert_eq!(config.relay_url, "http://relay:4000");
        assert_eq!(config.max_code_length, 64);
        assert_eq!(config.request_timeout_secs, Some(30));
        assert_eq!(config.max_ir_length, 200_000);
    }

    #[test]
    fn test_malformed_config_is_error() {
        let err = ValidatorConfig::from_toml("max_code_length = \"many\"", "bad.toml").unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = ValidatorConfig::load("/nonexistent/validator.toml").unwrap();
        assert_eq!(config.relay_url, "http://localhost:3001");
    }

    #[test]
    fn test_relay_override() {
        let config = ValidatorConfig::default().with_relay_override(Some("http://x:1".to_string()));
        assert_eq!(config.relay_url, "http://x:1");

        let config = ValidatorConfig::default().with_relay_override(Some("  ".to_string()));
        assert_eq!(config.relay_url, "http://localhost:3001");
    }
}
