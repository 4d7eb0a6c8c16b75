mod access;
mod analysis;
mod llm;
mod storage;

pub use access::*;
pub use analysis::*;
pub use llm::*;
pub use storage::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut push = |severity, field: &str, message: &str| {
            errors.push(ConfigError {
                severity,
                field: field.into(),
                message: message.into(),
            })
        };

        if self.llm.base_url.trim().is_empty() {
            push(ConfigSeverity::Error, "llm.base_url", "base_url must not be empty");
        } else if !self.llm.base_url.starts_with("http://")
            && !self.llm.base_url.starts_with("https://")
        {
            push(
                ConfigSeverity::Error,
                "llm.base_url",
                "base_url must start with http:// or https://",
            );
        }

        if self.llm.model.trim().is_empty() {
            push(ConfigSeverity::Error, "llm.model", "model must not be empty");
        }

        if self.llm.timeout_ms == 0 {
            push(
                ConfigSeverity::Error,
                "llm.timeout_ms",
                "timeout must be greater than 0",
            );
        }

        if self.llm.auth.key.is_some() {
            push(
                ConfigSeverity::Warning,
                "llm.auth.key",
                "plaintext key in config; prefer `config set-key` or an env var",
            );
        }

        if self.llm.auth.key.is_none() && self.llm.auth.env.is_none() {
            push(
                ConfigSeverity::Warning,
                "llm.auth",
                "no key or env configured; only a stored credential will be used",
            );
        }

        if self.storage.state_path.as_os_str().is_empty() {
            push(
                ConfigSeverity::Error,
                "storage.state_path",
                "state_path must not be empty",
            );
        }

        if self.access.enabled && self.access.secret.trim().is_empty() {
            push(
                ConfigSeverity::Error,
                "access.secret",
                "secret must not be empty while the access gate is enabled",
            );
        }

        errors
    }
}
