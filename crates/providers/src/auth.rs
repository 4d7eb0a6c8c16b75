//! Backend credential resolution.
//!
//! A [`Credential`] is resolved once per request from, in order:
//! 1. the credential stored through the settings panel (`config set-key`)
//! 2. the plaintext `key` in [`AuthConfig`] (warns)
//! 3. the environment variable named by `auth.env`
//!
//! Blank values at any step are treated as absent.

use vr_domain::config::AuthConfig;
use vr_domain::error::{Error, Result};

/// An API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// `None` when the value is blank.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Masked form for display: first four characters, then asterisks.
    pub fn masked(&self) -> String {
        let head: String = self.0.chars().take(4).collect();
        format!("{head}****")
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential").field(&"[REDACTED]").finish()
    }
}

/// Resolve the credential for the next request.
///
/// Fails with [`Error::Configuration`] when no source yields a key; the
/// message tells the user how to configure one.
pub fn resolve_credential(stored: Option<&str>, auth: &AuthConfig) -> Result<Credential> {
    // 1. Stored through the settings panel
    if let Some(cred) = stored.and_then(Credential::new) {
        return Ok(cred);
    }

    // 2. Plaintext key (warn the user)
    if let Some(cred) = auth.key.as_deref().and_then(Credential::new) {
        tracing::warn!(
            "API key loaded from plaintext config field 'key'; \
             prefer `config set-key` or 'env' instead"
        );
        return Ok(cred);
    }

    // 3. Env var
    if let Some(ref env_var) = auth.env {
        if let Some(cred) = std::env::var(env_var).ok().and_then(Credential::new) {
            return Ok(cred);
        }
    }

    Err(Error::Configuration(match auth.env {
        Some(ref env_var) => format!(
            "API key missing: run `vibe-ripper config set-key <KEY>` or set {env_var}"
        ),
        None => "API key missing: run `vibe-ripper config set-key <KEY>`".into(),
    }))
}
