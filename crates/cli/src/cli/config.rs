use serde_json::Value;

use vr_domain::config::{Config, ConfigSeverity};
use vr_providers::{resolve_credential, Credential};
use vr_studio::{Slot, StateStore};

/// Parse and validate the config, printing any issues.
///
/// Returns `false` when errors are found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!(
        "\n{} error(s), {} warning(s) in {config_path}",
        error_count, warning_count,
    );

    error_count == 0
}

/// Dump the resolved config as TOML with secrets masked, followed by the
/// credential status.
pub fn show(config: &Config, store: &dyn StateStore) -> anyhow::Result<()> {
    print!("{}", render(config)?);

    let stored = stored_key(store)?;
    match resolve_credential(stored.as_deref(), &config.llm.auth) {
        Ok(cred) => {
            let source = if stored.as_deref().and_then(Credential::new).is_some() {
                "state file"
            } else if config.llm.auth.key.is_some() {
                "config"
            } else {
                "environment"
            };
            println!("\n# credential: linked ({}, from {source})", cred.masked());
        }
        Err(_) => println!("\n# credential: not linked"),
    }
    Ok(())
}

/// Resolved config as TOML with `llm.auth.key` and `access.secret` masked.
pub fn render(config: &Config) -> anyhow::Result<String> {
    let mut masked = config.clone();
    masked.llm.auth.key = masked
        .llm
        .auth
        .key
        .as_deref()
        .and_then(Credential::new)
        .map(|c| c.masked());
    masked.access.secret = "****".into();
    Ok(toml::to_string_pretty(&masked)?)
}

pub fn set_key(store: &dyn StateStore, key: &str) -> anyhow::Result<()> {
    let Some(cred) = Credential::new(key) else {
        anyhow::bail!("API key must not be blank");
    };
    store.write(Slot::Credential, Value::String(cred.expose().to_string()))?;
    println!("API key stored ({})", cred.masked());
    Ok(())
}

pub fn clear_key(store: &dyn StateStore) -> anyhow::Result<()> {
    store.erase(Slot::Credential)?;
    println!("API key cleared");
    Ok(())
}

fn stored_key(store: &dyn StateStore) -> anyhow::Result<Option<String>> {
    Ok(match store.read(Slot::Credential)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}
