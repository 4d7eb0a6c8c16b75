use vr_domain::config::{Config, ConfigSeverity};

#[test]
fn default_backend_is_gemini() {
    let config = Config::default();
    assert_eq!(config.llm.provider_id, "google");
    assert_eq!(config.llm.model, "gemini-3-flash-preview");
    assert_eq!(
        config.llm.base_url,
        "https://generativelanguage.googleapis.com"
    );
}

#[test]
fn default_access_gate_is_enabled() {
    let config = Config::default();
    assert!(config.access.enabled);
    assert_eq!(config.access.secret, "PHANTOM_RIPPER_2025");
}

#[test]
fn default_guidance_is_cinematic_breakdown() {
    let config = Config::default();
    assert_eq!(
        config.analysis.default_guidance,
        "Provide a professional cinematic breakdown."
    );
}

#[test]
fn partial_toml_keeps_other_defaults() {
    let toml_str = r#"
[llm]
model = "gemini-2.5-pro"

[storage]
state_path = "/var/lib/vibe-ripper"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.llm.model, "gemini-2.5-pro");
    assert_eq!(config.llm.timeout_ms, 120_000);
    assert_eq!(
        config.storage.state_path.to_str(),
        Some("/var/lib/vibe-ripper")
    );
    assert!(config.access.enabled);
}

#[test]
fn access_gate_can_be_disabled() {
    let toml_str = r#"
[access]
enabled = false
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(!config.access.enabled);
}

#[test]
fn defaults_validate_clean() {
    assert!(Config::default().validate().is_empty());
}

#[test]
fn validation_flags_bad_backend_settings() {
    let toml_str = r#"
[llm]
base_url = "generativelanguage.googleapis.com"
model = ""
timeout_ms = 0
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
    assert!(fields.contains(&"llm.base_url"));
    assert!(fields.contains(&"llm.model"));
    assert!(fields.contains(&"llm.timeout_ms"));
    assert!(issues.iter().all(|i| i.severity == ConfigSeverity::Error));
}

#[test]
fn plaintext_key_is_a_warning() {
    let toml_str = r#"
[llm.auth]
key = "AIza-test"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, ConfigSeverity::Warning);
    assert_eq!(issues[0].field, "llm.auth.key");
}
