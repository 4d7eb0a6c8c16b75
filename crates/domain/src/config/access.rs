use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Access gate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cosmetic entry gate. Not a security boundary: the secret sits in
/// plain config and the flag in plain state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default = "d_true")]
    pub enabled: bool,
    #[serde(default = "d_secret")]
    pub secret: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret: d_secret(),
        }
    }
}

fn d_true() -> bool {
    true
}
fn d_secret() -> String {
    "PHANTOM_RIPPER_2025".into()
}
