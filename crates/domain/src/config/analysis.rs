use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Analysis prompts
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Guidance sent when the user supplies none.
    #[serde(default = "d_guidance")]
    pub default_guidance: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_guidance: d_guidance(),
        }
    }
}

fn d_guidance() -> String {
    "Provide a professional cinematic breakdown.".into()
}
