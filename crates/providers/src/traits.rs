use serde::{Deserialize, Serialize};
use serde_json::Value;
use vr_domain::error::Result;
use vr_domain::media::AssetPayload;

use crate::auth::Credential;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Which of the two pipeline stages a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Primary analysis: media → one visual DNA profile.
    Analysis,
    /// Variant expansion: media + locked profile → five shot variants.
    Expansion,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Expansion => "expansion",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schema-constrained, single-shot generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub kind: RequestKind,
    /// The encoded media the instruction refers to.
    pub payload: AssetPayload,
    /// Free-text directive, including guidance or DNA anchors.
    pub instruction: String,
    /// Declared output schema (Gemini `responseSchema` dialect).
    pub response_schema: Value,
}

/// Token usage reported by the backend, when available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The raw reply of one exchange. `text` is handed to the parser as-is.
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub text: String,
    /// The model that actually produced the response.
    pub model: String,
    pub usage: Option<Usage>,
    /// The reason the model stopped generating (e.g. "stop", "length").
    pub finish_reason: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core backend trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A generative backend reached through one request/response exchange.
///
/// Implementations must not retry, stream, or return partial text. The
/// credential is checked before any transport is attempted.
#[async_trait::async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Send the request and wait for the complete reply.
    async fn generate(
        &self,
        req: &GenerationRequest,
        credential: &Credential,
    ) -> Result<GenerationResponse>;

    /// A unique identifier for this backend instance.
    fn provider_id(&self) -> &str;

    /// The model used when a request carries no override.
    fn default_model(&self) -> &str;
}
