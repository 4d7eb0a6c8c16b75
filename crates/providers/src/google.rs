//! Google Gemini adapter.
//!
//! Implements the Gemini `generateContent` API with inline media and a
//! declared `responseSchema`. Auth is via an API key passed as a query
//! parameter (`key={api_key}`).

use std::time::Instant;

use serde_json::Value;
use vr_domain::config::LlmConfig;
use vr_domain::error::{Error, Result};
use vr_domain::trace::TraceEvent;

use crate::auth::Credential;
use crate::traits::{GenerationBackend, GenerationRequest, GenerationResponse, Usage};
use crate::util::{from_reqwest, redact_url_key, truncate_text};

/// Longest backend diagnostic carried into an error message.
const MAX_DIAGNOSTIC_CHARS: usize = 600;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A generation backend for the Google Gemini API.
pub struct GoogleBackend {
    id: String,
    base_url: String,
    default_model: String,
    client: reqwest::Client,
}

impl GoogleBackend {
    /// Create a new backend from the deserialized LLM config.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: cfg.provider_id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            default_model: cfg.model.clone(),
            client,
        })
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn generate_url(&self, model: &str, api_key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, api_key
        )
    }
}

/// Build the `generateContent` body: media part first, then the directive,
/// with JSON output constrained to the request's schema.
pub(crate) fn build_body(req: &GenerationRequest) -> Value {
    serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [
                {
                    "inlineData": {
                        "mimeType": req.payload.mime_type,
                        "data": req.payload.data,
                    }
                },
                { "text": req.instruction },
            ],
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": req.response_schema,
        },
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response deserialization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Extract the reply text. A reply with no candidates is a backend failure;
/// a candidate with empty text is returned as-is for the parser to reject.
pub(crate) fn parse_gemini_response(
    provider: &str,
    body: &Value,
    model: &str,
) -> Result<GenerationResponse> {
    let candidate = body
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .ok_or_else(|| {
            let reason = body
                .get("promptFeedback")
                .and_then(|f| f.get("blockReason"))
                .and_then(|r| r.as_str());
            Error::Backend {
                provider: provider.into(),
                message: match reason {
                    Some(r) => format!("no candidates in response (blocked: {r})"),
                    None => "no candidates in response".into(),
                },
            }
        })?;

    let mut text = String::new();
    if let Some(parts) = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
    {
        for part in parts {
            // Thought summaries are not part of the answer document.
            if part.get("thought").and_then(|t| t.as_bool()) == Some(true) {
                continue;
            }
            if let Some(t) = part.get("text").and_then(|v| v.as_str()) {
                text.push_str(t);
            }
        }
    }

    let finish_reason = candidate
        .get("finishReason")
        .and_then(|v| v.as_str())
        .map(|s| match s {
            "STOP" => "stop".to_string(),
            "MAX_TOKENS" => "length".to_string(),
            other => other.to_lowercase(),
        });

    let usage = body.get("usageMetadata").and_then(parse_gemini_usage);

    Ok(GenerationResponse {
        text,
        model: model.to_string(),
        usage,
        finish_reason,
    })
}

fn parse_gemini_usage(v: &Value) -> Option<Usage> {
    let prompt = v.get("promptTokenCount")?.as_u64()? as u32;
    let completion = v
        .get("candidatesTokenCount")
        .and_then(|c| c.as_u64())
        .unwrap_or(0) as u32;
    let total = v
        .get("totalTokenCount")
        .and_then(|v| v.as_u64())
        .unwrap_or((prompt + completion) as u64) as u32;
    Some(Usage {
        prompt_tokens: prompt,
        completion_tokens: completion,
        total_tokens: total,
    })
}

/// Prefer the `error.message` field of a Gemini error body over the raw text.
fn error_message(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string());
    format!("HTTP {status} - {}", truncate_text(&detail, MAX_DIAGNOSTIC_CHARS))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl GenerationBackend for GoogleBackend {
    async fn generate(
        &self,
        req: &GenerationRequest,
        credential: &Credential,
    ) -> Result<GenerationResponse> {
        let model = self.default_model.clone();
        let url = self.generate_url(&model, credential.expose());
        let body = build_body(req);

        tracing::debug!(
            provider = %self.id,
            kind = %req.kind,
            url = %redact_url_key(&url),
            "google generate request"
        );

        let started = Instant::now();
        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(Error::Backend {
                provider: self.id.clone(),
                message: error_message(status.as_u16(), &resp_text),
            });
        }

        let resp_json: Value = serde_json::from_str(&resp_text).map_err(|e| Error::Backend {
            provider: self.id.clone(),
            message: format!("undecodable response envelope: {e}"),
        })?;
        let response = parse_gemini_response(&self.id, &resp_json, &model)?;

        TraceEvent::GenerationRequest {
            provider: self.id.clone(),
            model: model.clone(),
            kind: req.kind.to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
            response_chars: response.text.len(),
            prompt_tokens: response.usage.map(|u| u.prompt_tokens),
            completion_tokens: response.usage.map(|u| u.completion_tokens),
        }
        .emit();

        Ok(response)
    }

    fn provider_id(&self) -> &str {
        &self.id
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}
