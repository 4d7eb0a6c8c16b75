use serde::Serialize;

/// Structured trace events emitted across all Vibe Ripper crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    AssetEncoded {
        asset: String,
        mime_type: String,
        raw_bytes: usize,
        encoded_chars: usize,
    },
    GenerationRequest {
        provider: String,
        model: String,
        kind: String,
        duration_ms: u64,
        response_chars: usize,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    ResponseRejected {
        kind: String,
        reason: String,
        detail: String,
    },
    SessionTransition {
        session_id: String,
        from: String,
        to: String,
        trigger: String,
    },
    HistoryRecorded {
        vibe_title: String,
        entries: usize,
        evicted: usize,
    },
    AccessChanged {
        granted: bool,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "vr_event");
    }
}
