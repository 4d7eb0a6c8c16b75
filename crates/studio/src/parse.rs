//! Strict parsing of backend replies.
//!
//! A reply is accepted whole or not at all: the text must be one JSON
//! document, every required field must be present and non-blank, and a
//! variant reply must hold exactly [`SHOT_COUNT`] distinct shots.

use serde::Deserialize;
use serde_json::Value;

use vr_domain::error::{Error, Result, ValidationFailure};
use vr_domain::profile::{ShotSet, ShotVariant, TechnicalSpecs, VisualDnaProfile, SHOT_COUNT};
use vr_domain::trace::TraceEvent;
use vr_providers::RequestKind;

/// A validated reply of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Profile(VisualDnaProfile),
    Variants(ShotSet),
}

pub fn parse(raw: &str, kind: RequestKind) -> Result<Parsed> {
    match kind {
        RequestKind::Analysis => parse_profile(raw).map(Parsed::Profile),
        RequestKind::Expansion => parse_variants(raw).map(Parsed::Variants),
    }
}

/// Parse a primary analysis reply.
///
/// A `variants` field in the reply is ignored: variants only ever come
/// from an expansion.
pub fn parse_profile(raw: &str) -> Result<VisualDnaProfile> {
    let kind = RequestKind::Analysis;
    let doc = document(raw, kind)?;

    let mut fields = match doc {
        Value::Object(fields) => fields,
        other => {
            return Err(reject(kind, schema(format!("expected an object, got {}", type_name(&other)))))
        }
    };
    fields.remove("variants");
    fields.retain(|_, v| !v.is_null());
    drop_mistyped_optionals(&mut fields, PROFILE_OPTIONAL_TEXT);
    if fields.get("duration_seconds").is_some_and(|v| !v.is_number()) {
        fields.remove("duration_seconds");
    }
    match fields.remove("tags") {
        Some(Value::Array(mut tags)) => {
            tags.retain(Value::is_string);
            fields.insert("tags".into(), Value::Array(tags));
        }
        Some(_) | None => {}
    }

    let mut profile: VisualDnaProfile = serde_json::from_value(Value::Object(fields))
        .map_err(|e| reject(kind, schema(e.to_string())))?;

    if let Some(field) = profile.missing_required() {
        return Err(reject(kind, schema(format!("required field '{field}' is blank"))));
    }

    profile.plot_points.retain(|p| !p.trim().is_empty());
    dedup_tags(&mut profile.tags);
    Ok(profile)
}

/// Parse a variant expansion reply into a [`ShotSet`].
pub fn parse_variants(raw: &str) -> Result<ShotSet> {
    let kind = RequestKind::Expansion;
    let doc = document(raw, kind)?;

    let items = match doc {
        Value::Array(items) => items,
        other => {
            return Err(reject(kind, schema(format!("expected an array, got {}", type_name(&other)))))
        }
    };
    if items.len() != SHOT_COUNT {
        return Err(reject(
            kind,
            schema(format!("expected {SHOT_COUNT} shot variants, got {}", items.len())),
        ));
    }

    let shots = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| shot(i, item))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|detail| reject(kind, schema(detail)))?;

    ShotSet::new(shots).map_err(|e| reject(kind, schema(e.to_string())))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Wire shape of one shot; `shot_number` is declared as a JSON number and
/// may arrive as `3.0`.
#[derive(Deserialize)]
struct RawShot {
    shot_number: f64,
    vibe_title: String,
    #[serde(default)]
    action_focus: Option<String>,
    main_prompt: String,
    #[serde(default)]
    negative_prompt: Option<String>,
    technical_specs: TechnicalSpecs,
}

fn shot(index: usize, mut item: Value) -> std::result::Result<ShotVariant, String> {
    if let Value::Object(fields) = &mut item {
        drop_mistyped_optionals(fields, &["action_focus", "negative_prompt"]);
        if let Some(Value::Object(specs)) = fields.get_mut("technical_specs") {
            drop_mistyped_optionals(specs, &["lighting", "camera"]);
        }
    }
    let raw: RawShot =
        serde_json::from_value(item).map_err(|e| format!("shot at index {index}: {e}"))?;

    let n = raw.shot_number;
    if n.fract() != 0.0 || n < 1.0 || n > SHOT_COUNT as f64 {
        return Err(format!(
            "shot at index {index}: shot_number {n} is not an integer in 1..={SHOT_COUNT}"
        ));
    }

    let specs = &raw.technical_specs;
    for (field, value) in [
        ("vibe_title", raw.vibe_title.as_str()),
        ("main_prompt", raw.main_prompt.as_str()),
        ("technical_specs.angle", specs.angle.as_str()),
        ("technical_specs.lens", specs.lens.as_str()),
        ("technical_specs.motion", specs.motion.as_str()),
    ] {
        if value.trim().is_empty() {
            return Err(format!("shot at index {index}: required field '{field}' is blank"));
        }
    }

    Ok(ShotVariant {
        shot_number: n as u8,
        vibe_title: raw.vibe_title,
        action_focus: raw.action_focus,
        main_prompt: raw.main_prompt,
        negative_prompt: raw.negative_prompt,
        technical_specs: raw.technical_specs,
    })
}

/// Optional free-text profile fields. A value of the wrong JSON type is
/// dropped rather than failing the reply.
const PROFILE_OPTIONAL_TEXT: &[&str] = &[
    "environment",
    "mood",
    "style",
    "camera",
    "motion",
    "angle",
    "lens",
    "lighting",
    "audio",
    "setting",
    "place",
    "time",
    "characters",
    "aspect_ratio",
    "negative_prompt",
];

fn drop_mistyped_optionals(fields: &mut serde_json::Map<String, Value>, keys: &[&str]) {
    for key in keys {
        if fields.get(*key).is_some_and(|v| !v.is_string() && !v.is_null()) {
            tracing::debug!(field = *key, "ignoring optional field with unexpected type");
            fields.remove(*key);
        }
    }
}

fn document(raw: &str, kind: RequestKind) -> Result<Value> {
    if raw.trim().is_empty() {
        return Err(reject(kind, ValidationFailure::Empty));
    }
    serde_json::from_str(raw).map_err(|e| reject(kind, ValidationFailure::Malformed(e.to_string())))
}

fn schema(detail: impl Into<String>) -> ValidationFailure {
    ValidationFailure::Schema(detail.into())
}

fn reject(kind: RequestKind, failure: ValidationFailure) -> Error {
    TraceEvent::ResponseRejected {
        kind: kind.to_string(),
        reason: failure.label().to_string(),
        detail: failure.to_string(),
    }
    .emit();
    Error::validation(failure)
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn dedup_tags(tags: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    tags.retain(|t| !t.trim().is_empty() && seen.insert(t.trim().to_lowercase()));
}
