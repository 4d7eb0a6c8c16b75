//! Generation request building.
//!
//! The declared schema is what keeps replies structurally valid; the anchor
//! block and lock rules in the expansion directive are what keep the five
//! shots consistent with the primary profile. The backend is trusted, not
//! verified, to honor the anchors.

use serde_json::{json, Value};
use vr_domain::media::{AssetPayload, MediaKind, MediaType};
use vr_domain::profile::{VisualDnaProfile, SHOT_COUNT};
use vr_providers::{GenerationRequest, RequestKind};

/// Written in place of an anchor the profile left empty.
const UNSPECIFIED: &str = "unspecified (infer from the attached media and keep it fixed)";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DNA anchors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The five profile attributes every expanded shot must keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnaAnchors {
    pub subject: String,
    pub time: String,
    pub environment: String,
    pub lighting: String,
    pub style: String,
}

impl DnaAnchors {
    pub fn from_profile(profile: &VisualDnaProfile) -> Self {
        Self {
            subject: anchor(Some(&profile.subject)),
            time: anchor(profile.time.as_deref()),
            environment: anchor(profile.environment.as_deref()),
            lighting: anchor(profile.lighting.as_deref()),
            style: anchor(profile.style.as_deref()),
        }
    }
}

fn anchor(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNSPECIFIED.to_string(),
    }
}

/// What a request is built around: user guidance for analysis, the locked
/// anchors for expansion.
#[derive(Debug, Clone)]
pub enum RequestContext<'a> {
    Guidance(&'a str),
    Anchors(DnaAnchors),
}

impl RequestContext<'_> {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Guidance(_) => RequestKind::Analysis,
            Self::Anchors(_) => RequestKind::Expansion,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Builder
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    default_guidance: String,
}

impl RequestBuilder {
    pub fn new(default_guidance: impl Into<String>) -> Self {
        Self {
            default_guidance: default_guidance.into(),
        }
    }

    /// Build the request for `context`; the context decides the kind.
    pub fn build(&self, payload: AssetPayload, context: RequestContext<'_>) -> GenerationRequest {
        let kind = context.kind();
        let media = MediaType::new(payload.mime_type.as_str()).kind();
        let (instruction, response_schema) = match context {
            RequestContext::Guidance(guidance) => {
                (self.analysis_instruction(guidance, media), analysis_schema())
            }
            RequestContext::Anchors(anchors) => (expansion_instruction(&anchors), variant_schema()),
        };

        GenerationRequest {
            kind,
            payload,
            instruction,
            response_schema,
        }
    }

    fn analysis_instruction(&self, guidance: &str, media: Option<MediaKind>) -> String {
        let guidance = match guidance.trim() {
            "" => self.default_guidance.as_str(),
            g => g,
        };
        let media_note = match media {
            Some(MediaKind::Video) => {
                "The attached media is a video clip: account for motion, pacing and \
                 how the scene develops over its duration.\n"
            }
            _ => "",
        };

        format!(
            "You are a high-end cinema production specialist and aesthetic auditor.\n\
             Deconstruct the attached media into a technical \"Visual DNA\" profile.\n\
             {media_note}\n\
             Focus areas:\n\
             - Subject and costume details.\n\
             - Exact lighting temperature and direction.\n\
             - Lens characteristics (bokeh, distortion, flare).\n\
             - Environment textures and color palette.\n\
             \n\
             Additional user context: \"{guidance}\"\n\
             \n\
             Output must be a single valid JSON object matching the provided schema. \
             plot_points must list the scene beats in order and must not be empty."
        )
    }
}

fn expansion_instruction(anchors: &DnaAnchors) -> String {
    format!(
        "You are a director of photography working on a continuous sequence.\n\
         Study the attached media and treat the following master DNA as an absolute anchor.\n\
         \n\
         MASTER DNA ANCHORS (DO NOT CHANGE):\n\
         - Subject DNA: {subject}\n\
         - Time/Weather: {time}\n\
         - Environment/Location: {environment}\n\
         - Lighting Profile: {lighting}\n\
         - Visual Style: {style}\n\
         \n\
         TASK: Generate {count} technical shot variants that are fully DNA-locked to this scene.\n\
         \n\
         STRICT DNA LOCK RULES:\n\
         1. TEMPORAL LOCK: keep the exact lighting intensity and color temperature.\n\
         2. SPATIAL LOCK: every shot exists within the exact same location/set.\n\
         3. SUBJECT LOCK: subject, wardrobe and props are identical in every shot.\n\
         4. GEAR LOCK: match the camera sensor and grain profile of the source.\n\
         \n\
         Variation may only come from camera placement and movement \
         (e.g. extreme close-up, low-angle tracking, overhead crane).\n\
         \n\
         Number the shots 1 to {count}, each number used once. \
         Output exactly {count} full-spec technical objects in a JSON array matching the provided schema.",
        subject = anchors.subject,
        time = anchors.time,
        environment = anchors.environment,
        lighting = anchors.lighting,
        style = anchors.style,
        count = SHOT_COUNT,
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Output schemas (Gemini `responseSchema` dialect)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Profile schema: four required fields, everything else optional.
pub fn analysis_schema() -> Value {
    let string = json!({ "type": "STRING" });
    let strings = json!({ "type": "ARRAY", "items": { "type": "STRING" } });

    let mut properties = serde_json::Map::new();
    for field in [
        "vibe_title",
        "subject",
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
        "main_prompt",
        "negative_prompt",
    ] {
        properties.insert(field.into(), string.clone());
    }
    properties.insert("plot_points".into(), strings.clone());
    properties.insert("duration_seconds".into(), json!({ "type": "NUMBER" }));
    properties.insert("tags".into(), strings);

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": ["vibe_title", "subject", "main_prompt", "plot_points"],
    })
}

/// Variant schema: an array of exactly [`SHOT_COUNT`] shot objects.
pub fn variant_schema() -> Value {
    json!({
        "type": "ARRAY",
        "minItems": SHOT_COUNT,
        "maxItems": SHOT_COUNT,
        "items": {
            "type": "OBJECT",
            "properties": {
                "shot_number": { "type": "NUMBER" },
                "vibe_title": { "type": "STRING" },
                "action_focus": { "type": "STRING" },
                "main_prompt": { "type": "STRING" },
                "negative_prompt": { "type": "STRING" },
                "technical_specs": {
                    "type": "OBJECT",
                    "properties": {
                        "angle": { "type": "STRING" },
                        "lens": { "type": "STRING" },
                        "motion": { "type": "STRING" },
                        "lighting": { "type": "STRING" },
                        "camera": { "type": "STRING" },
                    },
                    "required": ["angle", "lens", "motion"],
                },
            },
            "required": ["shot_number", "vibe_title", "main_prompt", "technical_specs"],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(mime: &str) -> AssetPayload {
        AssetPayload {
            mime_type: mime.into(),
            data: "AAAA".into(),
        }
    }

    fn profile() -> VisualDnaProfile {
        serde_json::from_value(json!({
            "vibe_title": "Neon Drift",
            "subject": "lone figure in a yellow raincoat",
            "environment": "rain-soaked Tokyo alley",
            "lighting": "magenta neon, 3200K practicals",
            "style": "anamorphic noir",
            "main_prompt": "lone figure walks through neon rain",
            "plot_points": ["enters frame", "turns toward light"]
        }))
        .unwrap()
    }

    #[test]
    fn empty_guidance_uses_default() {
        let builder = RequestBuilder::new("Provide a professional cinematic breakdown.");
        let req = builder.build(payload("image/png"), RequestContext::Guidance("   "));
        assert_eq!(req.kind, RequestKind::Analysis);
        assert!(req
            .instruction
            .contains("\"Provide a professional cinematic breakdown.\""));
    }

    #[test]
    fn user_guidance_is_quoted_into_instruction() {
        let builder = RequestBuilder::new("default");
        let req = builder.build(payload("video/mp4"), RequestContext::Guidance("focus on the car"));
        assert!(req.instruction.contains("\"focus on the car\""));
        assert!(req.instruction.contains("video clip"));
        assert!(!req.instruction.contains("\"default\""));
    }

    #[test]
    fn analysis_schema_requires_exactly_four_fields() {
        let schema = analysis_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, vec!["vibe_title", "subject", "main_prompt", "plot_points"]);
        assert_eq!(schema["properties"].as_object().unwrap().len(), 21);
        assert_eq!(schema["properties"]["plot_points"]["type"], "ARRAY");
        assert_eq!(schema["properties"]["duration_seconds"]["type"], "NUMBER");
    }

    #[test]
    fn expansion_states_all_anchors_and_lock_rules() {
        let builder = RequestBuilder::new("default");
        let anchors = DnaAnchors::from_profile(&profile());
        let req = builder.build(payload("image/png"), RequestContext::Anchors(anchors));

        assert_eq!(req.kind, RequestKind::Expansion);
        for needle in [
            "Subject DNA: lone figure in a yellow raincoat",
            "Environment/Location: rain-soaked Tokyo alley",
            "Lighting Profile: magenta neon, 3200K practicals",
            "Visual Style: anamorphic noir",
            "TEMPORAL LOCK",
            "SPATIAL LOCK",
            "SUBJECT LOCK",
            "GEAR LOCK",
            "camera placement and movement",
        ] {
            assert!(req.instruction.contains(needle), "missing {needle:?}");
        }
        // The profile has no time; the anchor is still stated.
        assert!(req.instruction.contains("Time/Weather: unspecified"));
    }

    #[test]
    fn variant_schema_pins_five_items_and_required_specs() {
        let schema = variant_schema();
        assert_eq!(schema["type"], "ARRAY");
        assert_eq!(schema["minItems"], 5);
        assert_eq!(schema["maxItems"], 5);
        let item = &schema["items"];
        assert_eq!(
            item["required"],
            json!(["shot_number", "vibe_title", "main_prompt", "technical_specs"])
        );
        assert_eq!(
            item["properties"]["technical_specs"]["required"],
            json!(["angle", "lens", "motion"])
        );
    }
}
