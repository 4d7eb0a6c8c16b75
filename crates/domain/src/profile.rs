//! Visual DNA profiles and their shot variants.
//!
//! Field names follow the wire schema sent to the backend, so these types
//! serialize to exactly the JSON the backend is asked to produce.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of shots produced by one variant expansion.
pub const SHOT_COUNT: usize = 5;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Primary profile
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The structured breakdown produced by primary analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualDnaProfile {
    pub vibe_title: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    pub plot_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    pub main_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<ShotSet>,
}

impl VisualDnaProfile {
    /// Name of the first required field that is missing or blank.
    pub fn missing_required(&self) -> Option<&'static str> {
        if is_blank(&self.vibe_title) {
            return Some("vibe_title");
        }
        if is_blank(&self.subject) {
            return Some("subject");
        }
        if is_blank(&self.main_prompt) {
            return Some("main_prompt");
        }
        if self.plot_points.iter().all(|p| is_blank(p)) {
            return Some("plot_points");
        }
        None
    }

    pub fn has_variants(&self) -> bool {
        self.variants.is_some()
    }

    /// Attach the expansion result. A profile is expanded at most once.
    pub fn attach_variants(&mut self, shots: ShotSet) -> Result<()> {
        if self.variants.is_some() {
            return Err(Error::Other(format!(
                "profile '{}' already has variants",
                self.vibe_title
            )));
        }
        self.variants = Some(shots);
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Shot variants
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalSpecs {
    pub angle: String,
    pub lens: String,
    pub motion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
}

/// One camera variation of a DNA-locked scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotVariant {
    pub shot_number: u8,
    pub vibe_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_focus: Option<String>,
    pub main_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub technical_specs: TechnicalSpecs,
}

/// Exactly [`SHOT_COUNT`] variants with distinct shot numbers in
/// `1..=SHOT_COUNT`, ordered by shot number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ShotVariant>", into = "Vec<ShotVariant>")]
pub struct ShotSet(Vec<ShotVariant>);

impl ShotSet {
    pub fn new(mut shots: Vec<ShotVariant>) -> Result<Self> {
        if shots.len() != SHOT_COUNT {
            return Err(Error::Other(format!(
                "expected {SHOT_COUNT} shot variants, got {}",
                shots.len()
            )));
        }
        let mut seen = [false; SHOT_COUNT];
        for shot in &shots {
            let n = shot.shot_number as usize;
            if n == 0 || n > SHOT_COUNT {
                return Err(Error::Other(format!(
                    "shot_number {n} outside 1..={SHOT_COUNT}"
                )));
            }
            if std::mem::replace(&mut seen[n - 1], true) {
                return Err(Error::Other(format!("duplicate shot_number {n}")));
            }
        }
        shots.sort_by_key(|s| s.shot_number);
        Ok(Self(shots))
    }

    pub fn shots(&self) -> &[ShotVariant] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShotVariant> {
        self.0.iter()
    }
}

impl TryFrom<Vec<ShotVariant>> for ShotSet {
    type Error = Error;

    fn try_from(shots: Vec<ShotVariant>) -> Result<Self> {
        Self::new(shots)
    }
}

impl From<ShotSet> for Vec<ShotVariant> {
    fn from(set: ShotSet) -> Self {
        set.0
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shot(n: u8) -> ShotVariant {
        ShotVariant {
            shot_number: n,
            vibe_title: format!("Shot {n}"),
            action_focus: None,
            main_prompt: "low angle tracking".into(),
            negative_prompt: None,
            technical_specs: TechnicalSpecs {
                angle: "low".into(),
                lens: "35mm".into(),
                motion: "dolly in".into(),
                lighting: None,
                camera: None,
            },
        }
    }

    #[test]
    fn shot_set_sorts_by_number() {
        let set = ShotSet::new(vec![shot(3), shot(1), shot(5), shot(2), shot(4)]).unwrap();
        let numbers: Vec<u8> = set.iter().map(|s| s.shot_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn shot_set_rejects_bad_shapes() {
        assert!(ShotSet::new(vec![shot(1), shot(2), shot(3), shot(4)]).is_err());
        assert!(ShotSet::new(vec![shot(1), shot(2), shot(3), shot(4), shot(4)]).is_err());
        assert!(ShotSet::new(vec![shot(0), shot(2), shot(3), shot(4), shot(5)]).is_err());
        assert!(ShotSet::new(vec![shot(1), shot(2), shot(3), shot(4), shot(6)]).is_err());
    }

    #[test]
    fn shot_set_deserialization_enforces_shape() {
        let four = serde_json::to_string(&vec![shot(1), shot(2), shot(3), shot(4)]).unwrap();
        assert!(serde_json::from_str::<ShotSet>(&four).is_err());
    }

    #[test]
    fn missing_required_reports_first_gap() {
        let json = r#"{"vibe_title":"Neon Drift","subject":"lone figure",
            "main_prompt":"rain-soaked alley","plot_points":["  "]}"#;
        let profile: VisualDnaProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.missing_required(), Some("plot_points"));
    }

    #[test]
    fn variants_attach_once() {
        let json = r#"{"vibe_title":"Neon Drift","subject":"lone figure",
            "main_prompt":"rain-soaked alley","plot_points":["enters frame"]}"#;
        let mut profile: VisualDnaProfile = serde_json::from_str(json).unwrap();
        let set = ShotSet::new((1..=5).map(shot).collect()).unwrap();
        profile.attach_variants(set.clone()).unwrap();
        assert!(profile.has_variants());
        assert!(profile.attach_variants(set).is_err());
    }
}
