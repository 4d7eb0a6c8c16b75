//! Session state machine.
//!
//! [`transition`] is pure: it maps the current state, an [`Event`] and the
//! current selection ([`Guard`]) to the next state, or to a [`Rejection`]
//! that leaves the state as it was. All effects live in [`crate::session`].

use std::fmt;

use serde::Serialize;

use vr_domain::error::ErrorKind;
use vr_domain::profile::{ShotSet, VisualDnaProfile};

/// A validated profile together with the digest of the asset it describes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedProfile {
    pub profile: VisualDnaProfile,
    /// `None` only for profiles whose source asset is unknown; those cannot
    /// be expanded.
    pub source_digest: Option<String>,
}

/// What the Error state shows, and what it keeps for a retry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionFault {
    pub kind: ErrorKind,
    pub message: String,
    /// The profile an expansion was running against, still without variants.
    pub retained: Option<LoadedProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Analyzing,
    Ready(LoadedProfile),
    Mixing(LoadedProfile),
    Error(SessionFault),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Analyzing => "analyzing",
            Self::Ready(_) => "ready",
            Self::Mixing(_) => "mixing",
            Self::Error(_) => "error",
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Analyzing | Self::Mixing(_))
    }

    /// The profile currently on view, if any.
    pub fn profile(&self) -> Option<&LoadedProfile> {
        match self {
            Self::Ready(p) | Self::Mixing(p) => Some(p),
            Self::Error(fault) => fault.retained.as_ref(),
            Self::Idle | Self::Analyzing => None,
        }
    }

    pub fn fault(&self) -> Option<&SessionFault> {
        match self {
            Self::Error(fault) => Some(fault),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    StartAnalysis,
    AnalysisSucceeded(LoadedProfile),
    StartExpansion,
    ExpansionSucceeded(ShotSet),
    Failed { kind: ErrorKind, message: String },
    /// Re-populate the view from history without a backend call.
    Restore(LoadedProfile),
    /// New asset selected, or an explicit reset.
    Reset,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartAnalysis => "start_analysis",
            Self::AnalysisSucceeded(_) => "analysis_succeeded",
            Self::StartExpansion => "start_expansion",
            Self::ExpansionSucceeded(_) => "expansion_succeeded",
            Self::Failed { .. } => "failed",
            Self::Restore(_) => "restore",
            Self::Reset => "reset",
        }
    }
}

/// The parts of the session outside the state that transitions depend on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Guard<'a> {
    /// Digest of the currently selected asset.
    pub asset_digest: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoAsset,
    Busy,
    NoProfile,
    AlreadyExpanded,
    AssetMismatch,
    /// A completion or failure arrived in a state with nothing in flight.
    Unexpected,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoAsset => "no asset selected",
            Self::Busy => "a request is already in flight",
            Self::NoProfile => "no analysed profile to expand",
            Self::AlreadyExpanded => "profile already has shot variants",
            Self::AssetMismatch => "profile was produced from a different asset",
            Self::Unexpected => "no matching request in flight",
        };
        f.write_str(s)
    }
}

pub fn transition(
    state: &SessionState,
    event: Event,
    guard: Guard<'_>,
) -> Result<SessionState, Rejection> {
    use SessionState as S;

    match event {
        Event::Reset => Ok(S::Idle),

        Event::StartAnalysis => {
            if state.is_in_flight() {
                return Err(Rejection::Busy);
            }
            if guard.asset_digest.is_none() {
                return Err(Rejection::NoAsset);
            }
            Ok(S::Analyzing)
        }

        Event::AnalysisSucceeded(loaded) => match state {
            S::Analyzing => Ok(S::Ready(loaded)),
            _ => Err(Rejection::Unexpected),
        },

        Event::StartExpansion => {
            if state.is_in_flight() {
                return Err(Rejection::Busy);
            }
            let loaded = match state {
                S::Ready(p) => p,
                S::Error(SessionFault {
                    retained: Some(p), ..
                }) => p,
                _ => return Err(Rejection::NoProfile),
            };
            if loaded.profile.has_variants() {
                return Err(Rejection::AlreadyExpanded);
            }
            let asset = guard.asset_digest.ok_or(Rejection::NoAsset)?;
            if loaded.source_digest.as_deref() != Some(asset) {
                return Err(Rejection::AssetMismatch);
            }
            Ok(S::Mixing(loaded.clone()))
        }

        Event::ExpansionSucceeded(shots) => match state {
            S::Mixing(loaded) => {
                let mut loaded = loaded.clone();
                loaded
                    .profile
                    .attach_variants(shots)
                    .map_err(|_| Rejection::AlreadyExpanded)?;
                Ok(S::Ready(loaded))
            }
            _ => Err(Rejection::Unexpected),
        },

        Event::Failed { kind, message } => match state {
            S::Analyzing => Ok(S::Error(SessionFault {
                kind,
                message,
                retained: None,
            })),
            S::Mixing(loaded) => Ok(S::Error(SessionFault {
                kind,
                message,
                retained: Some(loaded.clone()),
            })),
            _ => Err(Rejection::Unexpected),
        },

        Event::Restore(loaded) => {
            if state.is_in_flight() {
                return Err(Rejection::Busy);
            }
            Ok(S::Ready(loaded))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vr_domain::profile::{ShotVariant, TechnicalSpecs};

    const DIGEST: &str = "abc123";

    fn loaded() -> LoadedProfile {
        let profile: VisualDnaProfile = serde_json::from_value(serde_json::json!({
            "vibe_title": "Neon Drift",
            "subject": "lone figure",
            "main_prompt": "neon rain",
            "plot_points": ["enters frame"]
        }))
        .unwrap();
        LoadedProfile {
            profile,
            source_digest: Some(DIGEST.into()),
        }
    }

    fn shots() -> ShotSet {
        ShotSet::new(
            (1..=5)
                .map(|n| ShotVariant {
                    shot_number: n,
                    vibe_title: format!("Shot {n}"),
                    action_focus: None,
                    main_prompt: "tracking".into(),
                    negative_prompt: None,
                    technical_specs: TechnicalSpecs {
                        angle: "low".into(),
                        lens: "35mm".into(),
                        motion: "dolly".into(),
                        lighting: None,
                        camera: None,
                    },
                })
                .collect(),
        )
        .unwrap()
    }

    fn with_asset() -> Guard<'static> {
        Guard {
            asset_digest: Some(DIGEST),
        }
    }

    fn failed() -> Event {
        Event::Failed {
            kind: ErrorKind::Validation,
            message: "expected 5 shot variants, got 4".into(),
        }
    }

    #[test]
    fn analysis_needs_an_asset() {
        let err = transition(&SessionState::Idle, Event::StartAnalysis, Guard::default());
        assert_eq!(err, Err(Rejection::NoAsset));
        let next = transition(&SessionState::Idle, Event::StartAnalysis, with_asset()).unwrap();
        assert_eq!(next, SessionState::Analyzing);
    }

    #[test]
    fn full_happy_path() {
        let s = transition(&SessionState::Idle, Event::StartAnalysis, with_asset()).unwrap();
        let s = transition(&s, Event::AnalysisSucceeded(loaded()), with_asset()).unwrap();
        assert_eq!(s.name(), "ready");
        let s = transition(&s, Event::StartExpansion, with_asset()).unwrap();
        assert!(s.is_in_flight());
        let s = transition(&s, Event::ExpansionSucceeded(shots()), with_asset()).unwrap();
        assert!(s.profile().unwrap().profile.has_variants());

        // Expanded profiles are not expanded again.
        assert_eq!(
            transition(&s, Event::StartExpansion, with_asset()),
            Err(Rejection::AlreadyExpanded)
        );
    }

    #[test]
    fn expansion_from_idle_is_rejected() {
        assert_eq!(
            transition(&SessionState::Idle, Event::StartExpansion, with_asset()),
            Err(Rejection::NoProfile)
        );
    }

    #[test]
    fn nothing_starts_while_in_flight() {
        let mixing = SessionState::Mixing(loaded());
        assert_eq!(
            transition(&mixing, Event::StartAnalysis, with_asset()),
            Err(Rejection::Busy)
        );
        assert_eq!(
            transition(&SessionState::Analyzing, Event::StartExpansion, with_asset()),
            Err(Rejection::Busy)
        );
        assert_eq!(
            transition(&mixing, Event::Restore(loaded()), with_asset()),
            Err(Rejection::Busy)
        );
    }

    #[test]
    fn failed_expansion_retains_profile_and_allows_retry() {
        let s = transition(&SessionState::Mixing(loaded()), failed(), with_asset()).unwrap();
        let fault = s.fault().unwrap();
        assert_eq!(fault.kind, ErrorKind::Validation);
        assert!(!fault.retained.as_ref().unwrap().profile.has_variants());

        let retry = transition(&s, Event::StartExpansion, with_asset()).unwrap();
        assert_eq!(retry, SessionState::Mixing(loaded()));
    }

    #[test]
    fn failed_analysis_keeps_no_profile_but_allows_reanalysis() {
        let s = transition(&SessionState::Analyzing, failed(), with_asset()).unwrap();
        assert!(s.profile().is_none());
        assert_eq!(
            transition(&s, Event::StartExpansion, with_asset()),
            Err(Rejection::NoProfile)
        );
        assert_eq!(
            transition(&s, Event::StartAnalysis, with_asset()).unwrap(),
            SessionState::Analyzing
        );
    }

    #[test]
    fn expansion_requires_the_same_asset() {
        let ready = SessionState::Ready(loaded());
        let other = Guard {
            asset_digest: Some("different"),
        };
        assert_eq!(
            transition(&ready, Event::StartExpansion, other),
            Err(Rejection::AssetMismatch)
        );
        assert_eq!(
            transition(&ready, Event::StartExpansion, Guard::default()),
            Err(Rejection::NoAsset)
        );
    }

    #[test]
    fn completions_without_a_request_are_unexpected() {
        assert_eq!(
            transition(&SessionState::Idle, Event::AnalysisSucceeded(loaded()), with_asset()),
            Err(Rejection::Unexpected)
        );
        assert_eq!(
            transition(&SessionState::Ready(loaded()), failed(), with_asset()),
            Err(Rejection::Unexpected)
        );
    }

    #[test]
    fn reset_always_returns_to_idle() {
        for state in [
            SessionState::Analyzing,
            SessionState::Mixing(loaded()),
            SessionState::Ready(loaded()),
        ] {
            assert_eq!(
                transition(&state, Event::Reset, Guard::default()).unwrap(),
                SessionState::Idle
            );
        }
    }
}
