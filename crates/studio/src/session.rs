//! The session effect layer.
//!
//! [`Studio`] owns the current selection, the session state and the
//! history. It consults [`transition`] for every change and performs the
//! effects around it: credential lookup, encoding, the backend exchange
//! (as an explicit [`GenerationTask`]), and history recording.
//!
//! Each selection or reset mints a new session id. A task carries the id it
//! was started under; a completion whose id no longer matches is stale and
//! is dropped without touching the state.

use std::sync::Arc;

use serde_json::Value;

use vr_domain::config::{AuthConfig, Config};
use vr_domain::error::{Error, Result};
use vr_domain::media::MediaAsset;
use vr_domain::trace::TraceEvent;
use vr_providers::{resolve_credential, Credential, GenerationBackend, GenerationRequest, RequestKind};

use crate::encoder::encode;
use crate::history::{HistoryEntry, HistoryStore};
use crate::parse::{parse, Parsed};
use crate::preview::{PreviewLease, PreviewSurface};
use crate::request::{DnaAnchors, RequestBuilder, RequestContext};
use crate::state::{transition, Event, Guard, LoadedProfile, SessionState};
use crate::storage::{Slot, StateStore};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generation task
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One backend exchange, ready to run. Holds everything it needs, so it
/// can be awaited without borrowing the [`Studio`].
pub struct GenerationTask {
    ticket: String,
    source_digest: String,
    request: GenerationRequest,
    credential: Credential,
    backend: Arc<dyn GenerationBackend>,
}

impl GenerationTask {
    /// Send the request and parse the reply. Never touches session state.
    pub async fn run(self) -> TaskOutcome {
        let result = match self.backend.generate(&self.request, &self.credential).await {
            Ok(response) => parse(&response.text, self.request.kind),
            Err(e) => Err(e),
        };
        TaskOutcome {
            ticket: self.ticket,
            kind: self.request.kind,
            source_digest: self.source_digest,
            result,
        }
    }
}

/// The result of a [`GenerationTask`], to be handed to [`Studio::complete`].
pub struct TaskOutcome {
    ticket: String,
    kind: RequestKind,
    source_digest: String,
    result: Result<Parsed>,
}

impl TaskOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Studio
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Selection {
    asset: Arc<MediaAsset>,
    lease: Option<PreviewLease>,
}

pub struct Studio {
    backend: Arc<dyn GenerationBackend>,
    store: Arc<dyn StateStore>,
    preview: Arc<dyn PreviewSurface>,
    builder: RequestBuilder,
    auth: AuthConfig,
    history: HistoryStore,
    session_id: String,
    state: SessionState,
    selection: Option<Selection>,
    guidance: String,
}

impl Studio {
    pub fn new(
        config: &Config,
        backend: Arc<dyn GenerationBackend>,
        store: Arc<dyn StateStore>,
        preview: Arc<dyn PreviewSurface>,
    ) -> Result<Self> {
        let history = HistoryStore::load(store.clone())?;
        Ok(Self {
            backend,
            store,
            preview,
            builder: RequestBuilder::new(config.analysis.default_guidance.clone()),
            auth: config.llm.auth.clone(),
            history,
            session_id: new_session_id(),
            state: SessionState::Idle,
            selection: None,
            guidance: String::new(),
        })
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn asset(&self) -> Option<&MediaAsset> {
        self.selection.as_ref().map(|s| s.asset.as_ref())
    }

    pub fn preview_location(&self) -> Option<&std::path::Path> {
        self.selection.as_ref()?.lease.as_ref()?.location()
    }

    pub fn guidance(&self) -> &str {
        &self.guidance
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.list()
    }

    // ── Selection ──────────────────────────────────────────────────

    /// Replace the selection. The previous preview is released before the
    /// new one is opened; the state returns to Idle and any request still
    /// in flight becomes stale. Guidance is kept.
    pub fn select_asset(&mut self, asset: MediaAsset) {
        self.selection = None;
        self.apply_reset();

        let lease = match PreviewLease::open(self.preview.clone(), &asset) {
            Ok(lease) => Some(lease),
            Err(e) => {
                tracing::warn!(asset = %asset.name(), error = %e, "preview unavailable");
                None
            }
        };
        self.selection = Some(Selection {
            asset: Arc::new(asset),
            lease,
        });
    }

    pub fn set_guidance(&mut self, guidance: impl Into<String>) {
        self.guidance = guidance.into();
    }

    /// Drop the selection, the guidance and the current profile.
    pub fn reset(&mut self) {
        self.selection = None;
        self.guidance.clear();
        self.apply_reset();
    }

    // ── Requests ───────────────────────────────────────────────────

    /// Begin a primary analysis of the selected asset.
    ///
    /// Returns `Ok(None)` without doing anything when there is no asset or
    /// a request is in flight. A missing credential fails before any state
    /// change. An encoding failure moves the session to Error.
    pub fn start_analysis(&mut self) -> Result<Option<GenerationTask>> {
        if let Err(rejection) = transition(&self.state, Event::StartAnalysis, self.guard()) {
            tracing::debug!(reason = %rejection, "analysis not started");
            return Ok(None);
        }
        let credential = self.credential()?;
        let Some(asset) = self.selection.as_ref().map(|s| s.asset.clone()) else {
            return Ok(None);
        };

        self.apply(Event::StartAnalysis);
        let payload = match encode(&asset) {
            Ok(payload) => payload,
            Err(e) => return Err(self.fail(e)),
        };
        let request = self
            .builder
            .build(payload, RequestContext::Guidance(&self.guidance));

        Ok(Some(self.task(request, credential, asset.digest())))
    }

    /// Begin the DNA-locked variant expansion of the current profile.
    ///
    /// Returns `Ok(None)` when there is no expandable profile for the
    /// selected asset or a request is in flight.
    pub fn start_expansion(&mut self) -> Result<Option<GenerationTask>> {
        if let Err(rejection) = transition(&self.state, Event::StartExpansion, self.guard()) {
            tracing::debug!(reason = %rejection, "expansion not started");
            return Ok(None);
        }
        let credential = self.credential()?;
        let Some(asset) = self.selection.as_ref().map(|s| s.asset.clone()) else {
            return Ok(None);
        };
        let Some(anchors) = self
            .state
            .profile()
            .map(|loaded| DnaAnchors::from_profile(&loaded.profile))
        else {
            return Ok(None);
        };

        self.apply(Event::StartExpansion);
        let payload = match encode(&asset) {
            Ok(payload) => payload,
            Err(e) => return Err(self.fail(e)),
        };
        let request = self.builder.build(payload, RequestContext::Anchors(anchors));

        Ok(Some(self.task(request, credential, asset.digest())))
    }

    /// Apply a finished task.
    ///
    /// A stale outcome is dropped and `Ok(())` returned. A failed outcome
    /// moves the session to Error and the error is returned.
    pub fn complete(&mut self, outcome: TaskOutcome) -> Result<()> {
        if outcome.ticket != self.session_id {
            tracing::debug!(
                kind = %outcome.kind,
                ticket = %outcome.ticket,
                session_id = %self.session_id,
                "dropping stale completion"
            );
            return Ok(());
        }

        match outcome.result {
            Ok(Parsed::Profile(profile)) => {
                let loaded = LoadedProfile {
                    profile,
                    source_digest: Some(outcome.source_digest),
                };
                if self.apply(Event::AnalysisSucceeded(loaded.clone())) {
                    if let Err(e) = self.history.record(HistoryEntry::new(loaded)) {
                        tracing::warn!(error = %e, "history not persisted");
                    }
                }
                Ok(())
            }
            Ok(Parsed::Variants(shots)) => {
                self.apply(Event::ExpansionSucceeded(shots));
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Run a full analysis. Returns `false` when the request was not started.
    pub async fn analyze(&mut self) -> Result<bool> {
        match self.start_analysis()? {
            Some(task) => {
                let outcome = task.run().await;
                self.complete(outcome)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run a full expansion. Returns `false` when the request was not started.
    pub async fn expand(&mut self) -> Result<bool> {
        match self.start_expansion()? {
            Some(task) => {
                let outcome = task.run().await;
                self.complete(outcome)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Show a history entry as the current profile without a backend call.
    pub fn select_history(&mut self, index: usize) -> Result<&LoadedProfile> {
        let loaded = self
            .history
            .select(index)
            .map(HistoryEntry::to_loaded)
            .ok_or_else(|| Error::Other(format!("no history entry at index {index}")))?;

        if let Err(rejection) = transition(&self.state, Event::Restore(loaded.clone()), self.guard()) {
            return Err(Error::Other(format!("cannot restore history entry: {rejection}")));
        }
        self.apply(Event::Restore(loaded));
        self.state
            .profile()
            .ok_or_else(|| Error::Other("restored profile missing".into()))
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn guard(&self) -> Guard<'_> {
        Guard {
            asset_digest: self.selection.as_ref().map(|s| s.asset.digest()),
        }
    }

    fn credential(&self) -> Result<Credential> {
        let stored = match self.store.read(Slot::Credential)? {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        resolve_credential(stored.as_deref(), &self.auth)
    }

    fn task(&self, request: GenerationRequest, credential: Credential, digest: &str) -> GenerationTask {
        GenerationTask {
            ticket: self.session_id.clone(),
            source_digest: digest.to_string(),
            request,
            credential,
            backend: self.backend.clone(),
        }
    }

    /// Record `error` in the state machine and hand it back.
    fn fail(&mut self, error: Error) -> Error {
        self.apply(Event::Failed {
            kind: error.kind(),
            message: error.to_string(),
        });
        error
    }

    fn apply_reset(&mut self) {
        self.apply(Event::Reset);
        self.session_id = new_session_id();
    }

    /// Run `event` through the state machine. Returns whether it applied.
    fn apply(&mut self, event: Event) -> bool {
        let name = event.name();
        match transition(&self.state, event, self.guard()) {
            Ok(next) => {
                TraceEvent::SessionTransition {
                    session_id: self.session_id.clone(),
                    from: self.state.name().into(),
                    to: next.name().into(),
                    trigger: name.into(),
                }
                .emit();
                self.state = next;
                true
            }
            Err(rejection) => {
                tracing::warn!(event = name, state = self.state.name(), reason = %rejection, "transition rejected");
                false
            }
        }
    }
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
