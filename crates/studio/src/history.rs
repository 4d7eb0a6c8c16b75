//! Bounded, persisted log of successful analyses, newest first.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use vr_domain::error::{Error, Result};
use vr_domain::profile::VisualDnaProfile;
use vr_domain::trace::TraceEvent;

use crate::state::LoadedProfile;
use crate::storage::{Slot, StateStore};

/// Most entries kept; recording beyond this evicts the oldest.
pub const HISTORY_CAPACITY: usize = 10;

/// One stored analysis. Serialized as the profile's own fields plus
/// provenance, so the persisted array reads like a list of profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub profile: VisualDnaProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_digest: Option<String>,
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(loaded: LoadedProfile) -> Self {
        Self {
            profile: loaded.profile,
            source_digest: loaded.source_digest,
            recorded_at: Utc::now(),
        }
    }

    pub fn to_loaded(&self) -> LoadedProfile {
        LoadedProfile {
            profile: self.profile.clone(),
            source_digest: self.source_digest.clone(),
        }
    }
}

pub struct HistoryStore {
    store: Arc<dyn StateStore>,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Load history from the store.
    ///
    /// Unreadable history starts empty; individual entries that no longer
    /// form a valid profile are dropped.
    pub fn load(store: Arc<dyn StateStore>) -> Result<Self> {
        let entries = match store.read(Slot::History)? {
            None => Vec::new(),
            Some(Value::Array(items)) => {
                let total = items.len();
                let mut entries: Vec<HistoryEntry> = items
                    .into_iter()
                    .filter_map(|item| serde_json::from_value::<HistoryEntry>(item).ok())
                    .filter(|e| e.profile.missing_required().is_none())
                    .collect();
                if entries.len() < total {
                    tracing::warn!(
                        dropped = total - entries.len(),
                        "dropped unreadable history entries"
                    );
                }
                entries.truncate(HISTORY_CAPACITY);
                entries
            }
            Some(_) => {
                tracing::warn!("stored history is not a list, starting empty");
                Vec::new()
            }
        };

        tracing::debug!(entries = entries.len(), "history loaded");
        Ok(Self { store, entries })
    }

    /// Prepend `entry`, evict beyond [`HISTORY_CAPACITY`], and persist.
    ///
    /// The in-memory log is updated even when persisting fails.
    pub fn record(&mut self, entry: HistoryEntry) -> Result<()> {
        let vibe_title = entry.profile.vibe_title.clone();
        self.entries.insert(0, entry);
        let evicted = self.entries.len().saturating_sub(HISTORY_CAPACITY);
        self.entries.truncate(HISTORY_CAPACITY);

        TraceEvent::HistoryRecorded {
            vibe_title,
            entries: self.entries.len(),
            evicted,
        }
        .emit();

        self.persist()
    }

    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn select(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> Result<()> {
        let value = serde_json::to_value(&self.entries)
            .map_err(|e| Error::Storage(format!("serializing history: {e}")))?;
        self.store.write(Slot::History, value)
    }
}
