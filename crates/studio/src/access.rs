//! Access gate: a shared secret unlocks the tool once per machine.
//!
//! The comparison is case-insensitive and ignores surrounding whitespace.
//! A granted state persists in the [`StateStore`] until [`AccessGate::lock`].

use std::sync::Arc;

use serde_json::Value;

use vr_domain::config::AccessConfig;
use vr_domain::error::Result;
use vr_domain::trace::TraceEvent;

use crate::storage::{Slot, StateStore};

pub struct AccessGate {
    enabled: bool,
    secret: String,
    store: Arc<dyn StateStore>,
}

impl AccessGate {
    pub fn new(config: &AccessConfig, store: Arc<dyn StateStore>) -> Self {
        Self {
            enabled: config.enabled,
            secret: normalize(&config.secret),
            store,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Always true when the gate is disabled.
    pub fn is_granted(&self) -> Result<bool> {
        if !self.enabled {
            return Ok(true);
        }
        Ok(matches!(
            self.store.read(Slot::AccessGranted)?,
            Some(Value::Bool(true))
        ))
    }

    /// Returns `false` and leaves state untouched when the secret is wrong.
    pub fn unlock(&self, attempt: &str) -> Result<bool> {
        if !self.enabled {
            return Ok(true);
        }
        if normalize(attempt) != self.secret {
            tracing::debug!("access secret rejected");
            return Ok(false);
        }
        self.store.write(Slot::AccessGranted, Value::Bool(true))?;
        TraceEvent::AccessChanged { granted: true }.emit();
        Ok(true)
    }

    pub fn lock(&self) -> Result<()> {
        self.store.erase(Slot::AccessGranted)?;
        TraceEvent::AccessChanged { granted: false }.emit();
        Ok(())
    }
}

fn normalize(secret: &str) -> String {
    secret.trim().to_uppercase()
}
