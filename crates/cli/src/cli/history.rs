//! `vibe-ripper history`: browse and re-open past analyses.

use std::sync::Arc;

use vr_domain::config::Config;
use vr_studio::{HistoryStore, StateStore};

use crate::cli::analyze::build_studio;
use crate::render;

pub fn list(store: Arc<dyn StateStore>, json: bool) -> anyhow::Result<()> {
    let history = HistoryStore::load(store)?;
    if json {
        println!("{}", serde_json::to_string_pretty(history.list())?);
    } else {
        print!("{}", render::history_text(history.list()));
    }
    Ok(())
}

/// Re-populate the view from history and print it. No backend call.
pub fn show(config: &Config, store: Arc<dyn StateStore>, index: usize, json: bool) -> anyhow::Result<()> {
    let mut studio = build_studio(config, store)?;
    let loaded = studio.select_history(index)?;
    if json {
        println!("{}", render::profile_json(&loaded.profile)?);
    } else {
        print!("{}", render::profile_text(&loaded.profile));
    }
    Ok(())
}
