//! `vibe-ripper analyze`: one asset, one analysis, optionally expanded.

use std::path::Path;
use std::sync::Arc;

use vr_domain::config::Config;
use vr_providers::GoogleBackend;
use vr_studio::{load_asset, StateStore, Studio, TempFilePreview};

use crate::render;

pub struct AnalyzeArgs<'a> {
    pub path: &'a Path,
    pub guidance: Option<String>,
    pub expand: bool,
    pub json: bool,
}

pub async fn run(
    config: &Config,
    store: Arc<dyn StateStore>,
    args: AnalyzeArgs<'_>,
) -> anyhow::Result<()> {
    let mut studio = build_studio(config, store)?;

    let asset = load_asset(args.path).await?;
    tracing::info!(
        asset = %asset.name(),
        media_type = %asset.media_type(),
        bytes = asset.bytes().len(),
        "asset loaded"
    );
    studio.select_asset(asset);
    if let Some(location) = studio.preview_location() {
        tracing::debug!(path = %location.display(), "preview written");
    }
    if let Some(guidance) = args.guidance {
        studio.set_guidance(guidance);
    }

    if !studio.analyze().await? {
        anyhow::bail!("analysis did not start ({})", render::state_summary(studio.state()));
    }

    let expansion = if args.expand {
        studio.expand().await.map(|_| ())
    } else {
        Ok(())
    };

    // Print whatever profile is on view, even when the expansion failed.
    if let Some(loaded) = studio.state().profile() {
        if args.json {
            println!("{}", render::profile_json(&loaded.profile)?);
        } else {
            print!("{}", render::profile_text(&loaded.profile));
        }
    }

    expansion.map_err(|e| anyhow::anyhow!("shot expansion failed: {e}"))
}

pub(crate) fn build_studio(config: &Config, store: Arc<dyn StateStore>) -> anyhow::Result<Studio> {
    let backend = GoogleBackend::from_config(&config.llm)?;
    let studio = Studio::new(
        config,
        Arc::new(backend),
        store,
        Arc::new(TempFilePreview::new()),
    )?;
    Ok(studio)
}
