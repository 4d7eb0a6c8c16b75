//! Asset loading and transport encoding.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use vr_domain::error::{Error, Result};
use vr_domain::media::{AssetPayload, MediaAsset, MediaType};
use vr_domain::trace::TraceEvent;

/// Read a media file from disk into a [`MediaAsset`].
///
/// The media type is declared from the file extension. Unreadable files
/// and unknown extensions are [`Error::Encoding`].
pub async fn load_asset(path: &Path) -> Result<MediaAsset> {
    let media_type = MediaType::from_path(path).ok_or_else(|| {
        Error::Encoding(format!(
            "{}: unrecognized media type (expected an image or video file)",
            path.display()
        ))
    })?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::Encoding(format!("reading {}: {e}", path.display())))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(MediaAsset::new(name, media_type, bytes))
}

/// Encode an asset into a self-contained request payload.
pub fn encode(asset: &MediaAsset) -> Result<AssetPayload> {
    if asset.bytes().is_empty() {
        return Err(Error::Encoding(format!("{}: file is empty", asset.name())));
    }
    if asset.media_type().kind().is_none() {
        return Err(Error::Encoding(format!(
            "{}: unsupported media type '{}'",
            asset.name(),
            asset.media_type()
        )));
    }

    let data = BASE64.encode(asset.bytes());

    TraceEvent::AssetEncoded {
        asset: asset.name().to_string(),
        mime_type: asset.media_type().to_string(),
        raw_bytes: asset.bytes().len(),
        encoded_chars: data.len(),
    }
    .emit();

    Ok(AssetPayload {
        mime_type: asset.media_type().to_string(),
        data,
    })
}
