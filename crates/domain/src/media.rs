//! Media assets as selected by the user, and their transport payloads.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Broad media class; drives preview handling and request wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A declared MIME type such as `image/png` or `video/mp4`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaType(String);

impl MediaType {
    pub fn new(mime: impl Into<String>) -> Self {
        Self(mime.into().trim().to_ascii_lowercase())
    }

    /// Guess the media type from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let mime = match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "webp" => "image/webp",
            "gif" => "image/gif",
            "heic" => "image/heic",
            "heif" => "image/heif",
            "bmp" => "image/bmp",
            "mp4" | "m4v" => "video/mp4",
            "mov" => "video/quicktime",
            "webm" => "video/webm",
            "mpeg" | "mpg" => "video/mpeg",
            "avi" => "video/x-msvideo",
            "mkv" => "video/x-matroska",
            "3gp" => "video/3gpp",
            _ => return None,
        };
        Some(Self(mime.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `None` for anything that is not `image/*` or `video/*`.
    pub fn kind(&self) -> Option<MediaKind> {
        let (top, sub) = self.0.split_once('/')?;
        if sub.is_empty() {
            return None;
        }
        match top {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Selected asset
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One selected media file. Immutable; a new selection builds a new asset.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    name: String,
    media_type: MediaType,
    bytes: Arc<[u8]>,
    digest: String,
}

impl MediaAsset {
    pub fn new(name: impl Into<String>, media_type: MediaType, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        let digest = hex::encode(Sha256::digest(&bytes));
        Self {
            name: name.into(),
            media_type,
            bytes,
            digest,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex SHA-256 of the content. Two selections of the same bytes share
    /// a digest but remain distinct assets.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn is_video(&self) -> bool {
        self.media_type.kind() == Some(MediaKind::Video)
    }
}

/// Transport-safe form of an asset: base64 content plus its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPayload {
    pub mime_type: String,
    pub data: String,
}
