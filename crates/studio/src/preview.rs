//! Preview surfaces for the selected asset.
//!
//! Opening a preview hands back a [`PreviewHandle`]; the studio wraps it in
//! a [`PreviewLease`] that releases the handle exactly once, either when the
//! selection is replaced or when the lease is dropped.

use std::collections::HashMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use vr_domain::error::{Error, Result};
use vr_domain::media::MediaAsset;

/// An open preview resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    pub id: u64,
    /// Where the preview can be viewed, if the surface materializes one.
    pub location: Option<PathBuf>,
}

pub trait PreviewSurface: Send + Sync {
    fn open(&self, asset: &MediaAsset) -> Result<PreviewHandle>;
    fn release(&self, handle: &PreviewHandle);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Lease
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct PreviewLease {
    surface: Arc<dyn PreviewSurface>,
    handle: Option<PreviewHandle>,
}

impl PreviewLease {
    pub fn open(surface: Arc<dyn PreviewSurface>, asset: &MediaAsset) -> Result<Self> {
        let handle = surface.open(asset)?;
        Ok(Self {
            surface,
            handle: Some(handle),
        })
    }

    pub fn location(&self) -> Option<&Path> {
        self.handle.as_ref()?.location.as_deref()
    }

    /// Release now instead of at drop.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.surface.release(&handle);
        }
    }
}

impl Drop for PreviewLease {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl std::fmt::Debug for PreviewLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewLease")
            .field("handle", &self.handle)
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Surfaces
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Surface for headless use: hands out ids, holds nothing.
#[derive(Debug, Default)]
pub struct NoPreview {
    next_id: AtomicU64,
}

impl PreviewSurface for NoPreview {
    fn open(&self, _asset: &MediaAsset) -> Result<PreviewHandle> {
        Ok(PreviewHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            location: None,
        })
    }

    fn release(&self, _handle: &PreviewHandle) {}
}

/// Writes each previewed asset to a temporary file that lives until the
/// handle is released.
pub struct TempFilePreview {
    dir: PathBuf,
    next_id: AtomicU64,
    open: Mutex<HashMap<u64, NamedTempFile>>,
}

impl TempFilePreview {
    pub fn new() -> Self {
        Self::in_dir(std::env::temp_dir())
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_id: AtomicU64::new(0),
            open: Mutex::new(HashMap::new()),
        }
    }

    /// Number of previews currently held open.
    pub fn open_count(&self) -> usize {
        self.open.lock().len()
    }
}

impl Default for TempFilePreview {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewSurface for TempFilePreview {
    fn open(&self, asset: &MediaAsset) -> Result<PreviewHandle> {
        let suffix = Path::new(asset.name())
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix("vibe-ripper-preview-")
            .suffix(&suffix)
            .tempfile_in(&self.dir)
            .map_err(Error::Io)?;
        file.write_all(asset.bytes()).map_err(Error::Io)?;
        file.flush().map_err(Error::Io)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let location = file.path().to_path_buf();
        self.open.lock().insert(id, file);

        tracing::debug!(id, path = %location.display(), "preview opened");
        Ok(PreviewHandle {
            id,
            location: Some(location),
        })
    }

    fn release(&self, handle: &PreviewHandle) {
        // Dropping the NamedTempFile deletes it.
        if self.open.lock().remove(&handle.id).is_some() {
            tracing::debug!(id = handle.id, "preview released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vr_domain::media::MediaType;

    fn asset() -> MediaAsset {
        MediaAsset::new("frame.png", MediaType::new("image/png"), vec![7u8; 16])
    }

    #[test]
    fn temp_file_lives_until_lease_drops() {
        let dir = tempfile::tempdir().unwrap();
        let surface = Arc::new(TempFilePreview::in_dir(dir.path()));

        let lease = PreviewLease::open(surface.clone(), &asset()).unwrap();
        let path = lease.location().unwrap().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "png");
        assert_eq!(std::fs::read(&path).unwrap(), vec![7u8; 16]);
        assert_eq!(surface.open_count(), 1);

        drop(lease);
        assert!(!path.exists());
        assert_eq!(surface.open_count(), 0);
    }

    #[test]
    fn explicit_release_does_not_double_release() {
        struct Counting(AtomicU64);
        impl PreviewSurface for Counting {
            fn open(&self, _: &MediaAsset) -> Result<PreviewHandle> {
                Ok(PreviewHandle { id: 1, location: None })
            }
            fn release(&self, _: &PreviewHandle) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let surface = Arc::new(Counting(AtomicU64::new(0)));
        let lease = PreviewLease::open(surface.clone(), &asset()).unwrap();
        lease.release();
        assert_eq!(surface.0.load(Ordering::SeqCst), 1);
    }
}
