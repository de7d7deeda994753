//! Preview handles for the selected file.
//!
//! A viewer needs a URL it can open while the file is selected. The
//! [`PreviewManager`] keeps exactly one [`PreviewHandle`] alive for the
//! current candidate and drops it as soon as the candidate changes or goes
//! away. Release is tied to `Drop`, so a handle is released exactly once
//! whichever way it leaves the manager: replacement, clear, reset, or the
//! manager itself being dropped.

use crate::error::PlaygroundError;
use crate::session::upload::UploadCandidate;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::TempPath;
use tracing::{debug, warn};

/// Creates preview handles for upload candidates.
pub trait PreviewBackend: Send + Sync {
    /// Create a handle for `candidate`. The returned handle's guard is
    /// dropped when the handle is released.
    fn acquire(&self, candidate: &UploadCandidate) -> Result<PreviewHandle, PlaygroundError>;
}

/// A live, revocable reference to the selected file.
pub struct PreviewHandle {
    candidate_id: u64,
    url: String,
    _guard: Box<dyn Send + Sync>,
}

impl PreviewHandle {
    /// Wrap a URL and the guard that keeps its resource alive.
    pub fn new(candidate: &UploadCandidate, url: impl Into<String>, guard: impl Send + Sync + 'static) -> Self {
        Self {
            candidate_id: candidate.id(),
            url: url.into(),
            _guard: Box::new(guard),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn candidate_id(&self) -> u64 {
        self.candidate_id
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("candidate_id", &self.candidate_id)
            .field("url", &self.url)
            .finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        debug!("Released preview {}", self.url);
    }
}

/// Default backend: a private temporary copy of the PDF, exposed as a
/// `file://` URL and deleted on release.
#[derive(Debug, Default)]
pub struct TempFileBackend;

impl PreviewBackend for TempFileBackend {
    fn acquire(&self, candidate: &UploadCandidate) -> Result<PreviewHandle, PlaygroundError> {
        let mut file = tempfile::Builder::new()
            .prefix("playground-preview-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| PlaygroundError::Preview(format!("tempfile: {e}")))?;
        file.write_all(candidate.bytes())
            .map_err(|e| PlaygroundError::Preview(format!("tempfile write: {e}")))?;
        let path: TempPath = file.into_temp_path();
        let url = format!("file://{}", path.display());
        Ok(PreviewHandle::new(candidate, url, path))
    }
}

/// Issues in-memory `preview://` URLs with no backing resource.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    next: AtomicU64,
}

impl PreviewBackend for MemoryBackend {
    fn acquire(&self, candidate: &UploadCandidate) -> Result<PreviewHandle, PlaygroundError> {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        let url = format!("preview://{}/{}", n, candidate.name());
        Ok(PreviewHandle::new(candidate, url, ()))
    }
}

/// Owns the single live preview handle.
pub struct PreviewManager {
    backend: Arc<dyn PreviewBackend>,
    current: Option<PreviewHandle>,
}

impl PreviewManager {
    pub fn new(backend: Arc<dyn PreviewBackend>) -> Self {
        Self {
            backend,
            current: None,
        }
    }

    /// The live handle, if any.
    pub fn current(&self) -> Option<&PreviewHandle> {
        self.current.as_ref()
    }

    /// Follow the selected candidate.
    ///
    /// Same candidate as the live handle: nothing happens. Otherwise the old
    /// handle is released first, then a new one is acquired for `candidate`
    /// (if any). On a backend error no handle is live afterwards.
    pub fn sync(&mut self, candidate: Option<&UploadCandidate>) -> Result<(), PlaygroundError> {
        let unchanged = match (candidate, &self.current) {
            (Some(c), Some(h)) => c.id() == h.candidate_id(),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return Ok(());
        }

        self.release();

        if let Some(c) = candidate {
            match self.backend.acquire(c) {
                Ok(handle) => {
                    debug!("Acquired preview {} for '{}'", handle.url(), c.name());
                    self.current = Some(handle);
                }
                Err(e) => {
                    warn!("Preview for '{}' unavailable: {}", c.name(), e);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Release the live handle, if any.
    pub fn release(&mut self) {
        self.current.take();
    }
}

impl std::fmt::Debug for PreviewManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewManager")
            .field("current", &self.current)
            .finish()
    }
}
