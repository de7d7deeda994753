//! Upload candidates and the [`FileGate`] that admits them.
//!
//! The gate is the only place upload constraints are checked. A rejected
//! candidate never reaches the network: the orchestrator stores the reason
//! as its error message and leaves the current file untouched.

use crate::config::ClientConfig;
use crate::error::PlaygroundError;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Media type accepted by the extraction service.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

static NEXT_CANDIDATE_ID: AtomicU64 = AtomicU64::new(1);

/// A file the user picked for upload.
///
/// Cloning is cheap: the payload is shared. Each constructed candidate gets a
/// process-unique [`id`](Self::id), which is what the preview manager tracks
/// to notice that the selection changed.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    id: u64,
    name: String,
    media_type: String,
    bytes: Arc<[u8]>,
}

impl std::fmt::Debug for UploadCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadCandidate")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl UploadCandidate {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            id: NEXT_CANDIDATE_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            media_type: media_type.into(),
            bytes: Arc::from(bytes.into()),
        }
    }

    /// Read a local file, declaring its media type from its content.
    ///
    /// Files starting with the `%PDF` magic bytes are declared
    /// `application/pdf`; anything else is typed from its extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, PlaygroundError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PlaygroundError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => PlaygroundError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());
        let media_type = sniff_media_type(&bytes, path);
        debug!("Read {} ({} bytes, {})", path.display(), bytes.len(), media_type);

        Ok(Self::new(name, media_type, bytes))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_pdf(&self) -> bool {
        let essence = self.media_type.split(';').next().unwrap_or("").trim();
        essence.eq_ignore_ascii_case(PDF_MEDIA_TYPE)
    }
}

fn sniff_media_type(bytes: &[u8], path: &Path) -> String {
    if bytes.starts_with(b"%PDF") {
        return PDF_MEDIA_TYPE.to_string();
    }
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => PDF_MEDIA_TYPE,
        "txt" | "md" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "html" | "htm" => "text/html",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Admission check for upload candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileGate {
    max_bytes: u64,
}

impl FileGate {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.max_file_size)
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Accept or reject `candidate`. Checks size, then type, then emptiness.
    pub fn validate(&self, candidate: &UploadCandidate) -> Result<(), PlaygroundError> {
        if candidate.size() > self.max_bytes {
            return Err(PlaygroundError::FileTooLarge {
                size: candidate.size(),
                max_bytes: self.max_bytes,
            });
        }
        if !candidate.is_pdf() {
            return Err(PlaygroundError::NotAPdf {
                media_type: candidate.media_type().to_string(),
            });
        }
        if candidate.size() == 0 {
            return Err(PlaygroundError::EmptyFile);
        }
        Ok(())
    }
}

/// Format a byte count with binary units, e.g. `52428800 → "50 MB"`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let number = format!("{value:.2}");
    let number = number.trim_end_matches('0').trim_end_matches('.');
    format!("{number} {}", UNITS[unit])
}
