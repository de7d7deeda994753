//! Error types for the extraction-playground library.
//!
//! A single [`PlaygroundError`] covers every failure the client can surface,
//! grouped by where it originates:
//!
//! * **Validation**: the candidate file was rejected locally by
//!   [`crate::session::FileGate`]. No request is ever sent for these.
//! * **Service**: the extraction service could not be reached, timed out,
//!   answered with a non-2xx status, or returned a body we could not decode.
//!   The orchestrator catches these at the dispatch boundary and stores them
//!   as the session's error message.
//! * **Local I/O and configuration**: reading input files, writing exported
//!   markdown, building a [`crate::config::ClientConfig`].
//!
//! Two situations are deliberately *not* errors: a dispatch attempted while
//! its preconditions are unmet (a silent no-op), and a single model failing
//! inside a comparison batch (recorded as `status = failed` on that entry).

use crate::session::upload::format_bytes;
use std::path::PathBuf;
use thiserror::Error;

/// Message shown when a dispatch fails and the service supplied no detail.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to extract PDF. Please try again.";

/// All errors returned by the extraction-playground library.
#[derive(Debug, Error)]
pub enum PlaygroundError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The file exceeds the configured upload limit.
    #[error("File too large. Maximum size is {}", human(.max_bytes))]
    FileTooLarge { size: u64, max_bytes: u64 },

    /// The declared media type is not PDF.
    #[error("Invalid file type: {media_type}. Only PDF files are allowed.")]
    NotAPdf { media_type: String },

    /// The file has no content.
    #[error("File is empty")]
    EmptyFile,

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Input file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Service errors ────────────────────────────────────────────────────
    /// The service answered with a non-success status.
    ///
    /// `detail` carries the human-readable `detail` field of the error body
    /// when the service provided one.
    #[error("Extraction service returned HTTP {status}{}", detail_suffix(.detail))]
    ServiceError { status: u16, detail: Option<String> },

    /// The request never produced a response.
    #[error("Failed to reach extraction service at '{url}': {reason}")]
    Network { url: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("Request to '{url}' timed out after {secs}s\nIncrease --timeout.")]
    Timeout { url: String, secs: u64 },

    /// The response body did not match the expected schema.
    #[error("Unexpected response from extraction service: {0}")]
    InvalidResponse(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an exported Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The preview backend could not create a handle.
    #[error("Preview unavailable: {0}")]
    Preview(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaygroundError {
    /// True for errors produced by the local upload checks.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PlaygroundError::FileTooLarge { .. }
                | PlaygroundError::NotAPdf { .. }
                | PlaygroundError::EmptyFile
        )
    }

    /// The server-supplied `detail` message, if this error carries one.
    pub fn service_detail(&self) -> Option<&str> {
        match self {
            PlaygroundError::ServiceError {
                detail: Some(detail),
                ..
            } => Some(detail.as_str()),
            _ => None,
        }
    }

    /// The message a user should see for a failed dispatch.
    ///
    /// The service detail is used verbatim when present; every other failure
    /// collapses to [`GENERIC_FAILURE_MESSAGE`].
    pub fn user_message(&self) -> String {
        self.service_detail()
            .map(str::to_owned)
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string())
    }
}

fn human(bytes: &u64) -> String {
    format_bytes(*bytes)
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {d}"),
        None => String::new(),
    }
}
