//! Client-side session state.
//!
//! Each submodule owns one concern of the upload-and-extract flow:
//!
//! ```text
//! upload ──▶ selection ──▶ orchestrator ──▶ (client) ──▶ metrics
//!   │                          │
//!   └────────▶ preview ◀───────┘
//! ```
//!
//! 1. [`upload`]: upload candidates and the [`FileGate`] size/type check
//! 2. [`selection`]: the 1..=3 model selection
//! 3. [`preview`]: the single live preview handle for the selected file
//! 4. [`orchestrator`]: the session aggregate and its state machine

pub mod orchestrator;
pub mod preview;
pub mod selection;
pub mod upload;

pub use orchestrator::{
    DispatchOutput, DispatchRequest, DispatchTicket, ExtractionOrchestrator, ExtractionSession,
    Outcome, SessionPhase, Settlement,
};
pub use preview::{MemoryBackend, PreviewBackend, PreviewHandle, PreviewManager, TempFileBackend};
pub use selection::{ModelSelection, ToggleOutcome};
pub use upload::{format_bytes, FileGate, UploadCandidate, PDF_MEDIA_TYPE};
