//! # extraction-playground
//!
//! Upload a PDF, run it through one or more extraction models on a remote
//! service, and compare what each model produced.
//!
//! The crate is the client side of that flow: it validates the upload,
//! enforces the 1–3 model selection, dispatches either a single extraction or
//! a comparison, tracks progress and errors, keeps a preview of the selected
//! file alive, and derives the comparison metrics (fastest model, most
//! elements, longest content, ranked speed table) from the per-model results.
//!
//! ## Flow
//!
//! ```text
//! file ─▶ FileGate ─▶ ExtractionOrchestrator ─▶ ExtractionService ─▶ metrics
//!                         │        ▲                (HTTP)
//!                  PreviewManager  └─ toggle_model (1..=3)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use extraction_playground::{
//!     ClientConfig, ExtractionOrchestrator, HttpExtractionService, UploadCandidate,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::default();
//!     let service = HttpExtractionService::new(&config)?;
//!     let mut session = ExtractionOrchestrator::new(&config);
//!
//!     session.select_file(UploadCandidate::from_path("paper.pdf").await?)?;
//!     session.toggle_model("docling");
//!     session.toggle_model("mineru");
//!     session.dispatch(&service).await;
//!
//!     if let Some(cmp) = session.session().comparison_result() {
//!         println!("fastest: {:?}", cmp.metrics().fastest_model);
//!     } else if let Some(err) = session.session().error_message() {
//!         eprintln!("{err}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `playground` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod metrics;
pub mod output;
pub mod progress;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{ExtractionService, HttpExtractionService};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_API_URL, DEFAULT_MAX_FILE_SIZE};
pub use error::{PlaygroundError, GENERIC_FAILURE_MESSAGE};
pub use export::{combined_markdown, export_comparison, export_file_name, export_single, write_markdown};
pub use metrics::{derive_comparison_metrics, speed_ranking, summarize, ModelSummary, SpeedRank};
pub use indexmap::IndexMap;
pub use output::{
    ComparisonMetrics, ComparisonResponse, ComparisonResult, ExtractionMetrics, ExtractionResult,
    ExtractionStatus, ModelInfo,
};
pub use progress::{DispatchObserver, NoopObserver, SharedObserver};
pub use session::{
    format_bytes, DispatchOutput, DispatchRequest, DispatchTicket, ExtractionOrchestrator,
    ExtractionSession, FileGate, MemoryBackend, ModelSelection, Outcome, PreviewBackend,
    PreviewHandle, PreviewManager, SessionPhase, Settlement, TempFileBackend, ToggleOutcome,
    UploadCandidate, PDF_MEDIA_TYPE,
};
