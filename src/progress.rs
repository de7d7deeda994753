//! Dispatch lifecycle callbacks.
//!
//! Attach an [`Arc<dyn DispatchObserver>`] with
//! [`crate::session::ExtractionOrchestrator::with_observer`] to hear about each
//! dispatch as it starts and settles, or when the selected file has no
//! preview. A terminal spinner and the test trackers are both observers.
//!
//! # Example
//!
//! ```rust
//! use extraction_playground::{DispatchObserver, DispatchRequest};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct Counter(AtomicUsize);
//!
//! impl DispatchObserver for Counter {
//!     fn on_dispatch_start(&self, _epoch: u64, _request: &DispatchRequest) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//! ```

use crate::session::orchestrator::{DispatchOutput, DispatchRequest};
use std::sync::Arc;

/// Called by the orchestrator around each dispatch.
///
/// All methods default to no-ops.
pub trait DispatchObserver: Send + Sync {
    /// A dispatch passed its guards and its request is about to be sent.
    fn on_dispatch_start(&self, epoch: u64, request: &DispatchRequest) {
        let _ = (epoch, request);
    }

    /// The dispatch settled successfully and its result is now visible.
    fn on_dispatch_complete(&self, epoch: u64, output: &DispatchOutput) {
        let _ = (epoch, output);
    }

    /// The dispatch failed; `message` is what the session now shows.
    fn on_dispatch_error(&self, epoch: u64, message: &str) {
        let _ = (epoch, message);
    }

    /// A settlement arrived for an epoch that is no longer current.
    fn on_settlement_discarded(&self, epoch: u64, current_epoch: u64) {
        let _ = (epoch, current_epoch);
    }

    /// The file was accepted but its preview could not be created or
    /// released. The selection still stands.
    fn on_preview_unavailable(&self, message: &str) {
        let _ = message;
    }
}

/// Observer that ignores every event. The default.
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}

/// Shared observer handle as stored by the orchestrator.
pub type SharedObserver = Arc<dyn DispatchObserver>;
