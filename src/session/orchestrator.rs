//! The extraction session and the state machine that drives it.
//!
//! ```text
//!  Idle ──select_file──▶ FileSelected ──toggle_model──▶ Ready
//!                                                        │ dispatch
//!                                                        ▼
//!             reset ◀── SucceededSingle | SucceededComparison | Failed ◀── Processing
//! ```
//!
//! [`ExtractionSession`] is plain data and only ever changed by the
//! [`ExtractionOrchestrator`]'s transition methods; callers read it through
//! [`ExtractionOrchestrator::session`].
//!
//! ## Dispatch and epochs
//!
//! A dispatch is three steps so a host can keep processing input while the
//! request is in flight:
//!
//! 1. [`begin_dispatch`](ExtractionOrchestrator::begin_dispatch) checks the
//!    guards, marks the session as processing and returns a
//!    [`DispatchTicket`] stamped with a fresh epoch;
//! 2. [`DispatchTicket::execute`] performs the single network call;
//! 3. [`apply`](ExtractionOrchestrator::apply) settles the session, but only
//!    if the ticket's epoch is still current.
//!
//! [`reset`](ExtractionOrchestrator::reset) advances the epoch, so a request
//! that was still pending when the user started over can never overwrite the
//! new session. [`dispatch`](ExtractionOrchestrator::dispatch) chains all
//! three steps for hosts that simply await the result.

use crate::client::ExtractionService;
use crate::config::ClientConfig;
use crate::error::PlaygroundError;
use crate::output::{ComparisonResult, ExtractionResult};
use crate::progress::{NoopObserver, SharedObserver};
use crate::session::preview::{PreviewBackend, PreviewHandle, PreviewManager, TempFileBackend};
use crate::session::selection::{ModelSelection, ToggleOutcome};
use crate::session::upload::{FileGate, UploadCandidate};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the session currently shows besides its inputs.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Outcome {
    #[default]
    Empty,
    Single(ExtractionResult),
    Comparison(ComparisonResult),
    /// The one error message currently shown.
    Failed(String),
}

/// Coarse state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    FileSelected,
    Ready,
    Processing,
    SucceededSingle,
    SucceededComparison,
    Failed,
}

/// The aggregate owned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractionSession {
    upload: Option<UploadCandidate>,
    models: ModelSelection,
    processing: bool,
    outcome: Outcome,
}

impl ExtractionSession {
    pub fn upload(&self) -> Option<&UploadCandidate> {
        self.upload.as_ref()
    }

    pub fn models(&self) -> &ModelSelection {
        &self.models
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn single_result(&self) -> Option<&ExtractionResult> {
        match &self.outcome {
            Outcome::Single(r) => Some(r),
            _ => None,
        }
    }

    pub fn comparison_result(&self) -> Option<&ComparisonResult> {
        match &self.outcome {
            Outcome::Comparison(r) => Some(r),
            _ => None,
        }
    }

    /// File present, at least one model, nothing in flight.
    pub fn can_dispatch(&self) -> bool {
        self.upload.is_some() && !self.models.is_empty() && !self.processing
    }

    pub fn phase(&self) -> SessionPhase {
        if self.processing {
            return SessionPhase::Processing;
        }
        match &self.outcome {
            Outcome::Single(_) => SessionPhase::SucceededSingle,
            Outcome::Comparison(_) => SessionPhase::SucceededComparison,
            Outcome::Failed(_) => SessionPhase::Failed,
            Outcome::Empty => match (&self.upload, self.models.is_empty()) {
                (Some(_), false) => SessionPhase::Ready,
                (Some(_), true) => SessionPhase::FileSelected,
                (None, _) => SessionPhase::Idle,
            },
        }
    }
}

/// The request a ticket will send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchRequest {
    Single { model: String },
    Compare { models: Vec<String> },
}

impl DispatchRequest {
    fn for_selection(models: &ModelSelection) -> Self {
        match models.as_slice() {
            [only] => DispatchRequest::Single {
                model: only.clone(),
            },
            many => DispatchRequest::Compare {
                models: many.to_vec(),
            },
        }
    }

    pub fn models(&self) -> Vec<&str> {
        match self {
            DispatchRequest::Single { model } => vec![model.as_str()],
            DispatchRequest::Compare { models } => models.iter().map(String::as_str).collect(),
        }
    }
}

/// Successful payload of a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutput {
    Single(ExtractionResult),
    Comparison(ComparisonResult),
}

/// One pending dispatch: its epoch, its own copy of the inputs, and the
/// request it will make.
#[derive(Debug, Clone)]
pub struct DispatchTicket {
    epoch: u64,
    upload: UploadCandidate,
    request: DispatchRequest,
}

impl DispatchTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn request(&self) -> &DispatchRequest {
        &self.request
    }

    /// Perform the network call. Exactly one request is issued per ticket.
    pub async fn execute(self, service: &dyn ExtractionService) -> Settlement {
        let result = match &self.request {
            DispatchRequest::Single { model } => service
                .extract_single(&self.upload, model)
                .await
                .map(DispatchOutput::Single),
            DispatchRequest::Compare { models } => service
                .extract_compare(&self.upload, models)
                .await
                .map(|response| DispatchOutput::Comparison(response.into_result())),
        };
        Settlement {
            epoch: self.epoch,
            result,
        }
    }
}

/// The resolved outcome of a ticket, ready to [`apply`](ExtractionOrchestrator::apply).
#[derive(Debug)]
pub struct Settlement {
    epoch: u64,
    result: Result<DispatchOutput, PlaygroundError>,
}

impl Settlement {
    pub fn new(epoch: u64, result: Result<DispatchOutput, PlaygroundError>) -> Self {
        Self { epoch, result }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Owns an [`ExtractionSession`] and is the only code that mutates it.
pub struct ExtractionOrchestrator {
    session: ExtractionSession,
    gate: FileGate,
    preview: PreviewManager,
    epoch: u64,
    observer: SharedObserver,
}

impl ExtractionOrchestrator {
    /// Orchestrator with temp-file previews and the config's upload limit.
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_preview_backend(config, Arc::new(TempFileBackend))
    }

    pub fn with_preview_backend(config: &ClientConfig, backend: Arc<dyn PreviewBackend>) -> Self {
        Self {
            session: ExtractionSession::default(),
            gate: FileGate::from_config(config),
            preview: PreviewManager::new(backend),
            epoch: 0,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn session(&self) -> &ExtractionSession {
        &self.session
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.current()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn gate(&self) -> &FileGate {
        &self.gate
    }

    /// Offer a new file.
    ///
    /// Returns `Ok(true)` when accepted, `Ok(false)` when ignored because a
    /// dispatch is in flight. A rejection becomes the session's error message
    /// and is also returned; the previously selected file stays selected.
    pub fn select_file(&mut self, candidate: UploadCandidate) -> Result<bool, PlaygroundError> {
        if self.session.processing {
            debug!("Ignoring file selection while processing");
            return Ok(false);
        }
        if let Err(e) = self.gate.validate(&candidate) {
            warn!("Rejected '{}': {}", candidate.name(), e);
            self.session.outcome = Outcome::Failed(e.to_string());
            return Err(e);
        }

        info!("Selected '{}' ({} bytes)", candidate.name(), candidate.size());
        // Preview failures leave the selection valid.
        if let Err(e) = self.preview.sync(Some(&candidate)) {
            self.observer.on_preview_unavailable(&e.to_string());
        }
        self.session.upload = Some(candidate);
        self.session.outcome = Outcome::Empty;
        Ok(true)
    }

    /// Remove the selected file. Ignored while processing.
    pub fn clear_file(&mut self) -> bool {
        if self.session.processing {
            return false;
        }
        self.session.upload = None;
        if let Err(e) = self.preview.sync(None) {
            self.observer.on_preview_unavailable(&e.to_string());
        }
        true
    }

    /// Toggle a model. Returns `None` when ignored because a dispatch is in
    /// flight.
    pub fn toggle_model(&mut self, model: &str) -> Option<ToggleOutcome> {
        if self.session.processing {
            debug!("Ignoring toggle of '{}' while processing", model);
            return None;
        }
        let outcome = self.session.models.toggle_in_place(model);
        debug!("Toggle '{}': {:?} → {:?}", model, outcome, self.session.models.as_slice());
        Some(outcome)
    }

    /// Start a dispatch if the guards allow it.
    ///
    /// Returns `None` without touching the session when no file is selected,
    /// no model is selected, or a dispatch is already in flight.
    pub fn begin_dispatch(&mut self) -> Option<DispatchTicket> {
        if !self.session.can_dispatch() {
            debug!(
                "Dispatch guard: file={} models={} processing={}",
                self.session.upload.is_some(),
                self.session.models.len(),
                self.session.processing
            );
            return None;
        }
        let upload = self.session.upload.clone()?;

        self.epoch += 1;
        self.session.processing = true;
        self.session.outcome = Outcome::Empty;

        let request = DispatchRequest::for_selection(&self.session.models);
        info!("Dispatch #{}: {:?}", self.epoch, request);
        self.observer.on_dispatch_start(self.epoch, &request);

        Some(DispatchTicket {
            epoch: self.epoch,
            upload,
            request,
        })
    }

    /// Settle the session with a ticket's result.
    ///
    /// Returns `false` and changes nothing when the settlement belongs to an
    /// earlier epoch.
    pub fn apply(&mut self, settlement: Settlement) -> bool {
        if settlement.epoch != self.epoch || !self.session.processing {
            warn!(
                "Discarding settlement of dispatch #{} (current epoch {})",
                settlement.epoch, self.epoch
            );
            self.observer
                .on_settlement_discarded(settlement.epoch, self.epoch);
            return false;
        }

        self.session.processing = false;
        match settlement.result {
            Ok(output) => {
                info!("Dispatch #{} completed", settlement.epoch);
                self.observer.on_dispatch_complete(settlement.epoch, &output);
                self.session.outcome = match output {
                    DispatchOutput::Single(r) => Outcome::Single(r),
                    DispatchOutput::Comparison(c) => Outcome::Comparison(c),
                };
            }
            Err(e) => {
                warn!("Dispatch #{} failed: {}", settlement.epoch, e);
                let message = e.user_message();
                self.observer.on_dispatch_error(settlement.epoch, &message);
                self.session.outcome = Outcome::Failed(message);
            }
        }
        true
    }

    /// Begin, execute and apply a dispatch. Returns `false` when the guards
    /// turned it into a no-op.
    pub async fn dispatch(&mut self, service: &dyn ExtractionService) -> bool {
        let Some(ticket) = self.begin_dispatch() else {
            return false;
        };
        let settlement = ticket.execute(service).await;
        self.apply(settlement)
    }

    /// Return to a fresh session from any state.
    pub fn reset(&mut self) {
        info!("Session reset");
        self.session = ExtractionSession::default();
        self.preview.release();
        self.epoch += 1;
    }
}

impl std::fmt::Debug for ExtractionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionOrchestrator")
            .field("session", &self.session)
            .field("gate", &self.gate)
            .field("preview", &self.preview)
            .field("epoch", &self.epoch)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{ComparisonResponse, ExtractionStatus, ModelInfo};
    use crate::session::preview::MemoryBackend;
    use crate::session::upload::PDF_MEDIA_TYPE;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl ExtractionService for Echo {
        async fn list_models(&self) -> Result<Vec<ModelInfo>, PlaygroundError> {
            Ok(Vec::new())
        }

        async fn extract_single(
            &self,
            _file: &UploadCandidate,
            model: &str,
        ) -> Result<ExtractionResult, PlaygroundError> {
            Ok(ExtractionResult {
                task_id: None,
                model: model.to_string(),
                status: ExtractionStatus::Completed,
                markdown_content: format!("# {model}"),
                metrics: None,
                error: None,
            })
        }

        async fn extract_compare(
            &self,
            _file: &UploadCandidate,
            _models: &[String],
        ) -> Result<ComparisonResponse, PlaygroundError> {
            Err(PlaygroundError::Internal("not used".into()))
        }
    }

    fn orchestrator() -> ExtractionOrchestrator {
        ExtractionOrchestrator::with_preview_backend(&ClientConfig::default(), Arc::new(MemoryBackend::default()))
    }

    fn pdf() -> UploadCandidate {
        UploadCandidate::new("doc.pdf", PDF_MEDIA_TYPE, b"%PDF-1.7 test".to_vec())
    }

    #[test]
    fn phases_follow_inputs() {
        let mut o = orchestrator();
        assert_eq!(o.session().phase(), SessionPhase::Idle);
        o.select_file(pdf()).unwrap();
        assert_eq!(o.session().phase(), SessionPhase::FileSelected);
        o.toggle_model("docling");
        assert_eq!(o.session().phase(), SessionPhase::Ready);
        let ticket = o.begin_dispatch().unwrap();
        assert_eq!(o.session().phase(), SessionPhase::Processing);
        assert_eq!(ticket.request(), &DispatchRequest::Single { model: "docling".into() });
    }

    #[test]
    fn dispatch_without_inputs_is_noop() {
        let mut o = orchestrator();
        assert!(o.begin_dispatch().is_none());
        o.select_file(pdf()).unwrap();
        assert!(o.begin_dispatch().is_none());
        assert_eq!(o.epoch(), 0);
        assert!(!o.session().is_processing());
    }

    #[test]
    fn blocking_dispatch_with_tokio_test() {
        let mut o = orchestrator();
        o.select_file(pdf()).unwrap();
        o.toggle_model("mineru");
        assert!(tokio_test::block_on(o.dispatch(&Echo)));
        assert_eq!(o.session().phase(), SessionPhase::SucceededSingle);
        assert_eq!(o.session().single_result().unwrap().markdown_content, "# mineru");
    }

    #[test]
    fn toggles_ignored_while_processing() {
        let mut o = orchestrator();
        o.select_file(pdf()).unwrap();
        o.toggle_model("a");
        let _ticket = o.begin_dispatch().unwrap();
        assert_eq!(o.toggle_model("b"), None);
        assert_eq!(o.session().models().as_slice(), ["a"]);
        assert!(!o.select_file(pdf()).unwrap());
        assert!(!o.clear_file());
    }
}
