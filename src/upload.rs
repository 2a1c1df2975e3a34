//! Single-document ingestion: pasted text or one file.
//!
//! [`SingleUploadController`] keeps the armed inputs (an optional file and a
//! text buffer) between attempts. Arming one input never clears the other;
//! when both are present at submit time the file is sent and the text is
//! ignored. A successful upload clears both inputs, a failed one keeps
//! them so the user can retry as-is.

use anyhow::{Context, Result};
use rag_console_core::validate::{self, ContentChoice};
use rag_console_core::{
    messages, Collection, IngestResponse, Phase, SubmissionState, SubmitOutcome, UploadStatus,
    ValidationError,
};
use std::path::Path;
use tracing::{info, warn};

use crate::backend::{ApiError, Backend, HttpBackend, IngestContent, IngestRequest};
use crate::config::Config;
use crate::progress::{StatusEvent, StatusReporter};
use crate::registry::CollectionRegistry;

/// A file chosen for upload, read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read `path`; the upload is named after its final component.
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// An upload that passed validation and is waiting for its response.
#[derive(Debug)]
pub struct PendingUpload {
    request: IngestRequest,
}

impl PendingUpload {
    pub fn request(&self) -> &IngestRequest {
        &self.request
    }

    pub fn into_request(self) -> IngestRequest {
        self.request
    }
}

#[derive(Debug, Default)]
pub struct SingleUploadController {
    collection: Option<Collection>,
    file: Option<SelectedFile>,
    text: String,
    state: SubmissionState<UploadStatus>,
}

impl SingleUploadController {
    pub fn new(collection: Option<Collection>) -> Self {
        Self {
            collection,
            ..Self::default()
        }
    }

    pub fn select_collection(&mut self, collection: Option<Collection>) {
        self.collection = collection;
    }

    pub fn collection(&self) -> Option<&Collection> {
        self.collection.as_ref()
    }

    /// Arm a file. Pasted text is kept.
    pub fn arm_file(&mut self, file: SelectedFile) {
        self.file = Some(file);
    }

    /// Replace the pasted text. An armed file is kept.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Outcome of the latest attempt; cleared while a request is in flight.
    pub fn status(&self) -> Option<&UploadStatus> {
        self.state.value()
    }

    /// Validate the armed inputs and build the request.
    ///
    /// Returns `Err(Ignored)` while busy and `Err(Rejected(..))` when
    /// validation fails; neither changes the inputs or the shown status.
    pub fn prepare(&mut self) -> Result<PendingUpload, SubmitOutcome> {
        if self.state.begin().is_err() {
            return Err(SubmitOutcome::Ignored);
        }

        let choice =
            match validate::single_upload(self.collection.as_ref(), self.file.is_some(), &self.text)
            {
                Ok(choice) => choice,
                Err(e) => {
                    self.state.reject(None);
                    return Err(SubmitOutcome::Rejected(e));
                }
            };

        let content = match (choice, &self.file) {
            (ContentChoice::File, Some(file)) => IngestContent::File {
                name: file.name.clone(),
                bytes: file.bytes.clone(),
            },
            _ => IngestContent::Text(self.text.clone()),
        };
        let Some(collection) = self.collection.clone() else {
            self.state.reject(None);
            return Err(SubmitOutcome::Rejected(ValidationError::MissingCollection));
        };

        self.state.submit(None);
        Ok(PendingUpload {
            request: IngestRequest {
                collection,
                content,
            },
        })
    }

    /// Record the response and leave the busy state.
    pub fn complete(
        &mut self,
        response: Result<IngestResponse, ApiError>,
    ) -> SubmitOutcome {
        match response {
            Ok(resp) => {
                info!(chunks = resp.chunks_processed, "document ingested");
                self.state
                    .settle(UploadStatus::success(messages::upload_succeeded(
                        resp.chunks_processed,
                    )));
                self.file = None;
                self.text.clear();
                SubmitOutcome::Settled { success: true }
            }
            Err(e) => {
                warn!(error = %e, "document ingestion failed");
                let message = e
                    .detail()
                    .unwrap_or(messages::UPLOAD_FAILURE_FALLBACK)
                    .to_string();
                self.state.settle(UploadStatus::failure(message));
                SubmitOutcome::Settled { success: false }
            }
        }
    }

    /// Prepare, send, and complete in one step.
    pub async fn submit(&mut self, backend: &dyn Backend) -> SubmitOutcome {
        let pending = match self.prepare() {
            Ok(p) => p,
            Err(outcome) => return outcome,
        };
        let response = backend.ingest(pending.into_request()).await;
        self.complete(response)
    }
}

/// CLI entry point for `ragc ingest`.
pub async fn run_ingest(
    config: &Config,
    collection: Option<&str>,
    file: Option<&Path>,
    text: Option<String>,
    reporter: &dyn StatusReporter,
) -> Result<SubmitOutcome> {
    let backend = HttpBackend::new(&config.backend)?;

    let collection = match collection {
        Some(c) => Some(Collection::new(c)),
        None => CollectionRegistry::load(&backend)
            .await
            .default_upload_collection(),
    };

    let mut controller = SingleUploadController::new(collection);
    if let Some(path) = file {
        controller.arm_file(SelectedFile::load(path).await?);
    }
    if let Some(text) = text {
        if controller.file().is_some() && !text.trim().is_empty() {
            warn!("both --file and --text given; the file is uploaded and the text ignored");
        }
        controller.set_text(text);
    }

    let pending = match controller.prepare() {
        Ok(p) => p,
        Err(SubmitOutcome::Rejected(e)) => {
            eprintln!("Error: {}", e);
            return Ok(SubmitOutcome::Rejected(e));
        }
        Err(outcome) => return Ok(outcome),
    };

    let bytes = match &pending.request().content {
        IngestContent::File { bytes, .. } => Some(bytes.len() as u64),
        IngestContent::Text(t) => Some(t.len() as u64),
    };
    reporter.report(StatusEvent::Submitting {
        operation: "ingest".to_string(),
        notice: None,
        bytes,
    });
    let response = backend.ingest(pending.into_request()).await;
    let outcome = controller.complete(response);
    reporter.report(StatusEvent::Settled {
        operation: "ingest".to_string(),
        success: outcome.is_success(),
    });

    if let Some(status) = controller.status() {
        if status.success {
            println!("{}", status.message);
        } else {
            eprintln!("Error: {}", status.message);
        }
    }
    Ok(outcome)
}
