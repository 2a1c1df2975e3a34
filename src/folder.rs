//! Zipped-folder ingestion.
//!
//! [`FolderUploadController`] holds at most one armed archive. The archive's
//! size is known before its bytes are, so the 100 MiB guard runs without
//! reading anything. While the request is in flight the status shows an
//! optimistic "uploading" notice; the settled result always replaces it.
//!
//! A successful upload stores the backend's folder tree with the summary
//! message and disarms the archive. A failed one keeps the archive armed.
//! Because every settle overwrites the whole status, a failed re-upload
//! also drops the tree from the previous success.

use anyhow::{bail, Context, Result};
use rag_console_core::messages::{self, FOLDER_UPLOADING_NOTICE};
use rag_console_core::{
    tree, validate, Collection, FolderIngestResponse, Phase, SubmissionState, SubmitOutcome,
    UploadStatus, ValidationError,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::archive;
use crate::backend::{ApiError, Backend, FolderIngestRequest, HttpBackend};
use crate::config::Config;
use crate::progress::{StatusEvent, StatusReporter};
use crate::registry::CollectionRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ArchiveData {
    /// A zip on disk, read only once the size guard has passed.
    File(PathBuf),
    Memory(Vec<u8>),
}

/// A zip archive chosen for folder ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedArchive {
    name: String,
    size: u64,
    data: ArchiveData,
}

impl SelectedArchive {
    /// Select a zip on disk. Only its metadata is read here.
    pub fn open(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        if !meta.is_file() {
            bail!("Not a file: {}", path.display());
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "folder.zip".to_string());
        Ok(Self {
            name,
            size: meta.len(),
            data: ArchiveData::File(path.to_path_buf()),
        })
    }

    /// An archive that already lives in memory.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            data: ArchiveData::Memory(bytes),
        }
    }

    /// Pack `dir` with [`archive::pack_directory`]. A directory that does not
    /// fit under the upload limit fails with
    /// [`ValidationError::ArchiveTooLarge`] before the whole archive is built.
    pub fn pack(dir: &Path, excludes: &[String]) -> Result<Self> {
        let packed = archive::pack_directory(dir, excludes)?;
        info!(
            files = packed.files,
            bytes = packed.bytes.len(),
            "packed {}",
            dir.display()
        );
        Ok(Self::from_bytes(packed.archive_name, packed.bytes))
    }

    /// A `.zip` file is selected as-is; a directory is packed first.
    pub fn from_path(path: &Path, excludes: &[String]) -> Result<Self> {
        if path.is_dir() {
            Self::pack(path, excludes)
        } else {
            if !excludes.is_empty() {
                warn!("--exclude only applies when packing a directory");
            }
            Self::open(path)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    async fn read(&self) -> std::io::Result<Vec<u8>> {
        match &self.data {
            ArchiveData::File(path) => tokio::fs::read(path).await,
            ArchiveData::Memory(bytes) => Ok(bytes.clone()),
        }
    }
}

/// A folder upload that passed validation. The status already shows the
/// "uploading" notice.
#[derive(Debug)]
pub struct PendingFolderUpload {
    collection: Collection,
    archive: SelectedArchive,
}

impl PendingFolderUpload {
    pub fn archive(&self) -> &SelectedArchive {
        &self.archive
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Read the archive bytes and build the request.
    pub async fn into_request(self) -> std::io::Result<FolderIngestRequest> {
        let bytes = self.archive.read().await?;
        Ok(FolderIngestRequest {
            collection: self.collection,
            archive_name: self.archive.name,
            bytes,
        })
    }
}

#[derive(Debug, Default)]
pub struct FolderUploadController {
    collection: Option<Collection>,
    archive: Option<SelectedArchive>,
    state: SubmissionState<UploadStatus>,
}

impl FolderUploadController {
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

    /// Arm an archive, replacing any previous one.
    pub fn arm(&mut self, archive: SelectedArchive) {
        self.archive = Some(archive);
    }

    pub fn archive(&self) -> Option<&SelectedArchive> {
        self.archive.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn status(&self) -> Option<&UploadStatus> {
        self.state.value()
    }

    /// Validate the selection and switch to the optimistic "uploading" status.
    ///
    /// Missing inputs leave the shown status untouched. An oversized archive
    /// replaces it with the size-limit failure. In both cases the archive
    /// stays armed and no request is built.
    pub fn prepare(&mut self) -> Result<PendingFolderUpload, SubmitOutcome> {
        if self.state.begin().is_err() {
            return Err(SubmitOutcome::Ignored);
        }

        let size = self.archive.as_ref().map(SelectedArchive::size);
        if let Err(e) = validate::folder_upload(self.collection.as_ref(), size) {
            let shown = match e {
                ValidationError::ArchiveTooLarge { .. } => {
                    warn!(size = ?size, "archive over the folder upload limit");
                    Some(UploadStatus::failure(e.to_string()))
                }
                _ => None,
            };
            self.state.reject(shown);
            return Err(SubmitOutcome::Rejected(e));
        }

        let (Some(collection), Some(archive)) = (self.collection.clone(), self.archive.clone())
        else {
            self.state.reject(None);
            return Err(SubmitOutcome::Rejected(ValidationError::MissingArchive));
        };

        self.state
            .submit(Some(UploadStatus::success(FOLDER_UPLOADING_NOTICE)));
        Ok(PendingFolderUpload {
            collection,
            archive,
        })
    }

    /// Replace the optimistic status with the settled one.
    pub fn complete(&mut self, response: Result<FolderIngestResponse, ApiError>) -> SubmitOutcome {
        match response {
            Ok(resp) => {
                info!(
                    files = resp.files_processed,
                    chunks = resp.total_chunks,
                    skipped_binary = resp.skipped_binary_files,
                    failed = resp.failed_files,
                    "folder ingested"
                );
                let message = messages::folder_upload_succeeded(&resp);
                self.state
                    .settle(UploadStatus::success(message).with_tree(resp.folder_structure));
                self.archive = None;
                SubmitOutcome::Settled { success: true }
            }
            Err(e) => {
                warn!(error = %e, "folder ingestion failed");
                let message = e
                    .detail()
                    .unwrap_or(messages::FOLDER_FAILURE_FALLBACK)
                    .to_string();
                self.state.settle(UploadStatus::failure(message));
                SubmitOutcome::Settled { success: false }
            }
        }
    }

    /// Settle as failed when the archive could not be read after validation.
    pub fn fail_read(&mut self, error: &std::io::Error) -> SubmitOutcome {
        warn!(%error, "could not read archive");
        self.state
            .settle(UploadStatus::failure(messages::FOLDER_FAILURE_FALLBACK));
        SubmitOutcome::Settled { success: false }
    }

    /// Prepare, read, send, and complete in one step.
    pub async fn submit(&mut self, backend: &dyn Backend) -> SubmitOutcome {
        let pending = match self.prepare() {
            Ok(p) => p,
            Err(outcome) => return outcome,
        };
        self.send(backend, pending).await
    }

    async fn send(&mut self, backend: &dyn Backend, pending: PendingFolderUpload) -> SubmitOutcome {
        match pending.into_request().await {
            Ok(request) => {
                let response = backend.ingest_folder(request).await;
                self.complete(response)
            }
            Err(e) => self.fail_read(&e),
        }
    }
}

/// CLI entry point for `ragc ingest-folder`.
pub async fn run_ingest_folder(
    config: &Config,
    path: &Path,
    collection: Option<&str>,
    excludes: &[String],
    json: bool,
    reporter: &dyn StatusReporter,
) -> Result<SubmitOutcome> {
    let backend = HttpBackend::new(&config.backend)?;

    let collection = match collection {
        Some(c) => Some(Collection::new(c)),
        None => CollectionRegistry::load(&backend)
            .await
            .default_upload_collection(),
    };

    let mut controller = FolderUploadController::new(collection);
    match SelectedArchive::from_path(path, excludes) {
        Ok(archive) => controller.arm(archive),
        Err(e) => match e.downcast::<ValidationError>() {
            Ok(rejected) => {
                eprintln!("Error: {}", rejected);
                return Ok(SubmitOutcome::Rejected(rejected));
            }
            Err(e) => return Err(e),
        },
    }

    let pending = match controller.prepare() {
        Ok(p) => p,
        Err(SubmitOutcome::Rejected(e)) => {
            eprintln!("Error: {}", e);
            return Ok(SubmitOutcome::Rejected(e));
        }
        Err(outcome) => return Ok(outcome),
    };

    reporter.report(StatusEvent::Submitting {
        operation: "ingest-folder".to_string(),
        notice: controller.status().map(|s| s.message.clone()),
        bytes: Some(pending.archive().size()),
    });
    let outcome = controller.send(&backend, pending).await;
    reporter.report(StatusEvent::Settled {
        operation: "ingest-folder".to_string(),
        success: outcome.is_success(),
    });

    if let Some(status) = controller.status() {
        if json {
            println!("{}", serde_json::to_string_pretty(status)?);
        } else if status.success {
            println!("{}", status.message);
            if let Some(tree) = &status.folder_structure {
                if !tree.is_empty() {
                    println!();
                    print!("{}", tree::render_text(tree));
                }
            }
        } else {
            eprintln!("Error: {}", status.message);
        }
    }
    Ok(outcome)
}
