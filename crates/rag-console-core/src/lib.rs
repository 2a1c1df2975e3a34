//! # rag-console core
//!
//! Runtime-free logic shared by the rag-console client: collection
//! identifiers and selectors, the backend's wire models, the folder-structure
//! tree and its renderer, the submission state machine, and the user-facing
//! status messages.
//!
//! This crate performs no I/O and pulls in no async runtime or HTTP stack.
//! Everything here can be exercised with plain unit tests.

pub mod collection;
pub mod error;
pub mod messages;
pub mod models;
pub mod state;
pub mod tree;
pub mod validate;

pub use collection::{Collection, CollectionSelector};
pub use error::ValidationError;
pub use models::{FolderIngestResponse, IngestResponse, QueryRequest, QueryResult, Source};
pub use state::{Busy, Phase, SubmissionState, SubmitOutcome, UploadStatus};
pub use tree::{FolderEntry, FolderNode, LineKind, TreeLine};
