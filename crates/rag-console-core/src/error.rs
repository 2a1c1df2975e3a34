//! Local validation failures.
//!
//! These are raised before any request is made and are distinct from
//! transport or backend errors. The `Display` text is what the user sees.

use thiserror::Error;

use crate::messages;

/// A submission blocked on the client side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No target collection is selected.
    #[error("Please select a collection before uploading.")]
    MissingCollection,

    /// Single upload with neither a file nor non-blank text.
    #[error("Please provide either a file or text to upload.")]
    MissingContent,

    /// Folder upload without a zip archive.
    #[error("Please select a zip file containing your folder.")]
    MissingArchive,

    /// Folder archive above [`messages::MAX_FOLDER_ZIP_BYTES`].
    #[error("{}", messages::size_limit_exceeded(*size))]
    ArchiveTooLarge { size: u64 },

    /// The selected collection cannot receive documents.
    #[error("Collection '{0}' does not accept uploads.")]
    NotUploadable(String),
}
