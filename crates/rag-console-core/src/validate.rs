//! Preconditions checked before any ingestion request is sent.

use crate::collection::Collection;
use crate::error::ValidationError;
use crate::messages::MAX_FOLDER_ZIP_BYTES;

/// Which content a single upload will carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentChoice {
    File,
    Text,
}

fn check_collection(collection: Option<&Collection>) -> Result<&Collection, ValidationError> {
    let collection = collection.ok_or(ValidationError::MissingCollection)?;
    if collection.as_str().trim().is_empty() {
        return Err(ValidationError::MissingCollection);
    }
    if !collection.is_uploadable() {
        return Err(ValidationError::NotUploadable(collection.to_string()));
    }
    Ok(collection)
}

/// Validate a single upload and decide what it sends.
///
/// A selected file always wins over pasted text.
pub fn single_upload(
    collection: Option<&Collection>,
    has_file: bool,
    text: &str,
) -> Result<ContentChoice, ValidationError> {
    check_collection(collection)?;
    if has_file {
        Ok(ContentChoice::File)
    } else if !text.trim().is_empty() {
        Ok(ContentChoice::Text)
    } else {
        Err(ValidationError::MissingContent)
    }
}

/// Validate a folder upload given the archive size, if an archive is selected.
pub fn folder_upload(
    collection: Option<&Collection>,
    archive_size: Option<u64>,
) -> Result<(), ValidationError> {
    check_collection(collection)?;
    let size = archive_size.ok_or(ValidationError::MissingArchive)?;
    if size > MAX_FOLDER_ZIP_BYTES {
        return Err(ValidationError::ArchiveTooLarge { size });
    }
    Ok(())
}
