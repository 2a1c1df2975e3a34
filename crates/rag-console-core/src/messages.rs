//! User-facing status messages.
//!
//! Every message a controller stores is composed here so the wording stays
//! in one place and the composition rules can be tested without a backend.

use crate::models::FolderIngestResponse;

/// Largest zip archive accepted for folder ingestion (100 MiB).
pub const MAX_FOLDER_ZIP_BYTES: u64 = 100 * 1024 * 1024;

/// Answer stored when a query fails for any reason.
pub const QUERY_FAILURE_ANSWER: &str = "Error retrieving response. Please try again.";

/// Fallback when a single upload fails without a backend detail.
pub const UPLOAD_FAILURE_FALLBACK: &str = "Error uploading document. Please try again.";

/// Fallback when a folder upload fails without a backend detail.
pub const FOLDER_FAILURE_FALLBACK: &str = "Error uploading folder. Please try again.";

/// Optimistic notice shown while a folder upload is in flight.
pub const FOLDER_UPLOADING_NOTICE: &str =
    "Uploading folder... This may take a while for large files.";

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Size in MiB rendered to two decimals, e.g. `"100.00"`.
pub fn format_mib(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / BYTES_PER_MIB)
}

/// Payload size for status lines, e.g. `"1,234,567 bytes (1.18MB)"`.
pub fn format_payload_size(bytes: u64) -> String {
    let digits = bytes.to_string();
    let head = digits.len() % 3;
    let mut grouped = String::from(&digits[..head]);
    for (i, group) in digits.as_bytes()[head..].chunks(3).enumerate() {
        if head > 0 || i > 0 {
            grouped.push(',');
        }
        grouped.extend(group.iter().map(|b| *b as char));
    }
    format!("{} bytes ({}MB)", grouped, format_mib(bytes))
}

/// Failure text for an archive above [`MAX_FOLDER_ZIP_BYTES`].
pub fn size_limit_exceeded(size: u64) -> String {
    format!(
        "File size exceeds the {}MB limit. Current size: {}MB",
        MAX_FOLDER_ZIP_BYTES / (1024 * 1024),
        format_mib(size)
    )
}

/// Success text for `POST /ingest`.
pub fn upload_succeeded(chunks_processed: u64) -> String {
    format!("Successfully processed {} chunks.", chunks_processed)
}

/// Success text for `POST /ingest-folder`.
///
/// The skipped and failed clauses only appear when their counts are nonzero.
pub fn folder_upload_succeeded(resp: &FolderIngestResponse) -> String {
    let mut msg = format!(
        "Successfully processed {} files with {} chunks.",
        resp.files_processed, resp.total_chunks
    );
    if resp.skipped_binary_files > 0 {
        msg.push_str(&format!(
            " ({} binary files skipped)",
            resp.skipped_binary_files
        ));
    }
    if resp.failed_files > 0 {
        msg.push_str(&format!(
            " ({} files failed to process)",
            resp.failed_files
        ));
    }
    msg
}
