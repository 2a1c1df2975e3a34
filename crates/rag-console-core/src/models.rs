//! Wire models for the knowledge-base backend.
//!
//! Request and response bodies of the four endpoints the client consumes:
//!
//! | Endpoint | Request | Response |
//! |----------|---------|----------|
//! | `GET /collections` | | [`CollectionsResponse`] |
//! | `POST /query` | [`QueryRequest`] | [`QueryResult`] |
//! | `POST /ingest` | multipart | [`IngestResponse`] |
//! | `POST /ingest-folder` | multipart | [`FolderIngestResponse`] |
//!
//! Error bodies carry a `detail` field; see [`error_detail`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collection::Collection;
use crate::messages;
use crate::tree::FolderNode;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectionsResponse {
    pub collections: Vec<Collection>,
}

/// Body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    pub query: String,
    /// `None` searches every collection and is sent as `null`.
    pub collection: Option<String>,
    pub top_k: u32,
}

/// Answer plus the passages it was grounded on.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QueryResult {
    pub answer: String,
    /// Absent when the backend found nothing to ground the answer on.
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl QueryResult {
    /// Synthetic result stored when a query fails, so there is always
    /// something to show.
    pub fn failure() -> Self {
        Self {
            answer: messages::QUERY_FAILURE_ANSWER.to_string(),
            sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Source {
    pub collection: Collection,
    /// Similarity in `[0, 1]`.
    pub score: f64,
    pub text: String,
    /// Chunk payload minus the text (filename, path, chunk_index, …).
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

impl Source {
    /// A string field from `metadata`, if present.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IngestResponse {
    pub chunks_processed: u64,
}

/// Result of a zipped-folder ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FolderIngestResponse {
    pub files_processed: u64,
    pub total_chunks: u64,
    #[serde(default)]
    pub skipped_binary_files: u64,
    #[serde(default)]
    pub failed_files: u64,
    #[serde(default)]
    pub folder_structure: FolderNode,
}

/// Extract the `detail` string from an error body.
///
/// Only string details count; structured validation errors (a list of
/// objects) and non-JSON bodies yield `None`.
pub fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// The `status` / `message` pair of a successful HTTP response that still
/// reports failure in its body, as `{"status": "error", "message": "..."}`.
///
/// Decoded on its own so the rest of the body is not parsed twice.
#[derive(Debug, Default, Deserialize)]
pub struct ReportedStatus {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

impl ReportedStatus {
    /// The reported message when `status` is `"error"`.
    pub fn failure(self) -> Option<String> {
        if self.status.as_ref().and_then(Value::as_str) != Some("error") {
            return None;
        }
        Some(
            self.message
                .as_ref()
                .and_then(Value::as_str)
                .unwrap_or("The backend reported an error.")
                .to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_request_serializes_null_collection() {
        let req = QueryRequest {
            query: "what is qdrant?".into(),
            collection: None,
            top_k: 5,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({"query": "what is qdrant?", "collection": null, "top_k": 5})
        );
    }

    #[test]
    fn query_result_without_sources() {
        let r: QueryResult =
            serde_json::from_str(r#"{"answer": "No relevant information found."}"#).unwrap();
        assert!(r.sources.is_empty());
    }

    #[test]
    fn source_keeps_metadata() {
        let r: QueryResult = serde_json::from_value(json!({
            "answer": "a",
            "sources": [{
                "collection": "docs",
                "score": 0.82,
                "text": "chunk",
                "metadata": {"filename": "guide.md", "chunk_index": 0}
            }]
        }))
        .unwrap();
        assert_eq!(r.sources[0].collection.as_str(), "docs");
        assert_eq!(r.sources[0].metadata_str("filename"), Some("guide.md"));
        assert_eq!(r.sources[0].metadata_str("chunk_index"), None);
    }

    #[test]
    fn failure_result_has_no_sources() {
        let r = QueryResult::failure();
        assert!(!r.answer.is_empty());
        assert!(r.sources.is_empty());
    }

    #[test]
    fn detail_only_when_string() {
        assert_eq!(
            error_detail(r#"{"detail": "Collection must be one of ['docs']"}"#).as_deref(),
            Some("Collection must be one of ['docs']")
        );
        assert_eq!(
            error_detail(r#"{"detail": [{"loc": ["body"], "msg": "field required"}]}"#),
            None
        );
        assert_eq!(error_detail("Internal Server Error"), None);
    }

    #[test]
    fn reported_status_in_ok_body() {
        let reported = |body: &str| serde_json::from_str::<ReportedStatus>(body).unwrap().failure();
        assert_eq!(
            reported(r#"{"status": "error", "message": "No supported files found in the uploaded folder"}"#)
                .as_deref(),
            Some("No supported files found in the uploaded folder")
        );
        assert_eq!(
            reported(r#"{"status": "error"}"#).as_deref(),
            Some("The backend reported an error.")
        );
        assert_eq!(reported(r#"{"status": "success"}"#), None);
        assert_eq!(reported(r#"{"status": 500, "files_processed": 1}"#), None);
    }
}
