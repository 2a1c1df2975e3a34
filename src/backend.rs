//! HTTP transport for the knowledge-base backend.
//!
//! The [`Backend`] trait is the seam between the controllers and the
//! network. [`HttpBackend`] implements it with `reqwest`; tests drive the
//! controllers with an in-memory implementation instead.
//!
//! # Endpoints
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `GET`  | `/collections` | |
//! | `POST` | `/query` | JSON [`QueryRequest`] |
//! | `POST` | `/ingest` | multipart `collection` + `file` or `text` |
//! | `POST` | `/ingest-folder` | multipart `collection` + `folder_zip` |
//!
//! Folder ingestion uses its own, longer timeout; everything else uses the
//! client default. No request is retried.
//!
//! Response bodies are decoded straight from the text, never through
//! `serde_json::Value`, so object keys keep the order the backend sent them
//! in. Nesting depth is unbounded: folder trees are as deep as the uploaded
//! directory, and the decoder grows its stack on the heap as it descends.

use async_trait::async_trait;
use rag_console_core::models::{
    error_detail, CollectionsResponse, FolderIngestResponse, IngestResponse, QueryRequest,
    QueryResult, ReportedStatus,
};
use rag_console_core::Collection;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::BackendConfig;

/// A failed call to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, timeout, or body transfer failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("backend returned HTTP {status}")]
    Status { status: u16, detail: Option<String> },

    /// 2xx response whose body reports `"status": "error"`.
    #[error("backend reported an error: {0}")]
    Reported(String),

    /// 2xx response that does not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// The human-readable explanation supplied by the backend, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { detail, .. } => detail.as_deref(),
            ApiError::Reported(message) => Some(message),
            ApiError::Transport(_) | ApiError::Decode(_) => None,
        }
    }
}

/// What a single-document ingestion sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestContent {
    File { name: String, bytes: Vec<u8> },
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    pub collection: Collection,
    pub content: IngestContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderIngestRequest {
    pub collection: Collection,
    pub archive_name: String,
    pub bytes: Vec<u8>,
}

/// The backend's HTTP contract.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /collections`.
    async fn collections(&self) -> Result<Vec<Collection>, ApiError>;

    /// `POST /query`.
    async fn query(&self, request: &QueryRequest) -> Result<QueryResult, ApiError>;

    /// `POST /ingest`.
    async fn ingest(&self, request: IngestRequest) -> Result<IngestResponse, ApiError>;

    /// `POST /ingest-folder`.
    async fn ingest_folder(
        &self,
        request: FolderIngestRequest,
    ) -> Result<FolderIngestResponse, ApiError>;
}

/// [`Backend`] over HTTP.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    folder_timeout: Duration,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            folder_timeout: config.folder_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn collections(&self) -> Result<Vec<Collection>, ApiError> {
        let url = self.url("/collections");
        debug!(%url, "fetching collections");
        let resp = self.client.get(&url).send().await?;
        let body: CollectionsResponse = read_json(resp).await?;
        Ok(body.collections)
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResult, ApiError> {
        let url = self.url("/query");
        debug!(%url, collection = ?request.collection, top_k = request.top_k, "submitting query");
        let resp = self.client.post(&url).json(request).send().await?;
        read_json(resp).await
    }

    async fn ingest(&self, request: IngestRequest) -> Result<IngestResponse, ApiError> {
        let url = self.url("/ingest");
        let form = Form::new().text("collection", request.collection.to_string());
        let form = match request.content {
            IngestContent::File { name, bytes } => {
                debug!(%url, file = %name, bytes = bytes.len(), "ingesting file");
                form.part(
                    "file",
                    Part::bytes(bytes)
                        .file_name(name)
                        .mime_str("application/octet-stream")?,
                )
            }
            IngestContent::Text(text) => {
                debug!(%url, chars = text.chars().count(), "ingesting text");
                form.text("text", text)
            }
        };
        let resp = self.client.post(&url).multipart(form).send().await?;
        read_json(resp).await
    }

    async fn ingest_folder(
        &self,
        request: FolderIngestRequest,
    ) -> Result<FolderIngestResponse, ApiError> {
        let url = self.url("/ingest-folder");
        debug!(
            %url,
            archive = %request.archive_name,
            bytes = request.bytes.len(),
            timeout_secs = self.folder_timeout.as_secs(),
            "ingesting folder archive"
        );
        let form = Form::new()
            .text("collection", request.collection.to_string())
            .part(
                "folder_zip",
                Part::bytes(request.bytes)
                    .file_name(request.archive_name)
                    .mime_str("application/zip")?,
            );
        let resp = self
            .client
            .post(&url)
            .timeout(self.folder_timeout)
            .multipart(form)
            .send()
            .await?;

        let body = read_body(resp).await?;
        let reported: ReportedStatus = decode(&body)?;
        if let Some(message) = reported.failure() {
            return Err(ApiError::Reported(message));
        }
        decode(&body)
    }
}

/// Decode a 2xx body as `T`, or turn any other status into
/// [`ApiError::Status`] carrying the body's `detail`.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let body = read_body(resp).await?;
    decode(&body)
}

async fn read_body(resp: reqwest::Response) -> Result<String, ApiError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            detail: error_detail(&body),
        });
    }
    Ok(body)
}

/// Decode `body` without serde_json's nesting limit.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let mut de = serde_json::Deserializer::from_str(body);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    de.end().map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(value)
}
