//! An in-process stand-in for the knowledge-base backend.
//!
//! Serves the four endpoints on a random local port and records every
//! request it receives so tests can assert on what went over the wire.

#![allow(dead_code)]

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rag_console::config::BackendConfig;
use serde_json::{json, Map, Value};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// How the mock answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Ok,
    /// Every endpoint answers 4xx/5xx with a `detail` string.
    Fail,
    /// Every endpoint answers 5xx with an empty body.
    FailBare,
    /// `/ingest-folder` answers 200 with `{"status": "error", ...}`.
    NoSupportedFiles,
}

#[derive(Clone, Debug, Default)]
pub struct Part {
    pub name: String,
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct Recorded {
    pub path: &'static str,
    pub json: Option<Value>,
    pub parts: Vec<Part>,
}

impl Recorded {
    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.part(name)
            .map(|p| String::from_utf8_lossy(&p.bytes).to_string())
    }
}

pub struct MockState {
    pub mode: Mode,
    pub collections: Vec<String>,
    pub requests: Mutex<Vec<Recorded>>,
    /// Verbatim `/ingest-folder` body, sent instead of the tree built from
    /// the uploaded zip.
    pub folder_body: Mutex<Option<String>>,
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start(mode: Mode, collections: &[&str]) -> Self {
        let state = Arc::new(MockState {
            mode,
            collections: collections.iter().map(|c| c.to_string()).collect(),
            requests: Mutex::new(Vec::new()),
            folder_body: Mutex::new(None),
        });

        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .route("/collections", get(collections_handler))
            .route("/query", post(query_handler))
            .route("/ingest", post(ingest_handler))
            .route("/ingest-folder", post(ingest_folder_handler))
            .layer(DefaultBodyLimit::max(256 * 1024 * 1024))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    /// Answer every later folder upload with `body` as-is.
    pub fn answer_folder_with(&self, body: impl Into<String>) {
        *self.state.folder_body.lock().unwrap() = Some(body.into());
    }

    pub fn config(&self) -> BackendConfig {
        backend_config(&self.base_url)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

pub fn backend_config(url: &str) -> BackendConfig {
    BackendConfig {
        url: url.to_string(),
        timeout_secs: 5,
        folder_timeout_secs: 10,
    }
}

/// A port nothing listens on.
pub fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn failure(status: StatusCode, mode: Mode, detail: &str) -> Response {
    match mode {
        Mode::FailBare => status.into_response(),
        _ => (status, Json(json!({ "detail": detail }))).into_response(),
    }
}

async fn collections_handler(State(state): State<Arc<MockState>>) -> Response {
    state.requests.lock().unwrap().push(Recorded {
        path: "/collections",
        json: None,
        parts: vec![],
    });
    match state.mode {
        Mode::Fail | Mode::FailBare => {
            failure(StatusCode::INTERNAL_SERVER_ERROR, state.mode, "store offline")
        }
        _ => Json(json!({ "collections": state.collections })).into_response(),
    }
}

async fn query_handler(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.requests.lock().unwrap().push(Recorded {
        path: "/query",
        json: Some(body.clone()),
        parts: vec![],
    });
    if matches!(state.mode, Mode::Fail | Mode::FailBare) {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, state.mode, "model offline");
    }

    let question = body["query"].as_str().unwrap_or_default().to_string();
    if question == "no sources" {
        return Json(json!({ "answer": "Nothing relevant." })).into_response();
    }
    let collection = body["collection"].as_str().unwrap_or("docs").to_string();
    Json(json!({
        "answer": format!("Answer to: {}", question),
        "sources": [{
            "collection": collection,
            "score": 0.8734,
            "text": "x".repeat(300),
            "metadata": { "path": "handbook/deploy.md" }
        }]
    }))
    .into_response()
}

async fn read_parts(mut multipart: Multipart) -> Vec<Part> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.unwrap().to_vec();
        parts.push(Part {
            name,
            file_name,
            bytes,
        });
    }
    parts
}

async fn ingest_handler(State(state): State<Arc<MockState>>, multipart: Multipart) -> Response {
    let parts = read_parts(multipart).await;
    let recorded = Recorded {
        path: "/ingest",
        json: None,
        parts,
    };
    let chunks = if recorded.part("file").is_some() { 3 } else { 1 };
    state.requests.lock().unwrap().push(recorded);

    match state.mode {
        Mode::Fail | Mode::FailBare => failure(
            StatusCode::BAD_REQUEST,
            state.mode,
            "Either file or text must be provided",
        ),
        _ => Json(json!({ "chunks_processed": chunks })).into_response(),
    }
}

async fn ingest_folder_handler(
    State(state): State<Arc<MockState>>,
    multipart: Multipart,
) -> Response {
    let parts = read_parts(multipart).await;
    let zip_bytes = parts
        .iter()
        .find(|p| p.name == "folder_zip")
        .map(|p| p.bytes.clone())
        .unwrap_or_default();
    state.requests.lock().unwrap().push(Recorded {
        path: "/ingest-folder",
        json: None,
        parts,
    });

    match state.mode {
        Mode::Fail | Mode::FailBare => {
            return failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                state.mode,
                "Error processing folder: bad zip",
            )
        }
        Mode::NoSupportedFiles => {
            return Json(json!({
                "status": "error",
                "message": "No supported files found in the uploaded folder"
            }))
            .into_response()
        }
        Mode::Ok => {}
    }

    if let Some(body) = state.folder_body.lock().unwrap().clone() {
        return ([(header::CONTENT_TYPE, "application/json")], body).into_response();
    }

    let Ok(mut archive) = zip::ZipArchive::new(Cursor::new(zip_bytes)) else {
        return failure(StatusCode::BAD_REQUEST, Mode::Fail, "not a zip");
    };
    let mut tree = Map::new();
    let mut processed = 0u64;
    let mut skipped = 0u64;
    for i in 0..archive.len() {
        let Ok(entry) = archive.by_index(i) else {
            continue;
        };
        let name = entry.name().to_string();
        if name.ends_with('/') {
            continue;
        }
        if name.ends_with(".png") {
            skipped += 1;
        } else {
            processed += 1;
        }
        insert_path(&mut tree, &name);
    }

    Json(json!({
        "files_processed": processed,
        "total_chunks": processed * 2,
        "skipped_binary_files": skipped,
        "failed_files": 0,
        "folder_structure": Value::Object(tree)
    }))
    .into_response()
}

fn insert_path(tree: &mut Map<String, Value>, path: &str) {
    let mut segments: Vec<&str> = path.split('/').collect();
    let Some(file) = segments.pop() else {
        return;
    };
    let mut level = tree;
    for dir in segments {
        let next = level
            .entry(dir.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(map) = next else {
            return;
        };
        level = map;
    }
    if let Value::Array(files) = level
        .entry("files".to_string())
        .or_insert_with(|| Value::Array(vec![]))
    {
        files.push(Value::String(file.to_string()));
    }
}
