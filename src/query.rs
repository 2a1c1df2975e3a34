//! Question answering against one collection or all of them.
//!
//! [`QueryController`] owns the current selector and the latest
//! [`QueryResult`]. A failed query never leaves the result empty: it stores
//! a synthetic answer with no sources instead.

use anyhow::Result;
use rag_console_core::models::{QueryRequest, QueryResult, Source};
use rag_console_core::{CollectionSelector, Phase, SubmissionState, SubmitOutcome};
use tracing::{info, warn};

use crate::backend::{ApiError, Backend, HttpBackend};
use crate::config::Config;
use crate::registry::CollectionRegistry;

/// Characters of source text shown before truncation.
const SNIPPET_CHARS: usize = 240;

/// A query that has been accepted and is waiting for its response.
#[derive(Debug)]
pub struct PendingQuery {
    request: QueryRequest,
}

impl PendingQuery {
    pub fn request(&self) -> &QueryRequest {
        &self.request
    }
}

#[derive(Debug)]
pub struct QueryController {
    selection: CollectionSelector,
    top_k: u32,
    state: SubmissionState<QueryResult>,
}

impl QueryController {
    pub fn new(selection: CollectionSelector, top_k: u32) -> Self {
        Self {
            selection,
            top_k,
            state: SubmissionState::new(),
        }
    }

    pub fn select(&mut self, selection: CollectionSelector) {
        self.selection = selection;
    }

    pub fn selection(&self) -> &CollectionSelector {
        &self.selection
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Latest result; `None` before the first query and while one is in flight.
    pub fn result(&self) -> Option<&QueryResult> {
        self.state.value()
    }

    /// Accept `text` for submission against the current selection.
    ///
    /// Blank text, or a query already in flight, is ignored: nothing
    /// changes and `None` is returned. Otherwise the controller turns busy
    /// and the previous result is cleared.
    pub fn prepare(&mut self, text: &str) -> Option<PendingQuery> {
        if text.trim().is_empty() {
            return None;
        }
        self.state.begin().ok()?;
        self.state.submit(None);
        Some(PendingQuery {
            request: QueryRequest {
                query: text.to_string(),
                collection: self.selection.to_wire().map(str::to_string),
                top_k: self.top_k,
            },
        })
    }

    /// Store the response for `pending` and leave the busy state.
    pub fn complete(
        &mut self,
        pending: PendingQuery,
        response: Result<QueryResult, ApiError>,
    ) -> SubmitOutcome {
        match response {
            Ok(result) => {
                info!(
                    sources = result.sources.len(),
                    collection = ?pending.request.collection,
                    "query answered"
                );
                self.state.settle(result);
                SubmitOutcome::Settled { success: true }
            }
            Err(e) => {
                warn!(error = %e, "query failed");
                self.state.settle(QueryResult::failure());
                SubmitOutcome::Settled { success: false }
            }
        }
    }

    /// Prepare, send, and complete in one step.
    pub async fn submit(&mut self, backend: &dyn Backend, text: &str) -> SubmitOutcome {
        let Some(pending) = self.prepare(text) else {
            return SubmitOutcome::Ignored;
        };
        let response = backend.query(pending.request()).await;
        self.complete(pending, response)
    }
}

/// CLI entry point for `ragc query`.
pub async fn run_query(
    config: &Config,
    text: &str,
    collection: Option<&str>,
    top_k: Option<u32>,
    json: bool,
) -> Result<SubmitOutcome> {
    let backend = HttpBackend::new(&config.backend)?;

    let selection = match collection {
        Some(c) => CollectionSelector::parse(c),
        None => CollectionRegistry::load(&backend)
            .await
            .default_query_selector(),
    };
    let top_k = top_k.unwrap_or(config.query.top_k).max(1);

    let mut controller = QueryController::new(selection, top_k);
    let outcome = controller.submit(&backend, text).await;

    if outcome == SubmitOutcome::Ignored {
        println!("Nothing to ask.");
        return Ok(outcome);
    }

    if let Some(result) = controller.result() {
        if json {
            println!("{}", serde_json::to_string_pretty(result)?);
        } else {
            print_result(result);
        }
    }
    Ok(outcome)
}

fn print_result(result: &QueryResult) {
    println!("{}", result.answer);
    if result.sources.is_empty() {
        return;
    }
    println!();
    println!("Sources:");
    for (i, source) in result.sources.iter().enumerate() {
        println!("{}", format_source_header(i + 1, source));
        println!("    {}", snippet(&source.text, SNIPPET_CHARS));
    }
}

fn format_source_header(rank: usize, source: &Source) -> String {
    let mut line = format!(
        "  {}. [{}] match {:.1}%",
        rank,
        source.collection,
        source.score * 100.0
    );
    if let Some(path) = source
        .metadata_str("path")
        .or_else(|| source.metadata_str("filename"))
    {
        line.push_str("  ");
        line.push_str(path);
    }
    line
}

/// First `max` characters of `text`, with `...` appended when cut.
fn snippet(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
