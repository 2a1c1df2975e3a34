//! The console: one registry and three independent controllers.
//!
//! [`Console::start`] fetches the collection list once and seeds each
//! controller's selection from it. After that the controllers never share
//! mutable state; each has its own selection, busy flag, and shown result,
//! so a folder upload in flight does not block a query.

use rag_console_core::CollectionSelector;
use std::sync::Arc;

use crate::backend::Backend;
use crate::folder::FolderUploadController;
use crate::query::QueryController;
use crate::registry::CollectionRegistry;
use crate::upload::SingleUploadController;

pub struct Console {
    backend: Arc<dyn Backend>,
    registry: CollectionRegistry,
    pub query: QueryController,
    pub upload: SingleUploadController,
    pub folder: FolderUploadController,
}

impl Console {
    /// Load the collections and seed every selection.
    ///
    /// Never fails: an unreachable backend gives an empty registry, a query
    /// selector of "all", and no upload collection.
    pub async fn start(backend: Arc<dyn Backend>, top_k: u32) -> Self {
        let registry = CollectionRegistry::load(backend.as_ref()).await;
        let upload_default = registry.default_upload_collection();
        Self {
            query: QueryController::new(registry.default_query_selector(), top_k),
            upload: SingleUploadController::new(upload_default.clone()),
            folder: FolderUploadController::new(upload_default),
            registry,
            backend,
        }
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Point the query at `input` (a collection name or "all").
    pub fn select_query(&mut self, input: &str) {
        self.query.select(CollectionSelector::parse(input));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ApiError, FolderIngestRequest, IngestRequest};
    use crate::folder::SelectedArchive;
    use crate::upload::SelectedFile;
    use async_trait::async_trait;
    use rag_console_core::{
        Collection, FolderIngestResponse, FolderNode, IngestResponse, Phase, QueryRequest,
        QueryResult, SubmitOutcome,
    };
    use std::sync::Mutex;

    /// In-memory backend recording what it was sent.
    #[derive(Default)]
    struct FakeBackend {
        collections: Option<Vec<&'static str>>,
        queries: Mutex<Vec<QueryRequest>>,
        ingests: Mutex<Vec<IngestRequest>>,
        folders: Mutex<Vec<FolderIngestRequest>>,
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn collections(&self) -> Result<Vec<Collection>, ApiError> {
            match &self.collections {
                Some(names) => Ok(names.iter().map(|n| Collection::new(*n)).collect()),
                None => Err(ApiError::Decode("offline".into())),
            }
        }

        async fn query(&self, request: &QueryRequest) -> Result<QueryResult, ApiError> {
            self.queries.lock().unwrap().push(request.clone());
            Ok(QueryResult {
                answer: format!("echo: {}", request.query),
                sources: vec![],
            })
        }

        async fn ingest(&self, request: IngestRequest) -> Result<IngestResponse, ApiError> {
            self.ingests.lock().unwrap().push(request);
            Ok(IngestResponse {
                chunks_processed: 4,
            })
        }

        async fn ingest_folder(
            &self,
            request: FolderIngestRequest,
        ) -> Result<FolderIngestResponse, ApiError> {
            self.folders.lock().unwrap().push(request);
            Ok(FolderIngestResponse {
                files_processed: 1,
                total_chunks: 2,
                skipped_binary_files: 0,
                failed_files: 0,
                folder_structure: FolderNode::new().with_files(["a.md"]),
            })
        }
    }

    fn online(names: &[&'static str]) -> Arc<FakeBackend> {
        Arc::new(FakeBackend {
            collections: Some(names.to_vec()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn start_seeds_independent_selections() {
        let backend = online(&["global", "docs", "slack"]);
        let console = Console::start(backend, 5).await;
        assert_eq!(console.registry().collections().len(), 3);
        assert_eq!(
            console.query.selection(),
            &CollectionSelector::Named(Collection::new("global"))
        );
        assert_eq!(console.upload.collection(), Some(&Collection::new("docs")));
        assert_eq!(console.folder.collection(), Some(&Collection::new("docs")));
    }

    #[tokio::test]
    async fn offline_backend_still_starts() {
        let backend = Arc::new(FakeBackend::default());
        let mut console = Console::start(backend.clone(), 5).await;
        assert!(console.registry().is_empty());
        assert_eq!(console.query.selection(), &CollectionSelector::All);

        console.upload.set_text("notes");
        let backend_ref = console.backend.clone();
        let outcome = console.upload.submit(&*backend_ref).await;
        assert!(matches!(outcome, SubmitOutcome::Rejected(_)));
        assert!(backend.ingests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn controllers_do_not_block_each_other() {
        let backend = online(&["docs"]);
        let mut console = Console::start(backend.clone(), 5).await;

        console
            .folder
            .arm(SelectedArchive::from_bytes("a.zip", vec![1, 2]));
        let pending_folder = console.folder.prepare().unwrap();
        assert!(console.folder.is_busy());

        console.select_query("all");
        let outcome = console.query.submit(&*backend, "hello").await;
        assert!(outcome.is_success());
        assert_eq!(backend.queries.lock().unwrap()[0].collection, None);

        console
            .upload
            .arm_file(SelectedFile::new("x.txt", b"x".to_vec()));
        assert!(console.upload.submit(&*backend).await.is_success());

        let request = pending_folder.into_request().await.unwrap();
        let response = backend.ingest_folder(request).await;
        console.folder.complete(response);
        assert_eq!(console.folder.phase(), Phase::Settled);
        assert_eq!(backend.folders.lock().unwrap().len(), 1);
        assert_eq!(backend.ingests.lock().unwrap().len(), 1);
    }
}
