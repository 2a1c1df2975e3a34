//! Collection registry.
//!
//! Holds the collection identifiers the backend knows about. The list is
//! fetched once, when the console starts, and never changes afterwards.
//! A failed fetch is not fatal: the registry stays empty, a warning is
//! logged, and later submissions fail their own validation instead.

use anyhow::Result;
use rag_console_core::{Collection, CollectionSelector};
use tracing::{info, warn};

use crate::backend::{Backend, HttpBackend};
use crate::config::Config;

#[derive(Debug, Clone, Default)]
pub struct CollectionRegistry {
    collections: Vec<Collection>,
}

impl CollectionRegistry {
    /// Registry over a known list, keeping the given order.
    ///
    /// Later duplicates are dropped.
    pub fn new(collections: Vec<Collection>) -> Self {
        let mut unique: Vec<Collection> = Vec::with_capacity(collections.len());
        for c in collections {
            if !unique.contains(&c) {
                unique.push(c);
            }
        }
        Self { collections: unique }
    }

    /// Fetch the collection list. Never fails; an unreachable backend
    /// yields an empty registry.
    pub async fn load(backend: &dyn Backend) -> Self {
        match backend.collections().await {
            Ok(collections) => {
                info!(count = collections.len(), "loaded collections");
                Self::new(collections)
            }
            Err(e) => {
                warn!(error = %e, "could not fetch collections; continuing with none");
                Self::default()
            }
        }
    }

    /// All collections in server order.
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    /// Collections that can receive uploads.
    pub fn uploadable(&self) -> impl Iterator<Item = &Collection> {
        self.collections.iter().filter(|c| c.is_uploadable())
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collections.iter().any(|c| c.as_str() == name)
    }

    /// Initial query selection: the first collection, or every collection
    /// when none are known.
    pub fn default_query_selector(&self) -> CollectionSelector {
        self.collections
            .first()
            .cloned()
            .map(CollectionSelector::Named)
            .unwrap_or_default()
    }

    /// Initial upload selection: the first uploadable collection.
    pub fn default_upload_collection(&self) -> Option<Collection> {
        self.uploadable().next().cloned()
    }
}

/// CLI entry point for `ragc collections`.
pub async fn run_list_collections(config: &Config) -> Result<()> {
    let backend = HttpBackend::new(&config.backend)?;
    // Listing is the one place where an unreachable backend is an error.
    let collections = backend.collections().await?;
    let registry = CollectionRegistry::new(collections);

    if registry.is_empty() {
        println!("No collections.");
        return Ok(());
    }

    println!("{:<20} UPLOADS", "COLLECTION");
    for c in registry.collections() {
        let uploads = if c.is_uploadable() { "yes" } else { "no" };
        println!("{:<20} {}", c.as_str(), uploads);
    }
    Ok(())
}
