//! Collection identifiers and query selectors.
//!
//! A [`Collection`] is an opaque name handed out by the backend
//! (`"slack"`, `"docs"`, `"codebase"`, …). Queries additionally accept the
//! "every collection" selector, modelled as [`CollectionSelector::All`] and
//! sent to the backend as a JSON `null`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector text that means "search every collection".
pub const ALL_SENTINEL: &str = "all";

/// Pseudo-collection the backend lists for answers from general knowledge.
/// It can be queried but holds no documents, so it is never an upload target.
pub const GLOBAL_COLLECTION: &str = "global";

/// Opaque collection identifier, as listed by `GET /collections`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection(String);

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether documents can be ingested into this collection.
    pub fn is_uploadable(&self) -> bool {
        self.0 != GLOBAL_COLLECTION
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Collection {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Collection {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Target of a query: one named collection or all of them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CollectionSelector {
    #[default]
    All,
    Named(Collection),
}

impl CollectionSelector {
    /// Parse user input. The empty string and `"all"` (any case) select
    /// every collection; anything else names one.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_SENTINEL) {
            CollectionSelector::All
        } else {
            CollectionSelector::Named(Collection::new(trimmed))
        }
    }

    /// Value of the `collection` field in a `POST /query` body.
    pub fn to_wire(&self) -> Option<&str> {
        match self {
            CollectionSelector::All => None,
            CollectionSelector::Named(c) => Some(c.as_str()),
        }
    }
}

impl From<Collection> for CollectionSelector {
    fn from(c: Collection) -> Self {
        CollectionSelector::Named(c)
    }
}

impl fmt::Display for CollectionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionSelector::All => f.write_str(ALL_SENTINEL),
            CollectionSelector::Named(c) => c.fmt(f),
        }
    }
}
