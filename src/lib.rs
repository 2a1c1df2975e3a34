//! # rag-console
//!
//! A command-line client for a retrieval-augmented knowledge base. The
//! backend owns retrieval, generation, and document storage; this crate
//! asks it questions and feeds it content.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌────────────────────┐
//!                 │ CollectionRegistry │  GET /collections, once
//!                 └─────────┬──────────┘
//!          seeds            │            seeds
//!     ┌─────────────────────┼──────────────────────┐
//!     ▼                     ▼                      ▼
//! ┌──────────┐   ┌──────────────────┐   ┌──────────────────┐
//! │  Query   │   │  SingleUpload    │   │  FolderUpload    │
//! │Controller│   │  Controller      │   │  Controller      │
//! └────┬─────┘   └────────┬─────────┘   └────────┬─────────┘
//!      │ POST /query      │ POST /ingest         │ POST /ingest-folder
//!      └──────────────────┴──────────┬───────────┘
//!                                    ▼
//!                          ┌──────────────────┐
//!                          │ Backend (trait)  │
//!                          │ HttpBackend      │
//!                          └──────────────────┘
//! ```
//!
//! Validation, wire models, the submission state machine, and the folder
//! tree renderer live in the `rag-console-core` crate, which does no I/O.
//!
//! ## Quick Start
//!
//! ```bash
//! ragc collections
//! ragc query "how do we deploy?" --collection docs
//! ragc ingest --collection docs --file ./notes.md
//! ragc ingest-folder ./handbook --collection docs --exclude '**/*.png'
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`backend`] | HTTP transport and the [`backend::Backend`] seam |
//! | [`registry`] | Collection list and default selections |
//! | [`query`] | Question answering |
//! | [`upload`] | Text and single-file ingestion |
//! | [`folder`] | Zipped-folder ingestion |
//! | [`archive`] | Packing a directory into a zip |
//! | [`console`] | Registry plus the three controllers |
//! | [`progress`] | Submission status reporting |

pub mod archive;
pub mod backend;
pub mod config;
pub mod console;
pub mod folder;
pub mod progress;
pub mod query;
pub mod registry;
pub mod upload;
