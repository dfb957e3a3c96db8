//! # Repometa
//!
//! Persists per-file and per-function source analysis results, keyed by a
//! repository identity (owner, repo name, branch), plus the users and
//! session cookies of the application reading them.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! repometa = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use repometa::metadata::MetadataStore;
//! use repometa::store::{DocumentStore, SqliteStore};
//! use repometa::types::RepoKey;
//!
//! let store = SqliteStore::new("./data/repometa.db").unwrap();
//! store.initialize().unwrap();
//!
//! let meta = MetadataStore::new(Arc::new(store));
//! meta.write_repo(&RepoKey::new("octo", "widgets", "main")).unwrap();
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CLI module. Disable with `default-features = false`.

pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod metadata;
pub mod store;
pub mod types;
