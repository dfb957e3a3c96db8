//! The metadata facade over a [`DocumentStore`].
//!
//! Repos own files and files own functions. Deletes cascade down that
//! hierarchy, and a newer analysis of a file replaces the old one while
//! carrying each function's `user_score` forward by name. None of the
//! multi-step operations are atomic: a failure halfway through a cascade can
//! leave orphaned functions behind.

mod cookies;
mod files;
mod functions;
mod repos;
mod users;

use std::sync::Arc;

use serde_json::json;

use crate::auth::PasswordHasher;
use crate::error::{Error, Result};
use crate::store::{Collection, DocumentStore, Filter, filter};
use crate::types::RepoKey;

pub struct MetadataStore {
    store: Arc<dyn DocumentStore>,
    hasher: PasswordHasher,
}

impl MetadataStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            hasher: PasswordHasher::new(),
        }
    }

    /// The underlying document store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Removes every document in one collection. No cascade is performed.
    pub fn purge(&self, collection: Collection) -> Result<u64> {
        let removed = self.store.delete_many(collection, &Filter::new())?;
        tracing::info!("Purged {} documents from {}", removed, collection);
        Ok(removed)
    }
}

fn id_filter(id: &str) -> Filter {
    filter([("_id", json!(id))])
}

fn repo_filter(key: &RepoKey) -> Filter {
    filter([
        ("owner", json!(key.owner)),
        ("repo", json!(key.repo)),
        ("branch", json!(key.branch)),
    ])
}

fn user_filter(user_name: &str) -> Filter {
    filter([("user_name", json!(user_name))])
}

fn repo_not_found(key: &RepoKey) -> Error {
    Error::NotFound(format!("no such repo for {key} exists"))
}

fn file_not_found(key: &RepoKey, path: &str) -> Error {
    Error::NotFound(format!("no such file {key} - {path} exists"))
}

fn user_not_found(user_name: &str) -> Error {
    Error::NotFound(format!("There is no user associated with user name: {user_name}"))
}
