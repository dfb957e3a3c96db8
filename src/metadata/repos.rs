use serde_json::json;

use super::{MetadataStore, id_filter, repo_filter, repo_not_found};
use crate::error::{Error, Result};
use crate::store::{Collection, document_id, filter, from_document};
use crate::types::{File, Repo, RepoKey};

impl MetadataStore {
    /// Registers a repo. The (owner, repo, branch) triple must be new.
    pub fn write_repo(&self, key: &RepoKey) -> Result<String> {
        let query = repo_filter(key);
        if self.store.find_one(Collection::Repo, &query)?.is_some() {
            return Err(Error::AlreadyExists(format!("repo for {key} already exists")));
        }

        let id = self.store.insert_one(Collection::Repo, query)?;
        tracing::info!("Created repo {} ({})", key, id);
        Ok(id)
    }

    pub fn get_repo(&self, key: &RepoKey) -> Result<Repo> {
        let doc = self
            .store
            .find_one(Collection::Repo, &repo_filter(key))?
            .ok_or_else(|| repo_not_found(key))?;
        from_document(doc)
    }

    pub fn get_repo_id(&self, key: &RepoKey) -> Result<String> {
        let doc = self
            .store
            .find_one(Collection::Repo, &repo_filter(key))?
            .ok_or_else(|| repo_not_found(key))?;
        document_id(&doc)
    }

    /// Deletes a repo after deleting each of its files (and their functions).
    pub fn delete_repo(&self, key: &RepoKey) -> Result<()> {
        let repo_id = self.get_repo_id(key)?;

        let files = self.repo_files(&repo_id)?;
        tracing::debug!("Deleting {} files of repo {}", files.len(), key);
        for file in &files {
            self.delete_file(key, &file.path)?;
        }

        if self.store.delete_one(Collection::Repo, &id_filter(&repo_id))? == 0 {
            tracing::warn!("Repo {} disappeared during delete", key);
            return Err(Error::Inconsistency(format!("repo {key} could not be deleted")));
        }

        tracing::info!("Deleted repo {}", key);
        Ok(())
    }

    pub fn get_all_repo_files(&self, key: &RepoKey) -> Result<Vec<File>> {
        let repo_id = self.get_repo_id(key)?;
        self.repo_files(&repo_id)
    }

    fn repo_files(&self, repo_id: &str) -> Result<Vec<File>> {
        self.store
            .find(Collection::File, &filter([("repo_id", json!(repo_id))]))?
            .into_iter()
            .map(from_document)
            .collect()
    }
}
