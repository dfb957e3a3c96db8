use serde_json::json;

use super::{MetadataStore, file_not_found, id_filter};
use crate::error::{Error, Result};
use crate::store::{
    Collection, Document, Filter, document_id, filter, from_document, to_document,
};
use crate::types::{File, FileData, FilePatch, FileWrite, RepoKey, ScoreMap};

impl MetadataStore {
    /// Stores a file analysis under a repo.
    ///
    /// A new path is inserted with every function scored 0. An existing path
    /// is replaced only when `data.commits` is strictly greater than the
    /// stored count; the replacement keeps the lock flag and each function's
    /// `user_score` by name. Anything else is [`Error::NoChange`].
    pub fn write_file(&self, data: &FileData, key: &RepoKey) -> Result<FileWrite> {
        let repo_id = self.get_repo_id(key)?;

        match self.find_file(&repo_id, &data.path)? {
            None => {
                let file_id = self.insert_file(&repo_id, data, false)?;
                let function_ids = self.insert_functions(&file_id, &data.functions, None)?;
                tracing::info!(
                    "Inserted {} for {} with {} functions",
                    data.path,
                    key,
                    function_ids.len()
                );
                Ok(FileWrite::Inserted {
                    file_id,
                    function_ids,
                })
            }
            Some(existing) if existing.commits < data.commits => {
                let scores = self.delete_file(key, &data.path)?;
                let file_id = self.insert_file(&repo_id, data, existing.file_lock)?;
                let function_ids =
                    self.insert_functions(&file_id, &data.functions, Some(&scores))?;
                tracing::info!(
                    "Updated {} for {} (commits {} -> {})",
                    data.path,
                    key,
                    existing.commits,
                    data.commits
                );
                Ok(FileWrite::Updated {
                    file_id,
                    function_ids,
                })
            }
            Some(existing) => {
                tracing::debug!(
                    "Skipping {} for {}: stored commits {} >= {}",
                    data.path,
                    key,
                    existing.commits,
                    data.commits
                );
                Err(Error::NoChange(format!("{} is up to date", data.path)))
            }
        }
    }

    pub fn get_file(&self, key: &RepoKey, path: &str) -> Result<File> {
        let repo_id = self.get_repo_id(key)?;
        self.find_file(&repo_id, path)?
            .ok_or_else(|| file_not_found(key, path))
    }

    pub fn get_file_id(&self, key: &RepoKey, path: &str) -> Result<String> {
        let repo_id = self.get_repo_id(key)?;
        let doc = self
            .store
            .find_one(Collection::File, &file_filter(&repo_id, path))?
            .ok_or_else(|| file_not_found(key, path))?;
        document_id(&doc)
    }

    pub fn get_lock_status(&self, key: &RepoKey, path: &str) -> Result<bool> {
        Ok(self.get_file(key, path)?.file_lock)
    }

    /// Sets the advisory lock flag; nothing here enforces it.
    pub fn update_lock(&self, key: &RepoKey, path: &str, lock: bool) -> Result<bool> {
        let file_id = self.get_file_id(key, path)?;
        let mut set = Document::new();
        set.insert("file_lock".to_string(), json!(lock));

        if self.store.update_many(Collection::File, &id_filter(&file_id), &set)? == 0 {
            return Err(Error::Inconsistency(format!(
                "file {key} - {path} vanished during lock update"
            )));
        }

        tracing::info!("Set lock on {} - {} to {}", key, path, lock);
        Ok(lock)
    }

    /// Merges analysis fields into a stored file without touching its functions.
    pub fn update_file(&self, key: &RepoKey, path: &str, patch: &FilePatch) -> Result<()> {
        let file_id = self.get_file_id(key, path)?;
        let set = to_document(patch)?;
        if set.is_empty() {
            return Ok(());
        }

        if self.store.update_many(Collection::File, &id_filter(&file_id), &set)? == 0 {
            return Err(Error::Inconsistency(format!("file {key} - {path} vanished during update")));
        }
        Ok(())
    }

    /// Deletes a file and its functions, returning the functions' scores by name.
    pub fn delete_file(&self, key: &RepoKey, path: &str) -> Result<ScoreMap> {
        let file_id = self.get_file_id(key, path)?;
        let (scores, removed) = self.remove_functions(&file_id)?;

        if self.store.delete_one(Collection::File, &id_filter(&file_id))? == 0 {
            tracing::warn!("File {} - {} disappeared during delete", key, path);
            return Err(Error::Inconsistency(format!("no file named {path}")));
        }

        tracing::info!("Deleted {} - {} and {} functions", key, path, removed);
        Ok(scores)
    }

    fn find_file(&self, repo_id: &str, path: &str) -> Result<Option<File>> {
        self.store
            .find_one(Collection::File, &file_filter(repo_id, path))?
            .map(from_document)
            .transpose()
    }

    fn insert_file(&self, repo_id: &str, data: &FileData, file_lock: bool) -> Result<String> {
        let file = File {
            id: String::new(),
            repo_id: repo_id.to_string(),
            path: data.path.clone(),
            last_commit: data.last_commit.clone(),
            commits: data.commits,
            line_history: data.line_history.clone(),
            file_lock,
        };
        self.store.insert_one(Collection::File, to_document(&file)?)
    }
}

fn file_filter(repo_id: &str, path: &str) -> Filter {
    filter([("repo_id", json!(repo_id)), ("path", json!(path))])
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::error::Error;
    use crate::metadata::test_support::{file_data, key, memory_store};
    use crate::store::{Collection, Filter};
    use crate::types::{FilePatch, FileWrite};

    #[test]
    fn test_write_file_requires_repo() {
        let meta = memory_store();
        let err = meta.write_file(&file_data("x.py", 1, &["f"]), &key()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(meta.store().count(Collection::File, &Filter::new()).unwrap(), 0);
    }

    #[test]
    fn test_insert_new_file() {
        let meta = memory_store();
        meta.write_repo(&key()).unwrap();

        let write = meta.write_file(&file_data("x.py", 1, &["f", "g"]), &key()).unwrap();
        assert!(matches!(write, FileWrite::Inserted { .. }));
        assert_eq!(write.function_ids().len(), 2);

        let file = meta.get_file(&key(), "x.py").unwrap();
        assert_eq!(file.id, write.file_id());
        assert_eq!(file.commits, 1);
        assert_eq!(file.last_commit, "commit-1");
        assert!(!file.file_lock);
        assert_eq!(file.repo_id, meta.get_repo_id(&key()).unwrap());

        let f = meta.get_function(&key(), "x.py", "f").unwrap();
        assert_eq!(f.user_score, 0);
        assert_eq!(f.fields["signature"], "def f()");
    }

    #[test]
    fn test_same_or_older_commits_is_no_change() {
        let meta = memory_store();
        meta.write_repo(&key()).unwrap();
        let first = meta.write_file(&file_data("x.py", 3, &["f"]), &key()).unwrap();

        for commits in [3, 2] {
            let err = meta
                .write_file(&file_data("x.py", commits, &["other"]), &key())
                .unwrap_err();
            assert!(matches!(err, Error::NoChange(_)));
            assert_eq!(err.to_string(), "x.py is up to date");
        }

        let file = meta.get_file(&key(), "x.py").unwrap();
        assert_eq!(file.id, first.file_id());
        assert_eq!(file.commits, 3);
        let names: Vec<String> = meta
            .get_functions(&key(), "x.py")
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["f"]);
    }

    #[test]
    fn test_newer_commits_replace_and_keep_scores() {
        let meta = memory_store();
        meta.write_repo(&key()).unwrap();
        let first = meta.write_file(&file_data("x.py", 1, &["f", "g", "gone"]), &key()).unwrap();
        meta.update_user_score(&key(), "x.py", "f", 5).unwrap();
        meta.update_user_score(&key(), "x.py", "gone", 9).unwrap();
        meta.update_lock(&key(), "x.py", true).unwrap();

        let second = meta
            .write_file(&file_data("x.py", 2, &["f", "g", "new"]), &key())
            .unwrap();
        assert!(matches!(second, FileWrite::Updated { .. }));
        assert_ne!(second.file_id(), first.file_id());

        assert_eq!(meta.get_function(&key(), "x.py", "f").unwrap().user_score, 5);
        assert_eq!(meta.get_function(&key(), "x.py", "g").unwrap().user_score, 0);
        assert_eq!(meta.get_function(&key(), "x.py", "new").unwrap().user_score, 0);
        assert!(matches!(
            meta.get_function(&key(), "x.py", "gone"),
            Err(Error::NotFound(_))
        ));

        let file = meta.get_file(&key(), "x.py").unwrap();
        assert_eq!(file.commits, 2);
        assert!(file.file_lock);
        assert_eq!(meta.store().count(Collection::File, &Filter::new()).unwrap(), 1);
        assert_eq!(meta.store().count(Collection::Function, &Filter::new()).unwrap(), 3);
    }

    #[test]
    fn test_lock_round_trip() {
        let meta = memory_store();
        meta.write_repo(&key()).unwrap();
        meta.write_file(&file_data("x.py", 1, &[]), &key()).unwrap();

        assert!(!meta.get_lock_status(&key(), "x.py").unwrap());
        assert!(meta.update_lock(&key(), "x.py", true).unwrap());
        assert!(meta.get_lock_status(&key(), "x.py").unwrap());
        assert!(!meta.update_lock(&key(), "x.py", false).unwrap());
        assert!(!meta.get_lock_status(&key(), "x.py").unwrap());
    }

    #[test]
    fn test_lock_on_missing_file() {
        let meta = memory_store();
        meta.write_repo(&key()).unwrap();

        let err = meta.update_lock(&key(), "nope.py", true).unwrap_err();
        assert_eq!(err.to_string(), "no such file a - b - main - nope.py exists");
        assert!(matches!(
            meta.get_lock_status(&key(), "nope.py"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_update_file_patch() {
        let meta = memory_store();
        meta.write_repo(&key()).unwrap();
        meta.write_file(&file_data("x.py", 1, &["f"]), &key()).unwrap();

        let patch = FilePatch {
            last_commit: Some("deadbeef".to_string()),
            line_history: Some(json!({"3": 1})),
            ..FilePatch::default()
        };
        meta.update_file(&key(), "x.py", &patch).unwrap();
        meta.update_file(&key(), "x.py", &FilePatch::default()).unwrap();

        let file = meta.get_file(&key(), "x.py").unwrap();
        assert_eq!(file.last_commit, "deadbeef");
        assert_eq!(file.line_history, json!({"3": 1}));
        assert_eq!(file.commits, 1);
        assert_eq!(meta.get_functions(&key(), "x.py").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_file_returns_scores() {
        let meta = memory_store();
        meta.write_repo(&key()).unwrap();
        meta.write_file(&file_data("x.py", 1, &["f", "g"]), &key()).unwrap();
        meta.update_user_score(&key(), "x.py", "g", 3).unwrap();

        let scores = meta.delete_file(&key(), "x.py").unwrap();
        assert_eq!(scores.get("f"), Some(&0));
        assert_eq!(scores.get("g"), Some(&3));

        assert!(matches!(meta.get_file(&key(), "x.py"), Err(Error::NotFound(_))));
        assert_eq!(meta.store().count(Collection::Function, &Filter::new()).unwrap(), 0);
    }

    #[test]
    fn test_delete_file_without_functions() {
        let meta = memory_store();
        meta.write_repo(&key()).unwrap();
        meta.write_file(&file_data("x.py", 1, &[]), &key()).unwrap();

        assert!(meta.delete_file(&key(), "x.py").unwrap().is_empty());
        assert!(matches!(
            meta.delete_file(&key(), "x.py"),
            Err(Error::NotFound(_))
        ));
    }
}
