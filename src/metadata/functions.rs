use serde_json::{Value, json};

use super::MetadataStore;
use crate::error::{Error, Result};
use crate::store::{Collection, Document, filter, from_document};
use crate::types::{FileData, Function, FunctionData, RESERVED_FUNCTION_KEYS, RepoKey, ScoreMap};

impl MetadataStore {
    /// Inserts every function of `data` under an existing file.
    ///
    /// With `prior` scores, a function inherits the score stored under its
    /// name; names without an entry start at 0.
    pub fn write_functions(
        &self,
        data: &FileData,
        key: &RepoKey,
        path: &str,
        prior: Option<&ScoreMap>,
    ) -> Result<Vec<String>> {
        let file_id = self.get_file_id(key, path)?;
        self.insert_functions(&file_id, &data.functions, prior)
    }

    pub fn get_functions(&self, key: &RepoKey, path: &str) -> Result<Vec<Function>> {
        let file_id = self.get_file_id(key, path)?;
        self.store
            .find(Collection::Function, &filter([("file_id", json!(file_id))]))?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub fn get_function(&self, key: &RepoKey, path: &str, name: &str) -> Result<Function> {
        let file_id = self.get_file_id(key, path)?;
        let doc = self
            .store
            .find_one(
                Collection::Function,
                &filter([("file_id", json!(file_id)), ("name", json!(name))]),
            )?
            .ok_or_else(|| {
                Error::NotFound(format!("no such function {name} in {key} - {path} exists"))
            })?;
        from_document(doc)
    }

    /// Deletes all functions of a file and returns their scores by name.
    /// A file without functions is reported as not found.
    pub fn delete_functions(&self, key: &RepoKey, path: &str) -> Result<ScoreMap> {
        let file_id = self.get_file_id(key, path)?;
        let (scores, removed) = self.remove_functions(&file_id)?;
        if removed == 0 {
            return Err(Error::NotFound(format!("no functions listed for file {path}")));
        }

        tracing::info!("Deleted {} functions of {} - {}", removed, key, path);
        Ok(scores)
    }

    pub fn update_user_score(
        &self,
        key: &RepoKey,
        path: &str,
        name: &str,
        value: i64,
    ) -> Result<()> {
        let function = self.get_function(key, path, name)?;

        let mut set = Document::new();
        set.insert("user_score".to_string(), json!(value));
        let matched = self.store.update_many(
            Collection::Function,
            &filter([("file_id", json!(function.file_id)), ("name", json!(name))]),
            &set,
        )?;
        if matched == 0 {
            return Err(Error::Inconsistency(format!(
                "function {name} in {key} - {path} vanished during update"
            )));
        }

        tracing::info!("Set user_score of {} in {} - {} to {}", name, key, path, value);
        Ok(())
    }

    pub(super) fn insert_functions(
        &self,
        file_id: &str,
        functions: &[FunctionData],
        prior: Option<&ScoreMap>,
    ) -> Result<Vec<String>> {
        let mut inserted = Vec::with_capacity(functions.len());
        for function in functions {
            let score = prior
                .and_then(|scores| scores.get(&function.name))
                .copied()
                .unwrap_or(0);
            let id = self
                .store
                .insert_one(Collection::Function, function_document(file_id, function, score))?;
            inserted.push(id);
        }
        Ok(inserted)
    }

    /// Reads the scores of a file's functions, then deletes them.
    pub(super) fn remove_functions(&self, file_id: &str) -> Result<(ScoreMap, u64)> {
        let query = filter([("file_id", json!(file_id))]);

        let mut scores = ScoreMap::new();
        for doc in self.store.find(Collection::Function, &query)? {
            let function: Function = from_document(doc)?;
            scores.insert(function.name, function.user_score);
        }

        let removed = self.store.delete_many(Collection::Function, &query)?;
        Ok((scores, removed))
    }
}

/// Builds the stored document: the opaque analysis fields plus the keys the
/// store owns, which the analysis cannot override.
fn function_document(file_id: &str, function: &FunctionData, user_score: i64) -> Document {
    let mut doc: Document = function
        .fields
        .iter()
        .filter(|(k, _)| !RESERVED_FUNCTION_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    doc.insert("file_id".to_string(), Value::String(file_id.to_string()));
    doc.insert("name".to_string(), Value::String(function.name.clone()));
    doc.insert("user_score".to_string(), json!(user_score));
    doc
}
