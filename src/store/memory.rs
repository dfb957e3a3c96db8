use std::collections::HashMap;
use std::sync::Mutex;

use super::{
    Collection, Document, DocumentStore, Filter, ID_FIELD, apply_set, assign_id, matches,
};
use crate::error::{Error, Result};

/// In-process document store. Nothing survives the process; meant for tests
/// and for embedding the facade without a database file.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn collections(&self) -> std::sync::MutexGuard<'_, HashMap<Collection, Vec<Document>>> {
        self.collections.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DocumentStore for MemoryStore {
    fn initialize(&self) -> Result<()> {
        let mut collections = self.collections();
        for collection in Collection::ALL {
            collections.entry(collection).or_default();
        }
        Ok(())
    }

    fn insert_one(&self, collection: Collection, mut doc: Document) -> Result<String> {
        let id = assign_id(&mut doc);
        let mut collections = self.collections();
        let docs = collections.entry(collection).or_default();

        if docs
            .iter()
            .any(|d| d.get(ID_FIELD).and_then(|v| v.as_str()) == Some(id.as_str()))
        {
            return Err(Error::AlreadyExists(format!("{collection} document {id} already exists")));
        }

        docs.push(doc);
        Ok(id)
    }

    fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        Ok(self
            .collections()
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| matches(d, filter)).cloned()))
    }

    fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>> {
        Ok(self
            .collections()
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| matches(d, filter)).cloned().collect())
            .unwrap_or_default())
    }

    fn count(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        Ok(self
            .collections()
            .get(&collection)
            .map_or(0, |docs| docs.iter().filter(|d| matches(d, filter)).count() as u64))
    }

    fn update_many(&self, collection: Collection, filter: &Filter, set: &Document) -> Result<u64> {
        let mut collections = self.collections();
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(0);
        };

        let mut matched = 0;
        for doc in docs.iter_mut().filter(|d| matches(d, filter)) {
            apply_set(doc, set);
            matched += 1;
        }
        Ok(matched)
    }

    fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        let mut collections = self.collections();
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(0);
        };

        match docs.iter().position(|d| matches(d, filter)) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn delete_many(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        let mut collections = self.collections();
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(0);
        };

        let before = docs.len();
        docs.retain(|d| !matches(d, filter));
        Ok((before - docs.len()) as u64)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
