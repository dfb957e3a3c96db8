mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// A stored document: a JSON object whose `_id` is assigned by the store.
pub type Document = serde_json::Map<String, Value>;

/// Equality predicates, one per key. An empty filter matches every document.
pub type Filter = Document;

pub const ID_FIELD: &str = "_id";

/// The five collections behind the metadata store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Collection {
    Repo,
    File,
    Function,
    User,
    Cookie,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Repo,
        Collection::File,
        Collection::Function,
        Collection::User,
        Collection::Cookie,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Repo => "repo",
            Self::File => "file",
            Self::Function => "function",
            Self::User => "user",
            Self::Cookie => "cookie",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DocumentStore defines the collection-level database interface.
pub trait DocumentStore: Send + Sync {
    fn initialize(&self) -> Result<()>;

    /// Inserts a document and returns its `_id`. A non-empty string `_id`
    /// already present on the document is kept.
    fn insert_one(&self, collection: Collection, doc: Document) -> Result<String>;

    fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>>;

    /// All matching documents in insertion order.
    fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>>;

    fn count(&self, collection: Collection, filter: &Filter) -> Result<u64>;

    /// Merges `set` into every matching document; returns the number matched.
    fn update_many(&self, collection: Collection, filter: &Filter, set: &Document) -> Result<u64>;

    fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<u64>;

    fn delete_many(&self, collection: Collection, filter: &Filter) -> Result<u64>;

    fn close(&self) -> Result<()>;
}

/// Builds an equality filter from key/value pairs.
pub fn filter<const N: usize>(pairs: [(&str, Value); N]) -> Filter {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Malformed(format!("expected an object, got {other}"))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| {
        tracing::error!("Failed to decode stored document: {e}");
        Error::Malformed(e.to_string())
    })
}

/// Returns the `_id` of a stored document.
pub fn document_id(doc: &Document) -> Result<String> {
    doc.get(ID_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::Malformed("document has no _id".to_string()))
}

/// True if `doc` satisfies every predicate in `filter`. A `null` predicate
/// also matches a missing field.
pub(crate) fn matches(doc: &Document, filter: &Filter) -> bool {
    filter.iter().all(|(key, expected)| match doc.get(key) {
        Some(actual) => actual == expected,
        None => expected.is_null(),
    })
}

/// Applies `$set` semantics. The `_id` field is never overwritten.
pub(crate) fn apply_set(doc: &mut Document, set: &Document) {
    for (key, value) in set {
        if key != ID_FIELD {
            doc.insert(key.clone(), value.clone());
        }
    }
}

/// Fills in a fresh `_id` unless the document brings its own.
pub(crate) fn assign_id(doc: &mut Document) -> String {
    match doc.get(ID_FIELD).and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let id = uuid::Uuid::new_v4().to_string();
            doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
            id
        }
    }
}
