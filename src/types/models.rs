use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Document;

/// Function name to manually entered score, captured when functions are removed.
pub type ScoreMap = BTreeMap<String, i64>;

/// Natural key of a tracked repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoKey {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl RepoKey {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
        }
    }
}

impl fmt::Display for RepoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} - {}", self.owner, self.repo, self.branch)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repo {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl Repo {
    #[must_use]
    pub fn key(&self) -> RepoKey {
        RepoKey::new(&self.owner, &self.repo, &self.branch)
    }
}

/// One file's analysis as handed over by the analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileData {
    pub path: String,
    pub last_commit: String,
    pub commits: i64,
    #[serde(default)]
    pub line_history: Value,
    #[serde(default)]
    pub functions: Vec<FunctionData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub repo_id: String,
    pub path: String,
    pub last_commit: String,
    pub commits: i64,
    #[serde(default)]
    pub line_history: Value,
    #[serde(default)]
    pub file_lock: bool,
}

/// Partial update of the analysis fields of a stored file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commits: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_history: Option<Value>,
}

/// Outcome of a successful file write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileWrite {
    Inserted {
        file_id: String,
        function_ids: Vec<String>,
    },
    Updated {
        file_id: String,
        function_ids: Vec<String>,
    },
}

impl FileWrite {
    #[must_use]
    pub fn file_id(&self) -> &str {
        match self {
            Self::Inserted { file_id, .. } | Self::Updated { file_id, .. } => file_id,
        }
    }

    #[must_use]
    pub fn function_ids(&self) -> &[String] {
        match self {
            Self::Inserted { function_ids, .. } | Self::Updated { function_ids, .. } => {
                function_ids
            }
        }
    }
}

/// A function as reported by the analyzer. Everything besides the name is
/// opaque and stored as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionData {
    pub name: String,
    #[serde(flatten)]
    pub fields: Document,
}

impl FunctionData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Document::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub file_id: String,
    pub name: String,
    pub user_score: i64,
    #[serde(flatten)]
    pub fields: Document,
}

/// Keys owned by the store on a function document.
pub(crate) const RESERVED_FUNCTION_KEYS: &[&str] = &["_id", "file_id", "name", "user_score"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub dev_access: Vec<String>,
    /// Hex encoded.
    pub salt: String,
    /// Hex encoded PBKDF2 output.
    pub secured_password: String,
}

/// Registration input for a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub dev_access: Vec<String>,
}

/// Field-merge update of a user. A new password is re-hashed with a fresh salt.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub dev_access: Option<Vec<String>>,
    pub password: Option<String>,
}

impl UserUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.dev_access.is_none()
            && self.password.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub user_name: String,
    pub cookie: String,
    pub created_at: DateTime<Utc>,
}
