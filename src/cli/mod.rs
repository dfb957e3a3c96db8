mod commands;
mod file;
mod repo;
mod user;

pub use commands::{FileArgs, FileCommands, FunctionCommands, RepoArgs, RepoCommands, UserCommands};
pub use file::{run_file, run_function};
pub use repo::run_repo;
pub use user::run_user;

use std::fs;
use std::sync::Arc;

use serde::Serialize;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::metadata::MetadataStore;
use crate::store::{DocumentStore, SqliteStore};
use crate::types::{RepoKey, Status};

impl From<&RepoArgs> for RepoKey {
    fn from(args: &RepoArgs) -> Self {
        RepoKey::new(&args.owner, &args.repo, &args.branch)
    }
}

/// Creates the data directory and the collections.
pub fn run_init(config: &StoreConfig) -> anyhow::Result<()> {
    fs::create_dir_all(&config.data_dir)?;
    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    print_json(&Status::success(format!(
        "initialized {}",
        config.db_path().display()
    )))?;
    Ok(())
}

/// Opens the metadata store, checking the database exists.
pub fn open_store(config: &StoreConfig) -> anyhow::Result<MetadataStore> {
    let db_path = config.db_path();
    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'repometa init' first.",
            db_path.display()
        );
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;
    Ok(MetadataStore::new(Arc::new(store)))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints the value on success or the Failed envelope on error.
/// Returns whether the operation succeeded.
fn emit<T: Serialize>(result: Result<T>) -> anyhow::Result<bool> {
    match result {
        Ok(value) => {
            print_json(&value)?;
            Ok(true)
        }
        Err(e) => {
            print_json(&Status::failed(e.to_string()))?;
            Ok(false)
        }
    }
}

/// Prints the status envelope for a mutation.
fn emit_status<T>(result: Result<T>, reason: impl Into<String>) -> anyhow::Result<bool> {
    let status = Status::from_result(&result, reason);
    print_json(&status)?;
    Ok(status.is_success())
}
