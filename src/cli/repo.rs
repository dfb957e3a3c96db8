use serde::Serialize;

use crate::metadata::MetadataStore;
use crate::types::{RepoKey, Status};

use super::{RepoCommands, emit, emit_status};

#[derive(Serialize)]
struct RepoWritten {
    #[serde(flatten)]
    status: Status,
    repo_id: String,
}

pub fn run_repo(meta: &MetadataStore, command: RepoCommands) -> anyhow::Result<bool> {
    match command {
        RepoCommands::Add(args) => {
            let key = RepoKey::from(&args);
            emit(meta.write_repo(&key).map(|repo_id| RepoWritten {
                status: Status::success(format!("repo for {key} has been written")),
                repo_id,
            }))
        }
        RepoCommands::Show(args) => emit(meta.get_repo(&RepoKey::from(&args))),
        RepoCommands::Delete(args) => {
            let key = RepoKey::from(&args);
            emit_status(meta.delete_repo(&key), format!("{key} deleted"))
        }
        RepoCommands::Files(args) => emit(meta.get_all_repo_files(&RepoKey::from(&args))),
    }
}
