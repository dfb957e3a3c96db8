use std::fs;

use serde::Serialize;

use crate::metadata::MetadataStore;
use crate::types::{FileData, FileWrite, RepoKey, Status};

use super::{FileCommands, FunctionCommands, emit, emit_status};

#[derive(Serialize)]
struct FileWritten {
    #[serde(flatten)]
    status: Status,
    #[serde(flatten)]
    write: FileWrite,
}

impl FileWritten {
    fn new(path: &str, write: FileWrite) -> Self {
        let verb = match write {
            FileWrite::Inserted { .. } => "inserted",
            FileWrite::Updated { .. } => "updated",
        };
        Self {
            status: Status::success(format!("{path} has been {verb}")),
            write,
        }
    }
}

#[derive(Serialize)]
struct LockStatus {
    lock_status: bool,
}

pub fn run_file(meta: &MetadataStore, command: FileCommands) -> anyhow::Result<bool> {
    match command {
        FileCommands::Write { repo, input } => {
            let content = fs::read_to_string(&input)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", input.display()))?;
            let data: FileData = serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Invalid analysis in {}: {e}", input.display()))?;
            emit(
                meta.write_file(&data, &RepoKey::from(&repo))
                    .map(|write| FileWritten::new(&data.path, write)),
            )
        }
        FileCommands::Show(args) => emit(meta.get_file(&RepoKey::from(&args.repo), &args.path)),
        FileCommands::Delete(args) => {
            let key = RepoKey::from(&args.repo);
            emit_status(
                meta.delete_file(&key, &args.path),
                format!("{} has been deleted", args.path),
            )
        }
        FileCommands::Lock(args) => set_lock(meta, &args.repo, &args.path, true),
        FileCommands::Unlock(args) => set_lock(meta, &args.repo, &args.path, false),
        FileCommands::LockStatus(args) => emit(
            meta.get_lock_status(&RepoKey::from(&args.repo), &args.path)
                .map(|lock_status| LockStatus { lock_status }),
        ),
    }
}

fn set_lock(
    meta: &MetadataStore,
    repo: &super::RepoArgs,
    path: &str,
    lock: bool,
) -> anyhow::Result<bool> {
    emit(
        meta.update_lock(&RepoKey::from(repo), path, lock)
            .map(|lock_status| LockStatus { lock_status }),
    )
}

pub fn run_function(meta: &MetadataStore, command: FunctionCommands) -> anyhow::Result<bool> {
    match command {
        FunctionCommands::List(args) => {
            emit(meta.get_functions(&RepoKey::from(&args.repo), &args.path))
        }
        FunctionCommands::Show { file, name } => {
            emit(meta.get_function(&RepoKey::from(&file.repo), &file.path, &name))
        }
        FunctionCommands::Score { file, name, value } => emit_status(
            meta.update_user_score(&RepoKey::from(&file.repo), &file.path, &name, value),
            format!("successfully updated {name}"),
        ),
    }
}
