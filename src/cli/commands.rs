use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Identifies a tracked repo.
#[derive(Args, Debug, Clone)]
pub struct RepoArgs {
    /// Repository owner
    #[arg(long)]
    pub owner: String,

    /// Repository name
    #[arg(long)]
    pub repo: String,

    /// Branch
    #[arg(long, default_value = "main")]
    pub branch: String,
}

/// Identifies a file inside a tracked repo.
#[derive(Args, Debug, Clone)]
pub struct FileArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// File path within the repository
    #[arg(long)]
    pub path: String,
}

#[derive(Subcommand)]
pub enum RepoCommands {
    /// Register a repo
    Add(RepoArgs),
    /// Show a repo document
    Show(RepoArgs),
    /// Delete a repo with all its files and functions
    Delete(RepoArgs),
    /// List all files stored for a repo
    Files(RepoArgs),
}

#[derive(Subcommand)]
pub enum FileCommands {
    /// Store a file analysis read from a JSON file
    Write {
        #[command(flatten)]
        repo: RepoArgs,

        /// Analysis JSON: {path, last_commit, commits, line_history, functions}
        #[arg(long)]
        input: PathBuf,
    },
    /// Show a file document
    Show(FileArgs),
    /// Delete a file and its functions
    Delete(FileArgs),
    /// Set the advisory lock on a file
    Lock(FileArgs),
    /// Clear the advisory lock on a file
    Unlock(FileArgs),
    /// Show the advisory lock of a file
    LockStatus(FileArgs),
}

#[derive(Subcommand)]
pub enum FunctionCommands {
    /// List the functions of a file
    List(FileArgs),
    /// Show one function
    Show {
        #[command(flatten)]
        file: FileArgs,

        /// Function name
        #[arg(long)]
        name: String,
    },
    /// Set the user score of a function
    Score {
        #[command(flatten)]
        file: FileArgs,

        /// Function name
        #[arg(long)]
        name: String,

        /// New score
        #[arg(long, allow_negative_numbers = true)]
        value: i64,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a user
    Add {
        #[arg(long)]
        user_name: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "REPOMETA_PASSWORD", hide_env_values = true)]
        password: String,

        /// Repos the user may work on (repeatable)
        #[arg(long = "dev-access")]
        dev_access: Vec<String>,
    },
    /// Show a user (without credentials)
    Show {
        #[arg(long)]
        user_name: String,
    },
    /// Delete a user
    Remove {
        #[arg(long)]
        user_name: String,
    },
    /// Verify a password and issue a session cookie
    Login {
        #[arg(long)]
        user_name: String,

        #[arg(long, env = "REPOMETA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Drop the session cookie of a user
    Logout {
        #[arg(long)]
        user_name: String,
    },
}
