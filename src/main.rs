use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use repometa::cli::{
    FileCommands, FunctionCommands, RepoCommands, UserCommands, open_store, run_file,
    run_function, run_init, run_repo, run_user,
};
use repometa::config::StoreConfig;
use repometa::store::Collection;

#[derive(Parser)]
#[command(name = "repometa")]
#[command(about = "Repository analysis metadata store", long_about = None)]
struct Cli {
    /// Data directory holding the database
    #[arg(long, global = true, env = "REPOMETA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// TOML config file (data_dir, database)
    #[arg(long, global = true, env = "REPOMETA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and database
    Init,

    /// Manage tracked repos
    Repo {
        #[command(subcommand)]
        command: RepoCommands,
    },

    /// Manage analyzed files
    File {
        #[command(subcommand)]
        command: FileCommands,
    },

    /// Inspect and score analyzed functions
    Function {
        #[command(subcommand)]
        command: FunctionCommands,
    },

    /// Manage users and sessions
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Remove every document of one collection (no cascade)
    Purge {
        #[arg(value_enum)]
        collection: Collection,

        /// Confirm the purge
        #[arg(long)]
        yes: bool,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    Ok(config)
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("repometa=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let succeeded = match cli.command {
        Commands::Init => {
            run_init(&config)?;
            true
        }
        Commands::Repo { command } => run_repo(&open_store(&config)?, command)?,
        Commands::File { command } => run_file(&open_store(&config)?, command)?,
        Commands::Function { command } => run_function(&open_store(&config)?, command)?,
        Commands::User { command } => run_user(&open_store(&config)?, command)?,
        Commands::Purge { collection, yes } => {
            if !yes {
                anyhow::bail!("Refusing to purge '{collection}' without --yes");
            }
            let removed = open_store(&config)?.purge(collection)?;
            println!("{}", serde_json::json!({ "status": "Success", "removed": removed }));
            true
        }
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
