use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dealflow::dealflow_config::DealflowConfig;
use dealflow::logging::{self, LogSettings};

mod cmd;

#[derive(Parser)]
#[command(name = "dealflow")]
#[command(version, about = "Sales pipeline CRM: contacts, deal board, tasks and reporting")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create .dealflow/ with a default dealflow.toml and an empty database
    Init {
        /// Overwrite an existing dealflow.toml with defaults
        #[arg(long)]
        force: bool,
    },
    /// Serve the HTTP API and change feed
    Serve {
        /// Port to serve on (overrides dealflow.toml and DEALFLOW_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Database path (overrides dealflow.toml and DEALFLOW_DB_PATH)
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Enable dev mode (CORS permissive for a local frontend dev server)
        #[arg(long)]
        dev: bool,

        /// Keep everything in memory; nothing is written to disk
        #[arg(long)]
        offline: bool,

        /// Directory with contacts.json, deals.json and tasks.json to import at startup
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
    /// List or edit pipeline stages
    Stages {
        #[command(subcommand)]
        command: Option<StagesCommands>,
    },
    /// Print the pipeline board
    Board,
    /// Print the dashboard report
    Report {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum StagesCommands {
    /// List stages in board order
    List,
    /// Append a stage
    Add {
        name: String,
        /// Win probability, 0-100
        #[arg(long)]
        probability: Option<u8>,
        /// Column color, e.g. "#3b82f6"
        #[arg(long)]
        color: Option<String>,
    },
    /// Rename a stage; deals on it follow
    Rename { from: String, to: String },
    /// Move a stage to a 1-based position
    Move { name: String, position: usize },
    /// Delete a stage; deals on it stay where they are
    Delete { name: String },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let mut config = DealflowConfig::with_cli_args(project_dir, cli.verbose)?;
    let _log_guard = logging::init(&LogSettings::from_config(&config));

    match &cli.command {
        Commands::Init { force } => cmd::cmd_init(&config, *force)?,
        Commands::Serve {
            port,
            db_path,
            dev,
            offline,
            fixtures,
        } => {
            config.cli_port = *port;
            config.cli_db_path = db_path.clone();
            config.cli_dev_mode = *dev;
            cmd::cmd_serve(&config, *offline, fixtures.clone()).await?;
        }
        Commands::Stages { command } => cmd::cmd_stages(&config, command.clone()).await?,
        Commands::Board => cmd::cmd_board(&config).await?,
        Commands::Report { json } => cmd::cmd_report(&config, *json).await?,
        Commands::Config { command } => cmd::cmd_config(&config, command.clone())?,
    }

    Ok(())
}
