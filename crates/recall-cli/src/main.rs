use std::path::PathBuf;

use clap::{Parser, Subcommand};
use recall::memory::MemoryStore;
use recall_cli::commands::{AskCommand, MemoryCommand, StatsCommand};
use recall_cli::config::load_config;
use recall_cli::error::CliResult;
use recall_cli::output::OutputFormat;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "recall")]
#[command(about = "Recall - oracle-driven retrieval with tiered memory")]
#[command(version)]
pub struct Cli {
    #[clap(long, short, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[clap(long, short = 'd', global = true, help = "Path to data directory")]
    pub data_dir: Option<PathBuf>,

    #[clap(long, short = 'c', global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Answer a question through the pipeline")]
    Ask(AskCommand),

    #[clap(about = "Memory management commands")]
    Memory(MemoryCommand),

    #[clap(about = "Show memory store statistics")]
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so `--json` output stays parseable
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,recall=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let format = OutputFormat::from_json_flag(cli.json);

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }

    match &cli.command {
        Command::Ask(cmd) => cmd.execute(&config, format).await,
        Command::Memory(cmd) => {
            let store = MemoryStore::load(config.storage.memory_path()).await?;
            cmd.execute(&store, &config, format).await
        }
        Command::Stats(cmd) => {
            let store = MemoryStore::load(config.storage.memory_path()).await?;
            cmd.execute(&store, format).await
        }
    }
}
