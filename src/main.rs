use bracket_roster::core::Config;
use bracket_roster::pipeline::export_tournament;
use bracket_roster::server;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bracket-roster", version, about = "Wrestler roster extraction from bracket viewers")]
struct Cli {
    /// JSON config file; omitted keys keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the download page and the scrape endpoint
    Serve {
        #[arg(long)]
        addr: Option<String>,
    },
    /// Run one scrape from the terminal and write the spreadsheet
    Scrape {
        #[arg(long)]
        tournament: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::Serve { addr } => {
            let mut config = config;
            if let Some(addr) = addr {
                config.server.addr = addr;
            }
            server::serve(config).await?;
        }
        Command::Scrape { tournament, output } => {
            let export = export_tournament(&config, &tournament).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(&export.file_name));
            std::fs::write(&path, &export.bytes)?;
            info!("Wrote {} wrestlers to {}", export.rows, path.display());
        }
    }

    Ok(())
}
