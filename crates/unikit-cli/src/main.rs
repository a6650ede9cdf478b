use clap::{Parser, Subcommand};
use std::path::PathBuf;
use unikit_wallet::{EngineConfig, JsonFileStore, RecencyStore};

mod commands;

/// unikit wallet connection command-line interface.
#[derive(Parser)]
#[command(name = "unikit")]
#[command(about = "Rank, connect and inspect wallet backends")]
#[command(version)]
struct Cli {
    /// Recency store file (JSON).
    #[arg(long)]
    store: Option<String>,

    /// Engine configuration file (camelCase JSON).
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank the backends described in a JSON file.
    Rank {
        /// JSON array of backend descriptors.
        backends: PathBuf,
    },

    /// Show previously connected backends, most recent first.
    History,

    /// Move entries from the legacy recency key to the current one.
    Migrate,

    /// Clear the recency list.
    Forget,

    /// Connect to a simulated backend, then disconnect.
    Connect {
        /// JSON array of backend descriptors.
        backends: PathBuf,

        /// Backend id to connect.
        id: String,
    },

    /// Pair through the hosted relay configured in --config.
    Relay {
        /// Deep-link this wallet once the pairing is open.
        #[arg(long)]
        wallet: Option<String>,

        /// Give up after this many seconds without a session.
        #[arg(long, default_value = "120")]
        timeout: u64,
    },
}

/// Application context shared across commands.
struct AppContext {
    store_path: PathBuf,
    config: EngineConfig,
}

impl AppContext {
    fn from_cli(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let store_path = match cli.store {
            Some(ref path) => PathBuf::from(path),
            None => default_data_dir().join("recency.json"),
        };

        let config = match cli.config {
            Some(ref path) => EngineConfig::from_file(path)?,
            None => EngineConfig::default(),
        };

        Ok(Self { store_path, config })
    }

    fn recency(&self) -> RecencyStore {
        RecencyStore::open(Box::new(JsonFileStore::open(&self.store_path)))
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("unikit")
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let ctx = match AppContext::from_cli(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Rank { backends } => commands::rank_backends(&ctx, &backends).await,
        Commands::History => commands::show_history(&ctx).await,
        Commands::Migrate => commands::migrate(&ctx).await,
        Commands::Forget => commands::forget(&ctx).await,
        Commands::Connect { backends, id } => commands::connect(&ctx, &backends, &id).await,
        Commands::Relay { wallet, timeout } => commands::relay(&ctx, wallet, timeout).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
