use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use cryptotracker::core::TimeWindow;
use cryptotracker::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List assets by market cap
    List {
        /// Only show assets whose name or symbol contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Keep refreshing the listing until Ctrl-C
        #[arg(short, long)]
        watch: bool,
    },
    /// Show one asset with its price history
    Detail {
        /// Asset identifier, e.g. "bitcoin"
        asset_id: String,

        /// Time window: 1D, 7D, 1M, 3M, 1Y or 3Y
        #[arg(short, long, default_value_t = TimeWindow::default())]
        window: TimeWindow,
    },
}

impl From<Commands> for cryptotracker::AppCommand {
    fn from(cmd: Commands) -> cryptotracker::AppCommand {
        match cmd {
            Commands::List { search, watch } => cryptotracker::AppCommand::List { search, watch },
            Commands::Detail { asset_id, window } => {
                cryptotracker::AppCommand::Detail { asset_id, window }
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => cryptotracker::cli::setup::setup_at_path(path),
            None => cryptotracker::cli::setup::setup(),
        },
        Some(cmd) => cryptotracker::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
