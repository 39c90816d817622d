//! Wallet demo CLI - interactive passkey wallet authentication.

mod browser;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use wallet_config_and_utils::init_logging;

/// Walk through passkey wallet onboarding, login and signing.
#[derive(Parser)]
#[command(name = "wallet-demo")]
#[command(about = "Passkey wallet authentication demo against an in-memory provider")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format (text or json)
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the config value
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// State directory holding config.json and logs (default ~/.wallet-demo)
    #[arg(long = "config", env = "WALLET_DEMO_HOME", global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive authentication session (default)
    Run(commands::RunArgs),

    /// Inspect or write the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write the effective configuration to config.json
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let paths = commands::resolve_paths(cli.config_dir)?;
    let mut config = commands::load_config(&paths)?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_logging("wallet-cli", &config.log_level, &paths);
    debug!(base_dir = %paths.base_dir().display(), "Configuration loaded");

    match cli.command.unwrap_or_else(|| Commands::Run(commands::RunArgs::default())) {
        Commands::Run(args) => commands::run(config, args, cli.format).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config_show(&paths, &config, cli.format),
            ConfigCommands::Init { force } => {
                commands::config_init(&paths, &config, force, cli.format)
            }
        },
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = dispatch(cli).await {
        output::print_error(&format!("{:#}", e), format);
        std::process::exit(1);
    }
}
