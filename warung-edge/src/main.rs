//! Warung edge server.
//!
//! ```bash
//! warung serve --config warung.toml
//! warung check-config
//! warung indexnow-key example.com
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use warung_core::config::DEFAULT_CONFIG_FILE;
use warung_core::http::serve;
use warung_core::indexing::key_for;
use warung_core::logging::init_logging;
use warung_core::{WarungConfig, WarungState};

#[derive(Parser)]
#[command(name = "warung", about = "Warung edge server", version)]
struct Cli {
    /// Config file; environment variables override it
    #[arg(long, short, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the edge server until Ctrl-C
    Serve,
    /// Load and validate the configuration, then print it as TOML
    CheckConfig,
    /// Print the IndexNow key (and key file path) for a host
    IndexnowKey {
        host: String,
    },
}

fn load_config(path: &Path) -> Result<WarungConfig> {
    let config = WarungConfig::load_from(path)?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn run_server(config: WarungConfig) -> Result<()> {
    init_logging(&config.logging.to_logging_config())?;
    let state = WarungState::from_config(config).context("failed to build backend client")?;
    serve(Arc::new(state), async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::error!("failed to listen for Ctrl-C: {}", err);
        }
    })
    .await
}

fn indexnow_key(host: &str) -> String {
    let key = key_for(host.trim());
    format!("{}\nhttps://{}/{}.txt", key, host.trim(), key)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve => match load_config(&cli.config) {
            Ok(config) => run_server(config).await,
            Err(err) => Err(err),
        },
        Commands::CheckConfig => load_config(&cli.config).and_then(|config| {
            let rendered = toml::to_string_pretty(&config).context("failed to render config")?;
            println!("{}", rendered);
            Ok(())
        }),
        Commands::IndexnowKey { host } => {
            println!("{}", indexnow_key(&host));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
