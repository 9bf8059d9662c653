use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::info;

use linkmasker::cli::{Cli, Commands};
use linkmasker::config::{StaticConfig, generate_encryption_key};
use linkmasker::runtime::modes::run_server;
use linkmasker::services::ClickLog;
use linkmasker::storage::StorageFactory;
use linkmasker::storage::backend::OPTION_ENCRYPTION_KEY;
use linkmasker::system::init_logging;

const DEFAULT_SAMPLE_PATH: &str = "config.example.toml";

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::ConfigGen { path, force } => {
            let path = path.unwrap_or_else(|| DEFAULT_SAMPLE_PATH.to_string());
            if std::path::Path::new(&path).exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path);
            }
            StaticConfig::default()
                .save_to_file(&path)
                .with_context(|| format!("Failed to write {}", path))?;
            println!("{} Sample configuration written to {}", "✓".green(), path);
            Ok(())
        }
        Commands::GenKey { store } => {
            let key = generate_encryption_key();
            if !store {
                println!("{}", key);
                return Ok(());
            }
            let config = load_config(&cli.config)?;
            let storage = StorageFactory::create(&config.database).await?;
            storage.set_option(OPTION_ENCRYPTION_KEY, &key).await?;
            println!(
                "{} New encryption key stored. Existing aes256 links can no longer be decoded.",
                "✓".green()
            );
            Ok(())
        }
        Commands::PurgeLogs { days } => {
            let config = load_config(&cli.config)?;
            let days = days.unwrap_or(config.logs.log_duration.max(0) as u32);
            if days == 0 {
                anyhow::bail!("Nothing to do: pass --days or set logs.log_duration");
            }
            let storage = StorageFactory::create(&config.database).await?;
            let removed = ClickLog::new(storage).purge_older_than(days).await?;
            println!(
                "{} Removed {} redirect logs older than {} days",
                "✓".green(),
                removed,
                days
            );
            Ok(())
        }
        Commands::Serve => {
            let config = load_config(&cli.config)?;
            let _guard = init_logging(&config.logging)?;
            info!("linkmasker v{} starting", env!("CARGO_PKG_VERSION"));
            run_server(config).await
        }
    }
}

fn load_config(path: &str) -> Result<StaticConfig> {
    StaticConfig::load(path).with_context(|| format!("Failed to load configuration from {}", path))
}
