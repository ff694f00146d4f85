//! Spor CLI entry point.

use anyhow::Result;
use clap::Parser;
use spor::cli::{commands, Cli, Commands};
use spor::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // API keys may live in a local .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("spor={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match cli.command {
        Commands::Chat {
            provider,
            model,
            docs,
            no_search,
            no_wiki,
        } => {
            let options = commands::ChatOptions {
                provider,
                model,
                docs,
                no_search,
                no_wiki,
            };
            commands::run_chat(options, settings).await?;
        }

        Commands::Ask {
            question,
            provider,
            model,
        } => {
            commands::run_ask(&question, provider, model, settings).await?;
        }

        Commands::Qa { docs, top_k } => {
            commands::run_qa(&docs, top_k, settings).await?;
        }

        Commands::App { prompt, app_id } => {
            commands::run_app(&prompt, app_id, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, config_path, settings)?;
        }
    }

    Ok(())
}
