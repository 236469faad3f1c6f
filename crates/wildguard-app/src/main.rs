mod cli;
mod commands;
mod monitor;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use wildguard_client::{Bindings, Fetcher, Registry, ReqwestTransport};
use wildguard_core::config::AppConfig;
use wildguard_core::{lifecycle, ClientStore};

use cli::{Cli, Commands};

/// Store, registry and bindings over the real HTTP transport.
fn connect(config: &AppConfig) -> Result<(ClientStore, Bindings)> {
    let store = ClientStore::from_config(config);
    let transport = ReqwestTransport::new(Duration::from_secs(config.api.timeout_secs))?;
    let registry = Registry::new(store.clone(), Fetcher::new(Arc::new(transport)));
    Ok((store, Bindings::new(registry)))
}

#[tokio::main]
async fn main() -> Result<()> {
    lifecycle::init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::load_or_default(cli.config.as_deref());
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(mode) = cli.backend_mode {
        config.backend.mode = mode;
    }

    let (store, bindings) = connect(&config)?;
    tracing::debug!("api base url: {}", store.snapshot().effective_api_base_url());

    match cli.command {
        Commands::Health => commands::health(&bindings).await,
        Commands::Positions => commands::positions(&bindings).await,
        Commands::Hotspots => commands::hotspots(&bindings).await,
        Commands::Agents => commands::agents(&bindings).await,
        Commands::Movement => commands::movement(&bindings).await,
        Commands::Orchestrate => commands::orchestrate(&bindings).await,
        Commands::Analytics { export } => commands::analytics(&bindings, export.as_deref()).await,
        Commands::Dashboard => commands::dashboard(&bindings).await,
        Commands::Views => {
            commands::views();
            Ok(())
        }
        Commands::Monitor { view, paused } => {
            store.update(|s| {
                if let Some(view) = view {
                    s.selected_view = view;
                }
                if paused {
                    s.is_live = false;
                }
            });
            lifecycle::log_startup(store.snapshot().effective_api_base_url());
            let result = monitor::run(&bindings, &store).await;
            lifecycle::log_shutdown();
            result
        }
    }
}
