// src/main.rs
mod api;
mod catalog;
mod config;
mod error;
mod exchange;
mod models;
mod price;
mod valuation;

use crate::api::AppState;
use crate::catalog::{refresh_periodically, MarketCatalog, RefreshStatus};
use crate::config::Config;
use crate::exchange::{BudaClient, Exchange};
use env_logger::Builder;
use log::{error, info, warn, LevelFilter};
use std::sync::Arc;
use tokio::task;

#[tokio::main]
async fn main() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_env("RUST_LOG")
        .format_timestamp_secs()
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let exchange: Arc<dyn Exchange> =
        match BudaClient::new(&config.api_url, config.upstream_timeout) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                error!("Failed to build HTTP client: {}", e);
                std::process::exit(1);
            }
        };
    info!("Using exchange API at {}", config.api_url);

    let catalog = Arc::new(MarketCatalog::default());
    match catalog.refresh(exchange.as_ref()).await {
        RefreshStatus::Updated { markets } => info!("Loaded {} markets", markets),
        RefreshStatus::Retained if catalog.snapshot().await.is_empty() => {
            warn!("Market catalog is empty, every market will be reported as unavailable")
        }
        RefreshStatus::Retained => {}
    }

    if let Some(period) = config.catalog_refresh {
        info!("Refreshing market catalog every {}s", period.as_secs());
        task::spawn(refresh_periodically(
            catalog.clone(),
            exchange.clone(),
            period,
        ));
    }

    let api = api::routes(AppState { exchange, catalog });

    info!("Server running on http://{}", config.listen_addr);
    warp::serve(api).run(config.listen_addr).await;
}
