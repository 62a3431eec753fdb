mod health;
mod turn;

use std::sync::Arc;

use anyhow::Result;
use cordwood_core::config::{AppConfig, LoadOptions};
use cordwood_core::{AcceptAllAddresses, AddressVerifier, IntentRouter};
use cordwood_verify::HttpAddressVerifier;

fn init_logging(config: &AppConfig) {
    use cordwood_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let verifier: Arc<dyn AddressVerifier> = if config.verify.enabled {
        Arc::new(HttpAddressVerifier::from_config(&config.verify)?)
    } else {
        Arc::new(AcceptAllAddresses)
    };

    let router = Arc::new(IntentRouter::builtin(
        config.order_policy(),
        config.price_book(),
        verifier,
    ));

    let app = turn::router(turn::TurnState::new(router)).merge(health::router());

    let address = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        verify_mode = if config.verify.enabled { "remote" } else { "accept-all" },
        "cordwood turn endpoint started"
    );

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!(event_name = "system.server.stopped", "cordwood turn endpoint stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
