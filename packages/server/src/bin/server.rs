//! Chat relay server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parlor-server
//! cargo run --bin parlor-server -- --port 3000 --user alice=secret-a --user bob=secret-b
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use parlor_server::{
    config::ServerConfig,
    hub::Hub,
    infrastructure::{auth::StaticTokenAuthenticator, history::InMemoryHistoryStore},
    ui::{AppState, Server},
};
use parlor_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = ServerConfig::parse();
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    // Initialize dependencies in order:
    // 1. Clock / History store / Authenticator
    // 2. Hub
    // 3. AppState (UseCases)
    // 4. Server
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let history = Arc::new(InMemoryHistoryStore::with_clock(
        config.retention_policy(),
        Arc::clone(&clock),
    ));
    let authenticator = Arc::new(StaticTokenAuthenticator::new(config.token_entries()));
    if authenticator.is_empty() {
        tracing::warn!("No --user entries given, every client will be receive-only");
    } else {
        tracing::info!("{} session tokens loaded", authenticator.len());
    }

    let (hub, hub_handle) = Hub::spawn(config.hub_config(), history, Arc::clone(&clock));

    let state = AppState::new(
        hub,
        authenticator,
        clock,
        config.queue_capacity,
        config.pump_config(),
    );

    let server = Server::new(state);
    if let Err(e) = server.run(&config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    // Upgraded connections outlive the listener. Stopping the hub closes
    // every outbound queue, so their pumps drain and send a close frame.
    hub_handle.abort();
    tokio::time::sleep(SHUTDOWN_GRACE).await;
}
