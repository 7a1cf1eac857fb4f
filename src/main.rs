//! Process entry point (C12): load configuration, bring up storage, and run
//! the WebSocket acceptor until a shutdown signal drains it.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use ocpp_cs::application::commands::CommandSender;
use ocpp_cs::application::registry::SessionRegistry;
use ocpp_cs::domain::RepositoryProvider;
use ocpp_cs::interfaces::ws;
use ocpp_cs::support::ShutdownCoordinator;
use ocpp_cs::{init_database, Config, SeaOrmRepositories};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("starting OCPP central system");

    let db = init_database(&config.database_url, &config.pool).await?;
    let repo: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositories::new(db));

    let registry = Arc::new(SessionRegistry::new(repo.clone()));
    let command_sender = Arc::new(CommandSender::new(registry.clone()));

    let shutdown = ShutdownCoordinator::new(30);
    let shutdown_signal = shutdown.signal();
    shutdown.start_signal_listener();

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "listening for charge point connections");

    let acceptor = tokio::spawn(ws::run(
        listener,
        repo,
        registry,
        command_sender,
        shutdown_signal.clone(),
    ));

    shutdown_signal.wait().await;
    info!("shutdown signalled, draining acceptor");

    if let Err(e) = acceptor.await {
        error!(error = %e, "acceptor task panicked");
    }

    info!("OCPP central system shut down");
    Ok(())
}
