//! diplomacy-relay server entry point.
//!
//! Opens the subscription store, starts the poll scheduler and serves the
//! bridge surface until Ctrl-C.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use diplomacy_relay::api;
use diplomacy_relay::app_state::AppState;
use diplomacy_relay::config::RelayConfig;
use diplomacy_relay::domain::EventBus;
use diplomacy_relay::error::RelayError;
use diplomacy_relay::gateway::{BridgeGateway, ChannelDirectory, ChatGateway};
use diplomacy_relay::persistence::{SqliteStore, SubscriptionStore};
use diplomacy_relay::service::{CommandInterpreter, PollScheduler, TransitionEngine};
use diplomacy_relay::shutdown::Shutdown;
use diplomacy_relay::source::{GameSource, WebDiplomacyClient};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "cannot start relay");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "relay stopped with an error");
        std::process::exit(1);
    }
}

async fn run(config: RelayConfig) -> Result<(), RelayError> {
    tracing::info!(addr = %config.listen_addr, ?config, "starting diplomacy-relay");
    let (trigger, shutdown) = Shutdown::new();

    // Persistence and game source
    let sqlite = Arc::new(SqliteStore::connect(&config.database_url).await?);
    let store: Arc<dyn SubscriptionStore> = Arc::clone(&sqlite) as Arc<dyn SubscriptionStore>;
    let source: Arc<dyn GameSource> = Arc::new(WebDiplomacyClient::new(
        config.webdiplomacy_url.clone(),
        config.request_timeout(),
        config.backoff(),
        shutdown.clone(),
    )?);

    // Outbound delivery through connected bridges
    let event_bus = EventBus::new(config.event_bus_capacity);
    let directory = Arc::new(ChannelDirectory::new());
    let gateway: Arc<dyn ChatGateway> = Arc::new(BridgeGateway::new(
        event_bus.clone(),
        Arc::clone(&directory),
    ));

    // Service layer
    let engine = TransitionEngine::new(Arc::clone(&store), config.map_regeneration_delay());
    let scheduler = PollScheduler::new(
        Arc::clone(&store),
        Arc::clone(&source),
        engine,
        gateway,
        config.poll_interval(),
    );
    let interpreter = Arc::new(CommandInterpreter::new(
        Arc::clone(&store),
        source,
        config.trigger_words.clone(),
    ));
    let scheduler_task = tokio::spawn(scheduler.run(shutdown.clone()));

    // Build application state and router
    let app_state = AppState {
        interpreter,
        store,
        event_bus,
        directory,
        bot_token: Arc::from(config.bot_token.as_str()),
        shutdown: shutdown.clone(),
    };
    let app = api::build_router(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .map_err(|e| RelayError::Configuration(format!("cannot bind {}: {e}", config.listen_addr)))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    let mut server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Dropping the trigger would stop the relay; keep it alive instead.
            tracing::error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        tracing::info!("shutdown requested");
        trigger.trigger();
    });

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_shutdown.wait().await })
        .await
        .map_err(|e| RelayError::Internal(format!("server error: {e}")));

    if let Err(e) = scheduler_task.await {
        tracing::warn!(error = %e, "poll scheduler task failed");
    }
    sqlite.close().await;
    tracing::info!("diplomacy-relay stopped");
    served
}
