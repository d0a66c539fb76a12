//! Bonding Address Watcher
//!
//! Watches the MultiversX bonding registry for new pairs, alerts an operator
//! chat and buys into pairs whose token matches the configured keyword.

mod commands;
mod config;
mod server;
mod shutdown;
mod state;
#[cfg(test)]
mod testing;

use bondwatch_core::chain::{
    MultiversxPurchaser, MultiversxRegistry, MultiversxSwapProbe, PurchaseSettings,
};
use bondwatch_core::config::KeywordStore;
use bondwatch_core::entities::AddressSnapshotStore;
use bondwatch_core::events::transport_event_channel;
use bondwatch_core::processors::reconnect::MAX_RECONNECT_ATTEMPTS;
use bondwatch_core::processors::{
    DetectionScheduler, DetectorParts, NewAddressDetector, NotificationDispatcher,
    ReconnectSupervisor, SwapWaiter,
};
use bondwatch_core::reliability::{CircuitBreaker, HealthController, SHUTDOWN_TIMEOUT};
use bondwatch_core::transport::{ChatTransport, TelegramTransport};
use bondwatch_sdk::client::{MultiversxClient, TelegramClient};
use bondwatch_sdk::wallet::PemWallet;
use clap::Parser;
use commands::CommandHandler;
use config::{ConfigLoader, get_bot_token};
use server::{build_router, run_server};
use shutdown::shutdown_signal;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Bonding Address Watcher - MultiversX bonding registry monitor
#[derive(Parser, Debug)]
#[command(name = "bondwatch-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./bondwatch-config.toml")]
    config: PathBuf,

    /// Override the health endpoint listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting bondwatch-server v{}", env!("CARGO_PKG_VERSION"));

    let config = ConfigLoader::new(&args.config, args.listen)
        .load()
        .map_err(|e| {
            tracing::error!("Failed to load configuration: {}", e);
            e
        })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let bot_token = get_bot_token().map_err(|e| {
        tracing::error!("{}", e);
        e
    })?;

    // Purchases read the wallet themselves; an unusable file only fails them.
    match PemWallet::from_pem_file(&config.wallet.pem_file) {
        Ok(wallet) => tracing::info!(address = %wallet.address(), "Wallet found"),
        Err(e) => tracing::warn!(
            path = ?config.wallet.pem_file,
            error = %e,
            "Wallet not usable, purchases will fail until it is fixed"
        ),
    }

    // Clients
    let chain_client = MultiversxClient::new(config.chain.api_url.clone());
    let telegram_client = TelegramClient::new(Url::parse(TelegramClient::DEFAULT_BASE_URL)?, bot_token);

    // Chat transport and reliability core
    let (events_tx, _) = transport_event_channel();
    let telegram = TelegramTransport::new(telegram_client, events_tx.clone());
    let transport: Arc<dyn ChatTransport> = Arc::new(telegram);

    let breaker = CircuitBreaker::new();
    breaker.on_open(|| tracing::warn!("Circuit breaker opened, alerts suspended"));
    breaker.on_close(|| tracing::info!("Circuit breaker closed, alerts resumed"));

    let health = HealthController::new(breaker, Arc::clone(&transport), MAX_RECONNECT_ATTEMPTS);

    // Stores
    let keyword = KeywordStore::load(&config.storage.keyword_file).await;
    let snapshots = AddressSnapshotStore::new(&config.storage.addresses_file);

    // Detection pipeline
    let dispatcher = NotificationDispatcher::new(health.clone(), config.telegram.chat_id);
    let swap_waiter = SwapWaiter::with_interval(
        Arc::new(MultiversxSwapProbe::new(chain_client.clone())),
        config.monitor.swap_wait_interval,
    );
    let purchaser = MultiversxPurchaser::new(
        chain_client.clone(),
        config.wallet.pem_file.clone(),
        PurchaseSettings {
            default_token: config.wallet.default_token.clone(),
            chain_id: config.chain.chain_id.clone(),
            gas_limit: config.wallet.gas_limit,
            gas_price: config.wallet.gas_price,
            explorer_url: config.chain.explorer_url.clone(),
        },
    );
    let registry = MultiversxRegistry::new(
        chain_client,
        config.chain.registry_contract.clone(),
        config.chain.registry_function.clone(),
    );
    let detector = Arc::new(NewAddressDetector::new(DetectorParts {
        registry: Arc::new(registry),
        snapshots,
        keyword: keyword.clone(),
        dispatcher,
        swap_waiter,
        purchaser: Arc::new(purchaser),
        window_size: config.monitor.window_size,
        swap_wait_max_attempts: config.monitor.swap_wait_max_attempts,
    }));

    // Subscribe every consumer before the poller can emit anything.
    let liveness_events = events_tx.subscribe();
    let supervisor_events = events_tx.subscribe();
    let command_events = events_tx.subscribe();

    match transport.get_me().await {
        Ok(me) => tracing::info!(
            bot_id = me.id,
            username = me.username.as_deref().unwrap_or("-"),
            "Bot identity confirmed"
        ),
        Err(e) => tracing::error!(error = %e, "Bot identity probe failed"),
    }

    match transport.start_polling().await {
        Ok(()) => {
            health.mark_connected();
            tracing::info!("Chat transport polling started");
        }
        Err(e) => tracing::error!(error = %e, "Failed to start chat transport"),
    }

    let mut tasks = JoinSet::new();
    tasks.spawn(health.clone().track_liveness(liveness_events));
    tasks.spawn(ReconnectSupervisor::new(health.clone()).run(supervisor_events));
    tasks.spawn(
        CommandHandler::new(
            Arc::clone(&transport),
            keyword,
            config.telegram.authorized_chat_id,
        )
        .run(command_events, health.shutdown_receiver()),
    );
    tasks.spawn(
        DetectionScheduler::new(detector, config.monitor.check_interval)
            .run(health.shutdown_receiver()),
    );

    let router = build_router(AppState::new(health.clone()));
    let mut http_shutdown = health.shutdown_receiver();
    let listen_addr = config.server.listen;
    tasks.spawn(async move {
        let shutdown = async move {
            let _ = http_shutdown.wait_for(|stopping| *stopping).await;
        };
        if let Err(e) = run_server(router, listen_addr, shutdown).await {
            tracing::error!(error = %e, "Health endpoint failed");
        }
    });

    if let Err(e) = shutdown_signal().await {
        tracing::error!(error = %e, "Failed to install signal handlers, shutting down");
    }

    health.graceful_shutdown().await;

    // Workers only finish their current step; a detection cycle in the
    // middle of a swap wait is abandoned after the deadline.
    let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        while tasks.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        tracing::warn!(
            remaining = tasks.len(),
            "Tasks still running after shutdown timeout, aborting"
        );
        tasks.shutdown().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bondwatch_core=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
