use std::sync::Arc;

use distributed_cache::api;
use distributed_cache::cache::LocalStore;
use distributed_cache::cluster::{DiscoveryService, PeerClient};
use distributed_cache::config::NodeConfig;
use distributed_cache::coordinator::Coordinator;
use distributed_cache::ring::HashRing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} --host <host> --port <port> [--id <id>] [--peers <host:port,...>]",
            args[0]
        );
        eprintln!(
            "Example: {} --host 127.0.0.1 --port 8080 --peers 127.0.0.1:8080,127.0.0.1:8081",
            args[0]
        );
        std::process::exit(1);
    }

    let config = NodeConfig::from_args(&args)?;
    config.log_startup();

    let local = config.local_node();

    // 1. Core state: local store and the hash ring.
    let store = LocalStore::new(config.max_entries);
    let ring = Arc::new(HashRing::new(config.replication_factor));

    // 2. Peer plumbing and request routing.
    let client = Arc::new(PeerClient::new(config.connect_timeout, config.read_timeout)?);
    let coordinator = Coordinator::new(local.clone(), store.clone(), ring.clone(), client.clone());

    // 3. Membership: puts this node on the ring, then starts the heartbeat
    //    sender and timeout sweeper.
    let discovery = DiscoveryService::new(&config, ring.clone(), client.clone());
    discovery.start();

    // 4. HTTP server.
    let app = api::router(coordinator, store.clone(), discovery.clone());
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(
        "Node {} listening on {}:{}",
        local.id(),
        config.host,
        config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(store, discovery))
        .await?;

    Ok(())
}

async fn shutdown_signal(store: Arc<LocalStore>, discovery: Arc<DiscoveryService>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutting down");
    discovery.shutdown();
    store.shutdown();
}
