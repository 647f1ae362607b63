// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;
use tokio::net::TcpListener;
use traceline_node::config::NodeConfig;
use traceline_node::engine::Engine;
use traceline_node::server::build_router;
use traceline_node::telemetry;

#[tokio::main]
async fn main() {
    telemetry::init_telemetry();

    let cfg = NodeConfig::from_env();
    tracing::info!("Starting Traceline node with config: {:?}", cfg);

    let engine = match Engine::open(&cfg) {
        Ok(engine) => engine,
        Err(e) => {
            // A ledger that cannot be recovered must not serve writes.
            tracing::error!("Failed to open ledger: {e}");
            panic!("Failed to open ledger");
        }
    };

    let app = build_router(Arc::new(engine), cfg.auth_token.clone());

    let addr = cfg.bind_addr;
    tracing::info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
