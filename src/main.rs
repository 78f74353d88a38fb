// Bolao Pool Ledger - Main Entry Point
// Wallets, pool escrow, scoring and prize settlement over an in-memory ledger

use axum::{
    routing::{get, post, put},
    Router,
};
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use bolao_pool_ledger::app_state::{AppState, SharedState};
use bolao_pool_ledger::handlers::*;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bolao_pool_ledger=info,tower_http=warn".into()),
        )
        .init();

    info!("starting bolao pool ledger");

    // Initialize application state (loads a prior snapshot when one exists)
    let state: SharedState = Arc::new(Mutex::new(AppState::new()));

    // Clone state for shutdown handler before moving into router
    let shutdown_state = state.clone();

    let app = Router::new()
        // ===== WALLET ENDPOINTS =====
        .route("/users", post(create_user))
        .route("/wallet/:user_id/balance", get(get_balance))
        .route("/wallet/:user_id/history", get(get_history))
        .route("/wallet/:user_id/audit", get(audit_wallet))
        .route("/wallet/deposit", post(deposit))
        .route("/wallet/withdraw", post(withdraw))
        // ===== POOL ENDPOINTS =====
        .route("/pools", post(create_pool))
        .route("/pools", get(list_pools))
        .route("/pools/:id", get(get_pool))
        .route("/pools/:id/cancel", post(cancel_pool))
        .route("/pools/:id/settle", post(settle_pool))
        .route("/pools/:id/standings", get(pool_standings))
        .route("/pools/:id/payments", get(pool_payments))
        // ===== BETTING ENDPOINTS =====
        .route("/bets", post(place_bet))
        .route("/bets/:id/cancel", post(cancel_bet))
        // ===== MATCH INGESTION =====
        .route("/matches/:id", put(put_match))
        // ===== HEALTH CHECK =====
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let addr: SocketAddr = match bind_addr.parse() {
        Ok(a) => a,
        Err(e) => {
            error!("invalid BIND_ADDR {:?}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("listening on http://{}", addr);

    // Save the ledger snapshot on CTRL+C, then exit
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("failed to install CTRL+C handler, state will not be saved");
            return;
        }

        info!("shutdown signal received, saving state");
        if let Ok(app_state) = shutdown_state.lock() {
            match app_state.save_to_disk() {
                Ok(()) => info!("state saved"),
                Err(e) => error!("failed to save state: {}", e),
            }
        }
        std::process::exit(0);
    });

    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {}", e);
    }
}

async fn health_check() -> &'static str {
    "bolao pool ledger - online"
}
