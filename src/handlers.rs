// HTTP request handlers: thin adapters from JSON to the engine operations.
// Each handler takes the state lock for the whole operation, which makes the
// engine's unit of work a serializable boundary.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use crate::app_state::SharedState;
use crate::error::EngineError;
use crate::escrow;
use crate::ledger::{self, HistoryFilter};
use crate::models::*;
use crate::settlement;
use crate::store::Store;

type ApiError = (StatusCode, Json<Value>);

fn engine_error(err: EngineError) -> ApiError {
    (err.status_code(), Json(json!({ "error": err.to_string() })))
}

fn locked(state: &SharedState) -> Result<std::sync::MutexGuard<'_, crate::app_state::AppState>, ApiError> {
    state.lock().map_err(|_| {
        engine_error(EngineError::Unavailable("state lock poisoned".into()))
    })
}

// ===== USERS & WALLETS =====

pub async fn create_user(
    State(state): State<SharedState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut app = locked(&state)?;
    let wallet = app
        .store
        .transaction(|s: &mut Store| {
            let wallet = s.create_wallet(&req.user_id)?;
            if let Some(opening) = req.opening_deposit {
                ledger::record(s, &wallet.id, TxType::Deposit, opening, "Opening deposit")?;
            }
            Ok(wallet)
        })
        .map_err(engine_error)?;
    let wallet = app.store.wallet(&wallet.id).map_err(engine_error)?;
    Ok(Json(json!({ "user_id": req.user_id, "wallet": wallet })))
}

pub async fn get_balance(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let app = locked(&state)?;
    ledger::get_balance(&app.store, &user_id)
        .map(Json)
        .map_err(engine_error)
}

pub async fn get_history(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    Query(filter): Query<HistoryFilter>,
) -> Result<Json<TransactionPage>, ApiError> {
    let app = locked(&state)?;
    ledger::history(&app.store, &user_id, &filter)
        .map(Json)
        .map_err(engine_error)
}

pub async fn audit_wallet(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<AuditResponse>, ApiError> {
    let app = locked(&state)?;
    let wallet_id = app
        .store
        .wallet_for_user(&user_id)
        .map_err(engine_error)?
        .id
        .clone();
    ledger::audit_wallet(&app.store, &wallet_id)
        .map(Json)
        .map_err(engine_error)
}

pub async fn deposit(
    State(state): State<SharedState>,
    Json(req): Json<MoneyRequest>,
) -> Result<Json<Transaction>, ApiError> {
    let mut app = locked(&state)?;
    let description = req.description.as_deref().unwrap_or("Deposit");
    ledger::deposit(&mut app.store, &req.user_id, req.amount, description)
        .map(Json)
        .map_err(engine_error)
}

pub async fn withdraw(
    State(state): State<SharedState>,
    Json(req): Json<MoneyRequest>,
) -> Result<Json<Transaction>, ApiError> {
    let mut app = locked(&state)?;
    let description = req.description.as_deref().unwrap_or("Withdrawal");
    ledger::withdraw(&mut app.store, &req.user_id, req.amount, description)
        .map(Json)
        .map_err(engine_error)
}

// ===== POOLS =====

pub async fn create_pool(
    State(state): State<SharedState>,
    Json(req): Json<CreatePoolRequest>,
) -> Result<Json<Pool>, ApiError> {
    let mut app = locked(&state)?;
    escrow::create_pool(
        &mut app.store,
        &req.title,
        &req.description,
        req.entry_fee,
        req.max_players,
        req.modality,
        &req.match_ids,
    )
    .map(Json)
    .map_err(engine_error)
}

pub async fn list_pools(State(state): State<SharedState>) -> Result<Json<Vec<Pool>>, ApiError> {
    let app = locked(&state)?;
    let mut pools: Vec<Pool> = app.store.pools.values().cloned().collect();
    pools.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(pools))
}

pub async fn get_pool(
    State(state): State<SharedState>,
    Path(pool_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let app = locked(&state)?;
    let pool = app.store.pool(&pool_id).map_err(engine_error)?;
    let matches = app.store.pool_matches(&pool_id);
    Ok(Json(json!({ "pool": pool, "matches": matches })))
}

pub async fn cancel_pool(
    State(state): State<SharedState>,
    Path(pool_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut app = locked(&state)?;
    let refunded = escrow::cancel_pool(&mut app.store, &pool_id).map_err(engine_error)?;
    Ok(Json(json!({ "pool_id": pool_id, "refunded_bets": refunded })))
}

pub async fn settle_pool(
    State(state): State<SharedState>,
    Path(pool_id): Path<String>,
) -> Result<Json<settlement::SettlementReport>, ApiError> {
    let mut app = locked(&state)?;
    let (report, events) =
        settlement::settle_pool(&mut app.store, &pool_id).map_err(engine_error)?;
    // The monetary transaction has committed; notification delivery is
    // fire-and-forget from here.
    app.emit(events);
    Ok(Json(report))
}

pub async fn pool_standings(
    State(state): State<SharedState>,
    Path(pool_id): Path<String>,
) -> Result<Json<Vec<Standing>>, ApiError> {
    let app = locked(&state)?;
    settlement::pool_standings(&app.store, &pool_id)
        .map(Json)
        .map_err(engine_error)
}

pub async fn pool_payments(
    State(state): State<SharedState>,
    Path(pool_id): Path<String>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let app = locked(&state)?;
    app.store.pool(&pool_id).map_err(engine_error)?;
    let payments: Vec<Payment> = app
        .store
        .payments_for_pool(&pool_id)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(payments))
}

// ===== BETS =====

pub async fn place_bet(
    State(state): State<SharedState>,
    Json(req): Json<PlaceBetRequest>,
) -> Result<Json<Bet>, ApiError> {
    let mut app = locked(&state)?;
    let (bet, event) = escrow::place_bet(
        &mut app.store,
        &req.user_id,
        &req.pool_id,
        &req.match_id,
        req.prediction,
    )
    .map_err(engine_error)?;
    app.emit([event]);
    Ok(Json(bet))
}

pub async fn cancel_bet(
    State(state): State<SharedState>,
    Path(bet_id): Path<String>,
    Json(req): Json<CancelBetRequest>,
) -> Result<Json<Bet>, ApiError> {
    let mut app = locked(&state)?;
    escrow::cancel_bet(&mut app.store, &bet_id, &req.user_id)
        .map(Json)
        .map_err(engine_error)
}

// ===== MATCH SNAPSHOTS (provider ingestion) =====

pub async fn put_match(
    State(state): State<SharedState>,
    Path(match_id): Path<String>,
    Json(req): Json<MatchSnapshotRequest>,
) -> Result<Json<MatchRecord>, ApiError> {
    let mut app = locked(&state)?;
    let snapshot = MatchRecord {
        id: match_id,
        home_team_id: req.home_team_id,
        away_team_id: req.away_team_id,
        home_score: req.home_score,
        away_score: req.away_score,
        status: req.status,
        is_finished: req.is_finished,
    };
    app.store
        .put_match(snapshot.clone())
        .map_err(engine_error)?;
    Ok(Json(snapshot))
}
