/// Bolao Pool Ledger
/// Exports all modules for use as a library crate

pub mod app_state;
pub mod error;
pub mod escrow;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod notifications;
pub mod prizes;
pub mod scoring;
pub mod settlement;
pub mod store;

pub use app_state::{AppState, SharedState};
pub use error::EngineError;

// Re-export from models (wire and domain types)
pub use models::{
    Wallet, Transaction, TxType, TxStatus,
    MatchRecord, MatchStatus,
    Pool, PoolMatch, PoolMatchStatus, PoolStatus, Modality,
    Bet, BetStatus, Prediction, WinnerPick,
    Payment, PaymentKind, Standing,
};

pub use ledger::HistoryFilter;
pub use notifications::{LogSink, NotificationEvent, NotificationKind, NotificationSink, RecordingSink};
pub use prizes::{compute_tiers, min_correct, PrizeTier};
pub use scoring::{score, FULL_POINTS};
pub use settlement::{pool_standings, settle_pool, SettlementReport, SettledWinner};
pub use store::Store;
