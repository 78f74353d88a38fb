// Error taxonomy for the wagering pool engine.
//
// Every precondition failure maps to one variant; handlers translate the
// variant to an HTTP status. Validation errors are raised before any
// mutation, so a returned error implies no committed side effects.

use axum::http::StatusCode;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    InsufficientFunds { available: Decimal, requested: Decimal },
    InvalidAmount(String),
    PoolNotActive(String),
    PoolAlreadySettled(String),
    PoolFull(String),
    MatchesNotFinished(String),
    DuplicateBet(String),
    BetNotCancellable(String),
    InvalidPrediction(String),
    MatchNotFinished(String),
    NotFound(String),
    AlreadyExists(String),
    /// Storage-level failure; no partial state was committed, safe to retry.
    Unavailable(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InsufficientFunds { available, requested } => {
                write!(f, "Insufficient funds: have {}, need {}", available, requested)
            }
            EngineError::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),
            EngineError::PoolNotActive(msg) => write!(f, "Pool not active: {}", msg),
            EngineError::PoolAlreadySettled(msg) => write!(f, "Pool already settled: {}", msg),
            EngineError::PoolFull(msg) => write!(f, "Pool full: {}", msg),
            EngineError::MatchesNotFinished(msg) => write!(f, "Matches not finished: {}", msg),
            EngineError::DuplicateBet(msg) => write!(f, "Duplicate bet: {}", msg),
            EngineError::BetNotCancellable(msg) => write!(f, "Bet not cancellable: {}", msg),
            EngineError::InvalidPrediction(msg) => write!(f, "Invalid prediction: {}", msg),
            EngineError::MatchNotFinished(msg) => write!(f, "Match not finished: {}", msg),
            EngineError::NotFound(msg) => write!(f, "Not found: {}", msg),
            EngineError::AlreadyExists(msg) => write!(f, "Already exists: {}", msg),
            EngineError::Unavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl EngineError {
    /// HTTP status for the thin handler layer.
    pub fn status_code(&self) -> StatusCode {
        match self {
            EngineError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            EngineError::PoolNotActive(_)
            | EngineError::PoolAlreadySettled(_)
            | EngineError::PoolFull(_)
            | EngineError::MatchesNotFinished(_)
            | EngineError::BetNotCancellable(_)
            | EngineError::MatchNotFinished(_) => StatusCode::CONFLICT,
            EngineError::DuplicateBet(_) | EngineError::AlreadyExists(_) => StatusCode::CONFLICT,
            EngineError::InvalidPrediction(_) | EngineError::InvalidAmount(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
