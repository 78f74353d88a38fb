// Data models for the bolão wagering pool engine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

// ============================================================================
// WALLET & LEDGER
// ============================================================================

/// One wallet per user, created atomically with the user. The balance is
/// materialized; the append-only transaction log is the source of truth and
/// the two must always reconcile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: String,
    pub user_id: String,
    pub balance: Decimal,
    pub total_deposit: Decimal,
    pub total_withdraw: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(user_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            balance: Decimal::ZERO,
            total_deposit: Decimal::ZERO,
            total_withdraw: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxType {
    Deposit,
    Withdraw,
    Stake,
    Prize,
    Refund,
}

impl TxType {
    /// Debit types reduce the balance and require sufficient funds up front.
    pub fn is_debit(&self) -> bool {
        matches!(self, TxType::Withdraw | TxType::Stake)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    Pending,
    Completed,
    Failed,
}

/// Immutable ledger entry. `amount` carries the sign derived from the type
/// (DEPOSIT/PRIZE/REFUND positive, WITHDRAW/STAKE negative); callers always
/// pass magnitudes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub wallet_id: String,
    pub tx_type: TxType,
    pub amount: Decimal,
    pub status: TxStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// MATCHES (provider snapshots, read-only to the core)
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
}

/// Snapshot of a match as reported by the external match provider. Once
/// `is_finished` is true the snapshot is immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub status: MatchStatus,
    pub is_finished: bool,
}

impl MatchRecord {
    pub fn has_started(&self) -> bool {
        self.status != MatchStatus::Scheduled
    }

    /// Final score, present only for finished matches.
    pub fn final_score(&self) -> Option<(u32, u32)> {
        if !self.is_finished {
            return None;
        }
        match (self.home_score, self.away_score) {
            (Some(h), Some(a)) => Some((h, a)),
            _ => None,
        }
    }
}

// ============================================================================
// POOLS
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modality {
    Winner,
    ExactScore,
    TotalGoals,
    BothScore,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolStatus {
    Active,
    /// Exclusive settlement marker; bets and cancellations are rejected
    /// while a pool sits here.
    Settling,
    Closed,
    Finished,
    Cancelled,
}

/// A wagering pool ("bolão"): fixed entry fee per stake, accumulated prize
/// pool, one prediction modality across all of its matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub id: String,
    pub title: String,
    pub description: String,
    pub entry_fee: Decimal,
    pub max_players: Option<u32>,
    pub prize_pool: Decimal,
    pub modality: Modality,
    pub status: PoolStatus,
    pub created_at: DateTime<Utc>,
}

impl Pool {
    pub fn new(
        title: &str,
        description: &str,
        entry_fee: Decimal,
        max_players: Option<u32>,
        modality: Modality,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: description.to_string(),
            entry_fee,
            max_players,
            prize_pool: Decimal::ZERO,
            modality,
            status: PoolStatus::Active,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolMatchStatus {
    Open,
    Closed,
}

/// Links a pool to a match, with its own betting window independent of the
/// match lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolMatch {
    pub id: String,
    pub pool_id: String,
    pub match_id: String,
    pub status: PoolMatchStatus,
}

impl PoolMatch {
    pub fn new(pool_id: &str, match_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            pool_id: pool_id.to_string(),
            match_id: match_id.to_string(),
            status: PoolMatchStatus::Open,
        }
    }
}

// ============================================================================
// BETS & PREDICTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WinnerPick {
    Home,
    Away,
    Draw,
}

/// Prediction payload, one shape per modality. The tag mirrors the pool
/// modality so a payload can be checked against the pool it targets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "modality", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Prediction {
    Winner { winner: WinnerPick },
    ExactScore { home_score: u32, away_score: u32 },
    TotalGoals { total_goals: u32 },
    BothScore { both_score: bool },
}

impl Prediction {
    pub fn modality(&self) -> Modality {
        match self {
            Prediction::Winner { .. } => Modality::Winner,
            Prediction::ExactScore { .. } => Modality::ExactScore,
            Prediction::TotalGoals { .. } => Modality::TotalGoals,
            Prediction::BothScore { .. } => Modality::BothScore,
        }
    }

    /// Structural validation against the pool's modality. Shape errors inside
    /// a variant (negative scores, missing fields) are already impossible by
    /// construction; the remaining failure mode is a modality mismatch.
    pub fn validate(&self, pool_modality: Modality) -> Result<(), EngineError> {
        if self.modality() != pool_modality {
            return Err(EngineError::InvalidPrediction(format!(
                "prediction is {:?} but pool modality is {:?}",
                self.modality(),
                pool_modality
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Cancelled,
    Refunded,
}

impl BetStatus {
    /// Cancelled and refunded bets release the (user, pool, match) slot.
    pub fn is_active(&self) -> bool {
        !matches!(self, BetStatus::Cancelled | BetStatus::Refunded)
    }
}

/// One user's stake on one match within one pool. Mutated only at settlement
/// (status + points) or cancellation (status).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: String,
    pub user_id: String,
    pub pool_id: String,
    pub match_id: String,
    pub amount: Decimal,
    pub prediction: Prediction,
    pub status: BetStatus,
    pub points: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl Bet {
    pub fn new(
        user_id: &str,
        pool_id: &str,
        match_id: &str,
        amount: Decimal,
        prediction: Prediction,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            pool_id: pool_id.to_string(),
            match_id: match_id.to_string(),
            amount,
            prediction,
            status: BetStatus::Pending,
            points: None,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// PAYMENTS (audit trail, never the source of truth for balances)
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    EntryFee,
    Prize,
}

/// Audit record of a monetary event tied to a pool, written in lock-step
/// with the corresponding ledger transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    pub pool_id: String,
    pub amount: Decimal,
    pub kind: PaymentKind,
    pub description: String,
    pub processed_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        user_id: &str,
        pool_id: &str,
        amount: Decimal,
        kind: PaymentKind,
        description: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            pool_id: pool_id.to_string(),
            amount,
            kind,
            description: description.to_string(),
            processed_at: Utc::now(),
        }
    }
}

// ============================================================================
// STANDINGS
// ============================================================================

/// Ranked pool participant, usable before or after settlement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Standing {
    pub position: u32,
    pub user_id: String,
    pub correct_predictions: u32,
    pub points: u32,
    pub total_bets: u32,
}

// ============================================================================
// REQUEST / RESPONSE STRUCTS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub user_id: String,
    /// Optional opening deposit, recorded as a DEPOSIT ledger entry.
    #[serde(default)]
    pub opening_deposit: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct MoneyRequest {
    pub user_id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePoolRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub entry_fee: Decimal,
    #[serde(default)]
    pub max_players: Option<u32>,
    pub modality: Modality,
    pub match_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceBetRequest {
    pub user_id: String,
    pub pool_id: String,
    pub match_id: String,
    pub prediction: Prediction,
}

#[derive(Debug, Deserialize)]
pub struct CancelBetRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MatchSnapshotRequest {
    pub home_team_id: String,
    pub away_team_id: String,
    #[serde(default)]
    pub home_score: Option<u32>,
    #[serde(default)]
    pub away_score: Option<u32>,
    pub status: MatchStatus,
    pub is_finished: bool,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub user_id: String,
    pub wallet_id: String,
    pub balance: Decimal,
    pub total_deposit: Decimal,
    pub total_withdraw: Decimal,
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub wallet_id: String,
    pub balance: Decimal,
    pub ledger_sum: Decimal,
    pub consistent: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub total: usize,
    pub pages: usize,
    pub current_page: usize,
    pub per_page: usize,
}

#[derive(Debug, Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_modality_mismatch() {
        let p = Prediction::ExactScore { home_score: 2, away_score: 1 };
        assert!(p.validate(Modality::ExactScore).is_ok());
        assert!(matches!(
            p.validate(Modality::Winner),
            Err(EngineError::InvalidPrediction(_))
        ));
    }

    #[test]
    fn test_prediction_wire_shape() {
        let json = r#"{"modality":"EXACT_SCORE","home_score":3,"away_score":0}"#;
        let p: Prediction = serde_json::from_str(json).unwrap();
        assert_eq!(p, Prediction::ExactScore { home_score: 3, away_score: 0 });

        let json = r#"{"modality":"WINNER","winner":"DRAW"}"#;
        let p: Prediction = serde_json::from_str(json).unwrap();
        assert_eq!(p, Prediction::Winner { winner: WinnerPick::Draw });
    }

    #[test]
    fn test_negative_score_rejected_at_parse() {
        let json = r#"{"modality":"EXACT_SCORE","home_score":-1,"away_score":0}"#;
        assert!(serde_json::from_str::<Prediction>(json).is_err());
    }

    #[test]
    fn test_bet_status_active() {
        assert!(BetStatus::Pending.is_active());
        assert!(BetStatus::Won.is_active());
        assert!(!BetStatus::Cancelled.is_active());
        assert!(!BetStatus::Refunded.is_active());
    }

    #[test]
    fn test_match_final_score_requires_finish() {
        let m = MatchRecord {
            id: "m1".into(),
            home_team_id: "t1".into(),
            away_team_id: "t2".into(),
            home_score: Some(1),
            away_score: Some(0),
            status: MatchStatus::Live,
            is_finished: false,
        };
        assert_eq!(m.final_score(), None);
        assert!(m.has_started());
    }
}
