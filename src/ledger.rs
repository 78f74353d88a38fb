// Wallet Ledger
//
// Append-only transaction log plus a materialized balance per wallet; the
// single source of truth for all money movement. `record` is the only write
// path: one COMPLETED transaction row and one balance mutation per call,
// inside the caller's unit of work. The reconciliation invariant is
// balance == Σ(amount of COMPLETED transactions), checked by `audit_wallet`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{
    AuditResponse, BalanceResponse, Pagination, Transaction, TransactionPage, TxStatus, TxType,
};
use crate::store::Store;

/// Optional filters for `history`. Defaults: first page, 10 per page, all
/// types, no date bounds.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct HistoryFilter {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub tx_type: Option<TxType>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

/// Record a money movement against a wallet.
///
/// `amount` is a magnitude; the sign of the stored entry and the balance
/// effect are derived from `tx_type`:
///
/// | type     | balance    | counter              |
/// |----------|------------|----------------------|
/// | DEPOSIT  | +amount    | total_deposit += a   |
/// | WITHDRAW | -amount    | total_withdraw += a  |
/// | STAKE    | -amount    |                      |
/// | PRIZE    | +amount    |                      |
/// | REFUND   | +amount    |                      |
///
/// Debit types fail with `InsufficientFunds` before any mutation, so the
/// balance can never go negative.
pub fn record(
    store: &mut Store,
    wallet_id: &str,
    tx_type: TxType,
    amount: Decimal,
    description: &str,
) -> Result<Transaction, EngineError> {
    if amount <= Decimal::ZERO {
        return Err(EngineError::InvalidAmount(format!(
            "transaction amount must be positive, got {}",
            amount
        )));
    }

    let wallet = store.wallet(wallet_id)?;
    if tx_type.is_debit() && wallet.balance < amount {
        return Err(EngineError::InsufficientFunds {
            available: wallet.balance,
            requested: amount,
        });
    }

    let signed_amount = if tx_type.is_debit() { -amount } else { amount };
    let tx = Transaction {
        id: Uuid::new_v4().to_string(),
        wallet_id: wallet_id.to_string(),
        tx_type,
        amount: signed_amount,
        status: TxStatus::Completed,
        description: description.to_string(),
        created_at: Utc::now(),
    };

    let wallet = store.wallet_mut(wallet_id)?;
    wallet.balance += signed_amount;
    match tx_type {
        TxType::Deposit => wallet.total_deposit += amount,
        TxType::Withdraw => wallet.total_withdraw += amount,
        TxType::Stake | TxType::Prize | TxType::Refund => {}
    }
    let new_balance = wallet.balance;
    store.transactions.push(tx.clone());

    info!(
        wallet = wallet_id,
        tx_type = ?tx_type,
        amount = %signed_amount,
        balance = %new_balance,
        "Ledger entry recorded"
    );
    Ok(tx)
}

/// Deposit by user id (wallet resolved internally). A standalone atomic unit.
pub fn deposit(
    store: &mut Store,
    user_id: &str,
    amount: Decimal,
    description: &str,
) -> Result<Transaction, EngineError> {
    let wallet_id = store.wallet_for_user(user_id)?.id.clone();
    store.transaction(|s| record(s, &wallet_id, TxType::Deposit, amount, description))
}

/// Withdraw by user id. Fails with `InsufficientFunds` without side effects.
pub fn withdraw(
    store: &mut Store,
    user_id: &str,
    amount: Decimal,
    description: &str,
) -> Result<Transaction, EngineError> {
    let wallet_id = store.wallet_for_user(user_id)?.id.clone();
    store.transaction(|s| record(s, &wallet_id, TxType::Withdraw, amount, description))
}

/// Pure read: materialized balance plus audit counters.
pub fn get_balance(store: &Store, user_id: &str) -> Result<BalanceResponse, EngineError> {
    let wallet = store.wallet_for_user(user_id)?;
    Ok(BalanceResponse {
        user_id: user_id.to_string(),
        wallet_id: wallet.id.clone(),
        balance: wallet.balance,
        total_deposit: wallet.total_deposit,
        total_withdraw: wallet.total_withdraw,
    })
}

/// Pure read: paginated history, newest first, with optional type and
/// date-range filters.
pub fn history(
    store: &Store,
    user_id: &str,
    filter: &HistoryFilter,
) -> Result<TransactionPage, EngineError> {
    let wallet_id = store.wallet_for_user(user_id)?.id.clone();

    let page = filter.page.unwrap_or(1).max(1);
    let per_page = filter.limit.unwrap_or(10).max(1);

    let mut matching: Vec<Transaction> = store
        .transactions
        .iter()
        .filter(|tx| tx.wallet_id == wallet_id)
        .filter(|tx| filter.tx_type.map_or(true, |t| tx.tx_type == t))
        .filter(|tx| filter.start_date.map_or(true, |d| tx.created_at >= d))
        .filter(|tx| filter.end_date.map_or(true, |d| tx.created_at <= d))
        .cloned()
        .collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total = matching.len();
    let pages = total.div_ceil(per_page);
    let transactions = matching
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Ok(TransactionPage {
        transactions,
        pagination: Pagination {
            total,
            pages,
            current_page: page,
            per_page,
        },
    })
}

/// Conservation check: recompute the balance from the COMPLETED entries and
/// compare to the materialized value.
pub fn audit_wallet(store: &Store, wallet_id: &str) -> Result<AuditResponse, EngineError> {
    let wallet = store.wallet(wallet_id)?;
    let ledger_sum: Decimal = store
        .transactions
        .iter()
        .filter(|tx| tx.wallet_id == wallet_id && tx.status == TxStatus::Completed)
        .map(|tx| tx.amount)
        .sum();
    Ok(AuditResponse {
        wallet_id: wallet_id.to_string(),
        balance: wallet.balance,
        ledger_sum,
        consistent: wallet.balance == ledger_sum,
    })
}
