// In-memory storage handle with unit-of-work transactions.
//
// The store is passed explicitly to every component (no process-wide
// singleton). A multi-step monetary operation runs inside `transaction`,
// which snapshots the store and restores it when the closure fails, so no
// partial writes ever become observable. Serializability comes from
// exclusive access: the server keeps the store behind `Arc<Mutex<AppState>>`
// and every operation takes the lock for its whole boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{Bet, MatchRecord, Payment, Pool, PoolMatch, Transaction, Wallet};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Store {
    /// Wallets by wallet id.
    pub wallets: HashMap<String, Wallet>,
    /// user id -> wallet id (wallet created atomically with the user).
    pub wallet_by_user: HashMap<String, String>,
    /// Append-only ledger, insertion order == chronological order.
    pub transactions: Vec<Transaction>,
    pub pools: HashMap<String, Pool>,
    /// Pool-match associations by pool id.
    pub pool_matches: HashMap<String, Vec<PoolMatch>>,
    /// Provider match snapshots by match id.
    pub matches: HashMap<String, MatchRecord>,
    pub bets: HashMap<String, Bet>,
    pub payments: Vec<Payment>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit of work: commits the closure's writes on `Ok`, restores the
    /// pre-image on `Err`. Nested calls are harmless (the outermost snapshot
    /// wins).
    pub fn transaction<T>(
        &mut self,
        f: impl FnOnce(&mut Store) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let snapshot = self.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Wallets
    // ------------------------------------------------------------------

    /// Create a user's wallet. Exactly one wallet per user.
    pub fn create_wallet(&mut self, user_id: &str) -> Result<Wallet, EngineError> {
        if self.wallet_by_user.contains_key(user_id) {
            return Err(EngineError::AlreadyExists(format!(
                "user {} already has a wallet",
                user_id
            )));
        }
        let wallet = Wallet::new(user_id);
        self.wallet_by_user.insert(user_id.to_string(), wallet.id.clone());
        self.wallets.insert(wallet.id.clone(), wallet.clone());
        Ok(wallet)
    }

    pub fn wallet(&self, wallet_id: &str) -> Result<&Wallet, EngineError> {
        self.wallets
            .get(wallet_id)
            .ok_or_else(|| EngineError::NotFound(format!("wallet {}", wallet_id)))
    }

    pub fn wallet_mut(&mut self, wallet_id: &str) -> Result<&mut Wallet, EngineError> {
        self.wallets
            .get_mut(wallet_id)
            .ok_or_else(|| EngineError::NotFound(format!("wallet {}", wallet_id)))
    }

    pub fn wallet_for_user(&self, user_id: &str) -> Result<&Wallet, EngineError> {
        let wallet_id = self
            .wallet_by_user
            .get(user_id)
            .ok_or_else(|| EngineError::NotFound(format!("wallet for user {}", user_id)))?;
        self.wallet(wallet_id)
    }

    // ------------------------------------------------------------------
    // Pools & matches
    // ------------------------------------------------------------------

    pub fn pool(&self, pool_id: &str) -> Result<&Pool, EngineError> {
        self.pools
            .get(pool_id)
            .ok_or_else(|| EngineError::NotFound(format!("pool {}", pool_id)))
    }

    pub fn pool_mut(&mut self, pool_id: &str) -> Result<&mut Pool, EngineError> {
        self.pools
            .get_mut(pool_id)
            .ok_or_else(|| EngineError::NotFound(format!("pool {}", pool_id)))
    }

    pub fn pool_matches(&self, pool_id: &str) -> &[PoolMatch] {
        self.pool_matches
            .get(pool_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn match_record(&self, match_id: &str) -> Result<&MatchRecord, EngineError> {
        self.matches
            .get(match_id)
            .ok_or_else(|| EngineError::NotFound(format!("match {}", match_id)))
    }

    /// Ingest a provider snapshot. Finished matches are immutable.
    pub fn put_match(&mut self, snapshot: MatchRecord) -> Result<(), EngineError> {
        if let Some(existing) = self.matches.get(&snapshot.id) {
            if existing.is_finished {
                return Err(EngineError::AlreadyExists(format!(
                    "match {} already finished, snapshot is immutable",
                    snapshot.id
                )));
            }
        }
        self.matches.insert(snapshot.id.clone(), snapshot);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bets
    // ------------------------------------------------------------------

    pub fn bet(&self, bet_id: &str) -> Result<&Bet, EngineError> {
        self.bets
            .get(bet_id)
            .ok_or_else(|| EngineError::NotFound(format!("bet {}", bet_id)))
    }

    pub fn bet_mut(&mut self, bet_id: &str) -> Result<&mut Bet, EngineError> {
        self.bets
            .get_mut(bet_id)
            .ok_or_else(|| EngineError::NotFound(format!("bet {}", bet_id)))
    }

    pub fn bets_for_pool(&self, pool_id: &str) -> Vec<&Bet> {
        self.bets.values().filter(|b| b.pool_id == pool_id).collect()
    }

    /// Active (non-cancelled) bet for a (user, pool, match) slot, if one exists.
    pub fn active_bet(&self, user_id: &str, pool_id: &str, match_id: &str) -> Option<&Bet> {
        self.bets.values().find(|b| {
            b.user_id == user_id
                && b.pool_id == pool_id
                && b.match_id == match_id
                && b.status.is_active()
        })
    }

    /// Distinct users holding an active bet in the pool.
    pub fn active_players(&self, pool_id: &str) -> Vec<String> {
        let mut players: Vec<String> = self
            .bets
            .values()
            .filter(|b| b.pool_id == pool_id && b.status.is_active())
            .map(|b| b.user_id.clone())
            .collect();
        players.sort();
        players.dedup();
        players
    }

    pub fn payments_for_pool(&self, pool_id: &str) -> Vec<&Payment> {
        self.payments.iter().filter(|p| p.pool_id == pool_id).collect()
    }
}
