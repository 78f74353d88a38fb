// Bet Escrow & Pool Accounting
//
// Converts a stake placement into a wallet debit and a pool prize-pool
// credit as one atomic unit, and reverses it on cancellation. All
// preconditions are checked before any mutation; the unit of work rolls
// everything back if a later step fails.

use rust_decimal::Decimal;
use tracing::info;

use crate::error::EngineError;
use crate::ledger;
use crate::models::{
    Bet, BetStatus, Payment, PaymentKind, Pool, PoolMatchStatus, PoolStatus, Prediction, TxType,
};
use crate::notifications::NotificationEvent;
use crate::store::Store;

/// Create a pool together with its match associations.
pub fn create_pool(
    store: &mut Store,
    title: &str,
    description: &str,
    entry_fee: Decimal,
    max_players: Option<u32>,
    modality: crate::models::Modality,
    match_ids: &[String],
) -> Result<Pool, EngineError> {
    if entry_fee <= Decimal::ZERO {
        return Err(EngineError::InvalidAmount(format!(
            "entry fee must be positive, got {}",
            entry_fee
        )));
    }
    if match_ids.is_empty() {
        return Err(EngineError::InvalidAmount(
            "pool requires at least one match".into(),
        ));
    }
    store.transaction(|s| {
        for match_id in match_ids {
            s.match_record(match_id)?;
        }
        let pool = Pool::new(title, description, entry_fee, max_players, modality);
        let associations = match_ids
            .iter()
            .map(|m| crate::models::PoolMatch::new(&pool.id, m))
            .collect();
        s.pool_matches.insert(pool.id.clone(), associations);
        s.pools.insert(pool.id.clone(), pool.clone());
        info!(pool = %pool.id, matches = match_ids.len(), "Pool created");
        Ok(pool)
    })
}

/// Place a stake: validates the pool/match/bet/wallet preconditions, then in
/// one atomic unit creates the bet, debits the entry fee (STAKE), credits
/// the prize pool and writes the ENTRY_FEE payment row. Returns the bet plus
/// the BET_PLACED event for the caller to emit after commit.
pub fn place_bet(
    store: &mut Store,
    user_id: &str,
    pool_id: &str,
    match_id: &str,
    prediction: Prediction,
) -> Result<(Bet, NotificationEvent), EngineError> {
    // Precondition reads. Validation errors return before any mutation.
    let pool = store.pool(pool_id)?;
    if pool.status != PoolStatus::Active {
        return Err(EngineError::PoolNotActive(format!(
            "pool {} is {:?}",
            pool_id, pool.status
        )));
    }
    let entry_fee = pool.entry_fee;
    let modality = pool.modality;
    let max_players = pool.max_players;

    let pool_match = store
        .pool_matches(pool_id)
        .iter()
        .find(|pm| pm.match_id == match_id)
        .ok_or_else(|| {
            EngineError::NotFound(format!("match {} in pool {}", match_id, pool_id))
        })?;
    if pool_match.status != PoolMatchStatus::Open {
        return Err(EngineError::PoolNotActive(format!(
            "betting window closed for match {} in pool {}",
            match_id, pool_id
        )));
    }
    let m = store.match_record(match_id)?;
    if m.has_started() {
        return Err(EngineError::PoolNotActive(format!(
            "match {} has already started",
            match_id
        )));
    }

    if store.active_bet(user_id, pool_id, match_id).is_some() {
        return Err(EngineError::DuplicateBet(format!(
            "user {} already has a bet on match {} in pool {}",
            user_id, match_id, pool_id
        )));
    }

    if let Some(cap) = max_players {
        let players = store.active_players(pool_id);
        let is_new_player = !players.iter().any(|p| p == user_id);
        if is_new_player && players.len() as u32 >= cap {
            return Err(EngineError::PoolFull(format!(
                "pool {} is capped at {} players",
                pool_id, cap
            )));
        }
    }

    prediction.validate(modality)?;

    let wallet_id = store.wallet_for_user(user_id)?.id.clone();

    let bet = store.transaction(|s| {
        let bet = Bet::new(user_id, pool_id, match_id, entry_fee, prediction.clone());
        s.bets.insert(bet.id.clone(), bet.clone());

        ledger::record(
            s,
            &wallet_id,
            TxType::Stake,
            entry_fee,
            &format!("Stake on match {} in pool {}", match_id, pool_id),
        )?;

        s.pool_mut(pool_id)?.prize_pool += entry_fee;

        s.payments.push(Payment::new(
            user_id,
            pool_id,
            entry_fee,
            PaymentKind::EntryFee,
            &format!("Entry fee for match {}", match_id),
        ));

        Ok(bet)
    })?;

    info!(
        user = user_id,
        pool = pool_id,
        bet = %bet.id,
        stake = %entry_fee,
        "Bet placed"
    );
    let event = NotificationEvent::bet_placed(user_id, pool_id, &bet.id, match_id);
    Ok((bet, event))
}

/// Cancel a bet. Allowed only while the bet is PENDING, the match has not
/// started and the pool is not mid-settlement; reverses the stake with a
/// REFUND entry and drains the prize pool by the same amount.
pub fn cancel_bet(store: &mut Store, bet_id: &str, user_id: &str) -> Result<Bet, EngineError> {
    let bet = store.bet(bet_id)?;
    if bet.user_id != user_id {
        return Err(EngineError::NotFound(format!("bet {}", bet_id)));
    }
    if bet.status != BetStatus::Pending {
        return Err(EngineError::BetNotCancellable(format!(
            "bet {} is {:?}",
            bet_id, bet.status
        )));
    }
    let pool_id = bet.pool_id.clone();
    let match_id = bet.match_id.clone();
    let amount = bet.amount;

    let pool = store.pool(&pool_id)?;
    if pool.status != PoolStatus::Active {
        return Err(EngineError::PoolNotActive(format!(
            "pool {} is {:?}",
            pool_id, pool.status
        )));
    }
    if store.match_record(&match_id)?.has_started() {
        return Err(EngineError::BetNotCancellable(format!(
            "match {} has already started",
            match_id
        )));
    }

    let wallet_id = store.wallet_for_user(user_id)?.id.clone();
    let bet_id = bet_id.to_string();

    store.transaction(move |s| {
        ledger::record(
            s,
            &wallet_id,
            TxType::Refund,
            amount,
            &format!("Refund for cancelled bet {}", bet_id),
        )?;
        s.pool_mut(&pool_id)?.prize_pool -= amount;
        let bet = s.bet_mut(&bet_id)?;
        bet.status = BetStatus::Cancelled;
        info!(bet = %bet_id, user = user_id, refund = %amount, "Bet cancelled");
        Ok(bet.clone())
    })
}

/// Cancel an entire pool: refund every active bet exactly once, drain the
/// prize pool to zero and mark the pool CANCELLED.
pub fn cancel_pool(store: &mut Store, pool_id: &str) -> Result<u32, EngineError> {
    let pool = store.pool(pool_id)?;
    match pool.status {
        PoolStatus::Active | PoolStatus::Closed => {}
        status => {
            return Err(EngineError::PoolNotActive(format!(
                "pool {} is {:?}",
                pool_id, status
            )))
        }
    }

    store.transaction(|s| {
        let refundable: Vec<(String, String, Decimal)> = s
            .bets_for_pool(pool_id)
            .into_iter()
            .filter(|b| b.status.is_active())
            .map(|b| (b.id.clone(), b.user_id.clone(), b.amount))
            .collect();

        let mut refunded = 0u32;
        for (bet_id, user_id, amount) in refundable {
            let wallet_id = s.wallet_for_user(&user_id)?.id.clone();
            ledger::record(
                s,
                &wallet_id,
                TxType::Refund,
                amount,
                &format!("Refund: pool {} cancelled", pool_id),
            )?;
            let pool = s.pool_mut(pool_id)?;
            pool.prize_pool -= amount;
            s.bet_mut(&bet_id)?.status = BetStatus::Refunded;
            refunded += 1;
        }

        let pool = s.pool_mut(pool_id)?;
        pool.status = PoolStatus::Cancelled;
        info!(pool = pool_id, refunded, "Pool cancelled");
        Ok(refunded)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchRecord, MatchStatus, Modality, WinnerPick};
    use rust_decimal_macros::dec;

    fn scheduled_match(id: &str) -> MatchRecord {
        MatchRecord {
            id: id.into(),
            home_team_id: format!("{}_home", id),
            away_team_id: format!("{}_away", id),
            home_score: None,
            away_score: None,
            status: MatchStatus::Scheduled,
            is_finished: false,
        }
    }

    fn setup(balance: Decimal) -> (Store, String) {
        let mut store = Store::new();
        let wallet = store.create_wallet("u1").unwrap();
        ledger::record(&mut store, &wallet.id, TxType::Deposit, balance, "seed").unwrap();
        store.put_match(scheduled_match("m1")).unwrap();
        store.put_match(scheduled_match("m2")).unwrap();
        let pool = create_pool(
            &mut store,
            "Rodada 1",
            "",
            dec!(100),
            None,
            Modality::Winner,
            &["m1".into(), "m2".into()],
        )
        .unwrap();
        (store, pool.id)
    }

    fn home_pick() -> Prediction {
        Prediction::Winner { winner: WinnerPick::Home }
    }

    #[test]
    fn test_place_bet_moves_stake_into_prize_pool() {
        let (mut store, pool_id) = setup(dec!(1000));
        let (bet, _) = place_bet(&mut store, "u1", &pool_id, "m1", home_pick()).unwrap();

        assert_eq!(bet.amount, dec!(100));
        assert_eq!(store.wallet_for_user("u1").unwrap().balance, dec!(900));
        assert_eq!(store.pool(&pool_id).unwrap().prize_pool, dec!(100));
        assert_eq!(store.payments_for_pool(&pool_id).len(), 1);
        assert_eq!(store.payments_for_pool(&pool_id)[0].kind, PaymentKind::EntryFee);
    }

    #[test]
    fn test_insufficient_funds_leaves_no_trace() {
        let (mut store, pool_id) = setup(dec!(50));
        let err = place_bet(&mut store, "u1", &pool_id, "m1", home_pick()).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds { .. }));

        assert!(store.bets.is_empty());
        assert_eq!(store.pool(&pool_id).unwrap().prize_pool, Decimal::ZERO);
        assert_eq!(store.wallet_for_user("u1").unwrap().balance, dec!(50));
        assert_eq!(store.transactions.len(), 1); // seed deposit only
    }

    #[test]
    fn test_duplicate_bet_rejected() {
        let (mut store, pool_id) = setup(dec!(1000));
        place_bet(&mut store, "u1", &pool_id, "m1", home_pick()).unwrap();
        let err = place_bet(&mut store, "u1", &pool_id, "m1", home_pick()).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateBet(_)));
        // A bet on the other match is fine.
        assert!(place_bet(&mut store, "u1", &pool_id, "m2", home_pick()).is_ok());
    }

    #[test]
    fn test_rebet_allowed_after_cancellation() {
        let (mut store, pool_id) = setup(dec!(1000));
        let (bet, _) = place_bet(&mut store, "u1", &pool_id, "m1", home_pick()).unwrap();
        cancel_bet(&mut store, &bet.id, "u1").unwrap();
        assert!(place_bet(&mut store, "u1", &pool_id, "m1", home_pick()).is_ok());
    }

    #[test]
    fn test_modality_mismatch_rejected() {
        let (mut store, pool_id) = setup(dec!(1000));
        let wrong = Prediction::ExactScore { home_score: 1, away_score: 0 };
        let err = place_bet(&mut store, "u1", &pool_id, "m1", wrong).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPrediction(_)));
    }

    #[test]
    fn test_started_match_rejected() {
        let (mut store, pool_id) = setup(dec!(1000));
        let mut live = scheduled_match("m1");
        live.status = MatchStatus::Live;
        store.matches.insert("m1".into(), live);
        let err = place_bet(&mut store, "u1", &pool_id, "m1", home_pick()).unwrap_err();
        assert!(matches!(err, EngineError::PoolNotActive(_)));
    }

    #[test]
    fn test_max_players_cap() {
        let mut store = Store::new();
        for user in ["u1", "u2", "u3"] {
            let w = store.create_wallet(user).unwrap();
            ledger::record(&mut store, &w.id, TxType::Deposit, dec!(500), "seed").unwrap();
        }
        store.put_match(scheduled_match("m1")).unwrap();
        let pool = create_pool(
            &mut store,
            "Capped",
            "",
            dec!(10),
            Some(2),
            Modality::Winner,
            &["m1".into()],
        )
        .unwrap();

        place_bet(&mut store, "u1", &pool.id, "m1", home_pick()).unwrap();
        place_bet(&mut store, "u2", &pool.id, "m1", home_pick()).unwrap();
        let err = place_bet(&mut store, "u3", &pool.id, "m1", home_pick()).unwrap_err();
        assert!(matches!(err, EngineError::PoolFull(_)));
    }

    #[test]
    fn test_cancel_bet_restores_balances() {
        let (mut store, pool_id) = setup(dec!(1000));
        let (bet, _) = place_bet(&mut store, "u1", &pool_id, "m1", home_pick()).unwrap();

        let cancelled = cancel_bet(&mut store, &bet.id, "u1").unwrap();
        assert_eq!(cancelled.status, BetStatus::Cancelled);
        assert_eq!(store.wallet_for_user("u1").unwrap().balance, dec!(1000));
        assert_eq!(store.pool(&pool_id).unwrap().prize_pool, Decimal::ZERO);

        let wallet_id = store.wallet_for_user("u1").unwrap().id.clone();
        assert!(ledger::audit_wallet(&store, &wallet_id).unwrap().consistent);
    }

    #[test]
    fn test_cancel_after_kickoff_rejected() {
        let (mut store, pool_id) = setup(dec!(1000));
        let (bet, _) = place_bet(&mut store, "u1", &pool_id, "m1", home_pick()).unwrap();

        let mut live = scheduled_match("m1");
        live.status = MatchStatus::Live;
        store.matches.insert("m1".into(), live);

        let err = cancel_bet(&mut store, &bet.id, "u1").unwrap_err();
        assert!(matches!(err, EngineError::BetNotCancellable(_)));
    }

    #[test]
    fn test_cancel_requires_owner() {
        let (mut store, pool_id) = setup(dec!(1000));
        let (bet, _) = place_bet(&mut store, "u1", &pool_id, "m1", home_pick()).unwrap();
        assert!(matches!(
            cancel_bet(&mut store, &bet.id, "intruder"),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_cancel_pool_refunds_everyone_once() {
        let mut store = Store::new();
        for user in ["u1", "u2"] {
            let w = store.create_wallet(user).unwrap();
            ledger::record(&mut store, &w.id, TxType::Deposit, dec!(300), "seed").unwrap();
        }
        store.put_match(scheduled_match("m1")).unwrap();
        let pool = create_pool(
            &mut store,
            "Doomed",
            "",
            dec!(50),
            None,
            Modality::Winner,
            &["m1".into()],
        )
        .unwrap();
        place_bet(&mut store, "u1", &pool.id, "m1", home_pick()).unwrap();
        place_bet(&mut store, "u2", &pool.id, "m1", home_pick()).unwrap();

        let refunded = cancel_pool(&mut store, &pool.id).unwrap();
        assert_eq!(refunded, 2);
        assert_eq!(store.pool(&pool.id).unwrap().status, PoolStatus::Cancelled);
        assert_eq!(store.pool(&pool.id).unwrap().prize_pool, Decimal::ZERO);
        assert_eq!(store.wallet_for_user("u1").unwrap().balance, dec!(300));
        assert_eq!(store.wallet_for_user("u2").unwrap().balance, dec!(300));

        // Second cancellation fails, no double refunds.
        assert!(cancel_pool(&mut store, &pool.id).is_err());
    }

    #[test]
    fn test_create_pool_requires_at_least_one_match() {
        let mut store = Store::new();
        let err = create_pool(
            &mut store,
            "Empty",
            "",
            dec!(10),
            None,
            Modality::Winner,
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
        assert!(store.pools.is_empty());
    }

    #[test]
    fn test_create_pool_requires_known_matches() {
        let mut store = Store::new();
        let err = create_pool(
            &mut store,
            "Ghost",
            "",
            dec!(10),
            None,
            Modality::Winner,
            &["nope".into()],
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
        assert!(store.pools.is_empty());
    }
}
