// Settlement Orchestrator
//
// Drives the one-time finalization of a pool: readiness gate, scoring of
// every bet, tier computation, payout, FINISHED transition. The whole run is
// one unit of work; the ACTIVE → SETTLING → FINISHED transition inside it is
// the idempotency guard, so re-invoking settlement fails fast with
// `PoolAlreadySettled` before any scoring or payout work begins.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::ledger;
use crate::models::{BetStatus, Payment, PaymentKind, PoolStatus, Standing, TxType};
use crate::notifications::NotificationEvent;
use crate::prizes::{self, PrizeTier};
use crate::scoring;
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
pub struct SettledWinner {
    pub user_id: String,
    pub correct_predictions: u32,
    pub required_correct: u32,
    pub prize: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementReport {
    pub pool_id: String,
    pub total_matches: u32,
    pub prize_pool: Decimal,
    pub tiers: Vec<PrizeTier>,
    pub winners: Vec<SettledWinner>,
    pub distributed_total: Decimal,
    /// What stays on the pool after payout (tiers with no qualifying
    /// participants leave their share undistributed).
    pub undistributed: Decimal,
}

/// Settle a pool. Returns the report plus the BET_WON events for the caller
/// to emit after the transaction has committed.
pub fn settle_pool(
    store: &mut Store,
    pool_id: &str,
) -> Result<(SettlementReport, Vec<NotificationEvent>), EngineError> {
    // Fail-fast guards, before any work.
    let pool = store.pool(pool_id)?;
    match pool.status {
        PoolStatus::Active | PoolStatus::Closed => {}
        PoolStatus::Settling | PoolStatus::Finished => {
            return Err(EngineError::PoolAlreadySettled(format!("pool {}", pool_id)))
        }
        PoolStatus::Cancelled => {
            return Err(EngineError::PoolNotActive(format!(
                "pool {} is cancelled",
                pool_id
            )))
        }
    }

    let pool_match_ids: Vec<String> = store
        .pool_matches(pool_id)
        .iter()
        .map(|pm| pm.match_id.clone())
        .collect();
    for match_id in &pool_match_ids {
        if !store.match_record(match_id)?.is_finished {
            return Err(EngineError::MatchesNotFinished(format!(
                "match {} in pool {} is not finished",
                match_id, pool_id
            )));
        }
    }

    let total_matches = pool_match_ids.len() as u32;
    let mut events = Vec::new();

    let report = store.transaction(|s| {
        // Claim the pool exclusively for this settlement run.
        s.pool_mut(pool_id)?.status = PoolStatus::Settling;
        let modality = s.pool(pool_id)?.modality;
        let prize_pool = s.pool(pool_id)?.prize_pool;

        // Score every live bet and count correct predictions per user.
        // BTreeMap keeps the per-user iteration order stable, so repeated
        // settlements of identical state pay identical shares.
        let bet_ids: Vec<String> = s
            .bets_for_pool(pool_id)
            .into_iter()
            .filter(|b| b.status.is_active())
            .map(|b| b.id.clone())
            .collect();

        let mut correct_by_user: BTreeMap<String, u32> = BTreeMap::new();
        for bet_id in &bet_ids {
            let bet = s.bet(bet_id)?;
            let m = s.match_record(&bet.match_id)?.clone();
            let points = scoring::score(&bet.prediction, &m, modality)?;
            let user_id = bet.user_id.clone();

            let bet = s.bet_mut(bet_id)?;
            bet.points = Some(points);
            bet.status = if points > 0 { BetStatus::Won } else { BetStatus::Lost };

            let entry = correct_by_user.entry(user_id).or_insert(0);
            if points > 0 {
                *entry += 1;
            }
        }

        let tiers = prizes::compute_tiers(total_matches, prize_pool);

        // Pay tiers best-first; each tier is additionally capped by what is
        // left in the pool (the tier percentages are all taken from the full
        // prize pool and sum past 100%).
        let mut remaining = prize_pool;
        let mut winners = Vec::new();
        for tier in &tiers {
            let qualified: Vec<&String> = correct_by_user
                .iter()
                .filter(|(_, correct)| **correct == tier.required_correct)
                .map(|(user, _)| user)
                .collect();
            if qualified.is_empty() {
                continue;
            }

            let tier_amount = tier.amount.min(remaining);
            if tier_amount <= Decimal::ZERO {
                warn!(
                    pool = pool_id,
                    required = tier.required_correct,
                    "Prize pool exhausted before tier"
                );
                continue;
            }
            let share = (tier_amount / Decimal::from(qualified.len() as u64))
                .round_dp_with_strategy(2, RoundingStrategy::ToZero);
            if share <= Decimal::ZERO {
                continue;
            }

            for user_id in qualified {
                let wallet_id = s.wallet_for_user(user_id)?.id.clone();
                ledger::record(
                    s,
                    &wallet_id,
                    TxType::Prize,
                    share,
                    &format!(
                        "Prize for {} correct predictions in pool {}",
                        tier.required_correct, pool_id
                    ),
                )?;
                s.payments.push(Payment::new(
                    user_id,
                    pool_id,
                    share,
                    PaymentKind::Prize,
                    &format!("Prize: {} correct predictions", tier.required_correct),
                ));
                let correct = tier.required_correct;
                events.push(NotificationEvent::bet_won(
                    user_id,
                    pool_id,
                    correct,
                    &share.to_string(),
                ));
                winners.push(SettledWinner {
                    user_id: user_id.clone(),
                    correct_predictions: correct,
                    required_correct: tier.required_correct,
                    prize: share,
                });
                remaining -= share;
            }
        }

        let distributed_total = prize_pool - remaining;
        let pool = s.pool_mut(pool_id)?;
        pool.prize_pool = remaining;
        pool.status = PoolStatus::Finished;

        Ok(SettlementReport {
            pool_id: pool_id.to_string(),
            total_matches,
            prize_pool,
            tiers,
            winners,
            distributed_total,
            undistributed: remaining,
        })
    })?;

    info!(
        pool = pool_id,
        winners = report.winners.len(),
        distributed = %report.distributed_total,
        undistributed = %report.undistributed,
        "Pool settled"
    );
    Ok((report, events))
}

/// Ranked participants, usable before or after settlement. Recomputed purely
/// from the bets and finished-match snapshots; unfinished matches simply do
/// not contribute yet.
pub fn pool_standings(store: &Store, pool_id: &str) -> Result<Vec<Standing>, EngineError> {
    let pool = store.pool(pool_id)?;
    let modality = pool.modality;

    let mut by_user: BTreeMap<String, (u32, u32, u32)> = BTreeMap::new();
    for bet in store.bets_for_pool(pool_id) {
        if !bet.status.is_active() {
            continue;
        }
        let entry = by_user.entry(bet.user_id.clone()).or_insert((0, 0, 0));
        entry.2 += 1; // total bets
        let m = store.match_record(&bet.match_id)?;
        if !m.is_finished {
            continue;
        }
        let points = scoring::score(&bet.prediction, m, modality)?;
        if points > 0 {
            entry.0 += 1;
        }
        entry.1 += points;
    }

    let mut standings: Vec<Standing> = by_user
        .into_iter()
        .map(|(user_id, (correct, points, total))| Standing {
            position: 0,
            user_id,
            correct_predictions: correct,
            points,
            total_bets: total,
        })
        .collect();
    standings.sort_by(|a, b| {
        b.correct_predictions
            .cmp(&a.correct_predictions)
            .then(b.points.cmp(&a.points))
            .then(a.user_id.cmp(&b.user_id))
    });
    for (i, standing) in standings.iter_mut().enumerate() {
        standing.position = i as u32 + 1;
    }
    Ok(standings)
}
