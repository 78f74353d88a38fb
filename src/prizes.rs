// Prize Tier Computation
//
// Deterministic tier table derived from the number of matches in the pool
// and the prize pool at settlement time, independent of who actually played.
// Percentages apply to the full prize pool, not a remaining balance; tiers
// with zero qualifying participants simply pay nothing.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;

/// Minimum correct-prediction requirement, capped by the pool size.
pub fn min_correct(total_matches: u32) -> u32 {
    total_matches.min(4)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrizeTier {
    pub required_correct: u32,
    /// Percentage of the pool's total prize pool at settlement time.
    pub percentage: u32,
    pub amount: Decimal,
}

/// Tier table, best tier first:
///
/// - all correct           → 100%
/// - all but one correct   →  30%, only if `total - 1 >= min_correct`
/// - all but two correct   →  15%, only if `total - 2 >= min_correct`
/// - exactly `min_correct` →   5%, only if `min_correct < total - 2`
///
/// Tier amounts round down to two decimal places.
pub fn compute_tiers(total_matches: u32, prize_pool: Decimal) -> Vec<PrizeTier> {
    let min_correct = min_correct(total_matches);
    let mut tiers = Vec::new();

    if total_matches >= 1 {
        tiers.push(tier(total_matches, 100, prize_pool));
    }
    if total_matches > 1 && total_matches - 1 >= min_correct {
        tiers.push(tier(total_matches - 1, 30, prize_pool));
    }
    if total_matches > 2 && total_matches - 2 >= min_correct {
        tiers.push(tier(total_matches - 2, 15, prize_pool));
    }
    // Guard against duplicating a tier already emitted above.
    if min_correct < total_matches.saturating_sub(2) {
        tiers.push(tier(min_correct, 5, prize_pool));
    }

    tiers
}

fn tier(required_correct: u32, percentage: u32, prize_pool: Decimal) -> PrizeTier {
    let amount = (prize_pool * Decimal::from(percentage) / dec!(100))
        .round_dp_with_strategy(2, RoundingStrategy::ToZero);
    PrizeTier { required_correct, percentage, amount }
}
