// Scoring
//
// Pure per-modality scorer: same (prediction, match, modality) always yields
// the same points, with no external state, so results can be recomputed for
// audits and pre-settlement standings. A correct prediction scores
// `FULL_POINTS`, anything else scores 0 — EXACT_SCORE deliberately gives no
// partial credit for the right winner or margin.

use crate::error::EngineError;
use crate::models::{MatchRecord, Modality, Prediction, WinnerPick};

/// Points awarded for a correct prediction. Correctness downstream is always
/// `points > 0`.
pub const FULL_POINTS: u32 = 1;

/// Score one prediction against a finished match.
///
/// Fails with `MatchNotFinished` unless the match is finished with a recorded
/// score, and with `InvalidPrediction` when the payload does not match the
/// pool's modality.
pub fn score(
    prediction: &Prediction,
    m: &MatchRecord,
    modality: Modality,
) -> Result<u32, EngineError> {
    let (home, away) = m.final_score().ok_or_else(|| {
        EngineError::MatchNotFinished(format!("match {} has no final score", m.id))
    })?;
    prediction.validate(modality)?;

    let correct = match prediction {
        Prediction::Winner { winner } => *winner == actual_outcome(home, away),
        Prediction::ExactScore { home_score, away_score } => {
            *home_score == home && *away_score == away
        }
        Prediction::TotalGoals { total_goals } => *total_goals == home + away,
        Prediction::BothScore { both_score } => *both_score == (home > 0 && away > 0),
    };

    Ok(if correct { FULL_POINTS } else { 0 })
}

fn actual_outcome(home: u32, away: u32) -> WinnerPick {
    if home > away {
        WinnerPick::Home
    } else if home < away {
        WinnerPick::Away
    } else {
        WinnerPick::Draw
    }
}
