//! Entering results on a match or match game, with status and winner inference.

use crate::logic::status::{duel_status, infer_duel};
use crate::models::{BracketError, Duel, Opponent, OpponentResult, Outcome, Status};
use serde::{Deserialize, Serialize};

/// New values for one opponent. Unset fields keep what is stored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OpponentPatch {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub forfeit: Option<bool>,
    #[serde(default)]
    pub result: Option<Outcome>,
}

/// Results entered for a match.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchUpdate {
    #[serde(default)]
    pub opponent1: Option<OpponentPatch>,
    #[serde(default)]
    pub opponent2: Option<OpponentPatch>,
}

impl MatchUpdate {
    pub fn scores(score1: f64, score2: f64) -> Self {
        Self {
            opponent1: Some(OpponentPatch {
                score: Some(score1),
                ..OpponentPatch::default()
            }),
            opponent2: Some(OpponentPatch {
                score: Some(score2),
                ..OpponentPatch::default()
            }),
        }
    }
}

fn patch_opponent(opponent: &mut Opponent, patch: &OpponentPatch) -> Result<(), BracketError> {
    let Opponent::Participant(result) = opponent else {
        return Err(BracketError::validation(
            "Cannot set a result for an opponent that is not determined.",
        ));
    };
    *result = OpponentResult {
        score: patch.score.or(result.score),
        forfeit: patch.forfeit.or(result.forfeit),
        result: patch.result.or(result.result),
        ..result.clone()
    };
    Ok(())
}

/// A declared winner makes the other side the loser. Any other result against a winner is rejected.
fn complete_with_loser(duel: &mut impl Duel) -> Result<(), BracketError> {
    let [a, b] = duel.opponents_mut();
    let (Some(a), Some(b)) = (a.participant_mut(), b.participant_mut()) else {
        return Ok(());
    };
    match (a.result, b.result) {
        (Some(Outcome::Win), Some(Outcome::Win)) => {
            Err(BracketError::validation("There are two winners."))
        }
        (Some(Outcome::Win), Some(Outcome::Draw)) | (Some(Outcome::Draw), Some(Outcome::Win)) => {
            Err(BracketError::validation(
                "A winner's opponent can only have lost.",
            ))
        }
        (Some(Outcome::Win), None) => {
            b.result = Some(Outcome::Loss);
            Ok(())
        }
        (None, Some(Outcome::Win)) => {
            a.result = Some(Outcome::Loss);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Apply `update` to `duel`: patch the opponents, infer the missing result,
/// and raise the status to what the new results imply (never lower it).
pub fn apply_update<D: Duel>(duel: &mut D, update: &MatchUpdate) -> Result<(), BracketError> {
    if duel.status() == Status::Archived {
        return Err(BracketError::validation("Cannot update an archived match."));
    }
    {
        let [opponent1, opponent2] = duel.opponents_mut();
        if let Some(patch) = &update.opponent1 {
            patch_opponent(opponent1, patch)?;
        }
        if let Some(patch) = &update.opponent2 {
            patch_opponent(opponent2, patch)?;
        }
    }
    complete_with_loser(duel)?;
    infer_duel(duel);
    let status = duel.status().max(duel_status(&*duel));
    duel.set_status(status);
    Ok(())
}
