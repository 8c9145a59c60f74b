//! Status and result inference for two-opponent matches. Pure, no storage access.

use crate::models::{Duel, Opponent, OpponentResult, Outcome, Status};

/// Most advanced status consistent with what is known about both sides.
pub fn status_of(opponent1: &Opponent, opponent2: &Opponent) -> Status {
    use Opponent::*;
    match (opponent1, opponent2) {
        (Bye, _) | (_, Bye) => Status::Locked,
        (Tbd { .. }, Tbd { .. }) => Status::Locked,
        (Tbd { .. }, _) | (_, Tbd { .. }) => Status::Waiting,
        (Participant(a), Participant(b)) => {
            if is_decided(a, b) {
                Status::Completed
            } else if a.score.is_some() || b.score.is_some() {
                Status::Running
            } else {
                Status::Ready
            }
        }
    }
}

pub fn duel_status<D: Duel>(duel: &D) -> Status {
    let [opponent1, opponent2] = duel.opponents();
    status_of(opponent1, opponent2)
}

fn is_decided(a: &OpponentResult, b: &OpponentResult) -> bool {
    let has_winner = |r: &OpponentResult| matches!(r.result, Some(Outcome::Win | Outcome::Loss));
    a.forfeited()
        || b.forfeited()
        || has_winner(a)
        || has_winner(b)
        || (a.result == Some(Outcome::Draw) && b.result == Some(Outcome::Draw))
}

/// Fill in the winner when the other side is a bye, or when exactly one side lost or forfeited.
/// A result that is already set is never replaced.
pub fn inferred_result(opponent1: Opponent, opponent2: Opponent) -> (Opponent, Opponent) {
    use Opponent::*;
    match (opponent1, opponent2) {
        (Participant(mut a), Bye) => {
            a.result.get_or_insert(Outcome::Win);
            (Participant(a), Bye)
        }
        (Bye, Participant(mut b)) => {
            b.result.get_or_insert(Outcome::Win);
            (Bye, Participant(b))
        }
        (Participant(mut a), Participant(mut b)) => {
            match (a.lost(), b.lost()) {
                (true, false) => {
                    b.result.get_or_insert(Outcome::Win);
                }
                (false, true) => {
                    a.result.get_or_insert(Outcome::Win);
                }
                _ => {}
            }
            (Participant(a), Participant(b))
        }
        other => other,
    }
}

/// Apply [`inferred_result`] to both opponents of a duel in place.
pub fn infer_duel<D: Duel>(duel: &mut D) {
    let [opponent1, opponent2] = duel.opponents_mut();
    let (a, b) = inferred_result(std::mem::take(opponent1), std::mem::take(opponent2));
    *opponent1 = a;
    *opponent2 = b;
}

/// Reconcile one incoming opponent with the stored one.
///
/// A TBD never replaces a participant or a bye. A bye replaces anything only
/// when `allow_bye_override` is set. The same participant merges field by field.
pub fn merge_opponent(incoming: Opponent, existing: Opponent, allow_bye_override: bool) -> Opponent {
    use Opponent::*;
    match (incoming, existing) {
        (Bye, existing) => {
            if allow_bye_override {
                Bye
            } else {
                existing
            }
        }
        (incoming @ Tbd { .. }, existing) => {
            if existing.is_tbd() {
                incoming
            } else {
                existing
            }
        }
        (Participant(new), Participant(old)) if new.id == old.id => {
            Participant(merge_result(new, old))
        }
        (incoming @ Participant(_), _) => incoming,
    }
}

fn merge_result(incoming: OpponentResult, existing: OpponentResult) -> OpponentResult {
    OpponentResult {
        id: incoming.id,
        position: incoming.position.or(existing.position),
        forfeit: incoming.forfeit.or(existing.forfeit),
        score: incoming.score.or(existing.score),
        result: incoming.result.or(existing.result),
    }
}

/// A win given for a bye does not hold once the bye is replaced by a real opponent.
fn drop_bye_win(opponent: &mut Opponent) {
    if let Some(result) = opponent.participant_mut() {
        if result.result == Some(Outcome::Win) {
            result.result = None;
        }
    }
}

/// Merged duel to persist over `existing`: opponents reconciled, results inferred,
/// and status never lower than what was stored.
pub fn merge_on_update<D: Duel>(mut incoming: D, existing: &D, allow_bye_override: bool) -> D {
    let incoming_status = incoming.status();
    {
        let [in1, in2] = incoming.opponents_mut();
        let [ex1, ex2] = existing.opponents();
        *in1 = merge_opponent(std::mem::take(in1), ex1.clone(), allow_bye_override);
        *in2 = merge_opponent(std::mem::take(in2), ex2.clone(), allow_bye_override);
        if ex1.is_bye() && !in1.is_bye() {
            drop_bye_win(in2);
        }
        if ex2.is_bye() && !in2.is_bye() {
            drop_bye_win(in1);
        }
    }
    infer_duel(&mut incoming);
    let status = incoming_status
        .max(existing.status())
        .max(duel_status(&incoming));
    incoming.set_status(status);
    incoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Match, ParticipantId};
    use uuid::Uuid;

    fn player(id: ParticipantId) -> Opponent {
        Opponent::Participant(OpponentResult::new(id))
    }

    fn scored(id: ParticipantId, score: f64) -> Opponent {
        Opponent::Participant(OpponentResult {
            score: Some(score),
            ..OpponentResult::new(id)
        })
    }

    fn tbd() -> Opponent {
        Opponent::Tbd { position: None }
    }

    fn a_match(opponent1: Opponent, opponent2: Opponent, status: Status) -> Match {
        Match {
            id: Uuid::nil(),
            stage_id: Uuid::nil(),
            group_id: Uuid::nil(),
            round_id: Uuid::nil(),
            number: 1,
            child_count: 0,
            status,
            opponent1,
            opponent2,
        }
    }

    #[test]
    fn status_follows_known_opponents() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(status_of(&tbd(), &tbd()), Status::Locked);
        assert_eq!(status_of(&player(a), &Opponent::Bye), Status::Locked);
        assert_eq!(status_of(&player(a), &tbd()), Status::Waiting);
        assert_eq!(status_of(&player(a), &player(b)), Status::Ready);
        assert_eq!(status_of(&scored(a, 49.1), &player(b)), Status::Running);

        let forfeit = Opponent::Participant(OpponentResult {
            forfeit: Some(true),
            ..OpponentResult::new(b)
        });
        assert_eq!(status_of(&player(a), &forfeit), Status::Completed);
    }

    #[test]
    fn draws_complete_only_when_both_sides_draw() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let draw = |id| {
            Opponent::Participant(OpponentResult {
                result: Some(Outcome::Draw),
                ..OpponentResult::new(id)
            })
        };
        assert_eq!(status_of(&draw(a), &player(b)), Status::Ready);
        assert_eq!(status_of(&draw(a), &draw(b)), Status::Completed);
    }

    #[test]
    fn bye_gives_the_other_side_the_win() {
        let a = Uuid::new_v4();
        let (left, right) = inferred_result(player(a), Opponent::Bye);
        assert_eq!(left.participant().and_then(|r| r.result), Some(Outcome::Win));
        assert_eq!(right, Opponent::Bye);
    }

    #[test]
    fn loss_on_one_side_infers_win_on_the_other() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let loser = Opponent::Participant(OpponentResult {
            result: Some(Outcome::Loss),
            ..OpponentResult::new(b)
        });
        let (left, right) = inferred_result(player(a), loser.clone());
        assert_eq!(left.participant().and_then(|r| r.result), Some(Outcome::Win));
        assert_eq!(right, loser);
    }

    #[test]
    fn undetermined_pairs_are_left_alone() {
        let a = Uuid::new_v4();
        assert_eq!(inferred_result(player(a), tbd()), (player(a), tbd()));
        assert_eq!(
            inferred_result(Opponent::Bye, Opponent::Bye),
            (Opponent::Bye, Opponent::Bye)
        );
    }

    #[test]
    fn status_never_regresses_on_update() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let existing = a_match(scored(a, 48.0), scored(b, 49.5), Status::Completed);
        let incoming = a_match(player(a), player(b), Status::Ready);

        let merged = merge_on_update(incoming, &existing, false);
        assert_eq!(merged.status, Status::Completed);
        assert_eq!(merged.opponent1.participant().and_then(|r| r.score), Some(48.0));
    }

    #[test]
    fn tbd_does_not_clobber_a_known_opponent() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let existing = a_match(player(a), player(b), Status::Ready);
        let incoming = a_match(player(a), tbd(), Status::Waiting);

        let merged = merge_on_update(incoming, &existing, true);
        assert_eq!(merged.opponent2, player(b));
        assert_eq!(merged.status, Status::Ready);
    }

    #[test]
    fn bye_override_is_gated() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let existing = a_match(player(a), player(b), Status::Ready);

        let kept = merge_on_update(
            a_match(player(a), Opponent::Bye, Status::Locked),
            &existing,
            false,
        );
        assert_eq!(kept.opponent2, player(b));

        let replaced = merge_on_update(
            a_match(player(a), Opponent::Bye, Status::Locked),
            &existing,
            true,
        );
        assert_eq!(replaced.opponent2, Opponent::Bye);
        assert_eq!(replaced.status, Status::Ready);
    }

    #[test]
    fn win_over_a_replaced_bye_is_dropped() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut existing = a_match(player(a), Opponent::Bye, Status::Locked);
        infer_duel(&mut existing);
        assert_eq!(existing.opponent1.participant().and_then(|r| r.result), Some(Outcome::Win));

        let merged = merge_on_update(a_match(player(a), player(b), Status::Ready), &existing, false);
        assert_eq!(merged.opponent1, player(a));
        assert_eq!(merged.opponent2, player(b));
        assert_eq!(merged.status, Status::Ready);
    }

    #[test]
    fn newly_known_opponent_is_accepted() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let existing = a_match(player(a), tbd(), Status::Waiting);
        let merged = merge_on_update(a_match(player(a), player(b), Status::Ready), &existing, false);
        assert_eq!(merged.opponent2, player(b));
        assert_eq!(merged.status, Status::Ready);
    }
}
