//! Matches, match games, and the opponent results they carry.

use crate::models::participant::ParticipantId;
use crate::storage::{Id, Record, Table};
use serde::{Deserialize, Serialize};

/// Unique identifier for a match or a match game.
pub type MatchId = Id;

/// Progress of a match. Ordered: a later variant is more advanced.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// At least one side is a bye, or both are to be determined.
    #[default]
    Locked,
    /// One side is known, the other is to be determined.
    Waiting,
    Ready,
    Running,
    Completed,
    Archived,
}

/// Final result of a match for one opponent.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

/// What is recorded for a concrete opponent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OpponentResult {
    pub id: ParticipantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forfeit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Outcome>,
}

impl OpponentResult {
    pub fn new(id: ParticipantId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn forfeited(&self) -> bool {
        self.forfeit == Some(true)
    }

    /// Lost by result or by forfeit.
    pub fn lost(&self) -> bool {
        self.forfeited() || self.result == Some(Outcome::Loss)
    }
}

/// One side of a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Opponent {
    Bye,
    Tbd {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<u32>,
    },
    Participant(OpponentResult),
}

impl Default for Opponent {
    fn default() -> Self {
        Opponent::Tbd { position: None }
    }
}

impl Opponent {
    pub fn is_bye(&self) -> bool {
        matches!(self, Opponent::Bye)
    }

    pub fn is_tbd(&self) -> bool {
        matches!(self, Opponent::Tbd { .. })
    }

    pub fn participant(&self) -> Option<&OpponentResult> {
        match self {
            Opponent::Participant(result) => Some(result),
            _ => None,
        }
    }

    pub fn participant_mut(&mut self) -> Option<&mut OpponentResult> {
        match self {
            Opponent::Participant(result) => Some(result),
            _ => None,
        }
    }
}

/// Shared shape of [`Match`] and [`MatchGame`]: a status and two opponents.
pub trait Duel {
    fn status(&self) -> Status;

    fn set_status(&mut self, status: Status);

    fn opponents(&self) -> [&Opponent; 2];

    fn opponents_mut(&mut self) -> [&mut Opponent; 2];
}

/// A two-opponent contest inside a round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    #[serde(default)]
    pub id: MatchId,
    pub stage_id: Id,
    pub group_id: Id,
    pub round_id: Id,
    /// Ordinal within the round, starting at 1.
    pub number: u32,
    /// Number of match games.
    pub child_count: u32,
    pub status: Status,
    pub opponent1: Opponent,
    pub opponent2: Opponent,
}

/// A sub-game of a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchGame {
    #[serde(default)]
    pub id: MatchId,
    pub stage_id: Id,
    pub parent_id: MatchId,
    pub number: u32,
    pub status: Status,
    pub opponent1: Opponent,
    pub opponent2: Opponent,
}

macro_rules! impl_duel_record {
    ($ty:ty, $table:expr) => {
        impl Duel for $ty {
            fn status(&self) -> Status {
                self.status
            }

            fn set_status(&mut self, status: Status) {
                self.status = status;
            }

            fn opponents(&self) -> [&Opponent; 2] {
                [&self.opponent1, &self.opponent2]
            }

            fn opponents_mut(&mut self) -> [&mut Opponent; 2] {
                [&mut self.opponent1, &mut self.opponent2]
            }
        }

        impl Record for $ty {
            const TABLE: Table = $table;

            fn id(&self) -> Id {
                self.id
            }

            fn set_id(&mut self, id: Id) {
                self.id = id;
            }
        }
    };
}

impl_duel_record!(Match, Table::Match);
impl_duel_record!(MatchGame, Table::MatchGame);
