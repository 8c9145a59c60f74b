//! Participants and the transient slots that reference them.

use crate::models::game::{Opponent, OpponentResult};
use crate::storage::{Id, Record, Table};
use serde::{Deserialize, Serialize};

/// Unique identifier for a participant.
pub type ParticipantId = Id;

/// Unique identifier for a tournament (owner of stages and participants).
pub type TournamentId = Id;

/// A competitor registered under a tournament. Names are unique per tournament.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default)]
    pub id: ParticipantId,
    pub tournament_id: TournamentId,
    pub name: String,
}

impl Participant {
    /// A participant not yet stored (nil id).
    pub fn new(tournament_id: TournamentId, name: impl Into<String>) -> Self {
        Self {
            id: Id::nil(),
            tournament_id,
            name: name.into(),
        }
    }
}

impl Record for Participant {
    const TABLE: Table = Table::Participant;

    fn id(&self) -> Id {
        self.id
    }

    fn set_id(&mut self, id: Id) {
        self.id = id;
    }
}

/// One position in a round's input. `position` is the seed origin within the source round.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Slot {
    /// No opponent: the other side advances automatically.
    Bye,
    /// Opponent not known yet.
    Tbd { position: u32 },
    Participant { id: ParticipantId, position: u32 },
}

impl Slot {
    /// Opponent of a match, keeping where it comes from.
    pub fn to_opponent(&self) -> Opponent {
        match *self {
            Slot::Bye => Opponent::Bye,
            Slot::Tbd { position } => Opponent::Tbd {
                position: Some(position),
            },
            Slot::Participant { id, position } => Opponent::Participant(OpponentResult {
                position: Some(position),
                ..OpponentResult::new(id)
            }),
        }
    }

    /// Opponent of a match game: same participant, no seed origin.
    pub fn to_game_opponent(&self) -> Opponent {
        match *self {
            Slot::Bye => Opponent::Bye,
            Slot::Tbd { .. } => Opponent::Tbd { position: None },
            Slot::Participant { id, .. } => Opponent::Participant(OpponentResult::new(id)),
        }
    }
}
