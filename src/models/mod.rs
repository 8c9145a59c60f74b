//! Data structures for elimination brackets: stages, rounds, matches, participants.

mod error;
mod game;
mod participant;
mod stage;

pub use error::{BracketError, ErrorKind};
pub use game::{Duel, Match, MatchGame, MatchId, Opponent, OpponentResult, Outcome, Status};
pub use participant::{Participant, ParticipantId, Slot, TournamentId};
pub use stage::{Group, Round, Stage, StageData, StageId, StageSettings, StageInput, StageType};
