//! Elimination bracket builder: library with models, storage interface and bracket logic.

pub mod config;
pub mod logic;
pub mod models;
pub mod storage;

pub use config::{EliminationFormat, ServerConfig};
pub use logic::{
    AdvancementPolicy, BuildMode, ContestOutcome, Manager, MatchUpdate, OpponentPatch,
    PositionalSplit, StageCreator,
};
pub use models::{
    BracketError, ErrorKind, Group, Match, MatchGame, MatchId, Opponent, OpponentResult, Outcome,
    Participant, ParticipantId, Round, Slot, Stage, StageData, StageId, StageSettings, StageInput,
    StageType, Status, TournamentId,
};
pub use storage::{Filter, Id, MemoryStorage, Row, Storage, StorageError, Table};
