//! Bracket logic: slot resolution, status inference, upserts, and the stage builder.

mod builder;
mod manager;
mod results;
mod slots;
mod status;
mod upsert;

pub use builder::{contests, AdvancementPolicy, ContestOutcome, PositionalSplit, StageCreator};
pub use manager::Manager;
pub use results::{apply_update, MatchUpdate, OpponentPatch};
pub use slots::{ensure_no_duplicates, fix_seeding, planned_size, seeding_from_csv, Seeding, SlotResolver};
pub use status::{duel_status, infer_duel, inferred_result, merge_on_update, merge_opponent, status_of};
pub use upsert::{BuildMode, Key, Records, Upsertable, Upserter};
