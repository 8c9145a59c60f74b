//! Stage, Group and Round records, plus the caller's stage description.

use crate::models::game::{Match, MatchGame};
use crate::models::participant::{Participant, ParticipantId, TournamentId};
use crate::storage::{Id, Record, Table};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unique identifier for a stage.
pub type StageId = Id;

/// Structural type of a stage. Only elimination is built here.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageType {
    #[default]
    GymnasticsElimination,
}

/// Configuration blob of a stage. Unknown keys are preserved in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StageSettings {
    /// Competitor count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    /// Games per match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches_child_count: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StageSettings {
    /// Shallow merge: keys set here win, everything else is kept from `existing`.
    pub fn merged_over(self, existing: StageSettings) -> StageSettings {
        let mut extra = existing.extra;
        extra.extend(self.extra);
        StageSettings {
            size: self.size.or(existing.size),
            matches_child_count: self.matches_child_count.or(existing.matches_child_count),
            extra,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default)]
    pub id: StageId,
    pub tournament_id: TournamentId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StageType,
    /// Ordinal, unique within the tournament.
    pub number: u32,
    pub settings: StageSettings,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub id: Id,
    pub stage_id: StageId,
    pub number: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Round {
    #[serde(default)]
    pub id: Id,
    pub stage_id: StageId,
    pub group_id: Id,
    pub number: u32,
}

impl Record for Stage {
    const TABLE: Table = Table::Stage;

    fn id(&self) -> Id {
        self.id
    }

    fn set_id(&mut self, id: Id) {
        self.id = id;
    }
}

impl Record for Group {
    const TABLE: Table = Table::Group;

    fn id(&self) -> Id {
        self.id
    }

    fn set_id(&mut self, id: Id) {
        self.id = id;
    }
}

impl Record for Round {
    const TABLE: Table = Table::Round;

    fn id(&self) -> Id {
        self.id
    }

    fn set_id(&mut self, id: Id) {
        self.id = id;
    }
}

/// What the caller asks for when creating (or updating) a stage.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct StageInput {
    pub name: String,
    #[serde(default)]
    pub tournament_id: Option<TournamentId>,
    /// Explicit stage number; the next free one is used otherwise.
    #[serde(default)]
    pub number: Option<u32>,
    /// Seeding by participant name. `None` entries are byes.
    #[serde(default)]
    pub seeding: Option<Vec<Option<String>>>,
    /// Seeding by participant id. Takes precedence over `seeding`.
    #[serde(default)]
    pub seeding_ids: Option<Vec<Option<ParticipantId>>>,
    #[serde(default)]
    pub settings: StageSettings,
}

impl StageInput {
    pub fn new(name: impl Into<String>, tournament_id: TournamentId) -> Self {
        Self {
            name: name.into(),
            tournament_id: Some(tournament_id),
            ..Self::default()
        }
    }

    pub fn with_seeding<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seeding = Some(names.into_iter().map(|n| Some(n.into())).collect());
        self
    }

    pub fn with_seeding_ids(mut self, ids: impl IntoIterator<Item = ParticipantId>) -> Self {
        self.seeding_ids = Some(ids.into_iter().map(Some).collect());
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.settings.size = Some(size);
        self
    }

    pub fn with_child_count(mut self, child_count: u32) -> Self {
        self.settings.matches_child_count = Some(child_count);
        self
    }
}

/// Everything stored under one stage.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StageData {
    pub stage: Stage,
    pub groups: Vec<Group>,
    pub rounds: Vec<Round>,
    pub matches: Vec<Match>,
    pub match_games: Vec<MatchGame>,
    pub participants: Vec<Participant>,
}
