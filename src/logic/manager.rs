//! Facade over a storage: create and update stages, read them back, enter results.

use crate::config::EliminationFormat;
use crate::logic::builder::StageCreator;
use crate::logic::results::{apply_update, MatchUpdate};
use crate::logic::upsert::Records;
use crate::models::{
    BracketError, Duel, Group, Match, MatchGame, MatchId, Participant, Round, Stage, StageData,
    StageId, StageInput,
};
use crate::storage::{Filter, Record, Storage};
use log::info;
use std::collections::HashMap;

pub struct Manager<S: Storage> {
    storage: S,
    format: EliminationFormat,
}

impl<S: Storage> Manager<S> {
    pub fn new(storage: S) -> Self {
        Self::with_format(storage, EliminationFormat::default())
    }

    pub fn with_format(storage: S, format: EliminationFormat) -> Self {
        Self { storage, format }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn format(&self) -> EliminationFormat {
        self.format
    }

    pub async fn create_stage(&self, input: StageInput) -> Result<Stage, BracketError> {
        StageCreator::new(&self.storage, input)?
            .with_format(self.format)
            .run()
            .await
    }

    /// Re-run the build of an existing stage with new input, reconciling stored records.
    pub async fn update_stage(
        &self,
        stage_id: StageId,
        input: StageInput,
        enable_byes: bool,
    ) -> Result<Stage, BracketError> {
        let mut creator = StageCreator::new(&self.storage, input)?.with_format(self.format);
        creator.set_existing(stage_id, enable_byes);
        creator.run().await
    }

    /// Everything stored under a stage, ordered by round and match number.
    pub async fn stage_data(&self, stage_id: StageId) -> Result<StageData, BracketError> {
        let records = Records::new(&self.storage);
        let stage: Stage = records
            .by_id(stage_id)
            .await?
            .ok_or_else(|| BracketError::validation(format!("No stage found with id {stage_id}.")))?;

        let by_stage = Filter::new().by_id("stage_id", stage_id);
        let mut groups: Vec<Group> = records.all(Some(&by_stage)).await?;
        let mut rounds: Vec<Round> = records.all(Some(&by_stage)).await?;
        let mut matches: Vec<Match> = records.all(Some(&by_stage)).await?;
        let mut match_games: Vec<MatchGame> = records.all(Some(&by_stage)).await?;
        let participants: Vec<Participant> = records
            .all(Some(&Filter::new().by_id("tournament_id", stage.tournament_id)))
            .await?;

        groups.sort_by_key(|g| g.number);
        rounds.sort_by_key(|r| r.number);
        let round_rank: HashMap<_, _> = rounds.iter().map(|r| (r.id, r.number)).collect();
        matches.sort_by_key(|m| (round_rank.get(&m.round_id).copied(), m.number));
        let match_rank: HashMap<_, _> = matches.iter().enumerate().map(|(i, m)| (m.id, i)).collect();
        match_games.sort_by_key(|g| (match_rank.get(&g.parent_id).copied(), g.number));

        Ok(StageData {
            stage,
            groups,
            rounds,
            matches,
            match_games,
            participants,
        })
    }

    pub async fn update_match(
        &self,
        match_id: MatchId,
        update: MatchUpdate,
    ) -> Result<Match, BracketError> {
        self.update_duel(match_id, &update).await
    }

    pub async fn update_match_game(
        &self,
        game_id: MatchId,
        update: MatchUpdate,
    ) -> Result<MatchGame, BracketError> {
        self.update_duel(game_id, &update).await
    }

    async fn update_duel<T: Record + Duel>(
        &self,
        id: MatchId,
        update: &MatchUpdate,
    ) -> Result<T, BracketError> {
        let records = Records::new(&self.storage);
        let mut duel: T = records
            .by_id(id)
            .await?
            .ok_or_else(|| BracketError::validation(format!("No {} found with id {id}.", T::TABLE)))?;
        apply_update(&mut duel, update)?;
        records.update(&duel).await?;
        info!("Updated {} {id}: {:?}", T::TABLE, duel.status());
        Ok(duel)
    }
}
