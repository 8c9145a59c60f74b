//! Stage builder: lays out the rounds of an elimination stage and upserts every record.
//!
//! Round `n + 1` is built from the slots that advance out of round `n`, so rounds
//! are processed strictly in order and never revisited.

use crate::config::EliminationFormat;
use crate::logic::slots::{planned_size, SlotResolver};
use crate::logic::status::status_of;
use crate::logic::upsert::{BuildMode, Records, Upserter};
use crate::models::{
    BracketError, Group, Match, MatchGame, Round, Slot, Stage, StageId, StageInput, StageType,
    TournamentId,
};
use crate::storage::{Filter, Id, Storage};
use log::info;

/// Slots of one contest after it is played.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ContestOutcome {
    pub advancing: Vec<Slot>,
    pub eliminated: Vec<Slot>,
}

/// Decides which slots of a contest move on to the next round.
pub trait AdvancementPolicy {
    /// Split `contest` so that exactly `advancing` slots move on.
    fn split(&self, contest: &[Slot], advancing: usize) -> ContestOutcome;
}

/// The first slots of each contest advance, in seeding order. Scores are not consulted.
#[derive(Clone, Copy, Debug, Default)]
pub struct PositionalSplit;

impl AdvancementPolicy for PositionalSplit {
    fn split(&self, contest: &[Slot], advancing: usize) -> ContestOutcome {
        let (advancing, eliminated) = contest.split_at(advancing.min(contest.len()));
        ContestOutcome {
            advancing: advancing.to_vec(),
            eliminated: eliminated.to_vec(),
        }
    }
}

/// Partition a round's slots into contiguous contests of `width`.
pub fn contests(slots: &[Slot], width: usize) -> Vec<&[Slot]> {
    slots.chunks(width).collect()
}

/// Creates an elimination stage, or reconciles an existing one after [`StageCreator::set_existing`].
pub struct StageCreator<'a, S: Storage + ?Sized> {
    storage: &'a S,
    input: StageInput,
    tournament_id: TournamentId,
    format: EliminationFormat,
    policy: Box<dyn AdvancementPolicy + 'a>,
    mode: BuildMode,
}

impl<'a, S: Storage + ?Sized> StageCreator<'a, S> {
    /// Validates the caller's input; nothing is stored until [`StageCreator::run`].
    pub fn new(storage: &'a S, mut input: StageInput) -> Result<Self, BracketError> {
        if input.name.trim().is_empty() {
            return Err(BracketError::validation(
                "You must provide a name for the stage.",
            ));
        }
        let tournament_id = input.tournament_id.ok_or_else(|| {
            BracketError::validation("You must provide a tournament id for the stage.")
        })?;
        input.settings.matches_child_count.get_or_insert(0);

        Ok(Self {
            storage,
            input,
            tournament_id,
            format: EliminationFormat::default(),
            policy: Box::new(PositionalSplit),
            mode: BuildMode::Create,
        })
    }

    pub fn with_format(mut self, format: EliminationFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_policy(mut self, policy: impl AdvancementPolicy + 'a) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Switch to update mode against `stage_id`.
    ///
    /// `enable_byes` lets a bye in the new seeding replace an opponent already recorded;
    /// otherwise such entries leave the stored opponent untouched.
    pub fn set_existing(&mut self, stage_id: StageId, enable_byes: bool) {
        self.mode = BuildMode::Update {
            stage_id,
            enable_byes,
        };
    }

    pub async fn run(mut self) -> Result<Stage, BracketError> {
        self.format.validate()?;

        // Checked before anything is written.
        self.format
            .ensure_competitor_count(planned_size(&self.input)?)?;
        let number = self.stage_number().await?;

        let slots = SlotResolver::new(self.storage, self.tournament_id)
            .resolve(&mut self.input)
            .await?;
        self.format.ensure_competitor_count(slots.len())?;

        let upserter = Upserter::new(self.storage, self.mode);
        let stage = upserter.upsert(self.stage_record(number)).await?;
        let group = upserter
            .upsert(Group {
                id: Id::nil(),
                stage_id: stage.id,
                number: 1,
            })
            .await?;
        info!(
            "Building stage {} ({}) with {} competitors, {:?}",
            stage.name,
            stage.id,
            slots.len(),
            self.mode
        );

        let mut slots = slots;
        for number in 1..=self.format.round_count() as u32 {
            slots = self
                .build_round(&upserter, &stage, &group, number, slots)
                .await?;
        }

        if stage.id.is_nil() {
            return Err(BracketError::internal(
                "Something went wrong when creating the stage.",
            ));
        }
        Ok(stage)
    }

    fn stage_record(&self, number: u32) -> Stage {
        let id = match self.mode {
            BuildMode::Create => Id::nil(),
            BuildMode::Update { stage_id, .. } => stage_id,
        };
        Stage {
            id,
            tournament_id: self.tournament_id,
            name: self.input.name.clone(),
            kind: StageType::GymnasticsElimination,
            number,
            settings: self.input.settings.clone(),
        }
    }

    /// Stage number: the explicit one if free, else the next after the tournament's highest.
    /// In update mode the stage keeps its own number unless another is given, and stays
    /// in its tournament.
    async fn stage_number(&self) -> Result<u32, BracketError> {
        let records = Records::new(self.storage);
        let current = match self.mode {
            BuildMode::Create => None,
            BuildMode::Update { stage_id, .. } => {
                let stage: Stage = records.by_id(stage_id).await?.ok_or_else(|| {
                    BracketError::validation(format!("No stage found with id {stage_id}."))
                })?;
                if stage.tournament_id != self.tournament_id {
                    return Err(BracketError::validation(format!(
                        "Stage {stage_id} belongs to another tournament."
                    )));
                }
                Some(stage)
            }
        };

        let filter = Filter::new().by_id("tournament_id", self.tournament_id);
        let stages: Vec<Stage> = records.all(Some(&filter)).await?;
        let others: Vec<&Stage> = stages
            .iter()
            .filter(|s| current.as_ref().map_or(true, |c| c.id != s.id))
            .collect();

        if let Some(number) = self.input.number {
            if others.iter().any(|s| s.number == number) {
                return Err(BracketError::validation(
                    "The given stage number already exists.",
                ));
            }
            return Ok(number);
        }

        if let Some(current) = &current {
            return Ok(current.number);
        }
        Ok(others.iter().map(|s| s.number).max().map_or(1, |max| max + 1))
    }

    /// Upsert round `number` and return the slots advancing out of it.
    async fn build_round(
        &self,
        upserter: &Upserter<'a, S>,
        stage: &Stage,
        group: &Group,
        number: u32,
        slots: Vec<Slot>,
    ) -> Result<Vec<Slot>, BracketError> {
        let width = self.format.contest_width;
        if slots.is_empty() || slots.len() % width != 0 {
            return Err(BracketError::internal(format!(
                "Round {number} received {} slots, not a multiple of {width}.",
                slots.len()
            )));
        }

        let round = upserter
            .upsert(Round {
                id: Id::nil(),
                stage_id: stage.id,
                group_id: group.id,
                number,
            })
            .await?;
        info!(
            "Round {number}: {} contests of {width}",
            slots.len() / width
        );

        let advancing = self.format.advancing_per_contest;
        let mut next = Vec::with_capacity(slots.len() / width * advancing);
        for (index, contest) in contests(&slots, width).into_iter().enumerate() {
            self.build_contest(upserter, stage, &round, index, contest)
                .await?;

            let outcome = self.policy.split(contest, advancing);
            if outcome.advancing.len() != advancing {
                return Err(BracketError::internal(format!(
                    "Advancement policy moved {} slots out of a contest, expected {advancing}.",
                    outcome.advancing.len()
                )));
            }
            next.extend(outcome.advancing);
        }
        Ok(next)
    }

    /// A contest is stored as pairwise matches: slots {0,1}, {2,3}, ...
    async fn build_contest(
        &self,
        upserter: &Upserter<'a, S>,
        stage: &Stage,
        round: &Round,
        index: usize,
        contest: &[Slot],
    ) -> Result<(), BracketError> {
        let per_contest = self.format.matches_per_contest();
        for (pair, duel) in contest.chunks(2).enumerate() {
            let [a, b] = duel else {
                return Err(BracketError::internal("A contest slot has no opponent."));
            };
            let number = (index * per_contest + pair + 1) as u32;
            self.build_match(upserter, stage, round, number, *a, *b)
                .await?;
        }
        Ok(())
    }

    async fn build_match(
        &self,
        upserter: &Upserter<'a, S>,
        stage: &Stage,
        round: &Round,
        number: u32,
        a: Slot,
        b: Slot,
    ) -> Result<Match, BracketError> {
        let (opponent1, opponent2) = (a.to_opponent(), b.to_opponent());
        let stored = upserter
            .upsert(Match {
                id: Id::nil(),
                stage_id: stage.id,
                group_id: round.group_id,
                round_id: round.id,
                number,
                child_count: self.input.settings.matches_child_count.unwrap_or(0),
                status: status_of(&opponent1, &opponent2),
                opponent1,
                opponent2,
            })
            .await?;

        for game in 1..=stored.child_count {
            let (opponent1, opponent2) = (a.to_game_opponent(), b.to_game_opponent());
            upserter
                .upsert(MatchGame {
                    id: Id::nil(),
                    stage_id: stage.id,
                    parent_id: stored.id,
                    number: game,
                    status: status_of(&opponent1, &opponent2),
                    opponent1,
                    opponent2,
                })
                .await?;
        }
        Ok(stored)
    }
}
