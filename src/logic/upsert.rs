//! Insert-or-reconcile of bracket records keyed by their structural identity.
//!
//! Each record kind supplies its key (parent + ordinal) and its merge rule
//! through [`Upsertable`]; [`Upserter`] runs the same lookup-or-insert for all.

use crate::logic::status::{infer_duel, merge_on_update};
use crate::models::{BracketError, Group, Match, MatchGame, Round, Stage, StageId};
use crate::storage::{from_row, to_row, Filter, Id, Record, Storage};
use log::debug;

/// Whether the builder creates a new stage or reconciles an existing one.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BuildMode {
    #[default]
    Create,
    Update {
        stage_id: StageId,
        /// Let a bye in the input replace a recorded opponent.
        enable_byes: bool,
    },
}

/// How an existing record is found in update mode.
#[derive(Clone, Debug, PartialEq)]
pub enum Key {
    /// By identity; the record must exist.
    Id(Id),
    /// By parent identity and ordinal.
    Fields(Filter),
}

/// A record kind the upsert engine knows how to reconcile.
pub trait Upsertable: Record + Sized {
    fn key(&self) -> Key;

    /// Fill in derived fields of a record about to be inserted.
    fn derive_fields(&mut self) {}

    /// Record to write over `existing`, or `None` to reuse `existing` as is.
    fn merge(self, existing: &Self, allow_bye_override: bool) -> Option<Self>;
}

impl Upsertable for Stage {
    fn key(&self) -> Key {
        Key::Id(self.id)
    }

    fn merge(self, existing: &Self, _allow_bye_override: bool) -> Option<Self> {
        let settings = self.settings.merged_over(existing.settings.clone());
        Some(Stage {
            id: existing.id,
            settings,
            ..self
        })
    }
}

impl Upsertable for Group {
    fn key(&self) -> Key {
        Key::Fields(
            Filter::new()
                .by_id("stage_id", self.stage_id)
                .by("number", self.number),
        )
    }

    fn merge(self, _existing: &Self, _allow_bye_override: bool) -> Option<Self> {
        None
    }
}

impl Upsertable for Round {
    fn key(&self) -> Key {
        Key::Fields(
            Filter::new()
                .by_id("group_id", self.group_id)
                .by("number", self.number),
        )
    }

    fn merge(self, _existing: &Self, _allow_bye_override: bool) -> Option<Self> {
        None
    }
}

impl Upsertable for Match {
    fn key(&self) -> Key {
        Key::Fields(
            Filter::new()
                .by_id("round_id", self.round_id)
                .by("number", self.number),
        )
    }

    fn derive_fields(&mut self) {
        infer_duel(self);
    }

    fn merge(self, existing: &Self, allow_bye_override: bool) -> Option<Self> {
        let mut merged = merge_on_update(self, existing, allow_bye_override);
        // Keep a game count configured on the match itself.
        merged.child_count = existing.child_count;
        merged.id = existing.id;
        Some(merged)
    }
}

impl Upsertable for MatchGame {
    fn key(&self) -> Key {
        Key::Fields(
            Filter::new()
                .by_id("parent_id", self.parent_id)
                .by("number", self.number),
        )
    }

    fn derive_fields(&mut self) {
        infer_duel(self);
    }

    fn merge(self, existing: &Self, allow_bye_override: bool) -> Option<Self> {
        let mut merged = merge_on_update(self, existing, allow_bye_override);
        merged.id = existing.id;
        Some(merged)
    }
}

/// Typed access to a [`Storage`], turning sentinel returns into errors.
pub struct Records<'a, S: Storage + ?Sized> {
    storage: &'a S,
}

impl<'a, S: Storage + ?Sized> Records<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    pub async fn all<T: Record>(&self, filter: Option<&Filter>) -> Result<Vec<T>, BracketError> {
        let rows = self.storage.select(T::TABLE, filter).await?;
        let records = rows
            .unwrap_or_default()
            .into_iter()
            .map(from_row::<T>)
            .collect::<Result<_, _>>()?;
        Ok(records)
    }

    pub async fn first<T: Record>(&self, filter: &Filter) -> Result<Option<T>, BracketError> {
        let row = self.storage.select_first(T::TABLE, filter).await?;
        Ok(row.map(from_row::<T>).transpose()?)
    }

    pub async fn by_id<T: Record>(&self, id: Id) -> Result<Option<T>, BracketError> {
        let row = self.storage.select_by_id(T::TABLE, id).await?;
        Ok(row.map(from_row::<T>).transpose()?)
    }

    /// Insert `record` and return it with its new identity.
    pub async fn insert<T: Record>(&self, mut record: T) -> Result<T, BracketError> {
        let id = self.storage.insert(T::TABLE, to_row(&record)?).await?;
        if id.is_nil() {
            return Err(BracketError::persistence(format!(
                "Could not insert the {}.",
                T::TABLE
            )));
        }
        record.set_id(id);
        Ok(record)
    }

    pub async fn insert_many<T: Record>(&self, records: &[T]) -> Result<(), BracketError> {
        let rows = records.iter().map(to_row).collect::<Result<Vec<_>, _>>()?;
        if !self.storage.insert_many(T::TABLE, rows).await? {
            return Err(BracketError::persistence(format!(
                "Could not insert the {} rows.",
                T::TABLE
            )));
        }
        Ok(())
    }

    pub async fn update<T: Record>(&self, record: &T) -> Result<(), BracketError> {
        if !self
            .storage
            .update(T::TABLE, record.id(), to_row(record)?)
            .await?
        {
            return Err(BracketError::persistence(format!(
                "Could not update the {}.",
                T::TABLE
            )));
        }
        Ok(())
    }
}

/// Lookup-or-insert over every [`Upsertable`] kind.
pub struct Upserter<'a, S: Storage + ?Sized> {
    records: Records<'a, S>,
    mode: BuildMode,
}

impl<'a, S: Storage + ?Sized> Upserter<'a, S> {
    pub fn new(storage: &'a S, mode: BuildMode) -> Self {
        Self {
            records: Records::new(storage),
            mode,
        }
    }

    async fn insert<T: Upsertable>(&self, mut candidate: T) -> Result<T, BracketError> {
        candidate.derive_fields();
        self.records.insert(candidate).await
    }

    /// Store `candidate` and return the persisted record (existing identity, or a new one).
    ///
    /// Create mode always inserts. Update mode reconciles with the record found
    /// under the candidate's key, and inserts only when there is none.
    pub async fn upsert<T: Upsertable>(&self, candidate: T) -> Result<T, BracketError> {
        let BuildMode::Update { enable_byes, .. } = self.mode else {
            return self.insert(candidate).await;
        };

        let existing = match candidate.key() {
            Key::Id(id) => {
                let found = self.records.by_id::<T>(id).await?;
                Some(found.ok_or_else(|| {
                    BracketError::validation(format!("No {} found with id {id}.", T::TABLE))
                })?)
            }
            Key::Fields(filter) => self.records.first::<T>(&filter).await?,
        };

        let Some(existing) = existing else {
            debug!("No existing {}, inserting", T::TABLE);
            return self.insert(candidate).await;
        };

        match candidate.merge(&existing, enable_byes) {
            None => {
                debug!("Reusing {} {}", T::TABLE, existing.id());
                Ok(existing)
            }
            Some(mut merged) => {
                merged.set_id(existing.id());
                self.records.update(&merged).await?;
                debug!("Updated {} {}", T::TABLE, existing.id());
                Ok(merged)
            }
        }
    }
}
