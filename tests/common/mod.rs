//! Shared helpers for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use gymnastics_brackets::{
    Filter, Id, Match, MemoryStorage, Opponent, Row, StageData, StageInput, Storage, StorageError,
    Table, TournamentId,
};
use std::collections::HashMap;
use uuid::Uuid;

pub fn team_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("Team {i}")).collect()
}

pub fn ncaa_input(tournament_id: TournamentId) -> StageInput {
    StageInput::new("NCAA Gymnastics Tournament", tournament_id).with_seeding(team_names(32))
}

pub async fn total_rows(storage: &MemoryStorage) -> usize {
    let mut total = 0;
    for table in Table::ALL {
        total += storage.count(table).await;
    }
    total
}

/// Participant name of an opponent, `None` for byes and TBDs.
pub fn opponent_name<'a>(data: &'a StageData, opponent: &Opponent) -> Option<&'a str> {
    let id = opponent.participant()?.id;
    data.participants
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.name.as_str())
}

pub fn round_matches(data: &StageData, round_number: u32) -> Vec<&Match> {
    let Some(round) = data.rounds.iter().find(|r| r.number == round_number) else {
        return Vec::new();
    };
    data.matches.iter().filter(|m| m.round_id == round.id).collect()
}

pub fn match_ids(data: &StageData) -> HashMap<(Id, u32), Id> {
    data.matches
        .iter()
        .map(|m| ((m.round_id, m.number), m.id))
        .collect()
}

/// Memory storage whose inserts into one table report the failure sentinel.
pub struct FailingInserts {
    pub inner: MemoryStorage,
    pub table: Table,
}

impl FailingInserts {
    pub fn new(table: Table) -> Self {
        Self {
            inner: MemoryStorage::new(),
            table,
        }
    }
}

#[async_trait]
impl Storage for FailingInserts {
    async fn select(
        &self,
        table: Table,
        filter: Option<&Filter>,
    ) -> Result<Option<Vec<Row>>, StorageError> {
        self.inner.select(table, filter).await
    }

    async fn select_by_id(&self, table: Table, id: Id) -> Result<Option<Row>, StorageError> {
        self.inner.select_by_id(table, id).await
    }

    async fn select_first(
        &self,
        table: Table,
        filter: &Filter,
    ) -> Result<Option<Row>, StorageError> {
        self.inner.select_first(table, filter).await
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Id, StorageError> {
        if table == self.table {
            return Ok(Uuid::nil());
        }
        self.inner.insert(table, row).await
    }

    async fn insert_many(&self, table: Table, rows: Vec<Row>) -> Result<bool, StorageError> {
        if table == self.table {
            return Ok(false);
        }
        self.inner.insert_many(table, rows).await
    }

    async fn update(&self, table: Table, id: Id, row: Row) -> Result<bool, StorageError> {
        self.inner.update(table, id, row).await
    }
}
