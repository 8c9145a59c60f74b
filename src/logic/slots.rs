//! Seeding → participant slots. Named participants missing from the tournament are registered.

use crate::logic::upsert::Records;
use crate::models::{BracketError, Participant, ParticipantId, Slot, StageInput, TournamentId};
use crate::storage::{Filter, Storage};
use log::{debug, info};
use std::collections::HashSet;
use std::hash::Hash;
use std::io;

/// Seeding as given by the caller. `None` entries are byes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Seeding {
    Names(Vec<Option<String>>),
    Ids(Vec<Option<ParticipantId>>),
}

impl Seeding {
    /// Ids take precedence over names when both are given.
    pub fn from_input(input: &StageInput) -> Option<Seeding> {
        match (&input.seeding_ids, &input.seeding) {
            (Some(ids), _) => Some(Seeding::Ids(ids.clone())),
            (None, Some(names)) => Some(Seeding::Names(names.clone())),
            (None, None) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Seeding::Names(names) => names.len(),
            Seeding::Ids(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Competitor count of the stage: `settings.size`, else the seeding length.
pub fn planned_size(input: &StageInput) -> Result<usize, BracketError> {
    let seeding = Seeding::from_input(input);
    let size = input
        .settings
        .size
        .or_else(|| seeding.as_ref().map(Seeding::len))
        .unwrap_or(0);
    if size == 0 && seeding.is_none() {
        return Err(BracketError::validation(
            "Either size or seeding must be given.",
        ));
    }
    Ok(size)
}

/// Fails if a participant appears twice. Byes may repeat.
pub fn ensure_no_duplicates<T: Eq + Hash>(entries: &[Option<T>]) -> Result<(), BracketError> {
    let mut seen = HashSet::new();
    if entries.iter().flatten().any(|entry| !seen.insert(entry)) {
        return Err(BracketError::validation(
            "The seeding has a duplicate participant.",
        ));
    }
    Ok(())
}

/// Pad the seeding with byes up to `size`. A longer seeding is rejected.
pub fn fix_seeding<T>(mut entries: Vec<Option<T>>, size: usize) -> Result<Vec<Option<T>>, BracketError> {
    if entries.len() > size {
        return Err(BracketError::validation(format!(
            "The seeding has more participants ({}) than the size of the stage ({size}).",
            entries.len()
        )));
    }
    entries.resize_with(size, || None);
    Ok(entries)
}

/// Read a seeding by name from CSV: first column is the name, an empty cell is a bye.
/// A leading `name` header row is skipped.
pub fn seeding_from_csv<R: io::Read>(reader: R) -> Result<Vec<Option<String>>, BracketError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| BracketError::validation(format!("Invalid seeding CSV: {e}")))?;
        let name = record.get(0).unwrap_or_default();
        if i == 0 && name.eq_ignore_ascii_case("name") {
            continue;
        }
        entries.push((!name.is_empty()).then(|| name.to_string()));
    }
    Ok(entries)
}

/// Turns a stage's seeding into slots for one tournament.
pub struct SlotResolver<'a, S: Storage + ?Sized> {
    records: Records<'a, S>,
    tournament_id: TournamentId,
}

impl<'a, S: Storage + ?Sized> SlotResolver<'a, S> {
    pub fn new(storage: &'a S, tournament_id: TournamentId) -> Self {
        Self {
            records: Records::new(storage),
            tournament_id,
        }
    }

    fn tournament_filter(&self) -> Filter {
        Filter::new().by_id("tournament_id", self.tournament_id)
    }

    /// Ordered slots for `input`, one per competitor. Writes the resolved size back to `input.settings`.
    ///
    /// - size only: TBD slots, no storage access;
    /// - by name: missing participants are registered first;
    /// - by id: every id must already be registered.
    pub async fn resolve(&self, input: &mut StageInput) -> Result<Vec<Slot>, BracketError> {
        let size = planned_size(input)?;
        input.settings.size = Some(size);

        let Some(seeding) = Seeding::from_input(input) else {
            return Ok((1..=size as u32)
                .map(|position| Slot::Tbd { position })
                .collect());
        };

        match seeding {
            Seeding::Names(names) => {
                ensure_no_duplicates(&names)?;
                let names = fix_seeding(names, size)?;
                self.slots_from_names(names).await
            }
            Seeding::Ids(ids) => {
                ensure_no_duplicates(&ids)?;
                let ids = fix_seeding(ids, size)?;
                self.slots_from_ids(ids).await
            }
        }
    }

    async fn slots_from_names(&self, seeding: Vec<Option<String>>) -> Result<Vec<Slot>, BracketError> {
        let participants: Vec<Participant> = {
            let mut seen = HashSet::new();
            seeding
                .iter()
                .flatten()
                .filter(|name| seen.insert(name.as_str()))
                .map(|name| Participant::new(self.tournament_id, name.as_str()))
                .collect()
        };

        if participants.is_empty() {
            return Err(BracketError::validation(
                "The seeding has no participants.",
            ));
        }
        self.register(&participants).await?;

        let registered: Vec<Participant> = self.records.all(Some(&self.tournament_filter())).await?;
        if registered.is_empty() {
            return Err(BracketError::persistence(
                "Error getting registered participants.",
            ));
        }

        seeding
            .into_iter()
            .zip(1u32..)
            .map(|(entry, position)| match entry {
                None => Ok(Slot::Bye),
                Some(name) => registered
                    .iter()
                    .find(|p| p.name == name)
                    .map(|p| Slot::Participant { id: p.id, position })
                    .ok_or_else(|| {
                        BracketError::persistence(format!("Participant name not found: {name}."))
                    }),
            })
            .collect()
    }

    async fn slots_from_ids(
        &self,
        seeding: Vec<Option<ParticipantId>>,
    ) -> Result<Vec<Slot>, BracketError> {
        let registered: Vec<Participant> = self.records.all(Some(&self.tournament_filter())).await?;
        if registered.is_empty() {
            return Err(BracketError::validation("No available participants."));
        }

        seeding
            .into_iter()
            .zip(1u32..)
            .map(|(entry, position)| match entry {
                None => Ok(Slot::Bye),
                Some(id) if registered.iter().any(|p| p.id == id) => {
                    Ok(Slot::Participant { id, position })
                }
                Some(id) => Err(BracketError::validation(format!(
                    "Participant ID not found: {id}."
                ))),
            })
            .collect()
    }

    /// Insert participants whose name is not registered yet (all of them, in bulk, when none are).
    async fn register(&self, participants: &[Participant]) -> Result<(), BracketError> {
        let existing: Vec<Participant> = self.records.all(Some(&self.tournament_filter())).await?;

        if existing.is_empty() {
            info!(
                "Registering {} participants for tournament {}",
                participants.len(),
                self.tournament_id
            );
            return self.records.insert_many(participants).await;
        }

        for participant in participants {
            if existing.iter().any(|p| p.name == participant.name) {
                continue;
            }
            debug!("Registering participant {}", participant.name);
            self.records.insert(participant.clone()).await?;
        }
        Ok(())
    }
}
