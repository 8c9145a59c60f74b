//! Integration tests for update mode: re-running a build reconciles instead of duplicating.

mod common;

use common::{match_ids, ncaa_input, opponent_name, round_matches, team_names, total_rows};
use gymnastics_brackets::{
    ErrorKind, Manager, MatchUpdate, MemoryStorage, Opponent, Outcome, StageInput, Status, Table,
};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn rebuilding_with_the_same_input_is_idempotent() {
    let tournament = Uuid::new_v4();
    let manager = Manager::new(MemoryStorage::new());
    let stage = manager
        .create_stage(ncaa_input(tournament).with_child_count(2))
        .await
        .unwrap();
    let before = manager.stage_data(stage.id).await.unwrap();
    let rows_before = total_rows(manager.storage()).await;

    for _ in 0..2 {
        let again = manager
            .update_stage(stage.id, ncaa_input(tournament).with_child_count(2), false)
            .await
            .unwrap();
        assert_eq!(again.id, stage.id);
        assert_eq!(again.number, stage.number);
    }

    let after = manager.stage_data(stage.id).await.unwrap();
    assert_eq!(total_rows(manager.storage()).await, rows_before);
    assert_eq!(after.groups, before.groups);
    assert_eq!(after.rounds, before.rounds);
    assert_eq!(match_ids(&after), match_ids(&before));
    assert_eq!(after.matches, before.matches);
    assert_eq!(after.match_games, before.match_games);
}

#[tokio::test]
async fn recorded_results_survive_a_rebuild() {
    let tournament = Uuid::new_v4();
    let manager = Manager::new(MemoryStorage::new());
    let stage = manager.create_stage(ncaa_input(tournament)).await.unwrap();
    let data = manager.stage_data(stage.id).await.unwrap();
    let opening = round_matches(&data, 1)[0].id;

    let mut update = MatchUpdate::scores(197.425, 196.9);
    if let Some(patch) = update.opponent1.as_mut() {
        patch.result = Some(Outcome::Win);
    }
    let played = manager.update_match(opening, update).await.unwrap();
    assert_eq!(played.status, Status::Completed);

    manager
        .update_stage(stage.id, ncaa_input(tournament), false)
        .await
        .unwrap();

    let data = manager.stage_data(stage.id).await.unwrap();
    let rebuilt = round_matches(&data, 1)[0];
    assert_eq!(rebuilt.id, opening);
    assert_eq!(rebuilt.status, Status::Completed);
    let first = rebuilt.opponent1.participant().unwrap();
    assert_eq!(first.score, Some(197.425));
    assert_eq!(first.result, Some(Outcome::Win));
    assert_eq!(
        rebuilt.opponent2.participant().and_then(|r| r.result),
        Some(Outcome::Loss)
    );
}

#[tokio::test]
async fn placeholders_are_filled_in_by_a_later_seeding() {
    let tournament = Uuid::new_v4();
    let manager = Manager::new(MemoryStorage::new());
    let stage = manager
        .create_stage(StageInput::new("Regional", tournament).with_size(32))
        .await
        .unwrap();

    manager
        .update_stage(
            stage.id,
            StageInput::new("Regional", tournament).with_seeding(team_names(32)),
            false,
        )
        .await
        .unwrap();

    let data = manager.stage_data(stage.id).await.unwrap();
    assert_eq!(data.matches.len(), 30);
    let opening = round_matches(&data, 1)[0];
    assert_eq!(opening.status, Status::Ready);
    assert_eq!(opening_names(&data, opening), ("Team 1", "Team 2"));
}

fn opening_names<'a>(
    data: &'a gymnastics_brackets::StageData,
    m: &gymnastics_brackets::Match,
) -> (&'a str, &'a str) {
    (
        opponent_name(data, &m.opponent1).unwrap_or_default(),
        opponent_name(data, &m.opponent2).unwrap_or_default(),
    )
}

#[tokio::test]
async fn byes_replace_known_opponents_only_when_enabled() {
    let tournament = Uuid::new_v4();
    let manager = Manager::new(MemoryStorage::new());
    let stage = manager.create_stage(ncaa_input(tournament)).await.unwrap();

    let with_bye = || {
        let mut seeding: Vec<Option<String>> = team_names(32).into_iter().map(Some).collect();
        seeding[1] = None;
        StageInput {
            seeding: Some(seeding),
            ..StageInput::new("NCAA Gymnastics Tournament", tournament)
        }
    };

    manager
        .update_stage(stage.id, with_bye(), false)
        .await
        .unwrap();
    let data = manager.stage_data(stage.id).await.unwrap();
    let opening = round_matches(&data, 1)[0];
    assert_eq!(opponent_name(&data, &opening.opponent2), Some("Team 2"));
    assert_eq!(opening.status, Status::Ready);

    manager.update_stage(stage.id, with_bye(), true).await.unwrap();
    let data = manager.stage_data(stage.id).await.unwrap();
    let opening = round_matches(&data, 1)[0];
    assert_eq!(opening.opponent2, Opponent::Bye);
    // Status is never lowered, even when an opponent is removed.
    assert_eq!(opening.status, Status::Ready);
    assert_eq!(manager.storage().count(Table::Match).await, 30);

    manager
        .update_stage(stage.id, ncaa_input(tournament), false)
        .await
        .unwrap();
    let data = manager.stage_data(stage.id).await.unwrap();
    let opening = round_matches(&data, 1)[0];
    assert_eq!(opponent_name(&data, &opening.opponent2), Some("Team 2"));
    assert_eq!(opening.opponent1.participant().and_then(|r| r.result), None);
    assert_eq!(opening.status, Status::Ready);
}

#[tokio::test]
async fn a_bye_filled_in_later_leaves_the_match_unplayed() {
    let tournament = Uuid::new_v4();
    let manager = Manager::new(MemoryStorage::new());
    let stage = manager
        .create_stage(
            StageInput::new("NCAA Gymnastics Tournament", tournament)
                .with_seeding(team_names(31))
                .with_size(32),
        )
        .await
        .unwrap();

    let data = manager.stage_data(stage.id).await.unwrap();
    let last = *round_matches(&data, 1).iter().find(|m| m.number == 16).unwrap();
    assert_eq!(opponent_name(&data, &last.opponent1), Some("Team 31"));
    assert_eq!(last.opponent2, Opponent::Bye);
    assert_eq!(
        last.opponent1.participant().and_then(|r| r.result),
        Some(Outcome::Win)
    );
    assert_eq!(last.status, Status::Locked);

    manager
        .update_stage(stage.id, ncaa_input(tournament), false)
        .await
        .unwrap();

    let data = manager.stage_data(stage.id).await.unwrap();
    let last = round_matches(&data, 1)
        .into_iter()
        .find(|m| m.number == 16)
        .unwrap();
    assert_eq!(opponent_name(&data, &last.opponent2), Some("Team 32"));
    assert_eq!(last.opponent1.participant().and_then(|r| r.result), None);
    assert_eq!(last.opponent2.participant().and_then(|r| r.result), None);
    assert_eq!(last.status, Status::Ready);
}

#[tokio::test]
async fn existing_game_count_is_kept() {
    let tournament = Uuid::new_v4();
    let manager = Manager::new(MemoryStorage::new());
    let stage = manager
        .create_stage(ncaa_input(tournament).with_child_count(3))
        .await
        .unwrap();

    let updated = manager
        .update_stage(stage.id, ncaa_input(tournament).with_child_count(1), false)
        .await
        .unwrap();
    assert_eq!(updated.settings.matches_child_count, Some(1));

    let data = manager.stage_data(stage.id).await.unwrap();
    assert!(data.matches.iter().all(|m| m.child_count == 3));
    assert_eq!(data.match_games.len(), 90);
}

#[tokio::test]
async fn stage_settings_are_shallow_merged() {
    let tournament = Uuid::new_v4();
    let manager = Manager::new(MemoryStorage::new());
    let mut input = ncaa_input(tournament);
    input.settings
        .extra
        .insert("venue".to_string(), json!("Fort Worth"));
    let stage = manager.create_stage(input).await.unwrap();

    let mut renamed = ncaa_input(tournament);
    renamed.name = "NCAA Championships".to_string();
    let updated = manager.update_stage(stage.id, renamed, false).await.unwrap();

    assert_eq!(updated.name, "NCAA Championships");
    assert_eq!(updated.settings.size, Some(32));
    assert_eq!(updated.settings.extra.get("venue"), Some(&json!("Fort Worth")));

    let stored = manager.stage_data(stage.id).await.unwrap().stage;
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn updating_a_missing_stage_fails() {
    let manager = Manager::new(MemoryStorage::new());
    let err = manager
        .update_stage(Uuid::new_v4(), ncaa_input(Uuid::new_v4()), false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(manager.storage().count(Table::Stage).await, 0);
}

#[tokio::test]
async fn update_may_not_take_another_stages_number() {
    let tournament = Uuid::new_v4();
    let manager = Manager::new(MemoryStorage::new());
    let first = manager.create_stage(ncaa_input(tournament)).await.unwrap();
    manager.create_stage(ncaa_input(tournament)).await.unwrap();

    let mut input = ncaa_input(tournament);
    input.number = Some(2);
    let err = manager.update_stage(first.id, input, false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let mut input = ncaa_input(tournament);
    input.number = Some(1);
    assert_eq!(
        manager.update_stage(first.id, input, false).await.unwrap().number,
        1
    );
}

#[tokio::test]
async fn a_stage_cannot_move_to_another_tournament() {
    let tournament = Uuid::new_v4();
    let manager = Manager::new(MemoryStorage::new());
    let stage = manager.create_stage(ncaa_input(tournament)).await.unwrap();
    let rows = total_rows(manager.storage()).await;

    let err = manager
        .update_stage(stage.id, ncaa_input(Uuid::new_v4()), false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(total_rows(manager.storage()).await, rows);
    assert_eq!(
        manager.stage_data(stage.id).await.unwrap().stage.tournament_id,
        tournament
    );
}
