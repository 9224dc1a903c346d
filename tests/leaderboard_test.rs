//! Leaderboard scoring over stored picks and results.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use tempfile::NamedTempFile;

use pickem::{Leaderboard, LeaderboardScope, NewGame, NewTeam, NewUser, PickemRepository};

fn setup_test_db() -> (NamedTempFile, PickemRepository) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let repo = PickemRepository::new(db_path).expect("Failed to create repository");
    repo.migrate().expect("Migrations failed");
    (db_file, repo)
}

fn kickoff() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 9, 13)
        .and_then(|d| d.and_hms_opt(17, 0, 0))
        .expect("valid timestamp")
}

/// Two users over three games: week 1 and week 2 of 2026 plus week 1 of 2025.
/// Ann is right on everything; Bo is right only in 2025.
fn seeded() -> (NamedTempFile, PickemRepository) {
    let (db, repo) = setup_test_db();
    let ids: Vec<i32> = ["AAA", "BBB"]
        .iter()
        .map(|abbr| {
            *repo
                .create_team(NewTeam::new(
                    abbr.to_string(),
                    abbr.to_string(),
                    abbr.to_string(),
                    None,
                    None,
                ))
                .expect("Create team failed")
                .id()
        })
        .collect();
    let (a, b) = (ids[0], ids[1]);

    let ann = repo
        .create_user(NewUser::new("Ann".to_string(), None, false))
        .expect("Create user failed");
    let bo = repo
        .create_user(NewUser::new("Bo".to_string(), None, false))
        .expect("Create user failed");

    let games = [
        (2026, 1, kickoff(), (24, 10)),
        (2026, 2, kickoff() + TimeDelta::days(7), (31, 3)),
        (2025, 1, kickoff() - TimeDelta::days(364), (0, 7)),
    ];
    for (season, week, start, (home, away)) in games {
        let game = repo
            .create_game(NewGame::new(season, week, a, b, start))
            .expect("Create game failed");
        let winner = if home > away { a } else { b };
        let loser = if winner == a { b } else { a };
        let before = start - TimeDelta::hours(1);
        repo.upsert_pick(*ann.id(), *game.id(), winner, before)
            .expect("Pick failed");
        let bo_team = if season == 2025 { winner } else { loser };
        repo.upsert_pick(*bo.id(), *game.id(), bo_team, before)
            .expect("Pick failed");
        repo.record_result(*game.id(), home, away)
            .expect("Result failed");
    }
    (db, repo)
}

fn summary(board: &Leaderboard) -> Vec<(String, usize, u32, u32)> {
    board
        .entries()
        .iter()
        .map(|e| (e.display_name().clone(), *e.rank(), *e.correct(), *e.graded()))
        .collect()
}

#[test]
fn test_all_time_standings() {
    let (_db, repo) = seeded();
    let board = Leaderboard::load(&repo, LeaderboardScope::AllTime).expect("Load failed");
    assert_eq!(
        summary(&board),
        [("Ann".to_string(), 1, 3, 3), ("Bo".to_string(), 2, 1, 3)]
    );
}

#[test]
fn test_season_scope() {
    let (_db, repo) = seeded();
    let board = Leaderboard::load(&repo, LeaderboardScope::Season(2025)).expect("Load failed");
    assert_eq!(
        summary(&board),
        [("Ann".to_string(), 1, 1, 1), ("Bo".to_string(), 1, 1, 1)]
    );
}

#[test]
fn test_week_scope() {
    let (_db, repo) = seeded();
    let board = Leaderboard::load(&repo, LeaderboardScope::Week { week: 2, season: 2026 })
        .expect("Load failed");
    assert_eq!(
        summary(&board),
        [("Ann".to_string(), 1, 1, 1), ("Bo".to_string(), 2, 0, 1)]
    );
}

#[test]
fn test_users_without_picks_are_listed_last() {
    let (_db, repo) = seeded();
    repo.create_user(NewUser::new("Aaron".to_string(), None, false))
        .expect("Create user failed");
    let board = Leaderboard::load(&repo, LeaderboardScope::AllTime).expect("Load failed");
    let last = board.entries().last().expect("Entries missing");
    assert_eq!(last.display_name(), "Aaron");
    assert_eq!(*last.graded(), 0);
    assert_eq!(*last.rank(), 3);
}

#[test]
fn test_unfinished_games_do_not_count() {
    let (_db, repo) = setup_test_db();
    let a = repo
        .create_team(NewTeam::new("A".into(), "A".into(), "AAA".into(), None, None))
        .expect("Create team failed");
    let b = repo
        .create_team(NewTeam::new("B".into(), "B".into(), "BBB".into(), None, None))
        .expect("Create team failed");
    let user = repo
        .create_user(NewUser::new("Solo".to_string(), None, false))
        .expect("Create user failed");
    let game = repo
        .create_game(NewGame::new(2026, 1, *a.id(), *b.id(), kickoff()))
        .expect("Create game failed");
    repo.upsert_pick(*user.id(), *game.id(), *a.id(), kickoff() - TimeDelta::hours(1))
        .expect("Pick failed");

    let board = Leaderboard::load(&repo, LeaderboardScope::AllTime).expect("Load failed");
    assert_eq!(summary(&board), [("Solo".to_string(), 1, 0, 0)]);
}
