//! Schedule file import.

use std::io::Write;

use tempfile::NamedTempFile;

use pickem::{PickemRepository, Schedule};

const SCHEDULE: &str = r##"
[[teams]]
abbreviation = "KC"
name = "Chiefs"
display_name = "Kansas City Chiefs"
color = "#E31837"

[[teams]]
abbreviation = "BAL"
name = "Ravens"
display_name = "Baltimore Ravens"

[[teams]]
abbreviation = "BUF"
name = "Bills"
display_name = "Buffalo Bills"

[[games]]
season = 2026
week = 1
home = "KC"
away = "BAL"
start_time = "2026-09-11T00:20:00"

[[games]]
season = 2026
week = 2
home = "BUF"
away = "KC"
start_time = "2026-09-17T17:00:00"
"##;

fn setup_test_db() -> (NamedTempFile, PickemRepository) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let repo = PickemRepository::new(db_path).expect("Failed to create repository");
    repo.migrate().expect("Migrations failed");
    (db_file, repo)
}

#[test]
fn test_import_creates_teams_and_games() {
    let (_db, repo) = setup_test_db();
    let schedule = Schedule::from_toml(SCHEDULE).expect("Parse failed");
    let summary = schedule.import(&repo).expect("Import failed");

    assert_eq!(*summary.teams(), 3);
    assert_eq!(*summary.games(), 2);

    let kc = repo
        .get_team_by_abbreviation("KC")
        .expect("Query failed")
        .expect("KC missing");
    assert_eq!(kc.color().as_deref(), Some("#E31837"));

    let week_one = repo.list_games(Some(2026), Some(1)).expect("List failed");
    assert_eq!(week_one.len(), 1);
    assert_eq!(week_one[0].home_team_id(), kc.id());
}

#[test]
fn test_reimport_is_idempotent() {
    let (_db, repo) = setup_test_db();
    let schedule = Schedule::from_toml(SCHEDULE).expect("Parse failed");
    schedule.import(&repo).expect("First import failed");
    schedule.import(&repo).expect("Second import failed");

    assert_eq!(repo.list_teams().expect("List failed").len(), 3);
    assert_eq!(repo.list_games(None, None).expect("List failed").len(), 2);
}

#[test]
fn test_reimport_moves_kickoff() {
    let (_db, repo) = setup_test_db();
    Schedule::from_toml(SCHEDULE)
        .expect("Parse failed")
        .import(&repo)
        .expect("Import failed");

    let revised = SCHEDULE.replace("2026-09-17T17:00:00", "2026-09-17T20:25:00");
    Schedule::from_toml(&revised)
        .expect("Parse failed")
        .import(&repo)
        .expect("Import failed");

    let week_two = repo.list_games(Some(2026), Some(2)).expect("List failed");
    assert_eq!(week_two.len(), 1);
    assert_eq!(week_two[0].start_time().to_string(), "2026-09-17 20:25:00");
}

#[test]
fn test_games_may_reference_stored_teams() {
    let (_db, repo) = setup_test_db();
    Schedule::from_toml(SCHEDULE)
        .expect("Parse failed")
        .import(&repo)
        .expect("Import failed");

    let games_only = r#"
[[games]]
season = 2026
week = 3
home = "BAL"
away = "BUF"
start_time = "2026-09-24T17:00:00"
"#;
    let summary = Schedule::from_toml(games_only)
        .expect("Parse failed")
        .import(&repo)
        .expect("Import failed");
    assert_eq!(*summary.teams(), 0);
    assert_eq!(*summary.games(), 1);
}

#[test]
fn test_unknown_team_writes_nothing() {
    let (_db, repo) = setup_test_db();
    let broken = format!(
        "{}\n[[games]]\nseason = 2026\nweek = 3\nhome = \"KC\"\naway = \"NOPE\"\nstart_time = \"2026-09-24T17:00:00\"\n",
        SCHEDULE
    );
    let err = Schedule::from_toml(&broken)
        .expect("Parse failed")
        .import(&repo)
        .expect_err("Unknown team should fail");
    assert!(err.message.contains("NOPE"));
    assert!(repo.list_teams().expect("List failed").is_empty());
    assert!(repo.list_games(None, None).expect("List failed").is_empty());
}

#[test]
fn test_team_cannot_play_itself() {
    let (_db, repo) = setup_test_db();
    let selfplay = SCHEDULE.replace("away = \"BAL\"", "away = \"KC\"");
    let err = Schedule::from_toml(&selfplay)
        .expect("Parse failed")
        .import(&repo)
        .expect_err("Self matchup should fail");
    assert!(err.message.contains("cannot play itself"));
    assert!(repo.list_games(None, None).expect("List failed").is_empty());
}

#[test]
fn test_from_file_and_malformed_input() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(SCHEDULE.as_bytes()).expect("Write failed");
    let schedule = Schedule::from_file(file.path()).expect("Read failed");
    assert_eq!(schedule.games().len(), 2);

    assert!(Schedule::from_toml("[[games]]\nseason = \"soon\"").is_err());
    assert!(Schedule::from_file("/nonexistent/schedule.toml").is_err());
}

#[test]
fn test_abbreviations_are_case_insensitive() {
    let (_db, repo) = setup_test_db();
    let lower = r#"
[[teams]]
abbreviation = "kc"
name = "Chiefs"
display_name = "Kansas City Chiefs"

[[teams]]
abbreviation = "Bal"
name = "Ravens"
display_name = "Baltimore Ravens"

[[games]]
season = 2026
week = 1
home = "KC"
away = "bal"
start_time = "2026-09-11T00:20:00"
"#;
    Schedule::from_toml(lower)
        .expect("Parse failed")
        .import(&repo)
        .expect("Import failed");
    Schedule::from_toml(SCHEDULE)
        .expect("Parse failed")
        .import(&repo)
        .expect("Import failed");

    let teams = repo.list_teams().expect("List failed");
    let abbrs: Vec<&str> = teams.iter().map(|t| t.abbreviation().as_str()).collect();
    assert_eq!(abbrs, ["BAL", "BUF", "KC"]);
    assert_eq!(repo.list_games(Some(2026), Some(1)).expect("List failed").len(), 1);
}

#[test]
fn test_same_team_in_different_case_cannot_play_itself() {
    let (_db, repo) = setup_test_db();
    let selfplay = SCHEDULE.replace("away = \"BAL\"", "away = \"kc\"");
    let err = Schedule::from_toml(&selfplay)
        .expect("Parse failed")
        .import(&repo)
        .expect_err("Self matchup should fail");
    assert!(err.message.contains("cannot play itself"));
}

#[test]
fn test_storage_failure_rolls_back_whole_import() {
    let (_db, repo) = setup_test_db();
    // Week 0 passes file validation but is rejected by the games table
    let broken = SCHEDULE.replace("week = 2", "week = 0");
    let result = Schedule::from_toml(&broken)
        .expect("Parse failed")
        .import(&repo);

    assert!(result.is_err(), "Week 0 should be rejected by storage");
    assert!(repo.list_teams().expect("List failed").is_empty());
    assert!(repo.list_games(None, None).expect("List failed").is_empty());
}
