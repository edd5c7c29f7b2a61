use rusqlite::Connection;

use tennis_tracker::store::{
    LIVE_TABLE, LiveSnapshotRow, MATCH_TABLE, PROFILE_TABLE, Page, PlayerMatchRow,
    PlayerProfileRow, count_rows, ensure_schema, insert_live_row, load_live_rows,
    load_player_matches, load_player_profile, load_player_profiles, replace_live_snapshot,
    upsert_player_match, upsert_player_profile,
};

fn memory_db() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory db");
    ensure_schema(&conn).expect("schema");
    conn
}

fn live_row(id: i64, metric: &str) -> LiveSnapshotRow {
    LiveSnapshotRow {
        id,
        tournament: "ATP Rome".to_string(),
        round: "R16".to_string(),
        home_team: "A".to_string(),
        away_team: "B".to_string(),
        match_progress: "1st set".to_string(),
        period: "ALL".to_string(),
        home_score: "3".to_string(),
        away_score: "5".to_string(),
        statistic_group: "Service".to_string(),
        statistic_name: metric.to_string(),
        home_stat: "1".to_string(),
        away_stat: "2".to_string(),
        home_player_id: "10".to_string(),
        away_player_id: "20".to_string(),
    }
}

fn profile(id: &str, name: &str, ranking: i64) -> PlayerProfileRow {
    PlayerProfileRow {
        player_id: id.to_string(),
        name: name.to_string(),
        country: "Italy".to_string(),
        ranking,
    }
}

fn match_row(id: &str, home_score: &str) -> PlayerMatchRow {
    PlayerMatchRow {
        match_id: id.to_string(),
        tournament: "ATP Madrid".to_string(),
        status: "Ended".to_string(),
        start_time: "2024-05-06 12:53:20".to_string(),
        home_team: "A".to_string(),
        away_team: "E".to_string(),
        home_score: home_score.to_string(),
        away_score: "4-6 2-6".to_string(),
        player_id: "10".to_string(),
    }
}

#[test]
fn profile_first_write_wins() {
    let conn = memory_db();
    assert!(upsert_player_profile(&conn, &profile("10", "A", 2)).expect("insert"));
    assert!(!upsert_player_profile(&conn, &profile("10", "Renamed", 1)).expect("conflict"));

    let stored = load_player_profile(&conn, "10")
        .expect("query")
        .expect("row present");
    assert_eq!(stored, profile("10", "A", 2));
    assert_eq!(count_rows(&conn, PROFILE_TABLE).expect("count"), 1);
}

#[test]
fn match_reingest_is_a_no_op() {
    let conn = memory_db();
    assert!(upsert_player_match(&conn, &match_row("5001", "6-4 6-2")).expect("insert"));
    assert!(!upsert_player_match(&conn, &match_row("5001", "7-5 7-5")).expect("conflict"));

    let rows = load_player_matches(&conn, Page::default()).expect("load");
    assert_eq!(rows, vec![match_row("5001", "6-4 6-2")]);
}

#[test]
fn replace_snapshot_drops_previous_rows() {
    let mut conn = memory_db();
    replace_live_snapshot(&mut conn, &[live_row(1, "Aces"), live_row(1, "Double faults")])
        .expect("first snapshot");
    replace_live_snapshot(&mut conn, &[live_row(2, "Aces")]).expect("second snapshot");

    let rows = load_live_rows(&conn, Page::default()).expect("load");
    assert_eq!(rows, vec![live_row(2, "Aces")]);
}

#[test]
fn live_rows_allow_duplicates() {
    let conn = memory_db();
    insert_live_row(&conn, &live_row(1, "Aces")).expect("first");
    insert_live_row(&conn, &live_row(1, "Aces")).expect("second");
    assert_eq!(count_rows(&conn, LIVE_TABLE).expect("count"), 2);
}

#[test]
fn pages_follow_insertion_order() {
    let conn = memory_db();
    for n in 0..25 {
        upsert_player_profile(&conn, &profile(&format!("p{n:02}"), "X", n)).expect("insert");
    }

    let first = load_player_profiles(&conn, Page::new(1, 10).expect("page")).expect("load");
    assert_eq!(first.len(), 10);
    assert_eq!(first[0].player_id, "p00");

    let third = load_player_profiles(&conn, Page::new(3, 10).expect("page")).expect("load");
    assert_eq!(third.len(), 5);
    assert_eq!(third[4].player_id, "p24");

    let past_end = load_player_profiles(&conn, Page::new(4, 10).expect("page")).expect("load");
    assert!(past_end.is_empty());
}

#[test]
fn schema_uses_expected_column_order() {
    let conn = memory_db();
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
        .expect("prepare");
    let mut columns = |table: &str| -> Vec<String> {
        stmt.query_map([table], |row| row.get::<_, String>(0))
            .expect("query")
            .collect::<Result<_, _>>()
            .expect("decode")
    };
    assert_eq!(
        columns(MATCH_TABLE),
        vec![
            "match_id", "tournament", "status", "start_time", "home_team", "away_team",
            "home_score", "away_score", "player_id"
        ]
    );
    assert_eq!(
        columns(PROFILE_TABLE),
        vec!["player_id", "name", "country", "ranking"]
    );
    let live = columns(LIVE_TABLE);
    assert_eq!(live.len(), 15);
    assert_eq!(live[0], "id");
    assert_eq!(live[14], "away_player_id");
}
