use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

pub const LIVE_TABLE: &str = "Live_Tennis_Data";
pub const PROFILE_TABLE: &str = "Players_main_info";
pub const MATCH_TABLE: &str = "Player_matches_info";

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// One (event, group, metric) row of the current poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveSnapshotRow {
    pub id: i64,
    pub tournament: String,
    pub round: String,
    pub home_team: String,
    pub away_team: String,
    pub match_progress: String,
    pub period: String,
    pub home_score: String,
    pub away_score: String,
    pub statistic_group: String,
    pub statistic_name: String,
    pub home_stat: String,
    pub away_stat: String,
    pub home_player_id: String,
    pub away_player_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerProfileRow {
    pub player_id: String,
    pub name: String,
    pub country: String,
    pub ranking: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerMatchRow {
    pub match_id: String,
    pub tournament: String,
    pub status: String,
    pub start_time: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: String,
    pub away_score: String,
    pub player_id: String,
}

/// 1-based page request. Build with [`Page::new`] to get bounds checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Result<Self> {
        if page < 1 {
            return Err(anyhow!("page must be >= 1"));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(anyhow!("limit must be between 1 and {MAX_PAGE_LIMIT}"));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Creates the three tables when missing. Safe to run on every start.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS Live_Tennis_Data (
            id INTEGER NOT NULL,
            tournament TEXT,
            round TEXT,
            home_team TEXT,
            away_team TEXT,
            match_progress TEXT,
            period TEXT,
            home_score TEXT,
            away_score TEXT,
            statistic_group TEXT,
            statistic_name TEXT,
            home_stat TEXT,
            away_stat TEXT,
            home_player_id TEXT,
            away_player_id TEXT
        );
        CREATE TABLE IF NOT EXISTS Players_main_info (
            player_id TEXT PRIMARY KEY,
            name TEXT,
            country TEXT,
            ranking INTEGER
        );
        CREATE TABLE IF NOT EXISTS Player_matches_info (
            match_id TEXT PRIMARY KEY,
            tournament TEXT,
            status TEXT,
            start_time TEXT,
            home_team TEXT,
            away_team TEXT,
            home_score TEXT,
            away_score TEXT,
            player_id TEXT
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn clear_live_snapshot(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM Live_Tennis_Data", [])
        .context("truncate live table")?;
    Ok(())
}

/// Swaps the whole live table for `rows` in one transaction.
pub fn replace_live_snapshot(conn: &mut Connection, rows: &[LiveSnapshotRow]) -> Result<()> {
    let tx = conn.transaction().context("begin snapshot transaction")?;
    tx.execute("DELETE FROM Live_Tennis_Data", [])
        .context("truncate live table")?;
    for row in rows {
        insert_live_row(&tx, row)?;
    }
    tx.commit().context("commit snapshot transaction")?;
    Ok(())
}

pub fn insert_live_row(conn: &Connection, row: &LiveSnapshotRow) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO Live_Tennis_Data (
            id, tournament, round, home_team, away_team, match_progress, period,
            home_score, away_score, statistic_group, statistic_name,
            home_stat, away_stat, home_player_id, away_player_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
        params![
            row.id,
            row.tournament,
            row.round,
            row.home_team,
            row.away_team,
            row.match_progress,
            row.period,
            row.home_score,
            row.away_score,
            row.statistic_group,
            row.statistic_name,
            row.home_stat,
            row.away_stat,
            row.home_player_id,
            row.away_player_id,
        ],
    )
    .context("insert live row")?;
    Ok(())
}

/// First write wins. Returns `false` when the player already existed.
pub fn upsert_player_profile(conn: &Connection, row: &PlayerProfileRow) -> Result<bool> {
    let changed = conn
        .execute(
            "INSERT INTO Players_main_info (player_id, name, country, ranking)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(player_id) DO NOTHING",
            params![row.player_id, row.name, row.country, row.ranking],
        )
        .context("insert player profile")?;
    Ok(changed > 0)
}

/// Existing match rows are never refreshed. Returns `false` on conflict.
pub fn upsert_player_match(conn: &Connection, row: &PlayerMatchRow) -> Result<bool> {
    let changed = conn
        .execute(
            r#"
            INSERT INTO Player_matches_info (
                match_id, tournament, status, start_time, home_team, away_team,
                home_score, away_score, player_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(match_id) DO NOTHING
            "#,
            params![
                row.match_id,
                row.tournament,
                row.status,
                row.start_time,
                row.home_team,
                row.away_team,
                row.home_score,
                row.away_score,
                row.player_id,
            ],
        )
        .context("insert player match")?;
    Ok(changed > 0)
}

pub fn load_live_rows(conn: &Connection, page: Page) -> Result<Vec<LiveSnapshotRow>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                id, tournament, round, home_team, away_team, match_progress, period,
                home_score, away_score, statistic_group, statistic_name,
                home_stat, away_stat, home_player_id, away_player_id
            FROM Live_Tennis_Data
            ORDER BY rowid ASC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .context("prepare live rows query")?;
    let rows = stmt
        .query_map(params![page.limit, page.offset()], |row| {
            Ok(LiveSnapshotRow {
                id: row.get(0)?,
                tournament: text(row, 1)?,
                round: text(row, 2)?,
                home_team: text(row, 3)?,
                away_team: text(row, 4)?,
                match_progress: text(row, 5)?,
                period: text(row, 6)?,
                home_score: text(row, 7)?,
                away_score: text(row, 8)?,
                statistic_group: text(row, 9)?,
                statistic_name: text(row, 10)?,
                home_stat: text(row, 11)?,
                away_stat: text(row, 12)?,
                home_player_id: text(row, 13)?,
                away_player_id: text(row, 14)?,
            })
        })
        .context("query live rows")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode live row")?);
    }
    Ok(out)
}

pub fn load_player_profiles(conn: &Connection, page: Page) -> Result<Vec<PlayerProfileRow>> {
    let mut stmt = conn
        .prepare(
            "SELECT player_id, name, country, ranking
             FROM Players_main_info
             ORDER BY rowid ASC
             LIMIT ?1 OFFSET ?2",
        )
        .context("prepare player profiles query")?;
    let rows = stmt
        .query_map(params![page.limit, page.offset()], |row| {
            Ok(PlayerProfileRow {
                player_id: text(row, 0)?,
                name: text(row, 1)?,
                country: text(row, 2)?,
                ranking: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
            })
        })
        .context("query player profiles")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode player profile row")?);
    }
    Ok(out)
}

pub fn load_player_matches(conn: &Connection, page: Page) -> Result<Vec<PlayerMatchRow>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                match_id, tournament, status, start_time, home_team, away_team,
                home_score, away_score, player_id
            FROM Player_matches_info
            ORDER BY rowid ASC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .context("prepare player matches query")?;
    let rows = stmt
        .query_map(params![page.limit, page.offset()], |row| {
            Ok(PlayerMatchRow {
                match_id: text(row, 0)?,
                tournament: text(row, 1)?,
                status: text(row, 2)?,
                start_time: text(row, 3)?,
                home_team: text(row, 4)?,
                away_team: text(row, 5)?,
                home_score: text(row, 6)?,
                away_score: text(row, 7)?,
                player_id: text(row, 8)?,
            })
        })
        .context("query player matches")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode player match row")?);
    }
    Ok(out)
}

pub fn load_player_profile(conn: &Connection, player_id: &str) -> Result<Option<PlayerProfileRow>> {
    conn.query_row(
        "SELECT player_id, name, country, ranking FROM Players_main_info WHERE player_id = ?1",
        params![player_id],
        |row| {
            Ok(PlayerProfileRow {
                player_id: text(row, 0)?,
                name: text(row, 1)?,
                country: text(row, 2)?,
                ranking: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
            })
        },
    )
    .optional()
    .context("query player profile")
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<u64> {
    if ![LIVE_TABLE, PROFILE_TABLE, MATCH_TABLE].contains(&table) {
        return Err(anyhow!("unknown table {table}"));
    }
    let n = conn
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get::<_, i64>(0)
        })
        .with_context(|| format!("count rows in {table}"))?;
    Ok(n.max(0) as u64)
}

fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}
