use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use chrono::DateTime;
use rand::Rng;
use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::sofa_fetch::{FetchError, LiveSource};
use crate::sofa_parse::{HistoryEvent, LiveEvent, StatisticsPayload};
use crate::stats_extract::{ALL_PERIOD, NOT_AVAILABLE, extract_statistic, tracked_pairs};
use crate::store::{
    LiveSnapshotRow, PlayerMatchRow, PlayerProfileRow, clear_live_snapshot,
    insert_live_row, upsert_player_match, upsert_player_profile,
};

const UNKNOWN: &str = "Unknown";
const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub events: usize,
    pub participants: usize,
    pub participants_failed: usize,
    pub profiles_written: usize,
    pub matches_written: usize,
    pub live_rows_written: usize,
    pub events_without_stats: usize,
    pub write_errors: usize,
    /// False when the old snapshot could not be cleared; no live rows were
    /// written that cycle.
    pub snapshot_replaced: bool,
}

#[derive(Debug)]
pub enum CycleOutcome {
    /// Live feed answered; the snapshot was rebuilt.
    Populated(CycleSummary),
    /// No live data this cycle. Nothing in the store was touched.
    NoData(FetchError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    CycleLimit,
}

/// Owns the source and the connection for the lifetime of the loop.
pub struct Tracker<S: LiveSource> {
    source: S,
    conn: Connection,
    delay_secs: RangeInclusive<u64>,
}

impl<S: LiveSource> Tracker<S> {
    pub fn new(source: S, conn: Connection, delay_secs: RangeInclusive<u64>) -> Self {
        Self {
            source,
            conn,
            delay_secs,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_parts(self) -> (S, Connection) {
        (self.source, self.conn)
    }

    /// Polls until `cancel` fires (or its sender is dropped) or
    /// `max_cycles` cycles have run.
    pub fn run(&mut self, cancel: &Receiver<()>, max_cycles: Option<u64>) -> StopReason {
        let mut rng = rand::thread_rng();
        let mut cycles = 0u64;
        loop {
            self.run_cycle();
            cycles += 1;
            if max_cycles.is_some_and(|max| cycles >= max) {
                info!(cycles, "cycle limit reached");
                return StopReason::CycleLimit;
            }

            let delay = next_delay(&mut rng, &self.delay_secs);
            info!(
                "Waiting for {} seconds before fetching data again...",
                delay.as_secs()
            );
            match cancel.recv_timeout(delay) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    info!(cycles, "ingestion cancelled");
                    return StopReason::Cancelled;
                }
            }
        }
    }

    /// One fetch-and-populate pass, without the sleep.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        let events = match self.source.fetch_live_events() {
            Ok(events) => events,
            Err(err) => {
                error!(
                    status = err.status(),
                    "Failed to retrieve live events: {err}"
                );
                return CycleOutcome::NoData(err);
            }
        };

        let mut summary = CycleSummary {
            events: events.len(),
            ..CycleSummary::default()
        };

        // Participants do not depend on the snapshot and are stored either way.
        let cleared = match clear_live_snapshot(&self.conn) {
            Ok(()) => true,
            Err(err) => {
                error!("Error clearing live table: {err:#}");
                summary.write_errors += 1;
                false
            }
        };

        self.store_participants(&events, &mut summary);

        if cleared {
            summary.snapshot_replaced = true;
            self.store_live_rows(&events, &mut summary);
        } else {
            warn!("previous live snapshot kept; skipping live rows this cycle");
        }

        info!(
            events = summary.events,
            participants = summary.participants,
            live_rows = summary.live_rows_written,
            profiles = summary.profiles_written,
            matches = summary.matches_written,
            write_errors = summary.write_errors,
            snapshot_replaced = summary.snapshot_replaced,
            "cycle complete"
        );
        CycleOutcome::Populated(summary)
    }

    fn store_live_rows(&mut self, events: &[LiveEvent], summary: &mut CycleSummary) {
        for event in events {
            let stats = self.fetch_event_statistics(event.id);
            if stats.is_none() {
                summary.events_without_stats += 1;
            }
            for row in live_rows_for_event(event, stats.as_ref()) {
                match insert_live_row(&self.conn, &row) {
                    Ok(()) => summary.live_rows_written += 1,
                    Err(err) => {
                        error!(event_id = event.id, "Error inserting data: {err:#}");
                        summary.write_errors += 1;
                    }
                }
            }
        }
    }

    fn fetch_event_statistics(&mut self, event_id: i64) -> Option<StatisticsPayload> {
        match self.source.fetch_statistics(event_id) {
            Ok(Some(payload)) => Some(payload),
            Ok(None) => {
                info!(event_id, "no statistics available for event ID {event_id}");
                None
            }
            Err(err) if err.is_forbidden() => {
                warn!(
                    event_id,
                    "Failed to fetch statistics for event ID {event_id}. Forbidden: You may be rate-limited or unauthorized."
                );
                None
            }
            Err(err) => {
                error!(
                    event_id,
                    status = err.status(),
                    "Failed to fetch statistics for event ID {event_id}: {err}"
                );
                None
            }
        }
    }

    fn store_participants(&mut self, events: &[LiveEvent], summary: &mut CycleSummary) {
        let ids = participant_ids(events);
        summary.participants = ids.len();

        for participant_id in ids {
            let history = match self.source.fetch_participant_history(participant_id) {
                Ok(history) => history,
                Err(err) => {
                    error!(
                        participant_id,
                        status = err.status(),
                        "Failed to fetch player data for player ID {participant_id}: {err}"
                    );
                    summary.participants_failed += 1;
                    continue;
                }
            };

            if let Some(profile) = profile_from_history(participant_id, &history) {
                match upsert_player_profile(&self.conn, &profile) {
                    Ok(true) => summary.profiles_written += 1,
                    Ok(false) => {}
                    Err(err) => {
                        error!(participant_id, "Error inserting player data: {err:#}");
                        summary.write_errors += 1;
                    }
                }
            } else {
                warn!(participant_id, "participant history is empty; no profile stored");
            }

            for row in match_rows_from_history(participant_id, &history) {
                match upsert_player_match(&self.conn, &row) {
                    Ok(true) => summary.matches_written += 1,
                    Ok(false) => {}
                    Err(err) => {
                        error!(
                            participant_id,
                            match_id = %row.match_id,
                            "Error inserting match data: {err:#}"
                        );
                        summary.write_errors += 1;
                    }
                }
            }
        }
    }
}

pub fn next_delay<R: Rng>(rng: &mut R, range: &RangeInclusive<u64>) -> Duration {
    let (lo, hi) = (*range.start(), *range.end());
    if hi <= lo {
        return Duration::from_secs(lo);
    }
    Duration::from_secs(rng.gen_range(lo..=hi))
}

/// Distinct home and away ids, in first-seen order.
pub fn participant_ids(events: &[LiveEvent]) -> Vec<i64> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for event in events {
        for id in [event.home.id, event.away.id] {
            if seen.insert(id) {
                out.push(id);
            }
        }
    }
    out
}

/// The statistic-less row for `event`.
pub fn base_live_row(event: &LiveEvent) -> LiveSnapshotRow {
    LiveSnapshotRow {
        id: event.id,
        tournament: event.tournament.clone(),
        round: event.round.clone(),
        home_team: event.home.name.clone(),
        away_team: event.away.name.clone(),
        match_progress: event.progress.clone(),
        period: ALL_PERIOD.to_string(),
        home_score: event.home_score.clone(),
        away_score: event.away_score.clone(),
        statistic_group: String::new(),
        statistic_name: String::new(),
        home_stat: String::new(),
        away_stat: String::new(),
        home_player_id: event.home.id.to_string(),
        away_player_id: event.away.id.to_string(),
    }
}

/// One row per tracked metric when statistics exist, otherwise only the
/// base row. The base row is not written alongside the metric rows.
pub fn live_rows_for_event(
    event: &LiveEvent,
    stats: Option<&StatisticsPayload>,
) -> Vec<LiveSnapshotRow> {
    let base = base_live_row(event);
    let Some(stats) = stats else {
        return vec![base];
    };
    tracked_pairs()
        .map(|(group, name)| {
            let (home_stat, away_stat) = extract_statistic(stats, group, name);
            LiveSnapshotRow {
                statistic_group: group.to_string(),
                statistic_name: name.to_string(),
                home_stat,
                away_stat,
                ..base.clone()
            }
        })
        .collect()
}

/// Profile taken from the participant's side of the most recent event.
pub fn profile_from_history(
    participant_id: i64,
    history: &[HistoryEvent],
) -> Option<PlayerProfileRow> {
    let first = history.first()?;
    let team = if first.away.id == Some(participant_id) {
        &first.away
    } else {
        &first.home
    };
    Some(PlayerProfileRow {
        player_id: participant_id.to_string(),
        name: team.name.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        country: team.country.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        ranking: team.ranking.unwrap_or(0),
    })
}

pub fn match_rows_from_history(participant_id: i64, history: &[HistoryEvent]) -> Vec<PlayerMatchRow> {
    history
        .iter()
        .map(|event| {
            let (home_score, away_score) = if event.is_finished() {
                (
                    event.home_score.display.clone(),
                    event.away_score.display.clone(),
                )
            } else {
                (
                    event.home_score.current.clone(),
                    event.away_score.current.clone(),
                )
            };
            PlayerMatchRow {
                match_id: event.id.clone(),
                tournament: event
                    .tournament
                    .clone()
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                status: event.status_description.clone(),
                start_time: event
                    .start_timestamp
                    .map(format_start_time)
                    .unwrap_or_default(),
                home_team: event.home.name.clone().unwrap_or_default(),
                away_team: event.away.name.clone().unwrap_or_default(),
                home_score: home_score.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                away_score: away_score.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                player_id: participant_id.to_string(),
            }
        })
        .collect()
}

pub fn format_start_time(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format(START_TIME_FORMAT).to_string())
        .unwrap_or_default()
}
