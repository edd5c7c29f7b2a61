use std::collections::HashMap;

use rand::Rng;
use rand::rngs::ThreadRng;

use crate::sofa_fetch::{FetchError, FetchResult, LiveSource};
use crate::sofa_parse::{
    Competitor, HistoryEvent, HistoryTeam, LiveEvent, ScoreLine, StatisticsGroup,
    StatisticsItem, StatisticsPayload, StatisticsPeriod,
};
use crate::stats_extract::{ALL_PERIOD, TRACKED_METRICS};

/// Canned reply: the payload, or the HTTP status to fail with.
pub type Reply<T> = Result<T, u16>;

/// In-process stand-in for the SofaScore API.
///
/// Unscripted statistics and histories answer 404. With `jitter` set, every
/// live fetch nudges the scores and stat values so repeated `--fake` cycles
/// look like a match in progress.
pub struct FakeSource {
    live: Reply<Vec<LiveEvent>>,
    statistics: HashMap<i64, Reply<Option<StatisticsPayload>>>,
    histories: HashMap<i64, Reply<Vec<HistoryEvent>>>,
    jitter: Option<ThreadRng>,
    pub live_calls: usize,
    pub statistics_calls: Vec<i64>,
    pub history_calls: Vec<i64>,
}

impl FakeSource {
    pub fn new(live: Reply<Vec<LiveEvent>>) -> Self {
        Self {
            live,
            statistics: HashMap::new(),
            histories: HashMap::new(),
            jitter: None,
            live_calls: 0,
            statistics_calls: Vec::new(),
            history_calls: Vec::new(),
        }
    }

    pub fn with_statistics(mut self, event_id: i64, reply: Reply<StatisticsPayload>) -> Self {
        self.statistics.insert(event_id, reply.map(Some));
        self
    }

    /// A 200 answer whose body held no statistics.
    pub fn with_empty_statistics(mut self, event_id: i64) -> Self {
        self.statistics.insert(event_id, Ok(None));
        self
    }

    pub fn with_history(mut self, participant_id: i64, reply: Reply<Vec<HistoryEvent>>) -> Self {
        self.histories.insert(participant_id, reply);
        self
    }

    pub fn set_live(&mut self, live: Reply<Vec<LiveEvent>>) {
        self.live = live;
    }

    /// Two live matches with full statistics and one past match per player.
    pub fn demo() -> Self {
        let events = vec![
            demo_event(1001, "ATP Rome", "R16", (10, "Sinner J."), (20, "Medvedev D.")),
            demo_event(1002, "WTA Rome", "QF", (30, "Swiatek I."), (40, "Gauff C.")),
        ];
        let mut source = Self::new(Ok(events.clone()));
        for event in &events {
            source = source.with_statistics(event.id, Ok(full_statistics(event.id)));
            for side in [&event.home, &event.away] {
                source = source.with_history(side.id, Ok(vec![demo_history(event)]));
            }
        }
        source.jitter = Some(rand::thread_rng());
        source
    }
}

impl LiveSource for FakeSource {
    fn fetch_live_events(&mut self) -> FetchResult<Vec<LiveEvent>> {
        self.live_calls += 1;
        if let (Some(rng), Ok(events)) = (self.jitter.as_mut(), self.live.as_mut()) {
            for event in events.iter_mut() {
                bump_score(&mut event.home_score, rng);
                bump_score(&mut event.away_score, rng);
            }
            for canned in self.statistics.values_mut() {
                if let Ok(Some(payload)) = canned {
                    jitter_stats(payload, rng);
                }
            }
        }
        reply(&self.live, "fake://sport/tennis/events/live")
    }

    fn fetch_statistics(&mut self, event_id: i64) -> FetchResult<Option<StatisticsPayload>> {
        self.statistics_calls.push(event_id);
        let url = format!("fake://event/{event_id}/statistics");
        match self.statistics.get(&event_id) {
            Some(r) => reply(r, &url),
            None => Err(status_error(&url, 404)),
        }
    }

    fn fetch_participant_history(&mut self, participant_id: i64) -> FetchResult<Vec<HistoryEvent>> {
        self.history_calls.push(participant_id);
        let url = format!("fake://team/{participant_id}/events/last/0");
        match self.histories.get(&participant_id) {
            Some(r) => reply(r, &url),
            None => Err(status_error(&url, 404)),
        }
    }
}

fn reply<T: Clone>(r: &Reply<T>, url: &str) -> FetchResult<T> {
    match r {
        Ok(payload) => Ok(payload.clone()),
        Err(status) => Err(status_error(url, *status)),
    }
}

fn status_error(url: &str, status: u16) -> FetchError {
    if status == 403 {
        FetchError::Forbidden {
            url: url.to_string(),
        }
    } else {
        FetchError::Status {
            url: url.to_string(),
            status,
        }
    }
}

fn bump_score(score: &mut String, rng: &mut ThreadRng) {
    if rng.gen_bool(0.2) {
        let next = score.parse::<u32>().unwrap_or(0) + 1;
        *score = (next % 7).to_string();
    }
}

fn jitter_stats(payload: &mut StatisticsPayload, rng: &mut ThreadRng) {
    for period in &mut payload.statistics {
        for group in &mut period.groups {
            for item in &mut group.items {
                if rng.gen_bool(0.1) {
                    let next = item.home.parse::<u32>().unwrap_or(0) + 1;
                    item.home = next.to_string();
                }
            }
        }
    }
}

fn demo_event(
    id: i64,
    tournament: &str,
    round: &str,
    home: (i64, &str),
    away: (i64, &str),
) -> LiveEvent {
    LiveEvent {
        id,
        tournament: tournament.to_string(),
        round: round.to_string(),
        home: Competitor {
            id: home.0,
            name: home.1.to_string(),
        },
        away: Competitor {
            id: away.0,
            name: away.1.to_string(),
        },
        progress: "1st set".to_string(),
        home_score: "0".to_string(),
        away_score: "0".to_string(),
    }
}

/// Every tracked metric present in the whole-match period.
pub fn full_statistics(seed: i64) -> StatisticsPayload {
    let groups = TRACKED_METRICS
        .iter()
        .map(|(group, names)| StatisticsGroup {
            group_name: group.to_string(),
            items: names
                .iter()
                .enumerate()
                .map(|(idx, name)| StatisticsItem {
                    name: name.to_string(),
                    home: ((seed + idx as i64) % 10).to_string(),
                    away: (idx % 10).to_string(),
                })
                .collect(),
        })
        .collect();
    StatisticsPayload {
        statistics: vec![StatisticsPeriod {
            period: ALL_PERIOD.to_string(),
            groups,
        }],
    }
}

fn demo_history(event: &LiveEvent) -> HistoryEvent {
    let team = |c: &Competitor| HistoryTeam {
        id: Some(c.id),
        name: Some(c.name.clone()),
        country: Some("Demo".to_string()),
        ranking: Some(c.id),
    };
    HistoryEvent {
        id: (event.id * 10).to_string(),
        tournament: Some(event.tournament.clone()),
        status_description: "Ended".to_string(),
        status_type: "finished".to_string(),
        start_timestamp: Some(1_715_000_000),
        home: team(&event.home),
        away: team(&event.away),
        home_score: ScoreLine {
            current: Some("2".to_string()),
            display: Some("6-4 6-2".to_string()),
        },
        away_score: ScoreLine {
            current: Some("0".to_string()),
            display: Some("4-6 2-6".to_string()),
        },
    }
}
