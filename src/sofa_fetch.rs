use reqwest::StatusCode;
use reqwest::blocking::Client;
use tracing::debug;

use crate::sofa_parse::{
    HistoryEvent, LiveEvent, StatisticsPayload, parse_history_json, parse_live_events_json,
    parse_statistics_json,
};

/// Why an upstream request produced no usable payload.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },

    /// 403: usually rate limiting or a blocked client.
    #[error("forbidden (rate-limited or unauthorized) for {url}")]
    Forbidden { url: String },

    #[error("unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("failed to read body from {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("malformed payload from {url}: {detail}")]
    Decode { url: String, detail: String },
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Forbidden { .. } => Some(StatusCode::FORBIDDEN.as_u16()),
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, FetchError::Forbidden { .. })
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// The three upstream reads the ingestion loop depends on.
pub trait LiveSource {
    fn fetch_live_events(&mut self) -> FetchResult<Vec<LiveEvent>>;
    /// `Ok(None)` when the event answered 200 but carried no statistics.
    fn fetch_statistics(&mut self, event_id: i64) -> FetchResult<Option<StatisticsPayload>>;
    fn fetch_participant_history(&mut self, participant_id: i64) -> FetchResult<Vec<HistoryEvent>>;
}

/// Blocking client for the SofaScore v1 API.
pub struct SofaClient {
    http: Client,
    base_url: String,
}

impl SofaClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn live_events_url(&self) -> String {
        format!("{}/sport/tennis/events/live", self.base_url)
    }

    pub fn statistics_url(&self, event_id: i64) -> String {
        format!("{}/event/{event_id}/statistics", self.base_url)
    }

    pub fn participant_history_url(&self, participant_id: i64) -> String {
        format!("{}/team/{participant_id}/events/last/0", self.base_url)
    }

    fn get_body(&self, url: &str) -> FetchResult<String> {
        debug!(url, "GET");
        let resp = self
            .http
            .get(url)
            .send()
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        classify_status(url, resp.status())?;
        resp.text().map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
    }
}

impl LiveSource for SofaClient {
    fn fetch_live_events(&mut self) -> FetchResult<Vec<LiveEvent>> {
        let url = self.live_events_url();
        let body = self.get_body(&url)?;
        parse_live_events_json(&body).map_err(|err| FetchError::Decode {
            url,
            detail: format!("{err:#}"),
        })
    }

    fn fetch_statistics(&mut self, event_id: i64) -> FetchResult<Option<StatisticsPayload>> {
        let url = self.statistics_url(event_id);
        let body = self.get_body(&url)?;
        parse_statistics_json(&body).map_err(|err| FetchError::Decode {
            url,
            detail: format!("{err:#}"),
        })
    }

    fn fetch_participant_history(&mut self, participant_id: i64) -> FetchResult<Vec<HistoryEvent>> {
        let url = self.participant_history_url(participant_id);
        let body = self.get_body(&url)?;
        parse_history_json(&body).map_err(|err| FetchError::Decode {
            url,
            detail: format!("{err:#}"),
        })
    }
}

/// Only 200 counts as data; 403 is reported separately from other statuses.
pub fn classify_status(url: &str, status: StatusCode) -> FetchResult<()> {
    if status == StatusCode::OK {
        return Ok(());
    }
    if status == StatusCode::FORBIDDEN {
        return Err(FetchError::Forbidden {
            url: url.to_string(),
        });
    }
    Err(FetchError::Status {
        url: url.to_string(),
        status: status.as_u16(),
    })
}
