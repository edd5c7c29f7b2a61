use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Competitor {
    pub id: i64,
    pub name: String,
}

/// One entry of the live-events feed, flattened to what the snapshot rows need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveEvent {
    pub id: i64,
    pub tournament: String,
    pub round: String,
    pub home: Competitor,
    pub away: Competitor,
    pub progress: String,
    pub home_score: String,
    pub away_score: String,
}

// Upstream sends `null` for names and lists now and then; those decode as
// empty instead of failing the whole payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsPayload {
    #[serde(default, deserialize_with = "vec_or_default")]
    pub statistics: Vec<StatisticsPeriod>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsPeriod {
    #[serde(default, deserialize_with = "string_or_default")]
    pub period: String,
    #[serde(default, deserialize_with = "vec_or_default")]
    pub groups: Vec<StatisticsGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsGroup {
    #[serde(rename = "groupName", default, deserialize_with = "string_or_default")]
    pub group_name: String,
    #[serde(rename = "statisticsItems", default, deserialize_with = "vec_or_default")]
    pub items: Vec<StatisticsItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsItem {
    #[serde(default, deserialize_with = "string_or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub home: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub away: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTeam {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub country: Option<String>,
    pub ranking: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScoreLine {
    pub current: Option<String>,
    pub display: Option<String>,
}

/// A past (or running) match from a participant's recent-events feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEvent {
    pub id: String,
    pub tournament: Option<String>,
    pub status_description: String,
    pub status_type: String,
    pub start_timestamp: Option<i64>,
    pub home: HistoryTeam,
    pub away: HistoryTeam,
    pub home_score: ScoreLine,
    pub away_score: ScoreLine,
}

impl HistoryEvent {
    pub fn is_finished(&self) -> bool {
        self.status_type == "finished"
    }
}

pub fn parse_live_events_json(raw: &str) -> Result<Vec<LiveEvent>> {
    let Some(root) = parse_root(raw, "invalid live events json")? else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for item in events_array(&root) {
        match parse_live_event(item) {
            Some(event) => out.push(event),
            None => warn!(
                event_id = item.get("id").and_then(|v| v.as_i64()),
                "skipping live event with missing fields"
            ),
        }
    }
    Ok(out)
}

/// `None` when the body carries no statistics at all: blank, `null`, `{}` or
/// an object without a `statistics` key. An explicit `"statistics": []`
/// is still a payload, just one where every metric is missing.
pub fn parse_statistics_json(raw: &str) -> Result<Option<StatisticsPayload>> {
    let Some(root) = parse_root(raw, "invalid statistics json")? else {
        return Ok(None);
    };
    if root
        .as_object()
        .is_some_and(|map| !map.contains_key("statistics"))
    {
        return Ok(None);
    }
    serde_json::from_value(root)
        .map(Some)
        .context("invalid statistics json")
}

pub fn parse_history_json(raw: &str) -> Result<Vec<HistoryEvent>> {
    let Some(root) = parse_root(raw, "invalid participant events json")? else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for item in events_array(&root) {
        match parse_history_event(item) {
            Some(event) => out.push(event),
            None => warn!("skipping participant event without id"),
        }
    }
    Ok(out)
}

/// Renders a scalar JSON value the way it is stored: strings verbatim,
/// numbers in decimal form. `null` and missing values yield `None`.
pub fn value_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn parse_root(raw: &str, ctx: &'static str) -> Result<Option<Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let v: Value = serde_json::from_str(trimmed).context(ctx)?;
    Ok(Some(v))
}

fn events_array(root: &Value) -> &[Value] {
    root.get("events")
        .and_then(|x| x.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn parse_live_event(v: &Value) -> Option<LiveEvent> {
    let id = v.get("id")?.as_i64()?;
    let home = parse_competitor(v.get("homeTeam")?)?;
    let away = parse_competitor(v.get("awayTeam")?)?;

    Some(LiveEvent {
        id,
        tournament: name_of(v.get("tournament")).unwrap_or_default(),
        round: name_of(v.get("roundInfo")).unwrap_or_default(),
        home,
        away,
        progress: v
            .get("status")
            .and_then(|s| s.get("description"))
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
        home_score: value_text(v.get("homeScore").and_then(|s| s.get("current")))
            .unwrap_or_default(),
        away_score: value_text(v.get("awayScore").and_then(|s| s.get("current")))
            .unwrap_or_default(),
    })
}

fn parse_competitor(v: &Value) -> Option<Competitor> {
    Some(Competitor {
        id: v.get("id")?.as_i64()?,
        name: v
            .get("name")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
    })
}

fn parse_history_event(v: &Value) -> Option<HistoryEvent> {
    let id = value_text(v.get("id"))?;
    let status = v.get("status").unwrap_or(&Value::Null);

    Some(HistoryEvent {
        id,
        tournament: name_of(v.get("tournament")),
        status_description: status
            .get("description")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
        status_type: status
            .get("type")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
        start_timestamp: v.get("startTimestamp").and_then(|x| x.as_i64()),
        home: parse_history_team(v.get("homeTeam")),
        away: parse_history_team(v.get("awayTeam")),
        home_score: parse_score_line(v.get("homeScore")),
        away_score: parse_score_line(v.get("awayScore")),
    })
}

fn parse_history_team(v: Option<&Value>) -> HistoryTeam {
    let v = v.unwrap_or(&Value::Null);
    HistoryTeam {
        id: v.get("id").and_then(|x| x.as_i64()),
        name: v.get("name").and_then(|x| x.as_str()).map(str::to_string),
        country: name_of(v.get("country")),
        // Rankings occasionally arrive as strings.
        ranking: v.get("ranking").and_then(|x| {
            x.as_i64()
                .or_else(|| x.as_str().and_then(|s| s.trim().parse().ok()))
        }),
    }
}

fn parse_score_line(v: Option<&Value>) -> ScoreLine {
    let Some(v) = v else {
        return ScoreLine::default();
    };
    ScoreLine {
        current: value_text(v.get("current")),
        display: value_text(v.get("display")),
    }
}

fn name_of(v: Option<&Value>) -> Option<String> {
    v?.get("name")?.as_str().map(str::to_string)
}

fn string_or_default<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(value_text(Some(&v)).unwrap_or_default())
}

fn vec_or_default<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
