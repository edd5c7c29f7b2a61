use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "tennis_live.sqlite";
const DEFAULT_API_BASE: &str = "https://api.sofascore.com/api/v1";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POLL_MIN_SECS: u64 = 10;
const DEFAULT_POLL_MAX_SECS: u64 = 30;

/// Runtime settings for both binaries, resolved from the environment.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub db_path: PathBuf,
    pub api_base: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub poll_min_secs: u64,
    pub poll_max_secs: u64,
    pub bind_addr: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_min_secs: DEFAULT_POLL_MIN_SECS,
            poll_max_secs: DEFAULT_POLL_MAX_SECS,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl TrackerConfig {
    /// Loads `.env.local` then `.env` (neither is required) and reads the
    /// process environment on top of the defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = non_empty("TENNIS_DB_PATH")
            .map(|v| PathBuf::from(v.trim()))
            .unwrap_or(defaults.db_path);
        let api_base = non_empty("SOFA_API_BASE")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base);
        let user_agent = non_empty("SOFA_USER_AGENT").unwrap_or(defaults.user_agent);
        let timeout_secs = non_empty("HTTP_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .max(1);
        let poll_min_secs = non_empty("POLL_MIN_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_MIN_SECS);
        let poll_max_secs = non_empty("POLL_MAX_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_MAX_SECS)
            .max(poll_min_secs);
        let bind_addr = non_empty("API_BIND_ADDR")
            .map(|v| v.trim().to_string())
            .unwrap_or(defaults.bind_addr);

        Self {
            db_path,
            api_base,
            user_agent,
            request_timeout: Duration::from_secs(timeout_secs),
            poll_min_secs,
            poll_max_secs,
            bind_addr,
        }
    }

    pub fn poll_range(&self) -> RangeInclusive<u64> {
        self.poll_min_secs..=self.poll_max_secs.max(self.poll_min_secs)
    }
}
