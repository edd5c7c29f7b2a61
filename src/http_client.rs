use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::config::TrackerConfig;

pub fn build_http_client(cfg: &TrackerConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&cfg.user_agent).context("invalid user agent header")?,
    );
    Client::builder()
        .timeout(cfg.request_timeout)
        .default_headers(headers)
        .build()
        .context("failed to build http client")
}
