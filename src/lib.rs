pub mod api;
pub mod config;
pub mod fake_feed;
pub mod http_client;
pub mod ingest;
pub mod logging;
pub mod sofa_fetch;
pub mod sofa_parse;
pub mod stats_extract;
pub mod store;
