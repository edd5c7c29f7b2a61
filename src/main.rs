use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::Result;
use tracing::info;

use tennis_tracker::config::TrackerConfig;
use tennis_tracker::fake_feed::FakeSource;
use tennis_tracker::http_client::build_http_client;
use tennis_tracker::ingest::Tracker;
use tennis_tracker::logging::init_tracing;
use tennis_tracker::sofa_fetch::{LiveSource, SofaClient};
use tennis_tracker::store::{self, LIVE_TABLE, MATCH_TABLE, PROFILE_TABLE, count_rows};

fn main() -> Result<()> {
    let mut cfg = TrackerConfig::from_env();
    init_tracing();

    if let Some(path) = parse_db_path_arg() {
        cfg.db_path = path;
    }
    let max_cycles = parse_cycles_arg();
    let fake = std::env::args().skip(1).any(|arg| arg == "--fake");

    let conn = store::open_db(&cfg.db_path)?;
    info!(
        db = %cfg.db_path.display(),
        api = %cfg.api_base,
        fake,
        "tennis tracker starting"
    );

    // Held for the life of the process; dropping it stops the loop.
    let (_cancel_tx, cancel_rx) = mpsc::channel::<()>();

    if fake {
        let tracker = Tracker::new(FakeSource::demo(), conn, cfg.poll_range());
        run_to_stop(tracker, &cancel_rx, max_cycles)
    } else {
        let source = SofaClient::new(build_http_client(&cfg)?, cfg.api_base.clone());
        let tracker = Tracker::new(source, conn, cfg.poll_range());
        run_to_stop(tracker, &cancel_rx, max_cycles)
    }
}

fn run_to_stop<S: LiveSource>(
    mut tracker: Tracker<S>,
    cancel: &mpsc::Receiver<()>,
    max_cycles: Option<u64>,
) -> Result<()> {
    let reason = tracker.run(cancel, max_cycles);
    let (_, conn) = tracker.into_parts();
    info!(
        ?reason,
        live_rows = count_rows(&conn, LIVE_TABLE)?,
        profiles = count_rows(&conn, PROFILE_TABLE)?,
        matches = count_rows(&conn, MATCH_TABLE)?,
        "tennis tracker stopped"
    );
    Ok(())
}

fn parse_db_path_arg() -> Option<PathBuf> {
    parse_value_arg("--db").map(PathBuf::from)
}

fn parse_cycles_arg() -> Option<u64> {
    parse_value_arg("--cycles")
        .and_then(|raw| raw.parse::<u64>().ok())
        .filter(|n| *n > 0)
}

fn parse_value_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
