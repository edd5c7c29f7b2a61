use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Result;
use tracing::info;

use tennis_tracker::api::{self, ApiState};
use tennis_tracker::config::TrackerConfig;
use tennis_tracker::logging::init_tracing;
use tennis_tracker::store;

#[actix_web::main]
async fn main() -> Result<()> {
    let cfg = TrackerConfig::from_env();
    init_tracing();

    // Tables must exist before the first read, even if the tracker never ran.
    store::open_db(&cfg.db_path)?;

    let state = ApiState {
        db_path: cfg.db_path.clone(),
    };
    info!(addr = %cfg.bind_addr, db = %cfg.db_path.display(), "read api listening");

    HttpServer::new(move || {
        App::new()
            .app_data(Data::new(state.clone()))
            .configure(api::configure)
    })
    .bind(cfg.bind_addr.as_str())?
    .run()
    .await?;
    Ok(())
}
