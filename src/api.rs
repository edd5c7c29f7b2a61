use std::path::{Path, PathBuf};

use actix_web::error::{InternalError, QueryPayloadError};
use actix_web::web::{self, Data};
use actix_web::{HttpRequest, HttpResponse, Responder};
use anyhow::Context;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::store::{self, DEFAULT_PAGE_LIMIT, Page};

/// Shared handler state: where the tracker's database lives.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub db_path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    fn resolve(&self) -> anyhow::Result<Page> {
        Page::new(self.page.unwrap_or(1), self.limit.unwrap_or(DEFAULT_PAGE_LIMIT))
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(query_error))
        .route("/live_tennis_data/", web::get().to(live_tennis_data))
        .route("/player_matches_info/", web::get().to(player_matches_info))
        .route("/players_main_info/", web::get().to(players_main_info))
        .route("/players_main_info/{player_id}", web::get().to(player_main_info))
        .route("/health", web::get().to(HttpResponse::Ok));
}

// Non-numeric `page`/`limit` never reach `PageQuery::resolve`.
fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = json!({ "error": format!("invalid query parameters: {err}") });
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

pub async fn live_tennis_data(
    query: web::Query<PageQuery>,
    state: Data<ApiState>,
) -> impl Responder {
    paged(query, state, store::load_live_rows).await
}

pub async fn player_matches_info(
    query: web::Query<PageQuery>,
    state: Data<ApiState>,
) -> impl Responder {
    paged(query, state, store::load_player_matches).await
}

pub async fn players_main_info(
    query: web::Query<PageQuery>,
    state: Data<ApiState>,
) -> impl Responder {
    paged(query, state, store::load_player_profiles).await
}

pub async fn player_main_info(path: web::Path<String>, state: Data<ApiState>) -> impl Responder {
    let player_id = path.into_inner();
    let db_path = state.db_path.clone();
    let lookup_id = player_id.clone();
    let result = web::block(move || -> anyhow::Result<Option<store::PlayerProfileRow>> {
        let conn = open_for_read(&db_path)?;
        store::load_player_profile(&conn, &lookup_id)
    })
    .await;

    match result {
        Ok(Ok(Some(profile))) => HttpResponse::Ok().json(profile),
        Ok(Ok(None)) => HttpResponse::NotFound()
            .json(json!({ "error": format!("no player with id {player_id}") })),
        Ok(Err(err)) => {
            error!("read query failed: {err:#}");
            HttpResponse::InternalServerError().json(json!({ "error": "storage unavailable" }))
        }
        Err(err) => {
            error!("blocking pool error: {err}");
            HttpResponse::InternalServerError().json(json!({ "error": "storage unavailable" }))
        }
    }
}

async fn paged<T, F>(query: web::Query<PageQuery>, state: Data<ApiState>, load: F) -> HttpResponse
where
    T: Serialize + Send + 'static,
    F: FnOnce(&Connection, Page) -> anyhow::Result<Vec<T>> + Send + 'static,
{
    let page = match query.resolve() {
        Ok(page) => page,
        Err(err) => {
            return HttpResponse::BadRequest().json(json!({ "error": err.to_string() }));
        }
    };

    let db_path = state.db_path.clone();
    let result = web::block(move || -> anyhow::Result<Vec<T>> {
        let conn = open_for_read(&db_path)?;
        load(&conn, page)
    })
    .await;

    match result {
        Ok(Ok(rows)) => HttpResponse::Ok().json(rows),
        Ok(Err(err)) => {
            error!("read query failed: {err:#}");
            HttpResponse::InternalServerError().json(json!({ "error": "storage unavailable" }))
        }
        Err(err) => {
            error!("blocking pool error: {err}");
            HttpResponse::InternalServerError().json(json!({ "error": "storage unavailable" }))
        }
    }
}

// One connection per request; the ingest process owns the writer.
fn open_for_read(path: &Path) -> anyhow::Result<Connection> {
    Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))
}
