use std::path::{Path, PathBuf};

use actix_web::{App, test, web};
use serde_json::Value;

use tennis_tracker::api::{self, ApiState};
use tennis_tracker::store::{self, PlayerMatchRow, PlayerProfileRow, upsert_player_match};

fn temp_db(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("tennis_tracker_{}_{name}.sqlite", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

fn seed_profiles(path: &Path, n: i64) {
    let conn = store::open_db(path).expect("open db");
    for idx in 0..n {
        store::upsert_player_profile(
            &conn,
            &PlayerProfileRow {
                player_id: idx.to_string(),
                name: format!("Player {idx}"),
                country: "Italy".to_string(),
                ranking: idx,
            },
        )
        .expect("insert profile");
    }
}

#[actix_web::test]
async fn profiles_default_to_first_ten() {
    let path = temp_db("default_page");
    seed_profiles(&path, 15);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(ApiState {
                db_path: path.clone(),
            }))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/players_main_info/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let rows = body.as_array().expect("json array");
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0]["player_id"], "0");
    assert_eq!(rows[0]["ranking"], 0);

    let req = test::TestRequest::get()
        .uri("/players_main_info/?page=2&limit=10")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let rows = body.as_array().expect("json array");
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[4]["name"], "Player 14");

    let _ = std::fs::remove_file(&path);
}

#[actix_web::test]
async fn out_of_range_params_are_rejected() {
    let path = temp_db("bad_params");
    seed_profiles(&path, 1);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(ApiState {
                db_path: path.clone(),
            }))
            .configure(api::configure),
    )
    .await;

    for uri in [
        "/players_main_info/?page=0",
        "/players_main_info/?limit=0",
        "/players_main_info/?limit=101",
        "/live_tennis_data/?page=-1",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400, "uri {uri}");
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string(), "uri {uri}");
    }

    let _ = std::fs::remove_file(&path);
}

#[actix_web::test]
async fn non_numeric_params_get_json_errors() {
    let path = temp_db("non_numeric");
    seed_profiles(&path, 1);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(ApiState {
                db_path: path.clone(),
            }))
            .configure(api::configure),
    )
    .await;

    for uri in [
        "/players_main_info/?page=abc",
        "/player_matches_info/?limit=ten",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400, "uri {uri}");
        let body: Value = test::read_body_json(resp).await;
        let msg = body["error"].as_str().expect("error message");
        assert!(msg.starts_with("invalid query parameters"), "uri {uri}: {msg}");
    }

    let _ = std::fs::remove_file(&path);
}

#[actix_web::test]
async fn single_profile_lookup() {
    let path = temp_db("single_profile");
    seed_profiles(&path, 3);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(ApiState {
                db_path: path.clone(),
            }))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/players_main_info/2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["name"], "Player 2");
    assert_eq!(body["ranking"], 2);

    let req = test::TestRequest::get().uri("/players_main_info/99").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);

    let _ = std::fs::remove_file(&path);
}

#[actix_web::test]
async fn empty_tables_return_empty_arrays() {
    let path = temp_db("empty");
    store::open_db(&path).expect("open db");

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(ApiState {
                db_path: path.clone(),
            }))
            .configure(api::configure),
    )
    .await;

    for uri in ["/live_tennis_data/", "/player_matches_info/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, Value::Array(Vec::new()), "uri {uri}");
    }

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let _ = std::fs::remove_file(&path);
}

#[actix_web::test]
async fn match_rows_serialize_with_column_names() {
    let path = temp_db("matches");
    let conn = store::open_db(&path).expect("open db");
    upsert_player_match(
        &conn,
        &PlayerMatchRow {
            match_id: "5001".to_string(),
            tournament: "ATP Madrid".to_string(),
            status: "Ended".to_string(),
            start_time: "2024-05-06 12:53:20".to_string(),
            home_team: "A".to_string(),
            away_team: "E".to_string(),
            home_score: "6-4 6-2".to_string(),
            away_score: "4-6 2-6".to_string(),
            player_id: "10".to_string(),
        },
    )
    .expect("insert match");
    drop(conn);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(ApiState {
                db_path: path.clone(),
            }))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/player_matches_info/?limit=1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["match_id"], "5001");
    assert_eq!(body[0]["home_score"], "6-4 6-2");
    assert_eq!(body[0]["player_id"], "10");

    let _ = std::fs::remove_file(&path);
}
