//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::PgPool;
use taleweaver_core::generation::TextGenerator;
use taleweaver_store::PgStore;
use taleweaver_test_support::FixedClock;
use tower::ServiceExt;

use taleweaver_api::routes;
use taleweaver_api::state::AppState;

/// Build the full app router over a real `PgStore` with a fixed clock and
/// the given narrator. Uses the same route structure as `main.rs`.
pub fn build_test_app(pool: PgPool, narrator: Arc<dyn TextGenerator>) -> Router {
    let state = AppState::new(
        PgStore::new(pool),
        narrator,
        Arc::new(FixedClock::standard()),
        Duration::from_secs(5),
    );
    routes::app(state)
}

/// Seed a campaign at session 1 with the given active characters. Returns
/// the campaign id and the character ids in turn order.
pub async fn seed_campaign(pool: &PgPool, characters: &[&str]) -> (i64, Vec<i64>) {
    let campaign_id: i64 = sqlx::query_scalar(
        "INSERT INTO campaigns (title, description, current_session) \
         VALUES ('The Sunken Crown', 'A drowned kingdom stirs.', 1) RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO sessions (campaign_id, session_number, title, narrative, location, experience_reward) \
         VALUES ($1, 1, 'The Tavern', 'Rain drums on the shutters.', 'The Tavern', 125)",
    )
    .bind(campaign_id)
    .execute(pool)
    .await
    .unwrap();

    let mut ids = Vec::new();
    for (turn, name) in (1..).zip(characters) {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO characters (name, race, class_name, level) VALUES ($1, 'Human', 'Fighter', 1) RETURNING id",
        )
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO participants (campaign_id, character_id, user_id, turn_order) VALUES ($1, $2, $3, $4)",
        )
        .bind(campaign_id)
        .bind(id)
        .bind(id * 10)
        .bind(turn)
        .execute(pool)
        .await
        .unwrap();
        ids.push(id);
    }
    (campaign_id, ids)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
