use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use reelpage_api::api::{create_router, AppState};
use reelpage_api::middleware::SESSION_ID_HEADER;
use reelpage_api::models::Item;
use reelpage_api::services::providers::PlaceholderPosterGateway;
use reelpage_api::services::{
    RecommendationService, SimilarityMatrix, SimilarityStore, TitleResolver,
};

const EXHAUSTED: &str = "No more movies in database for this movie.";

/// Catalog of `n` movies with ids 1000.. where closer indices are more similar
fn create_test_store(n: usize) -> Arc<SimilarityStore> {
    let items = (0..n)
        .map(|i| Item::new(1000 + i as i64, format!("Movie {}", i), i))
        .collect();
    let rows = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| 1.0 / (1.0 + (i as f32 - j as f32).abs()))
                .collect()
        })
        .collect();
    let primary = SimilarityMatrix::from_rows(rows).unwrap();
    let secondary = SimilarityMatrix::from_rows(vec![vec![0.0; n]; n]).unwrap();
    Arc::new(SimilarityStore::new(items, primary, secondary).unwrap())
}

fn create_test_server(n: usize) -> TestServer {
    let store = create_test_store(n);
    let resolver = TitleResolver::with_seed(store.clone(), 3);
    let service = RecommendationService::with_resolver(
        store,
        Arc::new(PlaceholderPosterGateway),
        resolver,
        25,
        5,
    )
    .unwrap();
    let state = AppState::new(service, chrono::Duration::hours(1));
    TestServer::new(create_router(state)).unwrap()
}

fn session_header(id: Uuid) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(SESSION_ID_HEADER),
        HeaderValue::from_str(&id.to_string()).unwrap(),
    )
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(10);
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_search_returns_first_page() {
    let server = create_test_server(30);
    let (name, value) = session_header(Uuid::new_v4());

    let response = server
        .post("/api/v1/search")
        .add_header(name, value.clone())
        .json(&json!({ "query": "movie 3" }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header(SESSION_ID_HEADER), value);

    let body: Value = response.json();
    assert_eq!(body["root"]["id"], 1003);
    assert_eq!(body["root"]["title"], "Movie 3");
    assert_eq!(body["page"], 0);
    assert_eq!(body["total_candidates"], 25);
    assert_eq!(body["exhausted"], false);
    assert_eq!(body["movies"].as_array().unwrap().len(), 5);
    assert_eq!(body["movies"][0]["poster_placeholder"], true);
}

#[tokio::test]
async fn test_search_with_empty_query_picks_a_movie() {
    let server = create_test_server(10);

    let response = server
        .post("/api/v1/search")
        .json(&json!({ "query": "" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let root_id = body["root"]["id"].as_i64().unwrap();
    assert!((1000..1010).contains(&root_id));
}

#[tokio::test]
async fn test_session_id_generated_when_missing() {
    let server = create_test_server(10);
    let response = server.get("/api/v1/movies/1000/recommendations").await;

    response.assert_status_ok();
    let header = response.header(SESSION_ID_HEADER);
    assert!(Uuid::parse_str(header.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_more_pages_until_exhausted() {
    let server = create_test_server(30);
    let (name, value) = session_header(Uuid::new_v4());

    server
        .get("/api/v1/movies/1000/recommendations")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status_ok();

    let mut seen = Vec::new();
    for expected_page in 1..=4 {
        let response = server
            .post("/api/v1/movies/1000/more")
            .add_header(name.clone(), value.clone())
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["found"], true);
        assert_eq!(body["page"], expected_page);
        let ids: Vec<i64> = body["movies"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids.len(), 5);
        assert!(!seen.contains(&ids));
        seen.push(ids);
    }

    let response = server
        .post("/api/v1/movies/1000/more")
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["found"], false);
    assert_eq!(body["message"], EXHAUSTED);
    assert!(body["movies"].as_array().unwrap().is_empty());

    // Re-displaying shows the last page and the exhaustion notice
    let response = server
        .get("/api/v1/movies/1000/recommendations")
        .add_header(name, value)
        .await;
    let body: Value = response.json();
    assert_eq!(body["page"], 4);
    assert_eq!(body["exhausted"], true);
    assert_eq!(body["message"], EXHAUSTED);
}

#[tokio::test]
async fn test_small_catalog_exhausts_on_first_more() {
    let server = create_test_server(6);
    let (name, value) = session_header(Uuid::new_v4());

    server
        .get("/api/v1/movies/1002/recommendations")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status_ok();

    let response = server
        .post("/api/v1/movies/1002/more")
        .add_header(name, value)
        .await;
    let body: Value = response.json();
    assert_eq!(body["found"], false);
}

#[tokio::test]
async fn test_sessions_do_not_share_state() {
    let server = create_test_server(30);
    let (name_a, value_a) = session_header(Uuid::new_v4());
    let (name_b, value_b) = session_header(Uuid::new_v4());

    for _ in 0..2 {
        server
            .post("/api/v1/movies/1005/more")
            .add_header(name_a.clone(), value_a.clone())
            .await
            .assert_status_ok();
    }

    let response = server
        .get("/api/v1/movies/1005/recommendations")
        .add_header(name_b, value_b)
        .await;
    let body: Value = response.json();
    assert_eq!(body["page"], 0);

    let response = server
        .get("/api/v1/movies/1005/recommendations")
        .add_header(name_a, value_a)
        .await;
    let body: Value = response.json();
    assert_eq!(body["page"], 2);
}

#[tokio::test]
async fn test_current_requires_a_selection() {
    let server = create_test_server(10);
    let (name, value) = session_header(Uuid::new_v4());

    server
        .get("/api/v1/recommendations/current")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .post("/api/v1/search")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "query": "Movie 4" }))
        .await
        .assert_status_ok();

    let response = server
        .get("/api/v1/recommendations/current")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["root"]["id"], 1004);
}

#[tokio::test]
async fn test_unknown_movie_is_not_found() {
    let server = create_test_server(10);

    let response = server.get("/api/v1/movies/42/recommendations").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("id 42"));

    server
        .post("/api/v1/movies/42/more")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_numeric_movie_id_rejected() {
    let server = create_test_server(10);
    server
        .get("/api/v1/movies/avatar/recommendations")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
