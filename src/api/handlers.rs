use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::session_id::SessionId,
    models::{Item, ItemIdentity, MovieCard},
    services::{PageResult, Recommendations},
};

use super::AppState;

/// Message shown when a root movie has no unseen page left
pub const EXHAUSTED_MESSAGE: &str = "No more movies in database for this movie.";

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
}

impl From<&Item> for MovieSummary {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub root: MovieSummary,
    pub page: usize,
    pub total_candidates: usize,
    pub exhausted: bool,
    pub movies: Vec<MovieCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MoreResponse {
    pub root: MovieSummary,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    pub movies: Vec<MovieCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

async fn render(state: &AppState, recs: Recommendations) -> RecommendationsResponse {
    let movies = state.service.attach_posters(&recs.page.items).await;

    RecommendationsResponse {
        root: MovieSummary::from(&recs.root),
        page: recs.page.page_number,
        total_candidates: recs.page.total_candidates,
        exhausted: recs.exhausted,
        movies,
        message: recs.exhausted.then(|| EXHAUSTED_MESSAGE.to_string()),
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Resolve free text to a movie and show its first page
pub async fn search(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    Json(request): Json<SearchRequest>,
) -> AppResult<Json<RecommendationsResponse>> {
    tracing::info!(session_id = %session_id, query = %request.query, "Processing search");

    let book = state.sessions.session(session_id.0).await;
    let recs = {
        let mut book = book.lock().await;
        state.service.search(&mut book, &request.query)?
    };

    Ok(Json(render(&state, recs).await))
}

/// Show the current page of recommendations for a movie
pub async fn show_recommendations(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<RecommendationsResponse>> {
    let book = state.sessions.session(session_id.0).await;
    let recs = {
        let mut book = book.lock().await;
        state
            .service
            .show_recommendations(&mut book, &ItemIdentity::Id(movie_id))?
    };

    Ok(Json(render(&state, recs).await))
}

/// Re-display the session's current root movie
pub async fn current_recommendations(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
) -> AppResult<Json<RecommendationsResponse>> {
    let book = state.sessions.session(session_id.0).await;
    let recs = {
        let mut book = book.lock().await;
        state.service.current(&mut book)?
    };

    let recs = recs.ok_or_else(|| {
        AppError::NotFound("No movie selected yet; search first".to_string())
    })?;

    Ok(Json(render(&state, recs).await))
}

/// "Get similar movies": advance a movie to its next unseen page
pub async fn request_more(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<MoreResponse>> {
    let identity = ItemIdentity::Id(movie_id);
    let root = MovieSummary::from(state.service.resolve(&identity)?);

    let book = state.sessions.session(session_id.0).await;
    let result = {
        let mut book = book.lock().await;
        state.service.request_more(&mut book, &identity)?
    };

    let response = match result {
        PageResult::Found { page_number, items } => MoreResponse {
            root,
            found: true,
            page: Some(page_number),
            movies: state.service.attach_posters(&items).await,
            message: None,
        },
        PageResult::Exhausted => MoreResponse {
            root,
            found: false,
            page: None,
            movies: Vec::new(),
            message: Some(EXHAUSTED_MESSAGE.to_string()),
        },
    };

    Ok(Json(response))
}
