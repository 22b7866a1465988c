use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::{handlers, AppState};

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            TraceLayer::new_for_http().make_span_with(make_span_with_request_id),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/movies/:imdb_id", get(handlers::movie_detail))
        .route("/movies/:imdb_id/live", get(handlers::movie_live))
        .route("/movies/:imdb_id/saves", get(handlers::movie_saves))
        .route("/search", get(handlers::search))
        .route("/trending", get(handlers::trending))
        .route("/actors", get(handlers::popular_actors))
        .route("/actors/:actor_id", get(handlers::actor_detail))
        .route(
            "/users/:user_id/playlists",
            get(handlers::list_playlists).post(handlers::create_playlist),
        )
        .route(
            "/users/:user_id/playlists/:playlist_id",
            get(handlers::get_playlist),
        )
        .route(
            "/users/:user_id/playlists/:playlist_id/movies",
            post(handlers::add_movie),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
