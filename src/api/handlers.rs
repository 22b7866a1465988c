use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        ActorProfile, AddOutcome, MovieInsights, MovieRecord, Playlist, PlaylistEntry,
        PopularActor, SearchHit, TrendingMovie,
    },
    services::{
        movie_detail::{DetailSession, DetailState},
        playlists,
    },
};

use super::AppState;

/// How many now-playing titles the landing rail shows.
const TRENDING_LIMIT: usize = 4;

/// How many people the popular-actors rail shows.
const ACTORS_LIMIT: usize = 20;

// Request/Response types

#[derive(Debug, Serialize)]
pub struct MovieDetailResponse {
    pub movie: MovieRecord,
    pub insights: MovieInsights,
    pub save_count: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SaveCountResponse {
    pub imdb_id: String,
    pub save_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub cover_emoji: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddMovieRequest {
    pub imdb_id: String,
    pub title: String,
    pub poster: Option<String>,
    pub year: String,
}

#[derive(Debug, Serialize)]
pub struct AddMovieResponse {
    pub outcome: AddOutcome,
    pub save_count: Option<i64>,
}

// Handlers

/// Full detail payload for one movie: the provider record plus the derived
/// insights view model and the current save count.
pub async fn movie_detail(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> AppResult<Json<MovieDetailResponse>> {
    let movie = state
        .metadata
        .fetch_movie(&imdb_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No movie found for id {}", imdb_id)))?;

    let save_count = state.saves.current(&imdb_id).await?;
    let insights = MovieInsights::build(&movie, save_count);

    Ok(Json(MovieDetailResponse {
        movie,
        insights,
        save_count,
    }))
}

/// Live detail stream: one SSE event per snapshot, re-emitted whenever the
/// save count changes. Backed by a DetailSession, so a client that re-requests
/// mid-fetch can never observe a stale movie. An unknown id gets a terminal
/// `not_found` event and the stream closes.
pub async fn movie_live(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let session = DetailSession::new(state.metadata.clone(), state.saves.clone());
    session.navigate(&imdb_id);

    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(async move {
        // Owns the session; dropping it on disconnect tears down its workers
        let mut states = session.subscribe();
        loop {
            let current = states.borrow_and_update().clone();
            match current {
                DetailState::Pending => {}
                DetailState::NotFound => {
                    // Terminal for this id; tell the client and end the stream
                    let _ = tx.send(None).await;
                    return;
                }
                DetailState::Ready(snapshot) => {
                    if tx.send(Some(snapshot)).await.is_err() {
                        return;
                    }
                }
            }
            if states.changed().await.is_err() {
                return;
            }
        }
    });

    let stream = ReceiverStream::new(rx).map(|message| match message {
        Some(snapshot) => Event::default().json_data(&snapshot),
        None => Ok(Event::default().event("not_found")),
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Current save count for one movie.
pub async fn movie_saves(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> AppResult<Json<SaveCountResponse>> {
    let save_count = state.saves.current(&imdb_id).await?;
    Ok(Json(SaveCountResponse {
        imdb_id,
        save_count,
    }))
}

/// Title search against the metadata provider.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<SearchHit>>> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }

    let hits = state.metadata.search(query).await?;
    Ok(Json(hits))
}

/// Now-playing titles, enriched with save counts.
pub async fn trending(State(state): State<AppState>) -> AppResult<Json<Vec<TrendingMovie>>> {
    let mut movies = state.discovery.now_playing(TRENDING_LIMIT).await?;
    for movie in &mut movies {
        movie.save_count = state.saves.current(&movie.imdb_id).await?;
    }
    Ok(Json(movies))
}

/// Currently popular actors for the landing rail.
pub async fn popular_actors(State(state): State<AppState>) -> AppResult<Json<Vec<PopularActor>>> {
    let actors = state.discovery.popular_people(ACTORS_LIMIT).await?;
    Ok(Json(actors))
}

/// One actor's profile with their movie credits.
pub async fn actor_detail(
    State(state): State<AppState>,
    Path(actor_id): Path<u64>,
) -> AppResult<Json<ActorProfile>> {
    state
        .discovery
        .person(actor_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No actor found for id {}", actor_id)))
}

/// Lists a user's playlists.
pub async fn list_playlists(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<Playlist>>> {
    let playlists = state.playlists.list_playlists(&user_id).await?;
    Ok(Json(playlists))
}

/// Creates a playlist for a user.
pub async fn create_playlist(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<CreatePlaylistRequest>,
) -> AppResult<(StatusCode, Json<Playlist>)> {
    if request.name.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Playlist name cannot be empty".to_string(),
        ));
    }

    let playlist = state
        .playlists
        .create_playlist(&user_id, request.name.trim(), request.cover_emoji)
        .await?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

/// Fetches a single playlist.
pub async fn get_playlist(
    State(state): State<AppState>,
    Path((user_id, playlist_id)): Path<(String, Uuid)>,
) -> AppResult<Json<Playlist>> {
    state
        .playlists
        .get_playlist(&user_id, playlist_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No playlist {} for this user", playlist_id)))
}

/// Adds a movie to a playlist; a first-time add bumps the movie's save count
/// and notifies live subscribers.
pub async fn add_movie(
    State(state): State<AppState>,
    Path((user_id, playlist_id)): Path<(String, Uuid)>,
    Json(request): Json<AddMovieRequest>,
) -> AppResult<Json<AddMovieResponse>> {
    let entry = PlaylistEntry {
        imdb_id: request.imdb_id,
        title: request.title,
        poster: request.poster,
        year: request.year,
    };

    let outcome = playlists::add_movie_to_playlist(
        state.playlists.as_ref(),
        &state.saves,
        &user_id,
        playlist_id,
        &entry,
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("No playlist {} for this user", playlist_id)))?;

    let save_count = state.saves.current(&entry.imdb_id).await?;
    Ok(Json(AddMovieResponse {
        outcome,
        save_count,
    }))
}
