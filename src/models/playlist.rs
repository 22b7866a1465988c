use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A movie reference stored inside a playlist. Enough to render a tile without
/// a round trip to the metadata provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaylistEntry {
    pub imdb_id: String,
    pub title: String,
    pub poster: Option<String>,
    pub year: String,
}

/// A user-owned named collection of movie references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Playlist {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub cover_emoji: Option<String>,
    pub movies: Vec<PlaylistEntry>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of adding a movie to a playlist. Adds are idempotent per IMDb id;
/// only a first-time add bumps the movie's save count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}
