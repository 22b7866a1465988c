//! Playlist persistence and the add-movie flow.
//!
//! Playlists are per-user named collections of movie references. The per-movie
//! save count lives next to them: it counts first-time adds across all users
//! and playlists, and the rest of the service only ever reads it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{AddOutcome, Playlist, PlaylistEntry},
    services::save_counts::SaveCountHub,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaylistRepo: Send + Sync {
    async fn list_playlists(&self, user_id: &str) -> AppResult<Vec<Playlist>>;

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        cover_emoji: Option<String>,
    ) -> AppResult<Playlist>;

    async fn get_playlist(&self, user_id: &str, playlist_id: Uuid) -> AppResult<Option<Playlist>>;

    /// Inserts the entry unless the movie is already in the playlist.
    async fn add_movie(
        &self,
        user_id: &str,
        playlist_id: Uuid,
        entry: &PlaylistEntry,
    ) -> AppResult<Option<AddOutcome>>;

    /// Current save count for a movie; `None` if nobody has saved it yet.
    async fn save_count(&self, imdb_id: &str) -> AppResult<Option<i64>>;

    /// Bumps the save count and returns the new value.
    async fn increment_save_count(&self, imdb_id: &str) -> AppResult<i64>;
}

/// Adds a movie to a playlist and keeps the save counter in sync.
///
/// Only a first-time add increments the counter; the new value is pushed to
/// live subscribers through the hub. Returns `None` when the playlist does not
/// exist for that user.
pub async fn add_movie_to_playlist(
    repo: &dyn PlaylistRepo,
    saves: &SaveCountHub,
    user_id: &str,
    playlist_id: Uuid,
    entry: &PlaylistEntry,
) -> AppResult<Option<AddOutcome>> {
    let outcome = match repo.add_movie(user_id, playlist_id, entry).await? {
        Some(outcome) => outcome,
        None => return Ok(None),
    };

    if outcome == AddOutcome::Added {
        let count = repo.increment_save_count(&entry.imdb_id).await?;
        saves.publish(&entry.imdb_id, count).await;
        tracing::info!(
            imdb_id = %entry.imdb_id,
            playlist_id = %playlist_id,
            save_count = count,
            "Movie saved to playlist"
        );
    }

    Ok(Some(outcome))
}

/// Postgres-backed playlist store.
#[derive(Clone)]
pub struct PostgresPlaylistRepo {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct PlaylistRow {
    id: Uuid,
    user_id: String,
    name: String,
    cover_emoji: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    playlist_id: Uuid,
    imdb_id: String,
    title: String,
    poster: Option<String>,
    year: String,
}

impl PostgresPlaylistRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn entries_for(&self, playlist_ids: &[Uuid]) -> AppResult<Vec<EntryRow>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT playlist_id, imdb_id, title, poster, year
            FROM playlist_movies
            WHERE playlist_id = ANY($1)
            ORDER BY added_at
            "#,
        )
        .bind(playlist_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

fn assemble(row: PlaylistRow, entries: Vec<EntryRow>) -> Playlist {
    Playlist {
        id: row.id,
        user_id: row.user_id,
        name: row.name,
        cover_emoji: row.cover_emoji,
        movies: entries
            .into_iter()
            .map(|e| PlaylistEntry {
                imdb_id: e.imdb_id,
                title: e.title,
                poster: e.poster,
                year: e.year,
            })
            .collect(),
        created_at: row.created_at,
    }
}

#[async_trait]
impl PlaylistRepo for PostgresPlaylistRepo {
    async fn list_playlists(&self, user_id: &str) -> AppResult<Vec<Playlist>> {
        let rows = sqlx::query_as::<_, PlaylistRow>(
            r#"
            SELECT id, user_id, name, cover_emoji, created_at
            FROM playlists
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut entries = self.entries_for(&ids).await?;

        let playlists = rows
            .into_iter()
            .map(|row| {
                let (own, rest): (Vec<_>, Vec<_>) =
                    entries.drain(..).partition(|e| e.playlist_id == row.id);
                entries = rest;
                assemble(row, own)
            })
            .collect();

        Ok(playlists)
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        cover_emoji: Option<String>,
    ) -> AppResult<Playlist> {
        let row = sqlx::query_as::<_, PlaylistRow>(
            r#"
            INSERT INTO playlists (id, user_id, name, cover_emoji, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, cover_emoji, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .bind(cover_emoji)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = %user_id, playlist_id = %row.id, "Playlist created");
        Ok(assemble(row, Vec::new()))
    }

    async fn get_playlist(&self, user_id: &str, playlist_id: Uuid) -> AppResult<Option<Playlist>> {
        let row = sqlx::query_as::<_, PlaylistRow>(
            r#"
            SELECT id, user_id, name, cover_emoji, created_at
            FROM playlists
            WHERE user_id = $1 AND id = $2
            "#,
        )
        .bind(user_id)
        .bind(playlist_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let entries = self.entries_for(&[row.id]).await?;
                Ok(Some(assemble(row, entries)))
            }
            None => Ok(None),
        }
    }

    async fn add_movie(
        &self,
        user_id: &str,
        playlist_id: Uuid,
        entry: &PlaylistEntry,
    ) -> AppResult<Option<AddOutcome>> {
        // Ownership check first so one user cannot grow another's playlist
        if self.get_playlist(user_id, playlist_id).await?.is_none() {
            return Ok(None);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO playlist_movies (playlist_id, imdb_id, title, poster, year, added_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (playlist_id, imdb_id) DO NOTHING
            "#,
        )
        .bind(playlist_id)
        .bind(&entry.imdb_id)
        .bind(&entry.title)
        .bind(&entry.poster)
        .bind(&entry.year)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(Some(AddOutcome::AlreadyPresent))
        } else {
            Ok(Some(AddOutcome::Added))
        }
    }

    async fn save_count(&self, imdb_id: &str) -> AppResult<Option<i64>> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT save_count FROM movie_saves WHERE imdb_id = $1",
        )
        .bind(imdb_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(count)
    }

    async fn increment_save_count(&self, imdb_id: &str) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO movie_saves (imdb_id, save_count)
            VALUES ($1, 1)
            ON CONFLICT (imdb_id)
            DO UPDATE SET save_count = movie_saves.save_count + 1
            RETURNING save_count
            "#,
        )
        .bind(imdb_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
