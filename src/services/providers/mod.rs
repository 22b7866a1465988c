//! External data provider abstractions
//!
//! Two read-only collaborators feed the service: a metadata/ratings provider
//! (OMDb-shaped, keyed by IMDb id) and a discovery provider (TMDB-shaped) for
//! now-playing titles. Both are trait objects so handlers and the detail
//! session can be exercised against doubles.

use crate::{
    error::AppResult,
    models::{ActorProfile, MovieRecord, PopularActor, SearchHit, TrendingMovie},
};

pub mod omdb;
pub mod tmdb;

/// Movie metadata and critic ratings, keyed by a public IMDb id.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetches the full record for one movie.
    ///
    /// The provider's "not found" sentinel maps to `Ok(None)`; only transport
    /// and malformed-payload failures are errors.
    async fn fetch_movie(&self, imdb_id: &str) -> AppResult<Option<MovieRecord>>;

    /// Title search by free-text query.
    async fn search(&self, query: &str) -> AppResult<Vec<SearchHit>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Now-playing titles and people for the landing and actor pages.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DiscoveryProvider: Send + Sync {
    /// Returns up to `limit` currently-playing titles, most popular first.
    async fn now_playing(&self, limit: usize) -> AppResult<Vec<TrendingMovie>>;

    /// Returns up to `limit` currently popular actors.
    async fn popular_people(&self, limit: usize) -> AppResult<Vec<PopularActor>>;

    /// Fetches one actor's profile with their movie credits. Unknown person
    /// ids map to `Ok(None)`.
    async fn person(&self, person_id: u64) -> AppResult<Option<ActorProfile>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
