//! TMDB API provider
//!
//! Supplies the landing-page "now playing" rail and the actor pages. TMDB keys
//! everything by its own numeric ids, so each picked title needs a follow-up
//! detail call for the IMDb id (used everywhere else in the service) and the
//! runtime.
//!
//! API Flow:
//! 1. /movie/now_playing → popularity-ordered pool
//! 2. /movie/{id} per picked title → imdb_id + runtime
//! 3. /person/popular → actors rail
//! 4. /person/{id} + /person/{id}/combined_credits → actor profile, with a
//!    /movie/{id} lookup per credit for its IMDb id

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{ActorCredit, ActorProfile, PopularActor, TrendingMovie},
    services::insights::clip_words,
    services::providers::DiscoveryProvider,
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;

const TRENDING_CACHE_TTL: u64 = 1800; // 30 minutes
const ACTORS_CACHE_TTL: u64 = 3600; // 1 hour
const PERSON_CACHE_TTL: u64 = 86400; // 1 day
const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w780";
const PROFILE_BASE: &str = "https://image.tmdb.org/t/p/w300";
const OVERVIEW_WORDS: usize = 40;
/// How many films of an actor's filmography the profile carries.
const CREDIT_LIMIT: usize = 20;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

#[derive(Debug, Deserialize)]
struct NowPlayingPage {
    results: Vec<NowPlayingEntry>,
}

#[derive(Debug, Deserialize)]
struct NowPlayingEntry {
    id: u64,
    title: String,
    poster_path: Option<String>,
    #[serde(default)]
    overview: String,
}

#[derive(Debug, Deserialize)]
struct MovieDetail {
    imdb_id: Option<String>,
    runtime: Option<u32>,
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PersonPage {
    results: Vec<PersonEntry>,
}

#[derive(Debug, Deserialize)]
struct PersonEntry {
    id: u64,
    name: String,
    profile_path: Option<String>,
    #[serde(default)]
    known_for: Vec<KnownForEntry>,
}

/// Known-for entries mix movies (`title`) and TV shows (`name`).
#[derive(Debug, Deserialize)]
struct KnownForEntry {
    title: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PersonDetail {
    id: u64,
    name: String,
    biography: Option<String>,
    birthday: Option<String>,
    place_of_birth: Option<String>,
    profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CombinedCredits {
    #[serde(default)]
    cast: Vec<CastCredit>,
}

#[derive(Debug, Deserialize)]
struct CastCredit {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    poster_path: Option<String>,
    media_type: Option<String>,
}

impl CastCredit {
    /// Only film credits with artwork make the profile's "known for" rail.
    fn is_presentable_movie(&self) -> bool {
        self.media_type.as_deref() == Some("movie") && self.poster_path.is_some()
    }
}

fn first_known_for(entries: &[KnownForEntry]) -> Option<String> {
    entries
        .first()
        .and_then(|e| e.title.clone().or_else(|| e.name.clone()))
        .filter(|t| !t.is_empty())
}

impl TmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);
        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        response.json::<T>().await.map_err(AppError::from)
    }

    /// Like `get_json`, but a provider 404 is `Ok(None)` instead of an error.
    async fn get_json_opt<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
    ) -> AppResult<Option<T>> {
        let url = format!("{}{}", self.api_url, path);
        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        Ok(Some(response.json::<T>().await?))
    }

    async fn resolve_entry(&self, entry: NowPlayingEntry) -> AppResult<TrendingMovie> {
        let detail: MovieDetail = self.get_json(&format!("/movie/{}", entry.id)).await?;

        Ok(TrendingMovie {
            // No IMDb id on some fresh releases; keep a stable provider-scoped key
            imdb_id: detail
                .imdb_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("tmdb-{}", entry.id)),
            title: entry.title,
            year: extract_year(detail.release_date.as_deref()),
            poster: entry
                .poster_path
                .map(|p| format!("{}{}", POSTER_BASE, p)),
            runtime: detail
                .runtime
                .map(|m| format!("{} min", m))
                .unwrap_or_else(|| "N/A".to_string()),
            overview: clip_words(&entry.overview, OVERVIEW_WORDS),
            save_count: None,
        })
    }

    async fn resolve_credit(&self, credit: CastCredit) -> AppResult<Option<ActorCredit>> {
        let poster = match &credit.poster_path {
            Some(path) => format!("{}{}", PROFILE_BASE, path),
            None => return Ok(None),
        };

        let detail: MovieDetail = self.get_json(&format!("/movie/{}", credit.id)).await?;
        Ok(Some(ActorCredit {
            imdb_id: detail
                .imdb_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("tmdb-{}", credit.id)),
            title: credit
                .title
                .or(credit.name)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_string()),
            poster,
        }))
    }

    async fn fetch_credits(&self, person_id: u64) -> AppResult<Vec<ActorCredit>> {
        let combined: Option<CombinedCredits> = self
            .get_json_opt(&format!("/person/{}/combined_credits", person_id))
            .await?;
        let cast = combined.map(|c| c.cast).unwrap_or_default();

        let mut tasks = Vec::new();
        for credit in cast
            .into_iter()
            .filter(CastCredit::is_presentable_movie)
            .take(CREDIT_LIMIT)
        {
            let provider = self.clone();
            tasks.push(tokio::spawn(
                async move { provider.resolve_credit(credit).await },
            ));
        }

        let mut credits = Vec::new();
        for task in tasks {
            match task.await {
                Ok(Ok(Some(credit))) => credits.push(credit),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, provider = "tmdb", "Dropping unresolvable credit");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Task join error");
                }
            }
        }
        Ok(credits)
    }
}

#[async_trait::async_trait]
impl DiscoveryProvider for TmdbProvider {
    async fn now_playing(&self, limit: usize) -> AppResult<Vec<TrendingMovie>> {
        cached!(self.cache, CacheKey::Trending, TRENDING_CACHE_TTL, async move {
            let page: NowPlayingPage = self.get_json("/movie/now_playing").await?;

            // Detail lookups in parallel; a title that fails resolution is
            // dropped rather than failing the whole rail.
            let mut tasks = Vec::new();
            for entry in page.results.into_iter().take(limit) {
                let provider = self.clone();
                tasks.push(tokio::spawn(
                    async move { provider.resolve_entry(entry).await },
                ));
            }

            let mut movies = Vec::new();
            for task in tasks {
                match task.await {
                    Ok(Ok(movie)) => movies.push(movie),
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, provider = "tmdb", "Dropping unresolvable title");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Task join error");
                    }
                }
            }

            if movies.is_empty() {
                return Err(AppError::ExternalApi(
                    "No now-playing titles could be resolved".to_string(),
                ));
            }

            tracing::info!(
                results = movies.len(),
                provider = "tmdb",
                "Now-playing titles fetched"
            );

            Ok(movies)
        })
    }

    async fn popular_people(&self, limit: usize) -> AppResult<Vec<PopularActor>> {
        cached!(self.cache, CacheKey::PopularActors, ACTORS_CACHE_TTL, async move {
            let page: PersonPage = self.get_json("/person/popular").await?;

            let actors: Vec<PopularActor> = page
                .results
                .into_iter()
                .take(limit)
                .map(|entry| PopularActor {
                    id: entry.id,
                    name: entry.name,
                    profile: entry
                        .profile_path
                        .map(|p| format!("{}{}", PROFILE_BASE, p)),
                    known_for: first_known_for(&entry.known_for),
                })
                .collect();

            tracing::info!(
                results = actors.len(),
                provider = "tmdb",
                "Popular actors fetched"
            );

            Ok::<_, AppError>(actors)
        })
    }

    async fn person(&self, person_id: u64) -> AppResult<Option<ActorProfile>> {
        cached!(
            self.cache,
            CacheKey::ActorProfile(person_id),
            PERSON_CACHE_TTL,
            async move {
                let detail: PersonDetail =
                    match self.get_json_opt(&format!("/person/{}", person_id)).await? {
                        Some(detail) => detail,
                        None => return Ok(None),
                    };

                let credits = self.fetch_credits(person_id).await?;

                tracing::info!(
                    person_id = person_id,
                    name = %detail.name,
                    credits = credits.len(),
                    provider = "tmdb",
                    "Actor profile fetched"
                );

                Ok::<_, AppError>(Some(ActorProfile {
                    id: detail.id,
                    name: detail.name,
                    biography: detail.biography.filter(|b| !b.trim().is_empty()),
                    birthday: detail.birthday.filter(|b| !b.is_empty()),
                    place_of_birth: detail.place_of_birth.filter(|p| !p.is_empty()),
                    profile: detail
                        .profile_path
                        .map(|p| format!("{}{}", POSTER_BASE, p)),
                    credits,
                }))
            }
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

fn extract_year(date: Option<&str>) -> String {
    date.and_then(|d| d.split('-').next())
        .filter(|y| !y.is_empty())
        .unwrap_or("N/A")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_playing_page_deserializes() {
        let json = r#"{
            "page": 1,
            "results": [
                {"id": 27205, "title": "Inception", "poster_path": "/inc.jpg", "overview": "A thief."},
                {"id": 603, "title": "The Matrix", "poster_path": null, "overview": ""}
            ]
        }"#;
        let page: NowPlayingPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].id, 27205);
        assert!(page.results[1].poster_path.is_none());
    }

    #[test]
    fn movie_detail_deserializes() {
        let json = r#"{"imdb_id": "tt1375666", "runtime": 148, "release_date": "2010-07-16"}"#;
        let detail: MovieDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.imdb_id.as_deref(), Some("tt1375666"));
        assert_eq!(detail.runtime, Some(148));
    }

    #[test]
    fn extract_year_from_release_date() {
        assert_eq!(extract_year(Some("2010-07-16")), "2010");
        assert_eq!(extract_year(Some("")), "N/A");
        assert_eq!(extract_year(None), "N/A");
    }

    #[test]
    fn person_page_deserializes() {
        let json = r#"{
            "page": 1,
            "results": [
                {
                    "id": 6193,
                    "name": "Leonardo DiCaprio",
                    "profile_path": "/leo.jpg",
                    "known_for": [
                        {"title": "Inception", "media_type": "movie"},
                        {"name": "Some Show", "media_type": "tv"}
                    ]
                },
                {"id": 819, "name": "Edward Norton", "profile_path": null}
            ]
        }"#;
        let page: PersonPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].id, 6193);
        assert!(page.results[1].known_for.is_empty());
    }

    #[test]
    fn known_for_prefers_movie_title_over_tv_name() {
        let entries = vec![
            KnownForEntry {
                title: Some("Inception".to_string()),
                name: None,
            },
            KnownForEntry {
                title: None,
                name: Some("Some Show".to_string()),
            },
        ];
        assert_eq!(first_known_for(&entries), Some("Inception".to_string()));

        let tv_first = vec![KnownForEntry {
            title: None,
            name: Some("Some Show".to_string()),
        }];
        assert_eq!(first_known_for(&tv_first), Some("Some Show".to_string()));
        assert_eq!(first_known_for(&[]), None);
    }

    #[test]
    fn person_detail_deserializes() {
        let json = r#"{
            "id": 6193,
            "name": "Leonardo DiCaprio",
            "biography": "An American actor.",
            "birthday": "1974-11-11",
            "place_of_birth": "Los Angeles, California, USA",
            "profile_path": "/leo.jpg"
        }"#;
        let detail: PersonDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.id, 6193);
        assert_eq!(detail.birthday.as_deref(), Some("1974-11-11"));
    }

    #[test]
    fn cast_credits_filter_to_movies_with_artwork() {
        let json = r#"{
            "cast": [
                {"id": 27205, "title": "Inception", "poster_path": "/inc.jpg", "media_type": "movie"},
                {"id": 1399, "name": "Game of Thrones", "poster_path": "/got.jpg", "media_type": "tv"},
                {"id": 603, "title": "The Matrix", "poster_path": null, "media_type": "movie"}
            ]
        }"#;
        let combined: CombinedCredits = serde_json::from_str(json).unwrap();
        let presentable: Vec<_> = combined
            .cast
            .iter()
            .filter(|c| c.is_presentable_movie())
            .collect();
        assert_eq!(presentable.len(), 1);
        assert_eq!(presentable[0].id, 27205);
    }
}
