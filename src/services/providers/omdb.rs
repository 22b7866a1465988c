//! OMDb API provider
//!
//! Serves both the full movie record (with the critic ratings list) and title
//! search. OMDb signals "not found" in-band with `"Response": "False"` plus an
//! error message; that sentinel must suppress rendering, never crash, so it
//! maps to `None` / an empty result list here.

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{MovieRecord, SearchHit},
    services::providers::MetadataProvider,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

const DETAIL_CACHE_TTL: u64 = 86400; // 1 day
const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour

#[derive(Clone)]
pub struct OmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

/// Just enough of an OMDb payload to read the response sentinel before
/// committing to a full deserialization.
#[derive(Debug, Deserialize)]
struct ResponseProbe {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
}

impl ResponseProbe {
    fn is_failure(&self) -> bool {
        self.response.eq_ignore_ascii_case("false")
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "Search", default)]
    search: Vec<SearchHit>,
}

impl OmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    async fn get_text(&self, query: &[(&str, &str)]) -> AppResult<String> {
        let response = self
            .http_client
            .get(&self.api_url)
            .query(query)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OMDb API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for OmdbProvider {
    async fn fetch_movie(&self, imdb_id: &str) -> AppResult<Option<MovieRecord>> {
        if imdb_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Movie id cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::MovieDetail(imdb_id.to_string()),
            DETAIL_CACHE_TTL,
            async move {
                let body = self.get_text(&[("i", imdb_id), ("plot", "full")]).await?;

                let probe: ResponseProbe = serde_json::from_str(&body).map_err(|e| {
                    AppError::ExternalApi(format!("Failed to parse OMDb response: {}", e))
                })?;

                if probe.is_failure() {
                    tracing::debug!(
                        imdb_id = %imdb_id,
                        error = probe.error.as_deref().unwrap_or("unknown"),
                        provider = "omdb",
                        "Movie not found"
                    );
                    return Ok(None);
                }

                let record: MovieRecord = serde_json::from_str(&body).map_err(|e| {
                    tracing::error!(error = %e, response = %body, "Failed to deserialize OMDb record");
                    AppError::ExternalApi(format!("Failed to parse OMDb record: {}", e))
                })?;

                tracing::info!(
                    imdb_id = %imdb_id,
                    title = %record.title,
                    ratings = record.ratings.len(),
                    provider = "omdb",
                    "Movie record fetched"
                );

                Ok::<_, AppError>(Some(record))
            }
        )
    }

    async fn search(&self, query: &str) -> AppResult<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::TitleSearch(query.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let body = self.get_text(&[("s", query)]).await?;

                let probe: ResponseProbe = serde_json::from_str(&body).map_err(|e| {
                    AppError::ExternalApi(format!("Failed to parse OMDb response: {}", e))
                })?;

                // "Movie not found!" / "Too many results." both come back as
                // Response=False; either way there is nothing to show.
                if probe.is_failure() {
                    return Ok(Vec::new());
                }

                let envelope: SearchEnvelope = serde_json::from_str(&body).map_err(|e| {
                    AppError::ExternalApi(format!("Failed to parse OMDb search results: {}", e))
                })?;

                tracing::info!(
                    query = %query,
                    results = envelope.search.len(),
                    provider = "omdb",
                    "Title search completed"
                );

                Ok::<_, AppError>(envelope.search)
            }
        )
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_reads_failure_sentinel() {
        let json = r#"{"Response": "False", "Error": "Movie not found!"}"#;
        let probe: ResponseProbe = serde_json::from_str(json).unwrap();
        assert!(probe.is_failure());
        assert_eq!(probe.error.as_deref(), Some("Movie not found!"));
    }

    #[test]
    fn probe_reads_success_sentinel() {
        let json = r#"{"Title": "Inception", "Response": "True"}"#;
        let probe: ResponseProbe = serde_json::from_str(json).unwrap();
        assert!(!probe.is_failure());
    }

    #[test]
    fn search_envelope_defaults_to_empty() {
        let json = r#"{"Response": "True", "totalResults": "0"}"#;
        let envelope: SearchEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.search.is_empty());
    }

    #[test]
    fn search_envelope_deserializes_hits() {
        let json = r#"{
            "Search": [
                {"Title": "The Matrix", "Year": "1999", "imdbID": "tt0133093", "Type": "movie", "Poster": "N/A"}
            ],
            "totalResults": "1",
            "Response": "True"
        }"#;
        let envelope: SearchEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.search.len(), 1);
        assert_eq!(envelope.search[0].imdb_id, "tt0133093");
    }
}
