use serde::{Deserialize, Serialize};

/// One critic rating as delivered by the metadata provider, e.g.
/// `{"Source": "Rotten Tomatoes", "Value": "91%"}`. The value string comes in
/// several shapes (`"7.5/10"`, `"84%"`, plain numbers) and is only interpreted
/// by the insights normalizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingPair {
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// The full metadata/ratings payload for one film, in the provider's wire shape
/// (OMDb: PascalCase keys with a handful of `imdb*` exceptions).
///
/// Immutable once fetched. Textual fields are optional because the provider
/// omits or `"N/A"`s them freely; display fallbacks live in the insights layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct MovieRecord {
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    pub title: String,
    pub year: String,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub actors: Option<String>,
    pub plot: Option<String>,
    pub poster: Option<String>,
    pub runtime: Option<String>,
    pub rated: Option<String>,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: Option<String>,
    #[serde(default)]
    pub ratings: Vec<RatingPair>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub awards: Option<String>,
    pub box_office: Option<String>,
    pub metascore: Option<String>,
    #[serde(rename = "imdbVotes")]
    pub imdb_votes: Option<String>,
    pub released: Option<String>,
}

/// A single row from the metadata provider's title search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct SearchHit {
    pub title: String,
    pub year: String,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "Type")]
    pub kind: String,
    pub poster: String,
}

/// A now-playing title from the discovery provider, enriched with the local
/// save count before it goes out to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendingMovie {
    /// IMDb id when the provider knows it, otherwise a `tmdb-{id}` fallback.
    pub imdb_id: String,
    pub title: String,
    pub year: String,
    pub poster: Option<String>,
    pub runtime: String,
    /// Overview clipped to a preview length.
    pub overview: String,
    #[serde(default)]
    pub save_count: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_record_deserializes_omdb_shape() {
        let json = r#"{
            "Title": "Inception",
            "Year": "2010",
            "Rated": "PG-13",
            "Released": "16 Jul 2010",
            "Runtime": "148 min",
            "Genre": "Action, Adventure, Sci-Fi",
            "Director": "Christopher Nolan",
            "Actors": "Leonardo DiCaprio, Joseph Gordon-Levitt",
            "Plot": "A thief who steals corporate secrets...",
            "Language": "English, Japanese, French",
            "Country": "United States, United Kingdom",
            "Awards": "Won 4 Oscars. 159 wins & 220 nominations total",
            "Poster": "https://example.com/inception.jpg",
            "Ratings": [
                {"Source": "Internet Movie Database", "Value": "8.8/10"},
                {"Source": "Rotten Tomatoes", "Value": "87%"}
            ],
            "Metascore": "74",
            "imdbRating": "8.8",
            "imdbVotes": "2,400,000",
            "imdbID": "tt1375666",
            "BoxOffice": "$292,587,330",
            "Response": "True"
        }"#;

        let record: MovieRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.imdb_id, "tt1375666");
        assert_eq!(record.title, "Inception");
        assert_eq!(record.ratings.len(), 2);
        assert_eq!(record.ratings[1].value, "87%");
        assert_eq!(record.box_office.as_deref(), Some("$292,587,330"));
        assert_eq!(record.imdb_votes.as_deref(), Some("2,400,000"));
    }

    #[test]
    fn movie_record_tolerates_missing_fields() {
        let json = r#"{
            "Title": "Obscure Short",
            "Year": "1999",
            "imdbID": "tt0000001"
        }"#;

        let record: MovieRecord = serde_json::from_str(json).unwrap();
        assert!(record.ratings.is_empty());
        assert!(record.box_office.is_none());
        assert!(record.metascore.is_none());
    }

    #[test]
    fn search_hit_deserializes() {
        let json = r#"{
            "Title": "The Matrix",
            "Year": "1999",
            "imdbID": "tt0133093",
            "Type": "movie",
            "Poster": "https://example.com/matrix.jpg"
        }"#;

        let hit: SearchHit = serde_json::from_str(json).unwrap();
        assert_eq!(hit.imdb_id, "tt0133093");
        assert_eq!(hit.kind, "movie");
    }
}
