use serde::{Deserialize, Serialize};

/// One entry in the popular-actors rail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopularActor {
    pub id: u64,
    pub name: String,
    pub profile: Option<String>,
    /// Title of the actor's best-known work, when the provider lists one.
    pub known_for: Option<String>,
}

/// One film from an actor's combined credits, keyed for the movie detail page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActorCredit {
    /// IMDb id when the provider knows it, otherwise a `tmdb-{id}` fallback.
    pub imdb_id: String,
    pub title: String,
    pub poster: String,
}

/// The full actor detail payload: person record plus their movie credits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActorProfile {
    pub id: u64,
    pub name: String,
    pub biography: Option<String>,
    pub birthday: Option<String>,
    pub place_of_birth: Option<String>,
    pub profile: Option<String>,
    pub credits: Vec<ActorCredit>,
}
