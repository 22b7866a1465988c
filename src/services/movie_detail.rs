//! Movie detail orchestration.
//!
//! A `DetailSession` drives one detail view: it fetches the record for the
//! movie the view navigated to, derives the insights view model, and then
//! follows the live save-count channel, republishing a fresh snapshot on every
//! push.
//!
//! Two producers race here: record fetches and save-count pushes. Each
//! navigation takes a monotonically increasing generation number, and nothing
//! is published unless its generation is still the current one, so a slow
//! fetch for a movie the user already left can never overwrite the newer view.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{
    models::{MovieInsights, MovieRecord},
    services::providers::MetadataProvider,
    services::save_counts::SaveCountHub,
};

/// Everything a detail view renders, derived for one movie at one point in
/// time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailSnapshot {
    pub imdb_id: String,
    pub movie: MovieRecord,
    pub insights: MovieInsights,
    pub save_count: Option<i64>,
}

/// What the detail view currently shows. `NotFound` is terminal for the
/// navigated id, so consumers can stop waiting instead of treating it like
/// the initial pending state.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Pending,
    NotFound,
    Ready(DetailSnapshot),
}

pub struct DetailSession {
    metadata: Arc<dyn MetadataProvider>,
    saves: SaveCountHub,
    generation: Arc<AtomicU64>,
    tx: watch::Sender<DetailState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DetailSession {
    pub fn new(metadata: Arc<dyn MetadataProvider>, saves: SaveCountHub) -> Self {
        let (tx, _rx) = watch::channel(DetailState::Pending);
        Self {
            metadata,
            saves,
            generation: Arc::new(AtomicU64::new(0)),
            tx,
            task: Mutex::new(None),
        }
    }

    /// Observes the session's state. The receiver starts at the current value
    /// and sees every subsequent publication.
    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.tx.subscribe()
    }

    /// Navigates the view to a movie.
    ///
    /// Supersedes any in-flight fetch: the previous worker is aborted, and the
    /// generation bump makes sure a response that still manages to resolve is
    /// discarded instead of published.
    pub fn navigate(&self, imdb_id: &str) {
        let generation = self.generation.clone();
        let token = generation.fetch_add(1, Ordering::SeqCst) + 1;

        let metadata = self.metadata.clone();
        let saves = self.saves.clone();
        let tx = self.tx.clone();
        let imdb_id = imdb_id.to_string();

        let handle = tokio::spawn(async move {
            let movie = match metadata.fetch_movie(&imdb_id).await {
                Ok(Some(movie)) => movie,
                Ok(None) => {
                    // Terminal empty state for the page
                    publish_if_current(&tx, &generation, token, DetailState::NotFound);
                    return;
                }
                Err(e) => {
                    tracing::error!(imdb_id = %imdb_id, error = %e, "Movie fetch failed");
                    return;
                }
            };

            if generation.load(Ordering::SeqCst) != token {
                tracing::debug!(imdb_id = %imdb_id, "Superseded fetch discarded");
                return;
            }

            let mut counts = match saves.subscribe(&imdb_id).await {
                Ok(rx) => rx,
                Err(e) => {
                    tracing::warn!(imdb_id = %imdb_id, error = %e, "Save-count subscription failed");
                    let snapshot = snapshot_for(&imdb_id, &movie, None);
                    publish_if_current(&tx, &generation, token, DetailState::Ready(snapshot));
                    return;
                }
            };

            let mut count = *counts.borrow_and_update();
            loop {
                let snapshot = snapshot_for(&imdb_id, &movie, count);
                if !publish_if_current(&tx, &generation, token, DetailState::Ready(snapshot)) {
                    return;
                }
                if counts.changed().await.is_err() {
                    return;
                }
                count = *counts.borrow_and_update();
            }
        });

        if let Ok(mut slot) = self.task.lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.abort();
            }
        }
    }
}

impl Drop for DetailSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().ok().and_then(|mut slot| slot.take()) {
            task.abort();
        }
    }
}

fn snapshot_for(imdb_id: &str, movie: &MovieRecord, save_count: Option<i64>) -> DetailSnapshot {
    DetailSnapshot {
        imdb_id: imdb_id.to_string(),
        insights: MovieInsights::build(movie, save_count),
        movie: movie.clone(),
        save_count,
    }
}

/// Publishes under the channel lock, re-checking the generation so a stale
/// worker loses even if it raced past its earlier check. Returns whether the
/// value was published.
fn publish_if_current(
    tx: &watch::Sender<DetailState>,
    generation: &AtomicU64,
    token: u64,
    state: DetailState,
) -> bool {
    let mut published = false;
    tx.send_if_modified(|slot| {
        if generation.load(Ordering::SeqCst) != token {
            return false;
        }
        *slot = state;
        published = true;
        true
    });
    published
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppResult;
    use crate::models::{RatingPair, SearchHit};
    use crate::services::playlists::MockPlaylistRepo;
    use std::collections::HashMap;
    use std::time::Duration;

    fn record(imdb_id: &str, title: &str) -> MovieRecord {
        MovieRecord {
            imdb_id: imdb_id.to_string(),
            title: title.to_string(),
            year: "2010".to_string(),
            genre: None,
            director: None,
            actors: None,
            plot: None,
            poster: None,
            runtime: Some("148 min".to_string()),
            rated: None,
            imdb_rating: Some("7.5".to_string()),
            ratings: vec![RatingPair {
                source: "Internet Movie Database".to_string(),
                value: "7.5/10".to_string(),
            }],
            language: None,
            country: None,
            awards: None,
            box_office: None,
            metascore: Some("74".to_string()),
            imdb_votes: None,
            released: None,
        }
    }

    /// Resolves each known id after its configured delay; unknown ids are the
    /// not-found sentinel.
    struct SlowProvider {
        movies: HashMap<String, (Duration, MovieRecord)>,
    }

    #[async_trait::async_trait]
    impl MetadataProvider for SlowProvider {
        async fn fetch_movie(&self, imdb_id: &str) -> AppResult<Option<MovieRecord>> {
            match self.movies.get(imdb_id) {
                Some((delay, movie)) => {
                    tokio::time::sleep(*delay).await;
                    Ok(Some(movie.clone()))
                }
                None => Ok(None),
            }
        }

        async fn search(&self, _query: &str) -> AppResult<Vec<SearchHit>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &'static str {
            "slow-stub"
        }
    }

    fn hub() -> SaveCountHub {
        let mut repo = MockPlaylistRepo::new();
        repo.expect_save_count().returning(|_| Ok(None));
        SaveCountHub::new(Arc::new(repo))
    }

    fn session_with(movies: Vec<(&str, Duration)>) -> DetailSession {
        let movies = movies
            .into_iter()
            .map(|(id, delay)| (id.to_string(), (delay, record(id, &format!("Movie {}", id)))))
            .collect();
        DetailSession::new(Arc::new(SlowProvider { movies }), hub())
    }

    async fn next_state(rx: &mut watch::Receiver<DetailState>) -> DetailState {
        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .expect("timed out waiting for snapshot")
            .expect("session channel closed");
        rx.borrow_and_update().clone()
    }

    fn ready(state: DetailState) -> DetailSnapshot {
        match state {
            DetailState::Ready(snapshot) => snapshot,
            other => panic!("expected a ready snapshot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn publishes_snapshot_for_navigated_movie() {
        let session = session_with(vec![("ttA", Duration::from_millis(1))]);
        let mut rx = session.subscribe();

        session.navigate("ttA");
        let snapshot = ready(next_state(&mut rx).await);
        assert_eq!(snapshot.imdb_id, "ttA");
        assert_eq!(snapshot.insights.imdb_gauge[0].value, 75.0);
        assert_eq!(snapshot.insights.stats[4].value, "Was not saved");
    }

    #[tokio::test]
    async fn stale_response_cannot_overwrite_newer_navigation() {
        // A resolves slowly; the user moves on to B before it lands.
        let session = session_with(vec![
            ("ttA", Duration::from_millis(80)),
            ("ttB", Duration::from_millis(5)),
        ]);
        let mut rx = session.subscribe();

        session.navigate("ttA");
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.navigate("ttB");

        let snapshot = ready(next_state(&mut rx).await);
        assert_eq!(snapshot.imdb_id, "ttB");

        // Give A's fetch time to resolve; the view must still show B.
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(ready(rx.borrow().clone()).imdb_id, "ttB");
    }

    #[tokio::test]
    async fn not_found_publishes_terminal_empty_state() {
        let session = session_with(vec![]);
        let mut rx = session.subscribe();

        session.navigate("tt404");
        assert_eq!(next_state(&mut rx).await, DetailState::NotFound);
    }

    #[tokio::test]
    async fn save_count_push_rebuilds_insights() {
        let metadata = Arc::new(SlowProvider {
            movies: [(
                "ttA".to_string(),
                (Duration::from_millis(1), record("ttA", "Movie A")),
            )]
            .into_iter()
            .collect(),
        });

        let mut repo = MockPlaylistRepo::new();
        repo.expect_save_count().returning(|_| Ok(Some(3)));
        let saves = SaveCountHub::new(Arc::new(repo));

        let session = DetailSession::new(metadata, saves.clone());
        let mut rx = session.subscribe();

        session.navigate("ttA");
        let first = ready(next_state(&mut rx).await);
        assert_eq!(first.save_count, Some(3));
        assert_eq!(first.insights.stats[4].value, "3x");

        saves.publish("ttA", 4).await;
        let second = ready(next_state(&mut rx).await);
        assert_eq!(second.save_count, Some(4));
        assert_eq!(second.insights.stats[4].value, "4x");
    }
}
