//! Live save-count fanout.
//!
//! The save count is a per-movie integer owned by the playlist store. Detail
//! views observe it live: each movie gets a `tokio::sync::watch` channel,
//! seeded from the store on first subscription and pushed to by the playlist
//! add flow. Subscribers stop receiving by dropping their receiver; the hub
//! never originates counter writes itself.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, RwLock};

use crate::{error::AppResult, services::playlists::PlaylistRepo};

#[derive(Clone)]
pub struct SaveCountHub {
    repo: Arc<dyn PlaylistRepo>,
    channels: Arc<RwLock<HashMap<String, watch::Sender<Option<i64>>>>>,
}

impl SaveCountHub {
    pub fn new(repo: Arc<dyn PlaylistRepo>) -> Self {
        Self {
            repo,
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// One-shot read of the current count straight from the store.
    pub async fn current(&self, imdb_id: &str) -> AppResult<Option<i64>> {
        self.repo.save_count(imdb_id).await
    }

    /// Subscribes to live count updates for one movie.
    ///
    /// The channel is created on first use, seeded with the stored value so a
    /// fresh subscriber sees the present count before any push arrives. A
    /// channel whose receivers have all dropped is replaced with a freshly
    /// seeded one rather than reused.
    pub async fn subscribe(&self, imdb_id: &str) -> AppResult<watch::Receiver<Option<i64>>> {
        if let Some(tx) = self.channels.read().await.get(imdb_id) {
            if tx.receiver_count() > 0 {
                return Ok(tx.subscribe());
            }
        }

        let seed = self.repo.save_count(imdb_id).await?;

        let mut channels = self.channels.write().await;
        // Another subscriber may have raced us between the locks
        match channels.get(imdb_id) {
            Some(tx) if tx.receiver_count() > 0 => Ok(tx.subscribe()),
            _ => {
                let (tx, rx) = watch::channel(seed);
                channels.insert(imdb_id.to_string(), tx);
                Ok(rx)
            }
        }
    }

    /// Pushes a fresh count to live subscribers. Called by the playlist add
    /// flow after a successful increment; a movie nobody watches is a no-op.
    /// Channels without receivers are pruned here so the map does not grow
    /// with every movie ever viewed.
    pub async fn publish(&self, imdb_id: &str, count: i64) {
        let mut channels = self.channels.write().await;
        if let Some(tx) = channels.get(imdb_id) {
            if tx.receiver_count() == 0 {
                channels.remove(imdb_id);
            } else {
                tx.send_replace(Some(count));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::playlists::MockPlaylistRepo;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn subscribe_seeds_from_store() {
        let mut repo = MockPlaylistRepo::new();
        repo.expect_save_count()
            .with(eq("tt0133093"))
            .returning(|_| Ok(Some(7)));

        let hub = SaveCountHub::new(Arc::new(repo));
        let rx = hub.subscribe("tt0133093").await.unwrap();
        assert_eq!(*rx.borrow(), Some(7));
    }

    #[tokio::test]
    async fn subscribe_unsaved_movie_seeds_none() {
        let mut repo = MockPlaylistRepo::new();
        repo.expect_save_count().returning(|_| Ok(None));

        let hub = SaveCountHub::new(Arc::new(repo));
        let rx = hub.subscribe("tt0000001").await.unwrap();
        assert_eq!(*rx.borrow(), None);
    }

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let mut repo = MockPlaylistRepo::new();
        repo.expect_save_count().returning(|_| Ok(Some(1)));

        let hub = SaveCountHub::new(Arc::new(repo));
        let mut rx = hub.subscribe("tt0133093").await.unwrap();

        hub.publish("tt0133093", 2).await;
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Some(2));
    }

    #[tokio::test]
    async fn publish_prunes_channel_without_receivers() {
        let mut repo = MockPlaylistRepo::new();
        // Once for the first seed, once more because the pruned channel forces
        // a reseed.
        repo.expect_save_count().times(2).returning(|_| Ok(Some(1)));

        let hub = SaveCountHub::new(Arc::new(repo));
        let rx = hub.subscribe("tt0133093").await.unwrap();
        drop(rx);

        hub.publish("tt0133093", 2).await;
        let rx = hub.subscribe("tt0133093").await.unwrap();
        assert_eq!(*rx.borrow(), Some(1));
    }

    #[tokio::test]
    async fn subscribe_reseeds_after_all_receivers_drop() {
        use std::sync::atomic::{AtomicI64, Ordering};

        let reads = Arc::new(AtomicI64::new(0));
        let counter = reads.clone();
        let mut repo = MockPlaylistRepo::new();
        repo.expect_save_count()
            .returning(move |_| Ok(Some(counter.fetch_add(1, Ordering::SeqCst) + 1)));

        let hub = SaveCountHub::new(Arc::new(repo));
        let first = hub.subscribe("tt0133093").await.unwrap();
        assert_eq!(*first.borrow(), Some(1));
        drop(first);

        // The store moved on while nobody was listening; a new subscriber
        // must see the fresh value, not the dead channel's stale one.
        let second = hub.subscribe("tt0133093").await.unwrap();
        assert_eq!(*second.borrow(), Some(2));
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_subscriber_reuses_channel() {
        let mut repo = MockPlaylistRepo::new();
        // Seeding hits the store once; the second subscriber attaches to the
        // existing channel.
        repo.expect_save_count().times(1).returning(|_| Ok(Some(3)));

        let hub = SaveCountHub::new(Arc::new(repo));
        let _first = hub.subscribe("tt0133093").await.unwrap();
        let second = hub.subscribe("tt0133093").await.unwrap();
        assert_eq!(*second.borrow(), Some(3));
    }
}
