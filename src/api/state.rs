use std::sync::Arc;

use crate::services::{
    playlists::PlaylistRepo,
    providers::{DiscoveryProvider, MetadataProvider},
    save_counts::SaveCountHub,
};

/// Shared application state
///
/// Everything behind trait objects so handlers can be exercised against
/// doubles in tests.
#[derive(Clone)]
pub struct AppState {
    pub metadata: Arc<dyn MetadataProvider>,
    pub discovery: Arc<dyn DiscoveryProvider>,
    pub playlists: Arc<dyn PlaylistRepo>,
    pub saves: SaveCountHub,
}

impl AppState {
    pub fn new(
        metadata: Arc<dyn MetadataProvider>,
        discovery: Arc<dyn DiscoveryProvider>,
        playlists: Arc<dyn PlaylistRepo>,
    ) -> Self {
        let saves = SaveCountHub::new(playlists.clone());
        Self {
            metadata,
            discovery,
            playlists,
            saves,
        }
    }
}
