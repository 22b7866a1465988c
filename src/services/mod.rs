pub mod insights;
pub mod movie_detail;
pub mod playlists;
pub mod providers;
pub mod save_counts;
