pub mod actor;
pub mod insights;
pub mod movie;
pub mod playlist;

pub use actor::{ActorCredit, ActorProfile, PopularActor};
pub use insights::{GaugeSlice, MovieInsights, RatingPoint, StatItem};
pub use movie::{MovieRecord, RatingPair, SearchHit, TrendingMovie};
pub use playlist::{AddOutcome, Playlist, PlaylistEntry};
