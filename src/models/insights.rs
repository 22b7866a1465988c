use serde::{Deserialize, Serialize};

/// One critic rating normalized onto the 0-100 scale.
///
/// Invariant: `0 <= value <= 100` for entries that parsed; entries that did not
/// parse resolve to `0` rather than being dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingPoint {
    pub source: String,
    pub value: f64,
}

/// One slice of a value/remainder gauge pair.
///
/// Gauges always come as exactly two slices that sum to 100: the score slice
/// (named after its source) and a `"Remaining"` slice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GaugeSlice {
    pub name: String,
    pub value: f64,
}

/// One display row in the quick-stats grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatItem {
    pub icon: String,
    pub label: String,
    pub value: String,
}

/// The derived, read-only view model for a movie detail page: normalized
/// critic ratings, the two score gauges, display score strings and the
/// quick-stats rows. Rebuilt whenever the record or the save count changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieInsights {
    pub rating_breakdown: Vec<RatingPoint>,
    pub imdb_gauge: [GaugeSlice; 2],
    pub meta_gauge: [GaugeSlice; 2],
    pub imdb_score: String,
    pub meta_score: String,
    pub stats: Vec<StatItem>,
}
