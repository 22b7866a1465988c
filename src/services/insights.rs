//! Rating/stat normalization for the movie detail view.
//!
//! Critic ratings arrive in three shapes: fractional (`"7.5/10"`), percentage
//! (`"84%"`), and plain numeric scores. Everything here follows a single
//! policy: malformed input degrades to zeros and placeholder text, nothing
//! errors. The detail page always renders something.

use crate::models::{GaugeSlice, MovieInsights, MovieRecord, RatingPair, RatingPoint, StatItem};

/// Converts one raw rating string to the 0-100 scale.
///
/// * `"N/D"` with numeric N, D → `(N / D) * 100`
/// * `"NN%"` → the leading numeric portion, unchanged
/// * anything else → `0`
///
/// A bare numeric score (`"75"`) also resolves to `0` here; callers that hold
/// an already-normalized score (the Metascore field) go through [`build_gauge`]
/// instead, which parses it directly.
pub fn normalize_rating(raw: &str) -> f64 {
    if let Some((num, den)) = raw.split_once('/') {
        return match (num.trim().parse::<f64>(), den.trim().parse::<f64>()) {
            (Ok(n), Ok(d)) => {
                let value = (n / d) * 100.0;
                // "5/0" would put Infinity on a chart
                if value.is_finite() {
                    value
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };
    }
    if raw.contains('%') {
        return leading_number(raw).unwrap_or(0.0);
    }
    0.0
}

/// Maps the provider's ratings list onto chart points, one per source.
pub fn parse_ratings(ratings: &[RatingPair]) -> Vec<RatingPoint> {
    ratings
        .iter()
        .map(|r| RatingPoint {
            source: r.source.clone(),
            value: normalize_rating(&r.value),
        })
        .collect()
}

/// Builds a two-slice value/remainder gauge from a raw decimal score string.
///
/// `scale` maps the source's native range onto 0-100: 10 for IMDb scores
/// ("7.5"), 1 for Metascores ("75"). Non-numeric input counts as zero, so the
/// gauge renders empty instead of failing. The two slices always sum to 100.
pub fn build_gauge(label: &str, raw: &str, scale: f64) -> [GaugeSlice; 2] {
    let value = leading_number(raw).unwrap_or(0.0) * scale;
    [
        GaugeSlice {
            name: label.to_string(),
            value,
        },
        GaugeSlice {
            name: "Remaining".to_string(),
            value: 100.0 - value,
        },
    ]
}

/// Assembles the five fixed quick-stat rows. Every field has a placeholder, so
/// this cannot fail.
pub fn build_stats(movie: &MovieRecord, save_count: Option<i64>) -> Vec<StatItem> {
    let stat = |icon: &str, label: &str, value: String| StatItem {
        icon: icon.to_string(),
        label: label.to_string(),
        value,
    };

    vec![
        stat(
            "attach_money",
            "Box Office",
            text_or(&movie.box_office, "N/A"),
        ),
        stat("schedule", "Runtime", text_or(&movie.runtime, "N/A")),
        stat("people", "IMDb Votes", text_or(&movie.imdb_votes, "N/A")),
        stat("emoji_events", "Awards", text_or(&movie.awards, "—")),
        stat(
            "bookmark_added",
            "Saved by Users",
            match save_count {
                Some(n) => format!("{}x", n),
                None => "Was not saved".to_string(),
            },
        ),
    ]
}

/// Clips text to at most `max_words` words, appending an ellipsis when
/// something was cut.
pub fn clip_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    format!("{}…", words[..max_words].join(" "))
}

fn text_or(field: &Option<String>, fallback: &str) -> String {
    match field {
        Some(s) if !s.is_empty() => s.clone(),
        _ => fallback.to_string(),
    }
}

impl MovieInsights {
    /// Derives the full detail view model from a record and the current save
    /// count. Pure; recomputed whenever either input changes.
    pub fn build(movie: &MovieRecord, save_count: Option<i64>) -> Self {
        let imdb_raw = movie.imdb_rating.as_deref().unwrap_or("0");
        let meta_raw = movie.metascore.as_deref().unwrap_or("0");

        Self {
            rating_breakdown: parse_ratings(&movie.ratings),
            imdb_gauge: build_gauge("Rating", imdb_raw, 10.0),
            meta_gauge: build_gauge("Metascore", meta_raw, 1.0),
            imdb_score: text_or(&movie.imdb_rating, "N/A"),
            meta_score: text_or(&movie.metascore, "N/A"),
            stats: build_stats(movie, save_count),
        }
    }
}

/// `parseFloat` semantics: optional sign, digits, one decimal point, trailing
/// junk ignored. `None` when no digits lead the string.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {
                seen_digit = true;
                end += 1;
            }
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse().ok()
}
