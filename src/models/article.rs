use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Score value meaning "scoring ran but no numeric value could be extracted".
/// An empty score means the article has never been scored.
pub const SCORE_UNPARSEABLE: &str = "N/A";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub guid: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub content: String,
    pub published_date: DateTime<Utc>,
    pub score: String,
    pub analysis: String,
    pub feed_url: String,
    pub model: String,
    pub reported: bool,
}

impl Article {
    /// Score as an integer for threshold comparisons. Unscored and
    /// non-numeric scores count as 0.
    pub fn parsed_score(&self) -> i64 {
        self.score.trim().parse().unwrap_or(0)
    }
}
