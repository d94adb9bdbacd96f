use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{FeedbackSource, SentimentLabel};

/// A single piece of customer feedback.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FeedbackItem {
    pub id: String,
    pub company_id: String,
    pub customer_id: Option<String>,
    pub theme_id: Option<String>,
    pub source: FeedbackSource,
    pub content: String,
    pub summary: Option<String>,
    /// Sentiment in `[-1, 1]`.
    pub sentiment_score: Option<f64>,
    pub sentiment_label: Option<SentimentLabel>,
    /// Priority in `[0, 100]`, as reported by the analysis service.
    pub priority_score: Option<u8>,
    pub tags: Vec<String>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
