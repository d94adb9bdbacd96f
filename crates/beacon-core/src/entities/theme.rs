use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{Recommendation, ThemeStatus};

/// A cluster of related feedback treated as one product opportunity.
///
/// Scoring fields are `None` until the theme has been scored against a
/// strategy; `scored_strategy_version` records which version was used.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Theme {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub status: ThemeStatus,
    pub mention_count: u32,
    pub customer_count: u32,
    pub avg_sentiment: f64,
    /// Customer signal strength, 0-100.
    pub customer_signal_score: u8,
    pub strategic_alignment_score: Option<u8>,
    pub final_priority_score: Option<u8>,
    pub recommendation: Option<Recommendation>,
    pub alignment_reasoning: Option<String>,
    pub conflicts: Vec<String>,
    pub opportunities: Vec<String>,
    pub scored_strategy_version: Option<u32>,
    pub pm_notes: Option<String>,
    pub declined_reason: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
