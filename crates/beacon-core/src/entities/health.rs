use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{FrequencyTrend, SentimentTrend};

/// Output of the customer health heuristic.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub health_score: u8,
    pub churn_risk_score: u8,
    pub sentiment_trend: SentimentTrend,
    pub feedback_frequency: FrequencyTrend,
    pub avg_sentiment: Option<f64>,
    pub days_since_activity: Option<i64>,
    pub recent_negative_count: u32,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

/// A cached health report for one customer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CustomerHealthScore {
    pub customer_id: String,
    pub report: HealthReport,
    pub computed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CustomerHealthScore {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
