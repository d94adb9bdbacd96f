use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A customer account, with aggregated health and sentiment metrics.
///
/// The metric columns are written by health recomputation and are `None`
/// until the first run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Customer {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub email: Option<String>,
    pub segment: Option<String>,
    pub health_score: Option<u8>,
    pub churn_risk_score: Option<u8>,
    pub avg_sentiment: Option<f64>,
    pub feedback_count: u32,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
