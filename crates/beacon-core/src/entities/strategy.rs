use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A weighted strategic keyword. Positive weights pull matching themes up,
/// negative weights push them down.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct StrategicKeyword {
    pub keyword: String,
    /// Weight in `[-1, 1]`.
    pub weight: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// One version of a company's product strategy.
///
/// Versions are append-only. Exactly one version per company is active.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ProductStrategy {
    pub id: String,
    pub company_id: String,
    pub version: u32,
    pub is_active: bool,
    pub target_customer: String,
    pub problems_solved: Vec<String>,
    pub problems_not_solved: Vec<String>,
    pub strategic_keywords: Vec<StrategicKeyword>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}
