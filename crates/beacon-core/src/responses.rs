//! API response types returned as JSON by the REST layer and the CLI.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{
    Customer, FeedbackItem, HealthReport, KeyResult, Objective, Survey, SurveyLink, Theme,
};

/// Response from `GET /api/admin/customers/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CustomerDetailResponse {
    pub customer: Customer,
    pub health: HealthReport,
    pub recent_feedback: Vec<FeedbackItem>,
}

/// Response from `GET /api/admin/objectives/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ObjectiveDetailResponse {
    pub objective: Objective,
    /// Mean key result progress in `[0, 1]`.
    pub progress: f64,
}

/// Response from `POST /api/admin/objectives/{id}/key-results`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct KeyResultResponse {
    pub key_result: KeyResult,
    pub objective_progress: f64,
}

/// Per-item outcome of a batch operation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BatchItemResult {
    pub id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

/// Response from `POST /api/admin/themes/batch-review`.
///
/// Items are processed independently; a failure leaves earlier successes in place.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BatchReviewResponse {
    pub succeeded: u32,
    pub failed: u32,
    pub results: Vec<BatchItemResult>,
}

/// Response from theme discovery.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DiscoveryResponse {
    pub items_considered: u32,
    pub themes_created: Vec<Theme>,
}

/// Summary of a bulk scoring or recompute run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BulkRunResponse {
    pub processed: u32,
    pub failed: u32,
}

/// Usage count of one feedback tag.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: u32,
}

/// Response from `POST /api/admin/surveys/{id}/links`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SurveyLinkResponse {
    pub survey: Survey,
    pub link: SurveyLink,
}
