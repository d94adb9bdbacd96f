//! Contract for the external AI text-analysis service.
//!
//! Beacon only consumes this contract; the analysis itself runs elsewhere.
//! Field names are camelCase on the wire.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::SentimentLabel;

/// Request body sent to the analysis endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub text: String,
    /// Optional hint such as the feedback source or product area.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Sentiment {
    #[schemars(range(min = -1.0, max = 1.0))]
    pub score: f64,
    pub label: SentimentLabel,
}

/// Response body returned by the analysis endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub tags: Vec<String>,
    #[schemars(range(min = 0, max = 100))]
    pub priority_score: u8,
    /// Cost of the call in USD, when the service reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}
