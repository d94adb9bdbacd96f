use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{QuestionKind, SurveyStatus};

/// A question within a survey. `id` is unique within the survey.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SurveyQuestion {
    pub id: String,
    pub prompt: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Survey {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<SurveyQuestion>,
    pub status: SurveyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single-use distribution link for a survey.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SurveyLink {
    pub id: String,
    pub survey_id: String,
    pub customer_id: Option<String>,
    pub token: String,
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SurveyLink {
    /// Whether the link can still accept a response at `now`.
    #[must_use]
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.expires_at.is_none_or(|exp| now < exp)
    }
}

/// An answer to one survey question. Ratings and NPS values are sent as
/// JSON numbers, text answers as strings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SurveyAnswer {
    pub question_id: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SurveyResponse {
    pub id: String,
    pub survey_id: String,
    pub link_id: Option<String>,
    pub customer_id: Option<String>,
    pub answers: Vec<SurveyAnswer>,
    /// Feedback item created from the free-text answers, if any.
    pub feedback_item_id: Option<String>,
    pub submitted_at: DateTime<Utc>,
}
