use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{InitiativeStatus, Timeline};

/// A roadmap work item, optionally derived from an approved theme.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Initiative {
    pub id: String,
    pub company_id: String,
    pub theme_id: Option<String>,
    pub objective_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub timeline: Timeline,
    pub status: InitiativeStatus,
    pub priority_score: Option<u8>,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
