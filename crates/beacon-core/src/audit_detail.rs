//! Typed payloads stored in `AuditEntry::detail`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{Recommendation, ReviewDecision};

/// Detail for `AuditAction::StatusChanged`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StatusChangedDetail {
    pub from: String,
    pub to: String,
    pub reason: Option<String>,
}

/// Detail for `AuditAction::Reviewed`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReviewedDetail {
    pub decision: ReviewDecision,
    pub from: String,
    pub to: String,
    pub notes: Option<String>,
    pub declined_reason: Option<String>,
}

/// Detail for `AuditAction::Scored`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ScoredDetail {
    pub strategy_version: u32,
    pub alignment_score: u8,
    pub final_priority_score: u8,
    pub recommendation: Recommendation,
}
