use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ObjectiveStatus;

/// A measurable key result belonging to an objective.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct KeyResult {
    pub id: String,
    pub objective_id: String,
    pub title: String,
    pub start_value: f64,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KeyResult {
    /// Progress toward target in `[0, 1]`.
    ///
    /// Works for decreasing targets too (e.g. "reduce churn from 8 to 4").
    /// A key result whose start equals its target counts as complete once
    /// the current value reaches it.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let span = self.target_value - self.start_value;
        if span.abs() < f64::EPSILON {
            return if (self.current_value - self.target_value).abs() < f64::EPSILON {
                1.0
            } else {
                0.0
            };
        }
        ((self.current_value - self.start_value) / span).clamp(0.0, 1.0)
    }
}

/// An OKR objective.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Objective {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Free-form period label, e.g. `"2026-Q4"`.
    pub period: String,
    pub status: ObjectiveStatus,
    #[serde(default)]
    pub key_results: Vec<KeyResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Objective {
    /// Mean progress across key results, `0.0` when there are none.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.key_results.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.key_results.len() as f64;
        self.key_results.iter().map(KeyResult::progress).sum::<f64>() / n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kr(start: f64, target: f64, current: f64) -> KeyResult {
        let now = Utc::now();
        KeyResult {
            id: "kr-00000001".into(),
            objective_id: "obj-00000001".into(),
            title: "kr".into(),
            start_value: start,
            target_value: target,
            current_value: current,
            unit: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn progress_increasing_target() {
        assert!((kr(0.0, 10.0, 5.0).progress() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn progress_decreasing_target() {
        assert!((kr(8.0, 4.0, 6.0).progress() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn progress_is_clamped() {
        assert!((kr(0.0, 10.0, 15.0).progress() - 1.0).abs() < 1e-9);
        assert!(kr(0.0, 10.0, -3.0).progress().abs() < 1e-9);
    }

    #[test]
    fn objective_progress_is_mean() {
        let now = Utc::now();
        let objective = Objective {
            id: "obj-00000001".into(),
            company_id: "cmp-00000001".into(),
            title: "Delight onboarding".into(),
            description: None,
            period: "2026-Q4".into(),
            status: ObjectiveStatus::Active,
            key_results: vec![kr(0.0, 10.0, 10.0), kr(0.0, 10.0, 0.0)],
            created_at: now,
            updated_at: now,
        };
        assert!((objective.progress() - 0.5).abs() < 1e-9);
    }
}
