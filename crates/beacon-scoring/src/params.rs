//! Named parameter tables for every scoring heuristic.
//!
//! Defaults reproduce the values product has been running with. All fields
//! are individually overridable from configuration (`[scoring.*]` sections).

use serde::{Deserialize, Serialize};

/// Upper bound for every day-count setting (about a century).
pub const MAX_DAYS: i64 = 36_500;

// ---------------------------------------------------------------------------
// Alignment
// ---------------------------------------------------------------------------

const fn default_baseline() -> f64 {
    50.0
}

const fn default_keyword_scale() -> f64 {
    25.0
}

const fn default_conflict_penalty() -> f64 {
    20.0
}

const fn default_opportunity_bonus() -> f64 {
    10.0
}

/// Point values for strategic alignment scoring.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AlignmentParams {
    /// Neutral starting score.
    #[serde(default = "default_baseline")]
    pub baseline: f64,

    /// Points added per unit of keyword weight (`weight × keyword_scale`).
    #[serde(default = "default_keyword_scale")]
    pub keyword_scale: f64,

    /// Applied once when the theme touches any problem the company does not solve.
    #[serde(default = "default_conflict_penalty")]
    pub conflict_penalty: f64,

    /// Applied once when the theme matches any solved problem or positive keyword.
    #[serde(default = "default_opportunity_bonus")]
    pub opportunity_bonus: f64,
}

impl Default for AlignmentParams {
    fn default() -> Self {
        Self {
            baseline: default_baseline(),
            keyword_scale: default_keyword_scale(),
            conflict_penalty: default_conflict_penalty(),
            opportunity_bonus: default_opportunity_bonus(),
        }
    }
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

const fn default_high() -> u8 {
    70
}

const fn default_moderate() -> u8 {
    50
}

/// Cutoffs used to bucket (signal, alignment) into a recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecommendationThresholds {
    /// At or above this a score is "high".
    #[serde(default = "default_high")]
    pub high: u8,

    /// At or above this a score is "moderate"; below it is "low".
    #[serde(default = "default_moderate")]
    pub moderate: u8,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            high: default_high(),
            moderate: default_moderate(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

const fn default_health_base() -> f64 {
    50.0
}
const fn default_sentiment_weight() -> f64 {
    30.0
}
const fn default_window_days() -> i64 {
    30
}
const fn default_trend_hysteresis() -> f64 {
    0.1
}
const fn default_trend_points() -> f64 {
    10.0
}
const fn default_strong_negative_threshold() -> f64 {
    -0.5
}
const fn default_negative_penalty() -> f64 {
    5.0
}
const fn default_negative_penalty_cap() -> f64 {
    25.0
}
const fn default_active_days() -> i64 {
    7
}
const fn default_active_bonus() -> f64 {
    15.0
}
const fn default_recent_days() -> i64 {
    30
}
const fn default_recent_bonus() -> f64 {
    5.0
}
const fn default_stale_days() -> i64 {
    60
}
const fn default_dormant_days() -> i64 {
    90
}
const fn default_dormant_penalty() -> f64 {
    10.0
}
const fn default_inactive_penalty() -> f64 {
    25.0
}
const fn default_frequency_increase_ratio() -> f64 {
    1.25
}
const fn default_frequency_decrease_ratio() -> f64 {
    0.75
}
const fn default_churn_inactivity_days() -> i64 {
    60
}
const fn default_churn_inactivity_penalty() -> f64 {
    10.0
}
const fn default_churn_negative_count() -> u32 {
    2
}
const fn default_churn_negative_penalty() -> f64 {
    10.0
}
const fn default_churn_low_sentiment() -> f64 {
    -0.3
}
const fn default_churn_low_sentiment_penalty() -> f64 {
    10.0
}
const fn default_risk_inactivity_days() -> i64 {
    30
}
const fn default_advocate_threshold() -> u8 {
    75
}

/// Point values and thresholds for the customer health heuristic.
///
/// Activity buckets (days since last activity):
///
/// ```text
/// ≤ active_days   → +active_bonus
/// ≤ recent_days   → +recent_bonus
/// ≤ stale_days    → 0
/// ≤ dormant_days  → −dormant_penalty
/// beyond / unknown → −inactive_penalty
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HealthParams {
    #[serde(default = "default_health_base")]
    pub base: f64,
    /// Points per unit of average sentiment.
    #[serde(default = "default_sentiment_weight")]
    pub sentiment_weight: f64,
    /// Width of the recent and previous comparison windows.
    #[serde(default = "default_window_days")]
    pub window_days: i64,
    /// Dead band around zero when comparing window averages.
    #[serde(default = "default_trend_hysteresis")]
    pub trend_hysteresis: f64,
    #[serde(default = "default_trend_points")]
    pub trend_points: f64,
    /// Sentiment at or below which a feedback item counts as strongly negative.
    #[serde(default = "default_strong_negative_threshold")]
    pub strong_negative_threshold: f64,
    #[serde(default = "default_negative_penalty")]
    pub negative_penalty: f64,
    #[serde(default = "default_negative_penalty_cap")]
    pub negative_penalty_cap: f64,
    #[serde(default = "default_active_days")]
    pub active_days: i64,
    #[serde(default = "default_active_bonus")]
    pub active_bonus: f64,
    #[serde(default = "default_recent_days")]
    pub recent_days: i64,
    #[serde(default = "default_recent_bonus")]
    pub recent_bonus: f64,
    #[serde(default = "default_stale_days")]
    pub stale_days: i64,
    #[serde(default = "default_dormant_days")]
    pub dormant_days: i64,
    #[serde(default = "default_dormant_penalty")]
    pub dormant_penalty: f64,
    #[serde(default = "default_inactive_penalty")]
    pub inactive_penalty: f64,
    #[serde(default = "default_frequency_increase_ratio")]
    pub frequency_increase_ratio: f64,
    #[serde(default = "default_frequency_decrease_ratio")]
    pub frequency_decrease_ratio: f64,
    #[serde(default = "default_churn_inactivity_days")]
    pub churn_inactivity_days: i64,
    #[serde(default = "default_churn_inactivity_penalty")]
    pub churn_inactivity_penalty: f64,
    #[serde(default = "default_churn_negative_count")]
    pub churn_negative_count: u32,
    #[serde(default = "default_churn_negative_penalty")]
    pub churn_negative_penalty: f64,
    #[serde(default = "default_churn_low_sentiment")]
    pub churn_low_sentiment: f64,
    #[serde(default = "default_churn_low_sentiment_penalty")]
    pub churn_low_sentiment_penalty: f64,
    /// Inactivity beyond this is reported as a risk factor.
    #[serde(default = "default_risk_inactivity_days")]
    pub risk_inactivity_days: i64,
    /// Health at or above this earns an advocacy recommendation.
    #[serde(default = "default_advocate_threshold")]
    pub advocate_threshold: u8,
}

impl Default for HealthParams {
    fn default() -> Self {
        Self {
            base: default_health_base(),
            sentiment_weight: default_sentiment_weight(),
            window_days: default_window_days(),
            trend_hysteresis: default_trend_hysteresis(),
            trend_points: default_trend_points(),
            strong_negative_threshold: default_strong_negative_threshold(),
            negative_penalty: default_negative_penalty(),
            negative_penalty_cap: default_negative_penalty_cap(),
            active_days: default_active_days(),
            active_bonus: default_active_bonus(),
            recent_days: default_recent_days(),
            recent_bonus: default_recent_bonus(),
            stale_days: default_stale_days(),
            dormant_days: default_dormant_days(),
            dormant_penalty: default_dormant_penalty(),
            inactive_penalty: default_inactive_penalty(),
            frequency_increase_ratio: default_frequency_increase_ratio(),
            frequency_decrease_ratio: default_frequency_decrease_ratio(),
            churn_inactivity_days: default_churn_inactivity_days(),
            churn_inactivity_penalty: default_churn_inactivity_penalty(),
            churn_negative_count: default_churn_negative_count(),
            churn_negative_penalty: default_churn_negative_penalty(),
            churn_low_sentiment: default_churn_low_sentiment(),
            churn_low_sentiment_penalty: default_churn_low_sentiment_penalty(),
            risk_inactivity_days: default_risk_inactivity_days(),
            advocate_threshold: default_advocate_threshold(),
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

const fn default_min_mentions() -> usize {
    2
}
const fn default_max_theme_tags() -> usize {
    5
}
const fn default_customer_weight() -> f64 {
    6.0
}
const fn default_mention_weight() -> f64 {
    2.0
}
const fn default_negativity_weight() -> f64 {
    20.0
}

/// Parameters for tag co-occurrence theme discovery.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DiscoveryParams {
    /// Groups with fewer items are dropped.
    #[serde(default = "default_min_mentions")]
    pub min_mentions: usize,
    #[serde(default = "default_max_theme_tags")]
    pub max_theme_tags: usize,
    /// Signal points per distinct customer.
    #[serde(default = "default_customer_weight")]
    pub customer_weight: f64,
    /// Signal points per mention.
    #[serde(default = "default_mention_weight")]
    pub mention_weight: f64,
    /// Signal points per unit of negative average sentiment.
    #[serde(default = "default_negativity_weight")]
    pub negativity_weight: f64,
}

impl Default for DiscoveryParams {
    fn default() -> Self {
        Self {
            min_mentions: default_min_mentions(),
            max_theme_tags: default_max_theme_tags(),
            customer_weight: default_customer_weight(),
            mention_weight: default_mention_weight(),
            negativity_weight: default_negativity_weight(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// All scoring parameter tables, as loaded from the `[scoring]` config section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ScoringParams {
    #[serde(default)]
    pub alignment: AlignmentParams,
    #[serde(default)]
    pub recommendation: RecommendationThresholds,
    #[serde(default)]
    pub health: HealthParams,
    #[serde(default)]
    pub discovery: DiscoveryParams,
}

impl ScoringParams {
    /// Check ranges. Returns `(field, reason)` for the first violation.
    ///
    /// # Errors
    ///
    /// Returns the dotted field path and a reason when a value is out of range.
    pub fn validate(&self) -> Result<(), (String, String)> {
        let fail = |field: &str, reason: &str| Err((field.to_string(), reason.to_string()));

        let a = &self.alignment;
        if !(0.0..=100.0).contains(&a.baseline) {
            return fail("scoring.alignment.baseline", "must be within 0-100");
        }
        if a.keyword_scale < 0.0 {
            return fail("scoring.alignment.keyword_scale", "must not be negative");
        }
        if a.conflict_penalty < 0.0 || a.opportunity_bonus < 0.0 {
            return fail(
                "scoring.alignment",
                "conflict_penalty and opportunity_bonus must not be negative",
            );
        }

        let r = &self.recommendation;
        if r.high > 100 || r.moderate > 100 {
            return fail("scoring.recommendation", "thresholds must be within 0-100");
        }
        if r.moderate > r.high {
            return fail("scoring.recommendation.moderate", "must not exceed `high`");
        }

        let h = &self.health;
        if !(1..=MAX_DAYS).contains(&h.window_days) {
            return fail("scoring.health.window_days", "must be between 1 and 36500");
        }
        if h.trend_hysteresis < 0.0 {
            return fail("scoring.health.trend_hysteresis", "must not be negative");
        }
        if !(h.active_days <= h.recent_days
            && h.recent_days <= h.stale_days
            && h.stale_days <= h.dormant_days)
        {
            return fail(
                "scoring.health",
                "activity buckets must be ordered active ≤ recent ≤ stale ≤ dormant",
            );
        }
        for (field, days) in [
            ("scoring.health.active_days", h.active_days),
            ("scoring.health.dormant_days", h.dormant_days),
            ("scoring.health.churn_inactivity_days", h.churn_inactivity_days),
            ("scoring.health.risk_inactivity_days", h.risk_inactivity_days),
        ] {
            if !(0..=MAX_DAYS).contains(&days) {
                return fail(field, "must be between 0 and 36500");
            }
        }
        if h.frequency_decrease_ratio > h.frequency_increase_ratio {
            return fail(
                "scoring.health.frequency_decrease_ratio",
                "must not exceed frequency_increase_ratio",
            );
        }

        let d = &self.discovery;
        if d.min_mentions == 0 {
            return fail("scoring.discovery.min_mentions", "must be at least 1");
        }
        if d.max_theme_tags == 0 {
            return fail("scoring.discovery.max_theme_tags", "must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ScoringParams::default().validate().is_ok());
    }

    #[test]
    fn documented_defaults() {
        let p = ScoringParams::default();
        assert!((p.alignment.baseline - 50.0).abs() < f64::EPSILON);
        assert_eq!(p.recommendation.high, 70);
        assert_eq!(p.recommendation.moderate, 50);
        assert!((p.health.trend_hysteresis - 0.1).abs() < f64::EPSILON);
        assert!((p.health.negative_penalty - 5.0).abs() < f64::EPSILON);
        assert_eq!(p.health.window_days, 30);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let p: AlignmentParams = serde_json::from_str(r#"{"keyword_scale": 40.0}"#).unwrap();
        assert!((p.keyword_scale - 40.0).abs() < f64::EPSILON);
        assert!((p.baseline - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut p = ScoringParams::default();
        p.recommendation.moderate = 80;
        let (field, _) = p.validate().unwrap_err();
        assert_eq!(field, "scoring.recommendation.moderate");
    }

    #[test]
    fn rejects_day_counts_beyond_a_century() {
        let mut p = ScoringParams::default();
        p.health.window_days = 1_000_000_000_000_000;
        let (field, _) = p.validate().unwrap_err();
        assert_eq!(field, "scoring.health.window_days");

        let mut p = ScoringParams::default();
        p.health.recent_days = 1_000_000_000_000_000;
        p.health.stale_days = 1_000_000_000_000_000;
        p.health.dormant_days = 1_000_000_000_000_000;
        let (field, _) = p.validate().unwrap_err();
        assert_eq!(field, "scoring.health.dormant_days");

        let mut p = ScoringParams::default();
        p.health.window_days = MAX_DAYS;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_unordered_activity_buckets() {
        let mut p = ScoringParams::default();
        p.health.recent_days = 120;
        assert!(p.validate().is_err());
    }
}
