//! Customer health and churn risk.
//!
//! Health is derived from average sentiment, recency of activity, the
//! sentiment trend between two adjacent windows, and the number of strongly
//! negative items in the recent window. Churn risk is the inverse of health
//! plus flat penalties for the worst signals.

use chrono::{DateTime, Duration, Utc};

use beacon_core::entities::HealthReport;
use beacon_core::enums::{FrequencyTrend, SentimentTrend};

use crate::alignment::to_score;
use crate::params::{HealthParams, MAX_DAYS};

/// One sentiment observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentPoint {
    /// In `[-1, 1]`.
    pub sentiment: f64,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthInput {
    pub feedback: Vec<SentimentPoint>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

struct Windows {
    recent: Vec<f64>,
    previous: Vec<f64>,
}

fn split_windows(input: &HealthInput, window: Duration) -> Windows {
    let recent_start = input.now - window;
    let previous_start = recent_start - window;
    let mut recent = Vec::new();
    let mut previous = Vec::new();
    for point in &input.feedback {
        if point.at > recent_start && point.at <= input.now {
            recent.push(point.sentiment);
        } else if point.at > previous_start && point.at <= recent_start {
            previous.push(point.sentiment);
        }
    }
    Windows { recent, previous }
}

fn activity_adjustment(days: Option<i64>, params: &HealthParams) -> f64 {
    match days {
        Some(d) if d <= params.active_days => params.active_bonus,
        Some(d) if d <= params.recent_days => params.recent_bonus,
        Some(d) if d <= params.stale_days => 0.0,
        Some(d) if d <= params.dormant_days => -params.dormant_penalty,
        _ => -params.inactive_penalty,
    }
}

fn sentiment_trend(windows: &Windows, params: &HealthParams) -> SentimentTrend {
    match (mean(&windows.recent), mean(&windows.previous)) {
        (Some(recent), Some(previous)) => {
            let diff = recent - previous;
            if diff > params.trend_hysteresis {
                SentimentTrend::Improving
            } else if diff < -params.trend_hysteresis {
                SentimentTrend::Declining
            } else {
                SentimentTrend::Stable
            }
        }
        _ => SentimentTrend::Stable,
    }
}

#[allow(clippy::cast_precision_loss)]
fn frequency_trend(windows: &Windows, params: &HealthParams) -> FrequencyTrend {
    let recent = windows.recent.len();
    let previous = windows.previous.len();
    if previous == 0 {
        return if recent > 0 {
            FrequencyTrend::Increasing
        } else {
            FrequencyTrend::Stable
        };
    }
    let ratio = recent as f64 / previous as f64;
    if ratio >= params.frequency_increase_ratio {
        FrequencyTrend::Increasing
    } else if ratio <= params.frequency_decrease_ratio {
        FrequencyTrend::Decreasing
    } else {
        FrequencyTrend::Stable
    }
}

/// Compute a health report. Pure; `input.now` is the only clock.
#[must_use]
pub fn compute_health(input: &HealthInput, params: &HealthParams) -> HealthReport {
    let sentiments: Vec<f64> = input.feedback.iter().map(|p| p.sentiment).collect();
    let avg_sentiment = mean(&sentiments);

    // Feedback stands in for activity only when none was ever recorded.
    let last_activity = input
        .last_activity_at
        .or_else(|| input.feedback.iter().map(|p| p.at).max());
    let days_since_activity = last_activity.map(|at| (input.now - at).num_days().max(0));

    let windows = split_windows(input, Duration::days(params.window_days.clamp(0, MAX_DAYS)));
    let sentiment_trend = sentiment_trend(&windows, params);
    let feedback_frequency = frequency_trend(&windows, params);
    let recent_negative_count = u32::try_from(
        windows
            .recent
            .iter()
            .filter(|s| **s <= params.strong_negative_threshold)
            .count(),
    )
    .unwrap_or(u32::MAX);

    let mut score = params.base;
    if let Some(avg) = avg_sentiment {
        score += avg * params.sentiment_weight;
    }
    score += activity_adjustment(days_since_activity, params);
    score += match sentiment_trend {
        SentimentTrend::Improving => params.trend_points,
        SentimentTrend::Declining => -params.trend_points,
        SentimentTrend::Stable => 0.0,
    };
    score -= (f64::from(recent_negative_count) * params.negative_penalty)
        .min(params.negative_penalty_cap);
    let health_score = to_score(score);

    let inactive_for_churn =
        days_since_activity.is_none_or(|d| d > params.churn_inactivity_days);
    let many_negatives = recent_negative_count >= params.churn_negative_count;
    let low_sentiment = avg_sentiment.is_some_and(|a| a < params.churn_low_sentiment);

    let mut churn = 100.0 - f64::from(health_score);
    if inactive_for_churn {
        churn += params.churn_inactivity_penalty;
    }
    if many_negatives {
        churn += params.churn_negative_penalty;
    }
    if low_sentiment {
        churn += params.churn_low_sentiment_penalty;
    }
    let churn_risk_score = to_score(churn);

    let mut risk_factors = Vec::new();
    let mut recommendations = Vec::new();

    match days_since_activity {
        None => {
            risk_factors.push("No recorded activity".to_string());
            recommendations.push("Schedule a check-in call".to_string());
        }
        Some(d) if d > params.risk_inactivity_days => {
            risk_factors.push(format!("No activity in {d} days"));
            recommendations.push("Schedule a check-in call".to_string());
        }
        Some(_) => {}
    }
    if sentiment_trend == SentimentTrend::Declining {
        risk_factors.push("Sentiment is declining".to_string());
        recommendations.push("Review recent feedback with the account owner".to_string());
    }
    if many_negatives {
        risk_factors.push(format!(
            "{recent_negative_count} strongly negative feedback items in the last {} days",
            params.window_days
        ));
        recommendations.push("Follow up on recent negative feedback".to_string());
    }
    if let Some(avg) = avg_sentiment.filter(|_| low_sentiment) {
        risk_factors.push(format!("Average sentiment is low ({avg:.2})"));
        recommendations.push("Escalate to customer success".to_string());
    }
    if feedback_frequency == FrequencyTrend::Decreasing {
        risk_factors.push("Feedback volume is dropping".to_string());
        recommendations.push("Re-engage with a short survey".to_string());
    }
    if health_score >= params.advocate_threshold {
        recommendations.push("Invite to a case study or referral program".to_string());
    }

    HealthReport {
        health_score,
        churn_risk_score,
        sentiment_trend,
        feedback_frequency,
        avg_sentiment,
        days_since_activity,
        recent_negative_count,
        risk_factors,
        recommendations,
    }
}
