//! JsonSchema validation tests for the types that cross process boundaries.

use chrono::Utc;
use schemars::schema_for;

use beacon_core::analysis::AnalysisResult;
use beacon_core::entities::{HealthReport, ProductStrategy, StrategicKeyword};
use beacon_core::enums::{FrequencyTrend, SentimentTrend};

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

#[test]
fn analysis_result_accepts_valid_payload() {
    let schema = serde_json::to_value(schema_for!(AnalysisResult)).unwrap();
    let instance = serde_json::json!({
        "summary": "Customers want SSO",
        "sentiment": { "score": 0.2, "label": "neutral" },
        "tags": ["sso", "security"],
        "priorityScore": 64,
        "cost": 0.0012
    });
    let errors = validate_against_schema(&schema, &instance);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
}

#[test]
fn analysis_result_rejects_out_of_range_sentiment() {
    let schema = serde_json::to_value(schema_for!(AnalysisResult)).unwrap();
    let instance = serde_json::json!({
        "summary": "Too happy",
        "sentiment": { "score": 3.5, "label": "positive" },
        "tags": [],
        "priorityScore": 10
    });
    assert!(!validate_against_schema(&schema, &instance).is_empty());
}

#[test]
fn analysis_result_rejects_unknown_label() {
    let schema = serde_json::to_value(schema_for!(AnalysisResult)).unwrap();
    let instance = serde_json::json!({
        "summary": "Hmm",
        "sentiment": { "score": 0.0, "label": "ecstatic" },
        "tags": [],
        "priorityScore": 10
    });
    assert!(!validate_against_schema(&schema, &instance).is_empty());
}

#[test]
fn health_report_serializes_camel_case() {
    let report = HealthReport {
        health_score: 62,
        churn_risk_score: 38,
        sentiment_trend: SentimentTrend::Stable,
        feedback_frequency: FrequencyTrend::Increasing,
        avg_sentiment: Some(0.1),
        days_since_activity: Some(3),
        recent_negative_count: 0,
        risk_factors: vec![],
        recommendations: vec![],
    };
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["healthScore"], 62);
    assert_eq!(value["churnRiskScore"], 38);
    assert_eq!(value["sentimentTrend"], "stable");
    assert_eq!(value["feedbackFrequency"], "increasing");

    let schema = serde_json::to_value(schema_for!(HealthReport)).unwrap();
    assert!(validate_against_schema(&schema, &value).is_empty());
}

#[test]
fn strategy_keyword_reasoning_defaults_to_empty() {
    let json = serde_json::json!({
        "id": "str-00000001",
        "company_id": "cmp-00000001",
        "version": 1,
        "is_active": true,
        "target_customer": "Mid-market SaaS finance teams",
        "problems_solved": ["month-end close"],
        "problems_not_solved": ["payroll"],
        "strategic_keywords": [{ "keyword": "automation", "weight": 0.8 }],
        "created_by": null,
        "created_at": Utc::now().to_rfc3339()
    });
    let strategy: ProductStrategy = serde_json::from_value(json).unwrap();
    assert_eq!(
        strategy.strategic_keywords,
        vec![StrategicKeyword {
            keyword: "automation".into(),
            weight: 0.8,
            reasoning: String::new(),
        }]
    );
}
