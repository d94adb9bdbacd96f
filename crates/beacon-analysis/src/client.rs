//! The analysis client and the [`Analyzer`] seam the server depends on.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use beacon_config::AnalysisConfig;
use beacon_core::analysis::{AnalysisRequest, AnalysisResult};
use tracing::{debug, warn};

use crate::error::AnalysisError;
use crate::http::check_response;

pub type AnalyzeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<AnalysisResult, AnalysisError>> + Send + 'a>>;

/// Anything that can turn feedback text into an [`AnalysisResult`].
pub trait Analyzer: Send + Sync {
    /// Analyze `text`, with an optional hint such as the feedback source.
    fn analyze<'a>(&'a self, text: &'a str, context: Option<&'a str>) -> AnalyzeFuture<'a>;
}

/// reqwest client for the configured analysis endpoint.
pub struct AnalysisClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: Option<String>,
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for AnalysisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

fn result_validator() -> Result<jsonschema::Validator, AnalysisError> {
    let schema = serde_json::to_value(schemars::schema_for!(AnalysisResult))
        .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;
    jsonschema::validator_for(&schema).map_err(|e| AnalysisError::InvalidResponse(e.to_string()))
}

impl AnalysisClient {
    /// # Errors
    ///
    /// Returns `AnalysisError::NotConfigured` when no endpoint is set, or
    /// `AnalysisError::Http` if the HTTP client cannot be built.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        if !config.is_configured() {
            return Err(AnalysisError::NotConfigured);
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("beacon/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            validator: result_validator()?,
        })
    }

    /// Post `text` to the analysis endpoint.
    ///
    /// # Errors
    ///
    /// Returns `EmptyText` for blank input, `RateLimited`/`Api`/`Http` for
    /// transport failures, and `InvalidResponse` when the body does not match
    /// the result contract.
    pub async fn analyze_text(
        &self,
        text: &str,
        context: Option<&str>,
    ) -> Result<AnalysisResult, AnalysisError> {
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyText);
        }
        let request = AnalysisRequest {
            text: text.to_string(),
            context: context.map(ToString::to_string),
            model: self.model.clone(),
        };

        let mut builder = self.http.post(&self.endpoint).json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }
        let resp = check_response(builder.send().await?).await?;
        let body: serde_json::Value = resp.json().await?;
        let result = self.parse_result(body)?;
        debug!(
            tags = result.tags.len(),
            priority = result.priority_score,
            "analysis received"
        );
        Ok(result)
    }

    fn parse_result(&self, body: serde_json::Value) -> Result<AnalysisResult, AnalysisError> {
        let problems: Vec<String> = self
            .validator
            .iter_errors(&body)
            .map(|e| e.to_string())
            .collect();
        if !problems.is_empty() {
            warn!(problems = problems.len(), "analysis response failed validation");
            return Err(AnalysisError::InvalidResponse(problems.join("; ")));
        }
        serde_json::from_value(body).map_err(|e| AnalysisError::InvalidResponse(e.to_string()))
    }
}

impl Analyzer for AnalysisClient {
    fn analyze<'a>(&'a self, text: &'a str, context: Option<&'a str>) -> AnalyzeFuture<'a> {
        Box::pin(self.analyze_text(text, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, routing::post};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn client(endpoint: &str) -> AnalysisClient {
        AnalysisClient::from_config(&AnalysisConfig {
            endpoint: endpoint.to_string(),
            api_key: "sk-test".into(),
            ..Default::default()
        })
        .unwrap()
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/analyze")
    }

    #[test]
    fn unconfigured_endpoint_is_rejected() {
        let err = AnalysisClient::from_config(&AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::NotConfigured));
    }

    #[test]
    fn accepts_contract_shaped_body() {
        let result = client("http://localhost/unused")
            .parse_result(json!({
                "summary": "CSV export times out",
                "sentiment": { "score": -0.7, "label": "negative" },
                "tags": ["export"],
                "priorityScore": 81,
                "cost": 0.0004
            }))
            .unwrap();
        assert_eq!(result.priority_score, 81);
        assert_eq!(result.cost, Some(0.0004));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let c = client("http://localhost/unused");
        let too_negative = json!({
            "summary": "s",
            "sentiment": { "score": -1.5, "label": "negative" },
            "priorityScore": 10
        });
        assert!(matches!(
            c.parse_result(too_negative),
            Err(AnalysisError::InvalidResponse(_))
        ));

        let priority_too_high = json!({
            "summary": "s",
            "sentiment": { "score": 0.1, "label": "neutral" },
            "priorityScore": 140
        });
        assert!(c.parse_result(priority_too_high).is_err());
    }

    #[test]
    fn rejects_missing_fields_and_unknown_labels() {
        let c = client("http://localhost/unused");
        assert!(c.parse_result(json!({ "summary": "s" })).is_err());
        assert!(
            c.parse_result(json!({
                "summary": "s",
                "sentiment": { "score": 0.0, "label": "ecstatic" },
                "priorityScore": 5
            }))
            .is_err()
        );
    }

    #[tokio::test]
    async fn blank_text_is_not_sent() {
        let err = client("http://127.0.0.1:9/never")
            .analyze_text("   ", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyText));
    }

    #[tokio::test]
    async fn posts_request_with_bearer_key() {
        let router = Router::new().route(
            "/analyze",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "summary": format!("{auth} | {}", body["text"].as_str().unwrap_or_default()),
                    "sentiment": { "score": 0.2, "label": "positive" },
                    "tags": [body["context"].as_str().unwrap_or("none")],
                    "priorityScore": 40
                }))
            }),
        );
        let url = serve(router).await;

        let result = client(&url)
            .analyze("Love the new dashboard", Some("survey"))
            .await
            .unwrap();
        assert_eq!(result.summary, "Bearer sk-test | Love the new dashboard");
        assert_eq!(result.tags, vec!["survey"]);
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_api_error() {
        let router = Router::new().route(
            "/analyze",
            post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let url = serve(router).await;

        let err = client(&url).analyze_text("text", None).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Api { status: 502, .. }));
    }
}
