use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use beacon_core::analysis::AnalysisResult;

use crate::AppState;
use crate::error::ApiResult;
use crate::extract::{JsonBody, Writer};

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/test-ai", post(test_ai))
}

#[derive(Debug, Deserialize)]
struct TestAiBody {
    text: String,
    #[serde(default)]
    context: Option<String>,
}

/// Run arbitrary text through the analysis service without storing anything.
async fn test_ai(
    State(state): State<AppState>,
    Writer(_): Writer,
    JsonBody(body): JsonBody<TestAiBody>,
) -> ApiResult<Json<AnalysisResult>> {
    let result = state
        .analyzer()?
        .analyze(&body.text, body.context.as_deref())
        .await?;
    Ok(Json(result))
}
