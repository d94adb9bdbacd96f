use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use beacon_core::entities::FeedbackItem;
use beacon_core::responses::TagCount;
use beacon_db::repos::feedback::{FeedbackFilter, NewFeedback};

use crate::AppState;
use crate::error::ApiResult;
use crate::extract::{Admin, JsonBody, LimitQuery, PathParam, QueryParams, Writer};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/feedback", get(list_feedback).post(create_feedback))
        .route("/feedback/{id}", get(get_feedback))
        .route("/feedback/{id}/analyze", post(analyze_feedback))
        .route("/tags", get(tag_counts))
}

async fn list_feedback(
    admin: Admin,
    QueryParams(filter): QueryParams<FeedbackFilter>,
) -> ApiResult<Json<Vec<FeedbackItem>>> {
    Ok(Json(admin.service.list_feedback(&filter).await?))
}

async fn create_feedback(
    Writer(service): Writer,
    JsonBody(body): JsonBody<NewFeedback>,
) -> ApiResult<(StatusCode, Json<FeedbackItem>)> {
    Ok((StatusCode::CREATED, Json(service.create_feedback(&body).await?)))
}

async fn get_feedback(admin: Admin, PathParam(id): PathParam<String>) -> ApiResult<Json<FeedbackItem>> {
    Ok(Json(admin.service.get_feedback(&id).await?))
}

/// Send the item's text to the analysis service and store what comes back.
async fn analyze_feedback(
    State(state): State<AppState>,
    Writer(service): Writer,
    PathParam(id): PathParam<String>,
) -> ApiResult<Json<FeedbackItem>> {
    let item = service.get_feedback(&id).await?;
    let result = state
        .analyzer()?
        .analyze(&item.content, Some(item.source.as_str()))
        .await?;
    let updated = service.apply_analysis(&id, &result).await?;
    info!(feedback_id = %id, priority = result.priority_score, "feedback analyzed");
    Ok(Json(updated))
}

async fn tag_counts(admin: Admin, QueryParams(query): QueryParams<LimitQuery>) -> ApiResult<Json<Vec<TagCount>>> {
    Ok(Json(admin.service.tag_counts(query.limit).await?))
}
