use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use beacon_core::entities::Theme;
use beacon_core::responses::{BatchReviewResponse, BulkRunResponse, DiscoveryResponse};
use beacon_db::repos::theme::{NewTheme, ThemeFilter, ThemeReview};
use beacon_db::updates::theme::ThemeUpdateBuilder;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Admin, JsonBody, PathParam, QueryParams, Writer, nullable};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/themes", get(list_themes).post(create_theme))
        .route("/themes/discover", post(discover_themes))
        .route("/themes/batch-review", post(batch_review))
        .route("/themes/score-all", post(score_all))
        .route(
            "/themes/{id}",
            get(get_theme).patch(update_theme).delete(delete_theme),
        )
        .route("/themes/{id}/review", post(review_theme))
        .route("/themes/{id}/score", post(score_theme))
}

async fn list_themes(admin: Admin, QueryParams(filter): QueryParams<ThemeFilter>) -> ApiResult<Json<Vec<Theme>>> {
    Ok(Json(admin.service.list_themes(&filter).await?))
}

async fn create_theme(
    Writer(service): Writer,
    JsonBody(body): JsonBody<NewTheme>,
) -> ApiResult<(StatusCode, Json<Theme>)> {
    Ok((StatusCode::CREATED, Json(service.create_theme(&body).await?)))
}

async fn discover_themes(Writer(service): Writer) -> ApiResult<Json<DiscoveryResponse>> {
    let response = service.discover_themes().await?;
    info!(
        considered = response.items_considered,
        created = response.themes_created.len(),
        "theme discovery requested"
    );
    Ok(Json(response))
}

async fn get_theme(admin: Admin, PathParam(id): PathParam<String>) -> ApiResult<Json<Theme>> {
    Ok(Json(admin.service.get_theme(&id).await?))
}

#[derive(Debug, Deserialize)]
struct ThemePatch {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    description: Option<Option<String>>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pm_notes: Option<Option<String>>,
}

async fn update_theme(
    Writer(service): Writer,
    PathParam(id): PathParam<String>,
    JsonBody(patch): JsonBody<ThemePatch>,
) -> ApiResult<Json<Theme>> {
    let mut builder = ThemeUpdateBuilder::new();
    if let Some(title) = patch.title {
        builder = builder.title(title);
    }
    if let Some(description) = patch.description {
        builder = builder.description(description);
    }
    if let Some(tags) = patch.tags {
        builder = builder.tags(tags);
    }
    if let Some(pm_notes) = patch.pm_notes {
        builder = builder.pm_notes(pm_notes);
    }
    let update = builder.build();
    if update.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".into()));
    }
    Ok(Json(service.update_theme(&id, update).await?))
}

async fn delete_theme(Writer(service): Writer, PathParam(id): PathParam<String>) -> ApiResult<StatusCode> {
    service.delete_theme(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn review_theme(
    Writer(service): Writer,
    PathParam(id): PathParam<String>,
    JsonBody(review): JsonBody<ThemeReview>,
) -> ApiResult<Json<Theme>> {
    Ok(Json(service.review_theme(&id, &review).await?))
}

#[derive(Debug, Deserialize)]
struct BatchReview {
    theme_ids: Vec<String>,
    #[serde(flatten)]
    review: ThemeReview,
}

async fn batch_review(
    Writer(service): Writer,
    JsonBody(body): JsonBody<BatchReview>,
) -> ApiResult<Json<BatchReviewResponse>> {
    if body.theme_ids.is_empty() {
        return Err(ApiError::BadRequest("theme_ids must not be empty".into()));
    }
    Ok(Json(service.batch_review_themes(&body.theme_ids, &body.review).await?))
}

async fn score_theme(Writer(service): Writer, PathParam(id): PathParam<String>) -> ApiResult<Json<Theme>> {
    Ok(Json(service.score_theme(&id).await?))
}

async fn score_all(Writer(service): Writer) -> ApiResult<Json<BulkRunResponse>> {
    Ok(Json(service.score_all_themes().await?))
}
