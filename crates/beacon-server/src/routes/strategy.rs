use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use beacon_core::entities::ProductStrategy;
use beacon_db::repos::strategy::NewStrategy;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Admin, JsonBody, Writer};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/strategy", post(create_strategy))
        .route("/strategy/current", get(current_strategy))
        .route("/strategy/history", get(strategy_history))
}

async fn create_strategy(
    Writer(service): Writer,
    JsonBody(body): JsonBody<NewStrategy>,
) -> ApiResult<(StatusCode, Json<ProductStrategy>)> {
    let strategy = service.create_strategy(&body).await?;
    info!(version = strategy.version, "strategy published");
    Ok((StatusCode::CREATED, Json(strategy)))
}

async fn current_strategy(admin: Admin) -> ApiResult<Json<ProductStrategy>> {
    admin
        .service
        .current_strategy()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no strategy configured".into()))
}

async fn strategy_history(admin: Admin) -> ApiResult<Json<Vec<ProductStrategy>>> {
    Ok(Json(admin.service.strategy_history().await?))
}
