use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use beacon_core::entities::Objective;
use beacon_core::enums::ObjectiveStatus;
use beacon_core::responses::{KeyResultResponse, ObjectiveDetailResponse};
use beacon_db::repos::objective::{NewKeyResult, NewObjective};

use crate::AppState;
use crate::error::ApiResult;
use crate::extract::{Admin, JsonBody, LimitQuery, PathParam, QueryParams, Writer};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/objectives", get(list_objectives).post(create_objective))
        .route("/objectives/{id}", get(objective_detail))
        .route("/objectives/{id}/status", post(transition))
        .route("/objectives/{id}/key-results", post(add_key_result))
        .route("/key-results/{id}", patch(update_key_result))
}

async fn list_objectives(
    admin: Admin,
    QueryParams(query): QueryParams<LimitQuery>,
) -> ApiResult<Json<Vec<Objective>>> {
    Ok(Json(admin.service.list_objectives(query.limit).await?))
}

async fn create_objective(
    Writer(service): Writer,
    JsonBody(body): JsonBody<NewObjective>,
) -> ApiResult<(StatusCode, Json<Objective>)> {
    Ok((StatusCode::CREATED, Json(service.create_objective(&body).await?)))
}

async fn objective_detail(
    admin: Admin,
    PathParam(id): PathParam<String>,
) -> ApiResult<Json<ObjectiveDetailResponse>> {
    let objective = admin.service.get_objective(&id).await?;
    Ok(Json(ObjectiveDetailResponse {
        progress: objective.progress(),
        objective,
    }))
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: ObjectiveStatus,
}

async fn transition(
    Writer(service): Writer,
    PathParam(id): PathParam<String>,
    JsonBody(body): JsonBody<StatusBody>,
) -> ApiResult<Json<Objective>> {
    Ok(Json(service.transition_objective(&id, body.status).await?))
}

async fn add_key_result(
    Writer(service): Writer,
    PathParam(id): PathParam<String>,
    JsonBody(body): JsonBody<NewKeyResult>,
) -> ApiResult<(StatusCode, Json<KeyResultResponse>)> {
    Ok((StatusCode::CREATED, Json(service.add_key_result(&id, &body).await?)))
}

#[derive(Debug, Deserialize)]
struct ValueBody {
    current_value: f64,
}

async fn update_key_result(
    Writer(service): Writer,
    PathParam(id): PathParam<String>,
    JsonBody(body): JsonBody<ValueBody>,
) -> ApiResult<Json<KeyResultResponse>> {
    Ok(Json(service.update_key_result_value(&id, body.current_value).await?))
}
