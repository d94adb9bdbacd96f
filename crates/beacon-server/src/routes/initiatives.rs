use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use beacon_core::entities::Initiative;
use beacon_core::enums::{InitiativeStatus, Timeline};
use beacon_db::repos::initiative::{InitiativeFilter, NewInitiative};
use beacon_db::updates::initiative::InitiativeUpdateBuilder;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Admin, JsonBody, PathParam, QueryParams, Writer, nullable};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/initiatives", get(list_initiatives).post(create_initiative))
        .route("/initiatives/{id}", get(get_initiative).put(update_initiative))
        .route("/initiatives/{id}/timeline", put(set_timeline))
        .route("/initiatives/{id}/status", post(transition))
}

async fn list_initiatives(
    admin: Admin,
    QueryParams(filter): QueryParams<InitiativeFilter>,
) -> ApiResult<Json<Vec<Initiative>>> {
    Ok(Json(admin.service.list_initiatives(&filter).await?))
}

async fn create_initiative(
    Writer(service): Writer,
    JsonBody(body): JsonBody<NewInitiative>,
) -> ApiResult<(StatusCode, Json<Initiative>)> {
    Ok((StatusCode::CREATED, Json(service.create_initiative(&body).await?)))
}

async fn get_initiative(admin: Admin, PathParam(id): PathParam<String>) -> ApiResult<Json<Initiative>> {
    Ok(Json(admin.service.get_initiative(&id).await?))
}

#[derive(Debug, Deserialize)]
struct InitiativeBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    owner: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    objective_id: Option<Option<String>>,
    #[serde(default)]
    timeline: Option<Timeline>,
    #[serde(default)]
    status: Option<InitiativeStatus>,
}

async fn update_initiative(
    Writer(service): Writer,
    PathParam(id): PathParam<String>,
    JsonBody(body): JsonBody<InitiativeBody>,
) -> ApiResult<Json<Initiative>> {
    let mut builder = InitiativeUpdateBuilder::new();
    if let Some(title) = body.title {
        builder = builder.title(title);
    }
    if let Some(description) = body.description {
        builder = builder.description(description);
    }
    if let Some(owner) = body.owner {
        builder = builder.owner(owner);
    }
    if let Some(objective_id) = body.objective_id {
        builder = builder.objective_id(objective_id);
    }
    if let Some(timeline) = body.timeline {
        builder = builder.timeline(timeline);
    }
    if let Some(status) = body.status {
        builder = builder.status(status);
    }
    let update = builder.build();
    if update.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".into()));
    }
    Ok(Json(service.update_initiative(&id, update).await?))
}

#[derive(Debug, Deserialize)]
struct TimelineBody {
    timeline: Timeline,
}

async fn set_timeline(
    Writer(service): Writer,
    PathParam(id): PathParam<String>,
    JsonBody(body): JsonBody<TimelineBody>,
) -> ApiResult<Json<Initiative>> {
    Ok(Json(service.set_initiative_timeline(&id, body.timeline).await?))
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: InitiativeStatus,
    #[serde(default)]
    reason: Option<String>,
}

async fn transition(
    Writer(service): Writer,
    PathParam(id): PathParam<String>,
    JsonBody(body): JsonBody<StatusBody>,
) -> ApiResult<Json<Initiative>> {
    Ok(Json(
        service
            .transition_initiative(&id, body.status, body.reason.as_deref())
            .await?,
    ))
}
