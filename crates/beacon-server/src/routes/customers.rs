use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use beacon_core::entities::{Customer, CustomerHealthScore};
use beacon_core::responses::CustomerDetailResponse;
use beacon_db::repos::customer::NewCustomer;
use beacon_db::updates::customer::CustomerUpdateBuilder;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Admin, JsonBody, LimitQuery, PathParam, QueryParams, Writer, nullable};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/{id}", get(customer_detail).patch(update_customer))
        .route("/customers/{id}/health", post(recompute_health))
}

async fn list_customers(
    admin: Admin,
    QueryParams(query): QueryParams<LimitQuery>,
) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(admin.service.list_customers(query.limit).await?))
}

async fn create_customer(
    Writer(service): Writer,
    JsonBody(body): JsonBody<NewCustomer>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    Ok((StatusCode::CREATED, Json(service.create_customer(&body).await?)))
}

async fn customer_detail(
    admin: Admin,
    PathParam(id): PathParam<String>,
) -> ApiResult<Json<CustomerDetailResponse>> {
    Ok(Json(admin.service.customer_detail(&id).await?))
}

#[derive(Debug, Deserialize)]
struct CustomerPatch {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    segment: Option<Option<String>>,
}

async fn update_customer(
    Writer(service): Writer,
    PathParam(id): PathParam<String>,
    JsonBody(patch): JsonBody<CustomerPatch>,
) -> ApiResult<Json<Customer>> {
    let mut builder = CustomerUpdateBuilder::new();
    if let Some(name) = patch.name {
        builder = builder.name(name);
    }
    if let Some(email) = patch.email {
        builder = builder.email(email);
    }
    if let Some(segment) = patch.segment {
        builder = builder.segment(segment);
    }
    let update = builder.build();
    if update.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".into()));
    }
    Ok(Json(service.update_customer(&id, update).await?))
}

async fn recompute_health(
    Writer(service): Writer,
    PathParam(id): PathParam<String>,
) -> ApiResult<Json<CustomerHealthScore>> {
    Ok(Json(service.recompute_customer_health(&id).await?))
}
