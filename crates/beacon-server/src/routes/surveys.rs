use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use beacon_core::entities::{Survey, SurveyAnswer, SurveyQuestion, SurveyResponse};
use beacon_core::enums::SurveyStatus;
use beacon_core::responses::SurveyLinkResponse;
use beacon_db::repos::survey::NewSurvey;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Admin, JsonBody, LimitQuery, PathParam, QueryParams, Writer};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/surveys", get(list_surveys).post(create_survey))
        .route("/surveys/{id}", get(get_survey))
        .route("/surveys/{id}/status", post(transition))
        .route("/surveys/{id}/links", post(create_link))
        .route("/surveys/{id}/responses", get(list_responses))
}

pub(super) fn public_router() -> Router<AppState> {
    Router::new().route("/respond/{token}", get(open_survey).post(submit_response))
}

#[derive(Debug, Default, Deserialize)]
struct SurveyQuery {
    status: Option<SurveyStatus>,
}

async fn list_surveys(admin: Admin, QueryParams(query): QueryParams<SurveyQuery>) -> ApiResult<Json<Vec<Survey>>> {
    Ok(Json(admin.service.list_surveys(query.status).await?))
}

async fn create_survey(
    Writer(service): Writer,
    JsonBody(body): JsonBody<NewSurvey>,
) -> ApiResult<(StatusCode, Json<Survey>)> {
    Ok((StatusCode::CREATED, Json(service.create_survey(&body).await?)))
}

async fn get_survey(admin: Admin, PathParam(id): PathParam<String>) -> ApiResult<Json<Survey>> {
    Ok(Json(admin.service.get_survey(&id).await?))
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: SurveyStatus,
}

async fn transition(
    Writer(service): Writer,
    PathParam(id): PathParam<String>,
    JsonBody(body): JsonBody<StatusBody>,
) -> ApiResult<Json<Survey>> {
    Ok(Json(service.transition_survey(&id, body.status).await?))
}

#[derive(Debug, Default, Deserialize)]
struct LinkBody {
    #[serde(default)]
    customer_id: Option<String>,
}

/// The body is optional; an empty POST creates an anonymous link.
async fn create_link(
    Writer(service): Writer,
    PathParam(id): PathParam<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<SurveyLinkResponse>)> {
    let body: LinkBody = if body.is_empty() {
        LinkBody::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };
    let response = service
        .create_survey_link(&id, body.customer_id.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_responses(
    admin: Admin,
    PathParam(id): PathParam<String>,
    QueryParams(query): QueryParams<LimitQuery>,
) -> ApiResult<Json<Vec<SurveyResponse>>> {
    Ok(Json(admin.service.list_survey_responses(&id, query.limit).await?))
}

/// What a respondent sees. Omits company and status fields.
#[derive(Debug, Serialize)]
struct PublicSurvey {
    title: String,
    description: Option<String>,
    questions: Vec<SurveyQuestion>,
}

async fn open_survey(
    State(state): State<AppState>,
    PathParam(token): PathParam<String>,
) -> ApiResult<Json<PublicSurvey>> {
    let survey = state.service.survey_for_token(&token).await?;
    Ok(Json(PublicSurvey {
        title: survey.title,
        description: survey.description,
        questions: survey.questions,
    }))
}

#[derive(Debug, Deserialize)]
struct Submission {
    answers: Vec<SurveyAnswer>,
}

#[derive(Debug, Serialize)]
struct Submitted {
    response_id: String,
}

async fn submit_response(
    State(state): State<AppState>,
    PathParam(token): PathParam<String>,
    JsonBody(body): JsonBody<Submission>,
) -> ApiResult<(StatusCode, Json<Submitted>)> {
    let response = state
        .service
        .submit_survey_response(&token, &body.answers)
        .await?;
    info!(response_id = %response.id, survey_id = %response.survey_id, "survey response received");
    Ok((
        StatusCode::CREATED,
        Json(Submitted {
            response_id: response.id,
        }),
    ))
}
