use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use beacon_core::entities::AdminUser;
use beacon_core::enums::AdminRole;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Admin, JsonBody};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/users", get(list_users).post(create_user))
}

async fn me(admin: Admin) -> ApiResult<Json<AdminUser>> {
    Ok(Json(admin.service.get_admin_user(&admin.identity.user_id).await?))
}

async fn list_users(admin: Admin) -> ApiResult<Json<Vec<AdminUser>>> {
    Ok(Json(admin.service.list_admin_users().await?))
}

#[derive(Debug, Deserialize)]
struct NewAdminUser {
    auth_user_id: String,
    email: String,
    role: AdminRole,
}

async fn create_user(
    admin: Admin,
    JsonBody(body): JsonBody<NewAdminUser>,
) -> ApiResult<(StatusCode, Json<AdminUser>)> {
    if !admin.identity.role.can_manage_users() {
        return Err(ApiError::Forbidden("only owners can add admin users".into()));
    }
    let user = admin
        .service
        .create_admin_user(&body.auth_user_id, &body.email, body.role)
        .await?;
    info!(user_id = %user.id, role = %user.role, "admin user added");
    Ok((StatusCode::CREATED, Json(user)))
}
