use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use beacon_core::entities::AuditEntry;
use beacon_core::enums::{AuditAction, EntityType};
use beacon_db::repos::audit::AuditFilter;

use crate::AppState;
use crate::error::ApiResult;
use crate::extract::{Admin, QueryParams};

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/audit", get(query_audit))
}

#[derive(Debug, Default, Deserialize)]
struct AuditQuery {
    entity_type: Option<EntityType>,
    entity_id: Option<String>,
    action: Option<AuditAction>,
    limit: Option<u32>,
}

impl From<AuditQuery> for AuditFilter {
    fn from(q: AuditQuery) -> Self {
        Self {
            entity_type: q.entity_type,
            entity_id: q.entity_id,
            action: q.action,
            limit: q.limit,
        }
    }
}

async fn query_audit(admin: Admin, QueryParams(query): QueryParams<AuditQuery>) -> ApiResult<Json<Vec<AuditEntry>>> {
    Ok(Json(admin.service.query_audit(&query.into()).await?))
}
