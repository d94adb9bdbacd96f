//! Request extractors: the authenticated admin and error-mapped wrappers
//! around axum's JSON, query, and path extractors.

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use beacon_auth::bearer_token;
use beacon_core::identity::AdminIdentity;
use beacon_db::BeaconService;

use crate::AppState;
use crate::error::ApiError;

/// JSON request body; malformed input becomes a 400 `{"error"}` response.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// An authenticated admin with a service view scoped to their company.
pub struct Admin {
    pub service: BeaconService,
    pub identity: AdminIdentity,
}

impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let claims = state.verifier.verify(bearer_token(header)?)?;

        let admin = state
            .service
            .find_admin_by_auth_id(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::Forbidden("not an admin of any company".into()))?;
        debug!(user_id = %admin.id, company_id = %admin.company_id, "admin authenticated");

        let identity = AdminIdentity {
            user_id: admin.id,
            company_id: admin.company_id,
            role: admin.role,
        };
        Ok(Self {
            service: state.service.for_identity(identity.clone()),
            identity,
        })
    }
}

/// An admin allowed to mutate data. Viewers are rejected with 403.
pub struct Writer(pub BeaconService);

impl FromRequestParts<AppState> for Writer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let admin = Admin::from_request_parts(parts, state).await?;
        if !admin.identity.role.can_write() {
            return Err(ApiError::read_only());
        }
        Ok(Self(admin.service))
    }
}

/// `?limit=` on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in PATCH bodies. Pair with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        email: Option<Option<String>>,
    }

    #[test]
    fn nullable_separates_absent_from_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let cleared: Patch = serde_json::from_str(r#"{"email": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"email": "a@b.test"}"#).unwrap();
        assert_eq!(absent.email, None);
        assert_eq!(cleared.email, Some(None));
        assert_eq!(set.email, Some(Some("a@b.test".to_string())));
    }
}
