use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::AdminRole;

/// A dashboard user. Links an identity-provider subject to a company.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AdminUser {
    pub id: String,
    pub company_id: String,
    /// Subject (`sub` claim) issued by the identity provider.
    pub auth_user_id: String,
    pub email: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
}
