use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::AdminRole;

/// Authenticated admin identity for cross-crate passing.
///
/// Produced by the server after verifying a bearer token and looking up the
/// caller's admin-user row. Consumed by `beacon-db` to scope every query to
/// the caller's company.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AdminIdentity {
    /// Admin user row ID (`usr-...`).
    pub user_id: String,
    /// Company the admin belongs to (`cmp-...`).
    pub company_id: String,
    pub role: AdminRole,
}
