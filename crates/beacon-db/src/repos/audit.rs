//! Audit trail repository.
//!
//! Append-only entries recording every mutation, attributed to the acting
//! admin (or `None` for public and system actions).

use chrono::Utc;
use serde::Serialize;

use beacon_core::entities::AuditEntry;
use beacon_core::enums::{AuditAction, EntityType};
use beacon_core::ids::PREFIX_AUDIT;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_json};
use crate::service::BeaconService;

/// Filter criteria for audit queries.
#[derive(Debug, Default)]
pub struct AuditFilter {
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    pub action: Option<AuditAction>,
    pub limit: Option<u32>,
}

const SELECT_COLS: &str = "id, company_id, actor_id, entity_type, entity_id, action, detail, created_at";

fn row_to_audit(row: &libsql::Row) -> Result<AuditEntry, DatabaseError> {
    Ok(AuditEntry {
        id: row.get::<String>(0)?,
        company_id: get_opt_string(row, 1)?,
        actor_id: get_opt_string(row, 2)?,
        entity_type: parse_enum(&row.get::<String>(3)?)?,
        entity_id: row.get::<String>(4)?,
        action: parse_enum(&row.get::<String>(5)?)?,
        detail: parse_optional_json(get_opt_string(row, 6)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

impl BeaconService {
    /// Append an audit entry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT fails.
    pub async fn append_audit(&self, entry: &AuditEntry) -> Result<(), DatabaseError> {
        let detail = entry.detail.as_ref().map(ToString::to_string);
        self.db()
            .execute_with(
                &format!("INSERT INTO audit_trail ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                || {
                    libsql::params![
                        entry.id.as_str(),
                        entry.company_id.as_deref(),
                        entry.actor_id.as_deref(),
                        entry.entity_type.as_str(),
                        entry.entity_id.as_str(),
                        entry.action.as_str(),
                        detail.as_deref(),
                        entry.created_at.to_rfc3339()
                    ]
                },
            )
            .await?;
        Ok(())
    }

    /// Build and append an entry for the current caller.
    pub(crate) async fn record_audit<D: Serialize + Sync>(
        &self,
        company_id: Option<&str>,
        entity_type: EntityType,
        entity_id: &str,
        action: AuditAction,
        detail: Option<&D>,
    ) -> Result<(), DatabaseError> {
        let detail = detail
            .map(serde_json::to_value)
            .transpose()
            .map_err(DatabaseError::json)?;
        let id = self.db().generate_id(PREFIX_AUDIT).await?;
        self.append_audit(&AuditEntry {
            id,
            company_id: company_id.map(String::from),
            actor_id: self.actor_id().map(String::from),
            entity_type,
            entity_id: entity_id.to_string(),
            action,
            detail,
            created_at: Utc::now(),
        })
        .await
    }

    /// Record an action with no detail payload in the caller's company.
    pub(crate) async fn audit_simple(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        action: AuditAction,
    ) -> Result<(), DatabaseError> {
        let company_id = self.company_id()?.to_string();
        self.record_audit::<()>(Some(&company_id), entity_type, entity_id, action, None)
            .await
    }

    /// Record an action with a detail payload in the caller's company.
    pub(crate) async fn audit_detail<D: Serialize + Sync>(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        action: AuditAction,
        detail: &D,
    ) -> Result<(), DatabaseError> {
        let company_id = self.company_id()?.to_string();
        self.record_audit(Some(&company_id), entity_type, entity_id, action, Some(detail))
            .await
    }

    /// Query the caller's company audit entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, DatabaseError> {
        let mut conditions = vec!["company_id = ?1".to_string()];
        let mut params: Vec<libsql::Value> = vec![self.company_id()?.into()];

        if let Some(ref et) = filter.entity_type {
            params.push(et.as_str().into());
            conditions.push(format!("entity_type = ?{}", params.len()));
        }
        if let Some(ref eid) = filter.entity_id {
            params.push(eid.clone().into());
            conditions.push(format!("entity_id = ?{}", params.len()));
        }
        if let Some(ref action) = filter.action {
            params.push(action.as_str().into());
            conditions.push(format!("action = ?{}", params.len()));
        }

        let limit = self.limit(filter.limit);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM audit_trail WHERE {}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit}",
            conditions.join(" AND ")
        );

        let mut rows = self
            .db()
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_audit(&row)?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scoped_service;

    #[tokio::test]
    async fn append_and_query_is_company_scoped() {
        let svc = scoped_service().await;
        let other = svc.unscoped().create_company("Other Co").await.unwrap();

        svc.audit_simple(EntityType::Theme, "thm-00000001", AuditAction::Created)
            .await
            .unwrap();
        svc.for_company(&other.id)
            .audit_simple(EntityType::Theme, "thm-00000002", AuditAction::Created)
            .await
            .unwrap();

        let entries = svc
            .query_audit(&AuditFilter {
                entity_type: Some(EntityType::Theme),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entity_id, "thm-00000001");
        assert_eq!(entries[0].actor_id.as_deref(), svc.actor_id());
    }

    #[tokio::test]
    async fn unscoped_query_is_rejected() {
        let svc = scoped_service().await;
        let err = svc.unscoped().query_audit(&AuditFilter::default()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Unscoped));
    }
}
