//! Companies and admin users.
//!
//! Company creation and admin lookup by identity-provider subject are the
//! only operations that run without a company scope.

use chrono::Utc;

use beacon_core::entities::{AdminUser, Company};
use beacon_core::enums::{AdminRole, AuditAction, EntityType};
use beacon_core::ids::{PREFIX_ADMIN_USER, PREFIX_COMPANY};

use crate::error::DatabaseError;
use crate::helpers::{parse_datetime, parse_enum};
use crate::service::BeaconService;

const ADMIN_COLS: &str = "id, company_id, auth_user_id, email, role, created_at";

fn row_to_admin(row: &libsql::Row) -> Result<AdminUser, DatabaseError> {
    Ok(AdminUser {
        id: row.get(0)?,
        company_id: row.get(1)?,
        auth_user_id: row.get(2)?,
        email: row.get(3)?,
        role: parse_enum(&row.get::<String>(4)?)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

impl BeaconService {
    /// Create a tenant company.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for an empty name.
    pub async fn create_company(&self, name: &str) -> Result<Company, DatabaseError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DatabaseError::Validation("company name must not be empty".into()));
        }
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_COMPANY).await?;
        self.db()
            .execute_with(
                "INSERT INTO companies (id, name, created_at) VALUES (?1, ?2, ?3)",
                || libsql::params![id.as_str(), name, now.to_rfc3339()],
            )
            .await?;

        self.record_audit::<()>(Some(&id), EntityType::Company, &id, AuditAction::Created, None)
            .await?;

        Ok(Company {
            id,
            name: name.to_string(),
            created_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no company has this ID.
    pub async fn get_company(&self, id: &str) -> Result<Company, DatabaseError> {
        let mut rows = self
            .db()
            .query_with("SELECT id, name, created_at FROM companies WHERE id = ?1", || [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("company", id))?;
        Ok(Company {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: parse_datetime(&row.get::<String>(2)?)?,
        })
    }

    /// Add an admin user to the scoped company.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for malformed input, or
    /// `DatabaseError::InvalidState` if the subject is already linked.
    pub async fn create_admin_user(
        &self,
        auth_user_id: &str,
        email: &str,
        role: AdminRole,
    ) -> Result<AdminUser, DatabaseError> {
        let company_id = self.company_id()?.to_string();
        let auth_user_id = auth_user_id.trim();
        let email = email.trim();
        if auth_user_id.is_empty() {
            return Err(DatabaseError::Validation("auth_user_id must not be empty".into()));
        }
        if !email.contains('@') {
            return Err(DatabaseError::Validation(format!("invalid email: {email}")));
        }
        if self.find_admin_by_auth_id(auth_user_id).await?.is_some() {
            return Err(DatabaseError::InvalidState(format!(
                "auth user {auth_user_id} is already an admin"
            )));
        }

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_ADMIN_USER).await?;
        self.db()
            .execute_with(
                &format!("INSERT INTO admin_users ({ADMIN_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                || {
                    libsql::params![
                        id.as_str(),
                        company_id.as_str(),
                        auth_user_id,
                        email,
                        role.as_str(),
                        now.to_rfc3339()
                    ]
                },
            )
            .await?;

        self.audit_simple(EntityType::AdminUser, &id, AuditAction::Created)
            .await?;

        Ok(AdminUser {
            id,
            company_id,
            auth_user_id: auth_user_id.to_string(),
            email: email.to_string(),
            role,
            created_at: now,
        })
    }

    /// Look up the admin row linked to an identity-provider subject.
    ///
    /// Unscoped: this is how a request finds its company.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn find_admin_by_auth_id(
        &self,
        auth_user_id: &str,
    ) -> Result<Option<AdminUser>, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {ADMIN_COLS} FROM admin_users WHERE auth_user_id = ?1"),
                || [auth_user_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_admin(&row)?)),
            None => Ok(None),
        }
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the admin is not in the scoped company.
    pub async fn get_admin_user(&self, id: &str) -> Result<AdminUser, DatabaseError> {
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {ADMIN_COLS} FROM admin_users WHERE id = ?1 AND company_id = ?2"),
                || [id, company_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("admin user", id))?;
        row_to_admin(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_admin_users(&self) -> Result<Vec<AdminUser>, DatabaseError> {
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {ADMIN_COLS} FROM admin_users WHERE company_id = ?1 ORDER BY created_at"),
                || [company_id],
            )
            .await?;
        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            users.push(row_to_admin(&row)?);
        }
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{scoped_service, test_service};

    #[tokio::test]
    async fn bootstrap_company_and_owner() {
        let svc = test_service().await;
        let company = svc.create_company("  Acme  ").await.unwrap();
        assert_eq!(company.name, "Acme");
        assert!(company.id.starts_with("cmp-"));

        let scoped = svc.for_company(&company.id);
        let owner = scoped
            .create_admin_user("auth|1", "owner@acme.test", AdminRole::Owner)
            .await
            .unwrap();
        assert_eq!(owner.company_id, company.id);

        let found = svc.find_admin_by_auth_id("auth|1").await.unwrap().unwrap();
        assert_eq!(found, owner);
        assert!(svc.find_admin_by_auth_id("auth|nobody").await.unwrap().is_none());
        assert_eq!(svc.get_company(&company.id).await.unwrap().name, "Acme");
    }

    #[tokio::test]
    async fn duplicate_subject_is_rejected() {
        let svc = scoped_service().await;
        let err = svc
            .create_admin_user("auth|owner", "again@acme.test", AdminRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)));
    }

    #[tokio::test]
    async fn admin_users_are_listed_per_company() {
        let svc = scoped_service().await;
        svc.create_admin_user("auth|viewer", "viewer@acme.test", AdminRole::Viewer)
            .await
            .unwrap();
        let other = svc.unscoped().create_company("Other").await.unwrap();
        svc.for_company(&other.id)
            .create_admin_user("auth|other", "x@other.test", AdminRole::Owner)
            .await
            .unwrap();

        let users = svc.list_admin_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert!(users.iter().all(|u| u.company_id == svc.company_id().unwrap()));
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let svc = scoped_service().await;
        let err = svc
            .create_admin_user("auth|2", "not-an-email", AdminRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }
}
