//! Customer repository.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use beacon_core::entities::Customer;
use beacon_core::enums::{AuditAction, EntityType};
use beacon_core::ids::PREFIX_CUSTOMER;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, get_opt_u8, get_u32, opt_value, parse_datetime, parse_optional_datetime};
use crate::service::BeaconService;
use crate::updates::customer::CustomerUpdate;

const SELECT_COLS: &str = "id, company_id, name, email, segment, health_score, churn_risk_score, \
     avg_sentiment, feedback_count, last_activity_at, created_at, updated_at";

fn row_to_customer(row: &libsql::Row) -> Result<Customer, DatabaseError> {
    Ok(Customer {
        id: row.get(0)?,
        company_id: row.get(1)?,
        name: row.get(2)?,
        email: get_opt_string(row, 3)?,
        segment: get_opt_string(row, 4)?,
        health_score: get_opt_u8(row, 5)?,
        churn_risk_score: get_opt_u8(row, 6)?,
        avg_sentiment: row.get::<Option<f64>>(7)?,
        feedback_count: get_u32(row, 8)?,
        last_activity_at: parse_optional_datetime(get_opt_string(row, 9)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
        updated_at: parse_datetime(&row.get::<String>(11)?)?,
    })
}

/// Input for creating a customer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub segment: Option<String>,
}

impl BeaconService {
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for an empty name.
    pub async fn create_customer(&self, input: &NewCustomer) -> Result<Customer, DatabaseError> {
        let company_id = self.company_id()?.to_string();
        let name = input.name.trim();
        if name.is_empty() {
            return Err(DatabaseError::Validation("customer name must not be empty".into()));
        }

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_CUSTOMER).await?;
        self.db()
            .execute_with(
                "INSERT INTO customers (id, company_id, name, email, segment, feedback_count, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7)",
                || {
                    libsql::params![
                        id.as_str(),
                        company_id.as_str(),
                        name,
                        input.email.as_deref(),
                        input.segment.as_deref(),
                        now.to_rfc3339(),
                        now.to_rfc3339()
                    ]
                },
            )
            .await?;

        self.audit_simple(EntityType::Customer, &id, AuditAction::Created)
            .await?;

        Ok(Customer {
            id,
            company_id,
            name: name.to_string(),
            email: input.email.clone(),
            segment: input.segment.clone(),
            health_score: None,
            churn_risk_score: None,
            avg_sentiment: None,
            feedback_count: 0,
            last_activity_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the customer is not in the scoped company.
    pub async fn get_customer(&self, id: &str) -> Result<Customer, DatabaseError> {
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SELECT_COLS} FROM customers WHERE id = ?1 AND company_id = ?2"),
                || [id, company_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("customer", id))?;
        row_to_customer(&row)
    }

    /// Customers ordered by churn risk (highest first), then name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_customers(&self, limit: Option<u32>) -> Result<Vec<Customer>, DatabaseError> {
        let company_id = self.company_id()?;
        let limit = self.limit(limit);
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {SELECT_COLS} FROM customers WHERE company_id = ?1
                     ORDER BY churn_risk_score IS NULL, churn_risk_score DESC, name LIMIT {limit}"
                ),
                || [company_id],
            )
            .await?;
        let mut customers = Vec::new();
        while let Some(row) = rows.next().await? {
            customers.push(row_to_customer(&row)?);
        }
        Ok(customers)
    }

    /// All customer IDs in the scoped company.
    pub(crate) async fn customer_ids(&self) -> Result<Vec<String>, DatabaseError> {
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with("SELECT id FROM customers WHERE company_id = ?1 ORDER BY id", || [company_id])
            .await?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }
        Ok(ids)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown customer or
    /// `DatabaseError::Validation` for an empty name.
    pub async fn update_customer(
        &self,
        customer_id: &str,
        update: CustomerUpdate,
    ) -> Result<Customer, DatabaseError> {
        let company_id = self.company_id()?.to_string();
        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref name) = update.name {
            if name.trim().is_empty() {
                return Err(DatabaseError::Validation("customer name must not be empty".into()));
            }
            params.push(name.trim().into());
            sets.push(format!("name = ?{}", params.len()));
        }
        if let Some(ref email) = update.email {
            params.push(opt_value(email.as_deref()));
            sets.push(format!("email = ?{}", params.len()));
        }
        if let Some(ref segment) = update.segment {
            params.push(opt_value(segment.as_deref()));
            sets.push(format!("segment = ?{}", params.len()));
        }

        if sets.is_empty() {
            return self.get_customer(customer_id).await;
        }

        params.push(Utc::now().to_rfc3339().into());
        sets.push(format!("updated_at = ?{}", params.len()));
        params.push(customer_id.into());
        let id_idx = params.len();
        params.push(company_id.into());
        let company_idx = params.len();

        let sql = format!(
            "UPDATE customers SET {} WHERE id = ?{id_idx} AND company_id = ?{company_idx}",
            sets.join(", ")
        );
        let changed = self
            .db()
            .execute_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("customer", customer_id));
        }

        self.audit_detail(EntityType::Customer, customer_id, AuditAction::Updated, &update)
            .await?;
        self.get_customer(customer_id).await
    }

    /// Move `last_activity_at` forward to `at`. Never moves it backwards.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the UPDATE fails.
    pub async fn touch_customer_activity(
        &self,
        customer_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let company_id = self.company_id()?;
        let at = at.to_rfc3339();
        self.db()
            .execute_with(
                "UPDATE customers SET last_activity_at = ?1, updated_at = ?1
                 WHERE id = ?2 AND company_id = ?3
                   AND (last_activity_at IS NULL OR last_activity_at < ?1)",
                || libsql::params![at.as_str(), customer_id, company_id],
            )
            .await?;
        Ok(())
    }

    /// Write aggregated health metrics onto the customer row.
    pub(crate) async fn write_customer_metrics(
        &self,
        customer_id: &str,
        health_score: u8,
        churn_risk_score: u8,
        avg_sentiment: Option<f64>,
        feedback_count: u32,
    ) -> Result<(), DatabaseError> {
        let company_id = self.company_id()?;
        let now = Utc::now().to_rfc3339();
        self.db()
            .execute_with(
                "UPDATE customers
                 SET health_score = ?1, churn_risk_score = ?2, avg_sentiment = ?3,
                     feedback_count = ?4, updated_at = ?5
                 WHERE id = ?6 AND company_id = ?7",
                || {
                    libsql::params![
                        i64::from(health_score),
                        i64::from(churn_risk_score),
                        avg_sentiment,
                        i64::from(feedback_count),
                        now.as_str(),
                        customer_id,
                        company_id
                    ]
                },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scoped_service;
    use crate::updates::customer::CustomerUpdateBuilder;
    use chrono::Duration;

    fn new_customer(name: &str) -> NewCustomer {
        NewCustomer {
            name: name.into(),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            segment: Some("enterprise".into()),
        }
    }

    #[tokio::test]
    async fn create_get_and_list() {
        let svc = scoped_service().await;
        let created = svc.create_customer(&new_customer("Globex")).await.unwrap();
        let fetched = svc.get_customer(&created.id).await.unwrap();
        assert_eq!(fetched.name, "Globex");
        assert_eq!(fetched.feedback_count, 0);
        assert!(fetched.health_score.is_none());

        svc.create_customer(&new_customer("Initech")).await.unwrap();
        assert_eq!(svc.list_customers(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn other_company_cannot_read() {
        let svc = scoped_service().await;
        let created = svc.create_customer(&new_customer("Globex")).await.unwrap();
        let other = svc.unscoped().create_company("Other").await.unwrap();
        let err = svc
            .for_company(&other.id)
            .get_customer(&created.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let svc = scoped_service().await;
        let created = svc.create_customer(&new_customer("Globex")).await.unwrap();
        let updated = svc
            .update_customer(
                &created.id,
                CustomerUpdateBuilder::new().segment(None).build(),
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Globex");
        assert!(updated.segment.is_none());
        assert_eq!(updated.email, created.email);
    }

    #[tokio::test]
    async fn activity_only_moves_forward() {
        let svc = scoped_service().await;
        let created = svc.create_customer(&new_customer("Globex")).await.unwrap();
        let now = Utc::now();
        svc.touch_customer_activity(&created.id, now).await.unwrap();
        svc.touch_customer_activity(&created.id, now - Duration::days(3))
            .await
            .unwrap();
        let fetched = svc.get_customer(&created.id).await.unwrap();
        assert_eq!(
            fetched.last_activity_at.unwrap().timestamp(),
            now.timestamp()
        );
    }
}
