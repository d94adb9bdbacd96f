//! OKR repository: objectives and their key results.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use beacon_core::audit_detail::StatusChangedDetail;
use beacon_core::entities::{KeyResult, Objective};
use beacon_core::enums::{AuditAction, EntityType, ObjectiveStatus};
use beacon_core::ids::{PREFIX_KEY_RESULT, PREFIX_OBJECTIVE};
use beacon_core::responses::KeyResultResponse;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum};
use crate::service::BeaconService;

const OBJECTIVE_COLS: &str = "id, company_id, title, description, period, status, created_at, updated_at";
const KEY_RESULT_COLS: &str = "kr.id, kr.objective_id, kr.title, kr.start_value, kr.target_value, \
     kr.current_value, kr.unit, kr.created_at, kr.updated_at";

fn row_to_objective(row: &libsql::Row) -> Result<Objective, DatabaseError> {
    Ok(Objective {
        id: row.get(0)?,
        company_id: row.get(1)?,
        title: row.get(2)?,
        description: get_opt_string(row, 3)?,
        period: row.get(4)?,
        status: parse_enum(&row.get::<String>(5)?)?,
        key_results: Vec::new(),
        created_at: parse_datetime(&row.get::<String>(6)?)?,
        updated_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

fn row_to_key_result(row: &libsql::Row) -> Result<KeyResult, DatabaseError> {
    Ok(KeyResult {
        id: row.get(0)?,
        objective_id: row.get(1)?,
        title: row.get(2)?,
        start_value: row.get(3)?,
        target_value: row.get(4)?,
        current_value: row.get(5)?,
        unit: get_opt_string(row, 6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

/// Input for a key result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewKeyResult {
    pub title: String,
    #[serde(default)]
    pub start_value: f64,
    pub target_value: f64,
    /// Defaults to `start_value`.
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl NewKeyResult {
    fn validate(&self) -> Result<(), DatabaseError> {
        if self.title.trim().is_empty() {
            return Err(DatabaseError::Validation("key result title must not be empty".into()));
        }
        let values = [
            self.start_value,
            self.target_value,
            self.current_value.unwrap_or(self.start_value),
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DatabaseError::Validation("key result values must be finite".into()));
        }
        Ok(())
    }
}

/// Input for an objective with optional initial key results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewObjective {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Free-form period label such as `2026-Q4`.
    pub period: String,
    #[serde(default)]
    pub key_results: Vec<NewKeyResult>,
}

#[derive(Serialize)]
struct ValueChange {
    from: f64,
    to: f64,
}

impl BeaconService {
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for empty fields or non-finite values.
    pub async fn create_objective(&self, input: &NewObjective) -> Result<Objective, DatabaseError> {
        let company_id = self.company_id()?.to_string();
        let title = input.title.trim();
        let period = input.period.trim();
        if title.is_empty() || period.is_empty() {
            return Err(DatabaseError::Validation("objective title and period are required".into()));
        }
        for kr in &input.key_results {
            kr.validate()?;
        }

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_OBJECTIVE).await?;
        self.db()
            .execute_with(
                &format!(
                    "INSERT INTO objectives ({OBJECTIVE_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, 'active', ?6, ?6)"
                ),
                || {
                    libsql::params![
                        id.as_str(),
                        company_id.as_str(),
                        title,
                        input.description.as_deref(),
                        period,
                        now.to_rfc3339()
                    ]
                },
            )
            .await?;
        self.audit_simple(EntityType::Objective, &id, AuditAction::Created)
            .await?;

        let mut key_results = Vec::with_capacity(input.key_results.len());
        for kr in &input.key_results {
            key_results.push(self.insert_key_result(&id, kr).await?);
        }

        Ok(Objective {
            id,
            company_id,
            title: title.to_string(),
            description: input.description.clone(),
            period: period.to_string(),
            status: ObjectiveStatus::Active,
            key_results,
            created_at: now,
            updated_at: now,
        })
    }

    /// The objective with its key results.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the objective is not in the scoped company.
    pub async fn get_objective(&self, id: &str) -> Result<Objective, DatabaseError> {
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {OBJECTIVE_COLS} FROM objectives WHERE id = ?1 AND company_id = ?2"),
                || [id, company_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("objective", id))?;
        let mut objective = row_to_objective(&row)?;
        objective.key_results = self.key_results_for(id).await?;
        Ok(objective)
    }

    /// Objectives with key results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn list_objectives(&self, limit: Option<u32>) -> Result<Vec<Objective>, DatabaseError> {
        let company_id = self.company_id()?;
        let limit = self.limit(limit);
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {OBJECTIVE_COLS} FROM objectives WHERE company_id = ?1
                     ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
                ),
                || [company_id],
            )
            .await?;
        let mut objectives = Vec::new();
        while let Some(row) = rows.next().await? {
            objectives.push(row_to_objective(&row)?);
        }
        for objective in &mut objectives {
            objective.key_results = self.key_results_for(&objective.id).await?;
        }
        Ok(objectives)
    }

    async fn key_results_for(&self, objective_id: &str) -> Result<Vec<KeyResult>, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {KEY_RESULT_COLS} FROM key_results kr
                     WHERE kr.objective_id = ?1 ORDER BY kr.created_at, kr.rowid"
                ),
                || [objective_id],
            )
            .await?;
        let mut key_results = Vec::new();
        while let Some(row) = rows.next().await? {
            key_results.push(row_to_key_result(&row)?);
        }
        Ok(key_results)
    }

    async fn insert_key_result(&self, objective_id: &str, input: &NewKeyResult) -> Result<KeyResult, DatabaseError> {
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_KEY_RESULT).await?;
        let current = input.current_value.unwrap_or(input.start_value);
        let title = input.title.trim();
        self.db()
            .execute_with(
                "INSERT INTO key_results (id, objective_id, title, start_value, target_value,
                     current_value, unit, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                || {
                    libsql::params![
                        id.as_str(),
                        objective_id,
                        title,
                        input.start_value,
                        input.target_value,
                        current,
                        input.unit.as_deref(),
                        now.to_rfc3339()
                    ]
                },
            )
            .await?;
        self.audit_simple(EntityType::KeyResult, &id, AuditAction::Created)
            .await?;
        Ok(KeyResult {
            id,
            objective_id: objective_id.to_string(),
            title: title.to_string(),
            start_value: input.start_value,
            target_value: input.target_value,
            current_value: current,
            unit: input.unit.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Attach a key result to an existing objective.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown objective,
    /// `DatabaseError::InvalidState` when the objective is closed, or
    /// `DatabaseError::Validation`.
    pub async fn add_key_result(
        &self,
        objective_id: &str,
        input: &NewKeyResult,
    ) -> Result<KeyResultResponse, DatabaseError> {
        input.validate()?;
        let objective = self.get_objective(objective_id).await?;
        if objective.status != ObjectiveStatus::Active {
            return Err(DatabaseError::InvalidState(format!(
                "objective {objective_id} is {}",
                objective.status
            )));
        }
        let key_result = self.insert_key_result(objective_id, input).await?;
        let objective = self.get_objective(objective_id).await?;
        Ok(KeyResultResponse {
            key_result,
            objective_progress: objective.progress(),
        })
    }

    /// Record a new measurement for a key result.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the key result does not belong to
    /// an objective in the scoped company.
    pub async fn update_key_result_value(
        &self,
        key_result_id: &str,
        current_value: f64,
    ) -> Result<KeyResultResponse, DatabaseError> {
        if !current_value.is_finite() {
            return Err(DatabaseError::Validation("current_value must be finite".into()));
        }
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {KEY_RESULT_COLS} FROM key_results kr
                     JOIN objectives o ON o.id = kr.objective_id
                     WHERE kr.id = ?1 AND o.company_id = ?2"
                ),
                || [key_result_id, company_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("key result", key_result_id))?;
        let previous = row_to_key_result(&row)?;
        drop(rows);

        let now = Utc::now();
        self.db()
            .execute_with(
                "UPDATE key_results SET current_value = ?1, updated_at = ?2 WHERE id = ?3",
                || libsql::params![current_value, now.to_rfc3339(), key_result_id],
            )
            .await?;
        self.audit_detail(
            EntityType::KeyResult,
            key_result_id,
            AuditAction::Updated,
            &ValueChange {
                from: previous.current_value,
                to: current_value,
            },
        )
        .await?;

        let objective = self.get_objective(&previous.objective_id).await?;
        Ok(KeyResultResponse {
            key_result: KeyResult {
                current_value,
                updated_at: now,
                ..previous
            },
            objective_progress: objective.progress(),
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` when the objective is already closed.
    pub async fn transition_objective(
        &self,
        objective_id: &str,
        next: ObjectiveStatus,
    ) -> Result<Objective, DatabaseError> {
        let current = self.get_objective(objective_id).await?;
        if !current.status.can_transition_to(next) {
            return Err(DatabaseError::InvalidState(format!(
                "cannot move objective from {} to {next}",
                current.status
            )));
        }
        let company_id = self.company_id()?;
        let now = Utc::now().to_rfc3339();
        self.db()
            .execute_with(
                "UPDATE objectives SET status = ?1, updated_at = ?2 WHERE id = ?3 AND company_id = ?4",
                || libsql::params![next.as_str(), now.as_str(), objective_id, company_id],
            )
            .await?;
        self.audit_detail(
            EntityType::Objective,
            objective_id,
            AuditAction::StatusChanged,
            &StatusChangedDetail {
                from: current.status.to_string(),
                to: next.to_string(),
                reason: None,
            },
        )
        .await?;
        self.get_objective(objective_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scoped_service;
    use pretty_assertions::assert_eq;

    fn kr(title: &str, start: f64, target: f64, current: Option<f64>) -> NewKeyResult {
        NewKeyResult {
            title: title.into(),
            start_value: start,
            target_value: target,
            current_value: current,
            unit: Some("%".into()),
        }
    }

    fn objective() -> NewObjective {
        NewObjective {
            title: "Make onboarding effortless".into(),
            description: None,
            period: "2026-Q4".into(),
            key_results: vec![
                kr("Activation rate", 20.0, 40.0, Some(30.0)),
                kr("Time to first report", 10.0, 2.0, None),
            ],
        }
    }

    #[tokio::test]
    async fn create_with_key_results_and_progress() {
        let svc = scoped_service().await;
        let created = svc.create_objective(&objective()).await.unwrap();
        assert_eq!(created.key_results.len(), 2);

        let fetched = svc.get_objective(&created.id).await.unwrap();
        assert_eq!(fetched.key_results.len(), 2);
        assert_eq!(fetched.key_results[0].title, "Activation rate");
        // (0.5 + 0.0) / 2
        assert!((fetched.progress() - 0.25).abs() < 1e-9);
    }

    #[tokio::test]
    async fn updating_value_moves_progress() {
        let svc = scoped_service().await;
        let created = svc.create_objective(&objective()).await.unwrap();
        let kr_id = created.key_results[1].id.clone();

        let response = svc.update_key_result_value(&kr_id, 6.0).await.unwrap();
        assert!((response.key_result.current_value - 6.0).abs() < 1e-9);
        // (0.5 + 0.5) / 2
        assert!((response.objective_progress - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn key_results_are_company_scoped() {
        let svc = scoped_service().await;
        let created = svc.create_objective(&objective()).await.unwrap();
        let other = svc.unscoped().create_company("Other").await.unwrap();
        let err = svc
            .for_company(&other.id)
            .update_key_result_value(&created.key_results[0].id, 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn closed_objective_rejects_new_key_results() {
        let svc = scoped_service().await;
        let created = svc.create_objective(&objective()).await.unwrap();
        let response = svc
            .add_key_result(&created.id, &kr("NPS", 30.0, 50.0, None))
            .await
            .unwrap();
        assert_eq!(response.key_result.current_value, 30.0);

        svc.transition_objective(&created.id, ObjectiveStatus::Achieved)
            .await
            .unwrap();
        let err = svc
            .add_key_result(&created.id, &kr("More", 0.0, 1.0, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)));

        let err = svc
            .transition_objective(&created.id, ObjectiveStatus::Missed)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)));
    }

    #[tokio::test]
    async fn list_includes_key_results() {
        let svc = scoped_service().await;
        svc.create_objective(&objective()).await.unwrap();
        let objectives = svc.list_objectives(None).await.unwrap();
        assert_eq!(objectives.len(), 1);
        assert_eq!(objectives[0].key_results.len(), 2);
    }
}
